//! Example demonstrating logging capabilities
//!
//! Run with JSON logging (production):
//! ```bash
//! cargo run --example logging --features logging-json
//! ```
//!
//! Run with pretty logging (development):
//! ```bash
//! cargo run --example logging --features logging-pretty
//! ```
//!
//! `RUST_LOG=field_injector=trace` also shows cache hits and field writes.

use field_injector::{BoxError, Component, Container, Descriptor, Inject, InjectionPoints, bind};

trait Mailer: Send + Sync {
    fn send(&self, to: &str);
}

struct SmtpMailer;

impl Mailer for SmtpMailer {
    fn send(&self, to: &str) {
        println!("  [App] mail sent to {to}");
    }
}

impl Component for SmtpMailer {
    fn construct() -> Result<Self, BoxError> {
        Ok(SmtpMailer)
    }
}

#[derive(Default)]
struct Newsletter {
    mailer: Inject<dyn Mailer>,
    archive: Inject<Archive>,
}

impl Component for Newsletter {
    fn construct() -> Result<Self, BoxError> {
        Ok(Newsletter::default())
    }

    fn injection_points(points: &mut InjectionPoints<Self>) {
        points
            .field("mailer", |n| &n.mailer)
            .field("archive", |n| &n.archive);
    }
}

struct Archive;

fn main() {
    // Initialize logging - uses JSON if logging-json feature enabled,
    // pretty if logging-pretty enabled
    field_injector::logging::builder().trace().injector_only().init();

    println!("=== Field Injector Logging Demo ===\n");

    // Logs: "Creating new DI container"
    let container = Container::new();

    // Logs: "Managing component", "Registering binding"
    container.manage::<SmtpMailer>();
    container.manage::<Newsletter>();
    bind!(container, dyn Mailer => SmtpMailer);

    // Logs a warning: concrete request types never consult bindings
    container.register::<SmtpMailer, SmtpMailer>(|mailer| mailer);

    // Archive is not managed yet. Logs: "Implementation type is not managed",
    // "Resolution failed" with the discarded instance count
    if let Err(err) = container.resolve::<Newsletter>() {
        println!("  [App] first attempt failed: {err}");
    }

    // A failed resolution does not lock in anything, but it does lock the
    // container, so a fresh one is needed to fix the registration
    let container = Container::new();
    container
        .register_batch()
        .manage::<SmtpMailer>()
        .manage::<Newsletter>()
        .manage_with(Descriptor::<Archive>::new().constructor(|| Ok(Archive)))
        .register::<dyn Mailer, SmtpMailer>(|mailer| mailer)
        .done();

    // Logs: "Resolution completed", then "Resolved from committed cache"
    let newsletter = container.resolve::<Newsletter>().unwrap();
    let _again = container.resolve::<dyn Mailer>().unwrap();
    newsletter.mailer.send("guests@example.com");

    println!("\n=== Demo Complete ===");
    println!("Check the log output above to see structured logging in action!");
    println!("\nTip: Use --features logging-json for production (JSON output)");
    println!("     Use --features logging-pretty for development (colorful output)");
}
