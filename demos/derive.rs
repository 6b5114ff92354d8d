//! Example demonstrating the #[derive(Component)] macro
//!
//! Run with:
//!   cargo run --example derive --features derive

use field_injector::{BoxError, Component, Container, Inject, bind};
use std::sync::atomic::{AtomicU64, Ordering};

// Dependencies
trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

#[derive(Component)]
struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }
}

#[derive(Component)]
#[component(construct = "GuestLedger::open")]
struct GuestLedger {
    currency: String,
    #[inject]
    clock: Inject<dyn Clock>,
}

impl GuestLedger {
    fn open() -> Result<Self, BoxError> {
        let currency = std::env::var("HOTEL_CURRENCY").unwrap_or_else(|_| "EUR".into());
        Ok(GuestLedger {
            currency,
            clock: Inject::empty(),
        })
    }
}

// Service with injected dependencies
#[derive(Component)]
struct Concierge {
    #[inject]
    ledger: Inject<GuestLedger>,
    #[inject]
    clock: Inject<dyn Clock>,
    // Non-injected field uses Default
    requests: AtomicU64,
}

impl Concierge {
    fn describe(&self) -> String {
        let served = self.requests.fetch_add(1, Ordering::SeqCst) + 1;
        format!(
            "Concierge at t={} billing in {} (requests: {})",
            self.clock.now(),
            self.ledger.currency,
            served
        )
    }
}

fn main() {
    println!("=== #[derive(Component)] Demo ===\n");

    let container = Container::new();
    container
        .register_batch()
        .manage::<SystemClock>()
        .manage::<GuestLedger>()
        .manage::<Concierge>()
        .done();
    bind!(container, dyn Clock => SystemClock);

    match container.resolve::<Concierge>() {
        Ok(concierge) => {
            println!("{}", concierge.describe());
            println!("{}", concierge.describe());
            println!(
                "Ledger clock wired: {}",
                concierge.ledger.clock.is_wired()
            );
        }
        Err(err) => eprintln!("Failed to resolve Concierge: {err}"),
    }

    println!("\n{} instances cached", container.cached_count());
    println!("\n=== Demo Complete ===");
}
