//! A small hotel back end wired by the container
//!
//! Controller -> service traits -> repository, plus a manager and desk that
//! reference each other.
//!
//! Run with:
//!   cargo run --example front_desk

use field_injector::{
    BoxError, Component, Container, DiError, Inject, InjectionPoints, bind,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

// =============================================================================
// Repository
// =============================================================================

trait RoomRepository: Send + Sync {
    fn rate(&self, room: u32) -> Option<u32>;
}

struct StaticRooms {
    rates: HashMap<u32, u32>,
}

impl RoomRepository for StaticRooms {
    fn rate(&self, room: u32) -> Option<u32> {
        self.rates.get(&room).copied()
    }
}

impl Component for StaticRooms {
    fn construct() -> Result<Self, BoxError> {
        println!("  [construct] StaticRooms");
        Ok(StaticRooms {
            rates: HashMap::from([(101, 90), (102, 90), (201, 140)]),
        })
    }
}

// =============================================================================
// Services
// =============================================================================

trait BookingService: Send + Sync {
    fn book(&self, room: u32) -> Result<u32, String>;
}

trait BillingService: Send + Sync {
    fn invoice(&self, room: u32, nights: u32) -> Option<u32>;
}

/// One implementation behind two service traits
#[derive(Default)]
struct Reservations {
    rooms: Inject<dyn RoomRepository>,
    bookings: AtomicU32,
}

impl BookingService for Reservations {
    fn book(&self, room: u32) -> Result<u32, String> {
        self.rooms
            .rate(room)
            .map(|_| self.bookings.fetch_add(1, Ordering::SeqCst) + 1)
            .ok_or_else(|| format!("room {room} does not exist"))
    }
}

impl BillingService for Reservations {
    fn invoice(&self, room: u32, nights: u32) -> Option<u32> {
        self.rooms.rate(room).map(|rate| rate * nights)
    }
}

impl Component for Reservations {
    fn construct() -> Result<Self, BoxError> {
        println!("  [construct] Reservations");
        Ok(Reservations::default())
    }

    fn injection_points(points: &mut InjectionPoints<Self>) {
        points.field("rooms", |r| &r.rooms);
    }
}

// =============================================================================
// Staff (cycle)
// =============================================================================

#[derive(Default)]
struct Manager {
    desk: Inject<Desk>,
}

#[derive(Default)]
struct Desk {
    manager: Inject<Manager>,
}

impl Component for Manager {
    fn construct() -> Result<Self, BoxError> {
        println!("  [construct] Manager");
        Ok(Manager::default())
    }

    fn injection_points(points: &mut InjectionPoints<Self>) {
        points.field("desk", |m| &m.desk);
    }
}

impl Component for Desk {
    fn construct() -> Result<Self, BoxError> {
        println!("  [construct] Desk");
        Ok(Desk::default())
    }

    fn injection_points(points: &mut InjectionPoints<Self>) {
        points.field("manager", |d| &d.manager);
    }
}

// =============================================================================
// Controller
// =============================================================================

#[derive(Default)]
struct FrontDeskController {
    bookings: Inject<dyn BookingService>,
    billing: Inject<dyn BillingService>,
    desk: Inject<Desk>,
}

impl FrontDeskController {
    fn check_in(&self, room: u32, nights: u32) -> Result<String, String> {
        let booking = self.bookings.book(room)?;
        let total = self.billing.invoice(room, nights).unwrap_or_default();
        Ok(format!("booking #{booking}: room {room}, {nights} nights, {total} EUR"))
    }
}

impl Component for FrontDeskController {
    fn construct() -> Result<Self, BoxError> {
        println!("  [construct] FrontDeskController");
        Ok(FrontDeskController::default())
    }

    fn injection_points(points: &mut InjectionPoints<Self>) {
        points
            .field("bookings", |c| &c.bookings)
            .field("billing", |c| &c.billing)
            .field("desk", |c| &c.desk);
    }
}

fn main() -> Result<(), DiError> {
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    field_injector::logging::init_injector_only();

    println!("=== Front Desk Demo ===\n");

    let container = Container::new();
    container
        .register_batch()
        .manage::<StaticRooms>()
        .manage::<Reservations>()
        .manage::<Manager>()
        .manage::<Desk>()
        .manage::<FrontDeskController>()
        .done();

    bind!(container, dyn RoomRepository => StaticRooms);
    bind!(container, dyn BookingService => Reservations);
    bind!(container, dyn BillingService => Reservations);

    println!("Resolving the controller:");
    let controller = container.resolve::<FrontDeskController>()?;
    println!("  {} instances cached\n", container.cached_count());

    for (room, nights) in [(101, 2), (201, 1), (999, 3)] {
        match controller.check_in(room, nights) {
            Ok(receipt) => println!("  check-in ok: {receipt}"),
            Err(reason) => println!("  check-in refused: {reason}"),
        }
    }

    let booking = container.resolve::<dyn BookingService>()?;
    let billing = container.resolve::<dyn BillingService>()?;
    println!(
        "\nBooking and billing share one instance: {}",
        Arc::as_ptr(&booking) as *const () == Arc::as_ptr(&billing) as *const ()
    );

    let manager = container.resolve::<Manager>()?;
    let desk = controller.desk.get().map(Arc::clone);
    println!(
        "Manager and desk point at each other: {}",
        desk.is_some_and(|desk| {
            desk.manager
                .get()
                .is_some_and(|back| Arc::ptr_eq(back, &manager))
        })
    );

    println!("\nAsking for something nobody provides:");
    trait Spa: Send + Sync {}
    match container.resolve::<dyn Spa>() {
        Ok(_) => println!("  unexpected spa"),
        Err(err) => println!("  {err}"),
    }

    println!("\n=== Demo Complete ===");
    Ok(())
}
