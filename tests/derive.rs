//! `#[derive(Component)]` against a real container

use field_injector::{BoxError, Component, Container, ErrorKind, Inject, InjectionPoints, bind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

trait RoomStore: Send + Sync {
    fn free(&self) -> u32;
}

#[derive(Component)]
struct InMemoryRooms {
    taken: AtomicU32,
}

impl RoomStore for InMemoryRooms {
    fn free(&self) -> u32 {
        40 - self.taken.load(Ordering::SeqCst)
    }
}

#[derive(Component)]
struct Reception {
    #[inject]
    rooms: Inject<dyn RoomStore>,
    #[inject]
    ledger: Inject<Ledger>,
    greeting: String,
}

#[derive(Component)]
#[component(construct = "Ledger::open")]
struct Ledger {
    currency: &'static str,
    #[inject]
    reception: Inject<Reception>,
}

impl Ledger {
    fn open() -> Result<Self, BoxError> {
        Ok(Ledger {
            currency: "EUR",
            reception: Inject::empty(),
        })
    }
}

#[derive(Component)]
struct Doorbell;

#[derive(Component)]
#[component(construct = "Closed::refuse")]
struct Closed {
    _reason: String,
}

impl Closed {
    fn refuse() -> Result<Self, BoxError> {
        Err("closed for renovation".into())
    }
}

fn container() -> Container {
    let container = Container::new();
    container
        .register_batch()
        .manage::<InMemoryRooms>()
        .manage::<Reception>()
        .manage::<Ledger>()
        .manage::<Closed>()
        .manage::<Doorbell>()
        .done();
    bind!(container, dyn RoomStore => InMemoryRooms);
    container
}

#[test]
fn test_derived_injection_points() {
    let mut points = InjectionPoints::<Reception>::new();
    Reception::injection_points(&mut points);

    let fields: Vec<_> = points.iter().map(|p| p.field()).collect();
    assert_eq!(fields, vec!["rooms", "ledger"]);

    let mut none = InjectionPoints::<InMemoryRooms>::new();
    InMemoryRooms::injection_points(&mut none);
    assert!(none.is_empty());
}

#[test]
fn test_derived_graph_with_cycle() {
    let container = container();

    let reception = container.resolve::<Reception>().unwrap();
    assert_eq!(reception.rooms.free(), 40);
    assert!(reception.greeting.is_empty());
    assert_eq!(reception.ledger.currency, "EUR");

    let ledger = container.resolve::<Ledger>().unwrap();
    assert!(Arc::ptr_eq(reception.ledger.get().unwrap(), &ledger));
    assert!(Arc::ptr_eq(ledger.reception.get().unwrap(), &reception));
}

#[test]
fn test_custom_constructor_failure() {
    let container = container();

    let err = container.resolve::<Closed>().err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Instantiation);
    assert!(err.to_string().contains("closed for renovation"));
}

#[test]
fn test_unit_component() {
    let container = container();

    let first = container.resolve::<Doorbell>().unwrap();
    let second = container.resolve::<Doorbell>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(container.managed_count(), 5);
}
