//! # Field Injector - Singleton Field Injection for Rust
//!
//! A small inversion-of-control container: components declare which of their
//! fields are dependencies, and the container builds the whole object graph
//! for them, one shared instance per concrete type.
//!
//! ## Features
//!
//! - 🧩 **Field injection** - Dependencies live in [`Inject<T>`] fields and are wired after construction
//! - 🔗 **Trait bindings** - Request `dyn Trait` and get the bound implementation
//! - ♻️ **Cycles welcome** - `A -> B -> A` resolves through early references
//! - 🔒 **Thread-safe** - Concurrent resolution never builds a second instance
//! - ↩️ **All or nothing** - A failed resolution leaves nothing half-wired in the cache
//! - 📊 **Observable** - Optional tracing integration with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use field_injector::{bind, BoxError, Component, Container, Inject, InjectionPoints};
//!
//! trait GuestBook: Send + Sync {
//!     fn guests(&self) -> Vec<&'static str>;
//! }
//!
//! struct PaperBook;
//!
//! impl GuestBook for PaperBook {
//!     fn guests(&self) -> Vec<&'static str> {
//!         vec!["Ada", "Grace"]
//!     }
//! }
//!
//! impl Component for PaperBook {
//!     fn construct() -> Result<Self, BoxError> {
//!         Ok(PaperBook)
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Reception {
//!     book: Inject<dyn GuestBook>,
//! }
//!
//! impl Component for Reception {
//!     fn construct() -> Result<Self, BoxError> {
//!         Ok(Reception::default())
//!     }
//!
//!     fn injection_points(points: &mut InjectionPoints<Self>) {
//!         points.field("book", |r| &r.book);
//!     }
//! }
//!
//! let container = Container::new();
//! container.manage::<PaperBook>();
//! container.manage::<Reception>();
//! bind!(container, dyn GuestBook => PaperBook);
//!
//! let reception = container.resolve::<Reception>().unwrap();
//! assert_eq!(reception.book.guests().len(), 2);
//! ```
//!
//! ## Circular Dependencies
//!
//! ```rust
//! use field_injector::{BoxError, Component, Container, Inject, InjectionPoints};
//!
//! #[derive(Default)]
//! struct Manager {
//!     desk: Inject<Desk>,
//! }
//!
//! #[derive(Default)]
//! struct Desk {
//!     manager: Inject<Manager>,
//! }
//!
//! impl Component for Manager {
//!     fn construct() -> Result<Self, BoxError> {
//!         Ok(Manager::default())
//!     }
//!     fn injection_points(points: &mut InjectionPoints<Self>) {
//!         points.field("desk", |m| &m.desk);
//!     }
//! }
//!
//! impl Component for Desk {
//!     fn construct() -> Result<Self, BoxError> {
//!         Ok(Desk::default())
//!     }
//!     fn injection_points(points: &mut InjectionPoints<Self>) {
//!         points.field("manager", |d| &d.manager);
//!     }
//! }
//!
//! let container = Container::new();
//! container.manage::<Manager>();
//! container.manage::<Desk>();
//!
//! let manager = container.resolve::<Manager>().unwrap();
//! let desk = container.resolve::<Desk>().unwrap();
//! assert!(std::sync::Arc::ptr_eq(manager.desk.get().unwrap(), &desk));
//! assert!(std::sync::Arc::ptr_eq(desk.manager.get().unwrap(), &manager));
//! ```
//!
//! Instances that reference each other this way are never freed.
//!
//! ## Derive
//!
//! With the `derive` feature, `#[derive(Component)]` writes the impl: every
//! `#[inject]` field becomes an injection point and all other fields start
//! from `Default`.

mod component;
mod container;
mod error;
mod factory;
mod inject;
mod key;
#[cfg(feature = "logging")]
pub mod logging;
mod registry;
mod resolver;
mod storage;

pub use component::*;
pub use container::*;
pub use error::*;
pub use factory::Descriptor;
pub use inject::*;
pub use key::*;
pub use registry::Binding;

#[cfg(feature = "derive")]
pub use field_injector_derive::Component;

// Re-export tracing macros for convenience when logging feature is enabled
#[cfg(feature = "logging")]
pub use tracing::{debug, error, info, trace, warn};

// Re-export for convenience
pub use std::sync::Arc;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BatchBuilder, Binding, BoxError, Component, Container, Descriptor, DiError, ErrorKind,
        Inject, InjectionPoints, Result, TypeKey, bind,
    };
    pub use std::sync::Arc;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    trait Clock: Send + Sync {
        fn now(&self) -> u64;
    }

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> u64 {
            1_700_000_000
        }
    }

    impl Component for FixedClock {
        fn construct() -> std::result::Result<Self, BoxError> {
            Ok(FixedClock)
        }
    }

    #[derive(Default)]
    struct Housekeeping {
        clock: Inject<dyn Clock>,
        owner: Inject<Housekeeping>,
    }

    impl Component for Housekeeping {
        fn construct() -> std::result::Result<Self, BoxError> {
            Ok(Housekeeping::default())
        }

        fn injection_points(points: &mut InjectionPoints<Self>) {
            points
                .field("clock", |h| &h.clock)
                .field("owner", |h| &h.owner);
        }
    }

    #[test]
    fn test_trait_binding_and_self_dependency() {
        let container = Container::new();
        container.manage::<FixedClock>();
        container.manage::<Housekeeping>();
        bind!(container, dyn Clock => FixedClock);

        let housekeeping = container.resolve::<Housekeeping>().unwrap();
        assert_eq!(housekeeping.clock.now(), 1_700_000_000);
        assert!(Arc::ptr_eq(housekeeping.owner.get().unwrap(), &housekeeping));
    }

    #[test]
    fn test_abstract_cycle() {
        trait Left: Send + Sync {
            fn right(&self) -> &Inject<dyn Right>;
        }
        trait Right: Send + Sync {
            fn left(&self) -> &Inject<dyn Left>;
        }

        #[derive(Default)]
        struct L {
            right: Inject<dyn Right>,
        }
        #[derive(Default)]
        struct R {
            left: Inject<dyn Left>,
        }

        impl Left for L {
            fn right(&self) -> &Inject<dyn Right> {
                &self.right
            }
        }
        impl Right for R {
            fn left(&self) -> &Inject<dyn Left> {
                &self.left
            }
        }

        let container = Container::new();
        container.manage_with(
            Descriptor::<L>::new()
                .constructor(|| Ok(L::default()))
                .inject("right", |l| &l.right),
        );
        container.manage_with(
            Descriptor::<R>::new()
                .constructor(|| Ok(R::default()))
                .inject("left", |r| &r.left),
        );
        bind!(container, dyn Left => L);
        bind!(container, dyn Right => R);

        let left = container.resolve::<dyn Left>().unwrap();
        let back = left.right().left().get().unwrap();
        assert_eq!(
            Arc::as_ptr(&left) as *const (),
            Arc::as_ptr(back) as *const ()
        );
        assert_eq!(container.cached_count(), 2);
    }

    #[test]
    fn test_constructor_called_once_per_type() {
        static BUILT: AtomicU32 = AtomicU32::new(0);

        struct Laundry;

        impl Component for Laundry {
            fn construct() -> std::result::Result<Self, BoxError> {
                BUILT.fetch_add(1, Ordering::SeqCst);
                Ok(Laundry)
            }
        }

        let container = Container::new();
        container.manage::<Laundry>();

        for _ in 0..5 {
            container.resolve::<Laundry>().unwrap();
        }
        assert_eq!(BUILT.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_rollback_leaves_no_partial_graph() {
        #[derive(Default)]
        struct Parent {
            child: Inject<Child>,
        }

        struct Child;

        let container = Container::new();
        container.manage_with(
            Descriptor::<Parent>::new()
                .constructor(|| Ok(Parent::default()))
                .inject("child", |p| &p.child),
        );
        container.manage_with(
            Descriptor::<Child>::new().constructor(|| Err("child refused".into())),
        );

        let err = container.resolve::<Parent>().err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Instantiation);
        assert!(!container.is_cached::<Parent>());
        assert_eq!(container.cached_count(), 0);
    }
}
