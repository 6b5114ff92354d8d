//! The managed-component marker
//!
//! Implementing [`Component`] is how a concrete type declares that the
//! container may construct it, and which of its fields are injection points.
//! The declaration only takes effect once the type is handed to
//! [`Container::manage`](crate::Container::manage).

use crate::{BoxError, InjectionPoints};

/// A concrete type the container is allowed to construct.
///
/// # Examples
///
/// ```rust
/// use field_injector::{BoxError, Component, Container, Inject, InjectionPoints};
///
/// #[derive(Default)]
/// struct Ledger;
///
/// impl Component for Ledger {
///     fn construct() -> Result<Self, BoxError> {
///         Ok(Ledger)
///     }
/// }
///
/// #[derive(Default)]
/// struct Reception {
///     ledger: Inject<Ledger>,
/// }
///
/// impl Component for Reception {
///     fn construct() -> Result<Self, BoxError> {
///         Ok(Reception::default())
///     }
///
///     fn injection_points(points: &mut InjectionPoints<Self>) {
///         points.field("ledger", |r| &r.ledger);
///     }
/// }
///
/// let container = Container::new();
/// container.manage::<Ledger>();
/// container.manage::<Reception>();
///
/// let reception = container.resolve::<Reception>().unwrap();
/// assert!(reception.ledger.is_wired());
/// ```
pub trait Component: Send + Sync + Sized + 'static {
    /// The zero-argument construction path.
    ///
    /// Injection points must be left empty; the container fills them after
    /// the instance has been cached.
    fn construct() -> Result<Self, BoxError>;

    /// Declare the fields the container must populate.
    fn injection_points(points: &mut InjectionPoints<Self>) {
        let _ = points;
    }
}
