//! Component descriptors
//!
//! A [`Descriptor`] is the declarative metadata of a managed type: its
//! zero-argument constructor and its injection points. Once managed it is
//! erased into a `ComponentDescriptor`, which the resolver drives without
//! knowing the concrete type.

use crate::{BoxError, Component, ConstructError, Inject, InjectionPoint, InjectionPoints, TypeKey};
use std::any::Any;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::trace;

/// A constructed component, type-erased
pub(crate) type ErasedInstance = Arc<dyn Any + Send + Sync>;

/// A resolved request: a boxed `Arc<Request>`
pub(crate) type Resolved = Box<dyn Any>;

/// Turns a cached instance back into the `Arc<C>` handle of its own type
pub(crate) type Projection = fn(ErasedInstance) -> Option<Resolved>;

type ConstructFn<C> = Box<dyn Fn() -> Result<C, BoxError> + Send + Sync>;

type ErasedConstructFn = Box<dyn Fn() -> Result<ErasedInstance, BoxError> + Send + Sync>;

/// Declarative description of a managed component.
///
/// Usually built from a [`Component`] impl with [`Descriptor::of`], but can
/// be assembled by hand for types that do not implement the trait.
///
/// # Examples
///
/// ```rust
/// use field_injector::{Container, Descriptor, Inject};
///
/// struct Ledger;
///
/// #[derive(Default)]
/// struct Reception {
///     ledger: Inject<Ledger>,
/// }
///
/// let container = Container::new();
/// container.manage_with(Descriptor::<Ledger>::new().constructor(|| Ok(Ledger)));
/// container.manage_with(
///     Descriptor::<Reception>::new()
///         .constructor(|| Ok(Reception::default()))
///         .inject("ledger", |r| &r.ledger),
/// );
///
/// assert!(container.resolve::<Reception>().unwrap().ledger.is_wired());
/// ```
pub struct Descriptor<C> {
    constructor: Option<ConstructFn<C>>,
    points: InjectionPoints<C>,
}

impl<C: Send + Sync + 'static> Descriptor<C> {
    /// Empty descriptor: managed, but with no constructor and no fields.
    pub fn new() -> Self {
        Self {
            constructor: None,
            points: InjectionPoints::new(),
        }
    }

    /// Descriptor derived from the type's [`Component`] impl
    pub fn of() -> Self
    where
        C: Component,
    {
        let mut points = InjectionPoints::new();
        C::injection_points(&mut points);
        Self {
            constructor: Some(Box::new(C::construct) as ConstructFn<C>),
            points,
        }
    }

    /// Set the zero-argument constructor
    pub fn constructor<F>(mut self, constructor: F) -> Self
    where
        F: Fn() -> Result<C, BoxError> + Send + Sync + 'static,
    {
        self.constructor = Some(Box::new(constructor) as ConstructFn<C>);
        self
    }

    /// Declare an injection point
    pub fn inject<T>(mut self, field: &'static str, accessor: fn(&C) -> &Inject<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.points.field(field, accessor);
        self
    }

    #[inline]
    pub fn key(&self) -> TypeKey {
        TypeKey::of::<C>()
    }

    #[inline]
    pub fn has_constructor(&self) -> bool {
        self.constructor.is_some()
    }

    pub fn injection_points(&self) -> &InjectionPoints<C> {
        &self.points
    }

    pub(crate) fn erase(self) -> ComponentDescriptor {
        let constructor = self.constructor.map(|construct| {
            Box::new(move || construct().map(|c| Arc::new(c) as ErasedInstance))
                as ErasedConstructFn
        });

        ComponentDescriptor {
            key: TypeKey::of::<C>(),
            constructor,
            points: self.points.into_vec(),
            project: project::<C>,
        }
    }
}

impl<C: Send + Sync + 'static> Default for Descriptor<C> {
    fn default() -> Self {
        Self::new()
    }
}

fn project<C: Send + Sync + 'static>(instance: ErasedInstance) -> Option<Resolved> {
    instance
        .downcast::<C>()
        .ok()
        .map(|typed| Box::new(typed) as Resolved)
}

/// Type-erased descriptor held by the catalog
pub(crate) struct ComponentDescriptor {
    key: TypeKey,
    constructor: Option<ErasedConstructFn>,
    points: Vec<InjectionPoint>,
    project: Projection,
}

impl ComponentDescriptor {
    #[inline]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    #[inline]
    pub fn injection_points(&self) -> &[InjectionPoint] {
        &self.points
    }

    #[inline]
    pub fn projection(&self) -> Projection {
        self.project
    }

    /// Run the zero-argument construction path
    pub fn instantiate(&self) -> Result<ErasedInstance, ConstructError> {
        let constructor = self
            .constructor
            .as_ref()
            .ok_or(ConstructError::MissingConstructor)?;

        #[cfg(feature = "logging")]
        trace!(
            target: "field_injector",
            service = self.key.name(),
            "Invoking zero-argument constructor"
        );

        constructor().map_err(ConstructError::Failed)
    }
}

impl std::fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("key", &self.key.name())
            .field("has_constructor", &self.constructor.is_some())
            .field("injection_points", &self.points)
            .finish()
    }
}
