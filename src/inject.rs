//! Injection points
//!
//! A component declares which of its fields the container fills by listing
//! them in an [`InjectionPoints`] builder. The resulting [`InjectionPoint`]s
//! are a static description of the type: they are computed once, when the
//! component is managed, and only touch an instance through
//! [`InjectionPoint::assign`].

use crate::{FieldError, TypeKey};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

/// A field populated by the container after construction.
///
/// Starts empty and is written exactly once. Because components are shared
/// (and may be handed out as early references to a cycle) the write goes
/// through a `OnceCell` rather than `&mut self`.
///
/// # Examples
///
/// ```rust
/// use field_injector::Inject;
///
/// struct Reception {
///     ledger: Inject<Ledger>,
/// }
/// struct Ledger;
///
/// let reception = Reception { ledger: Inject::empty() };
/// assert!(!reception.ledger.is_wired());
/// ```
pub struct Inject<T: ?Sized> {
    cell: OnceCell<Arc<T>>,
}

impl<T: ?Sized> Inject<T> {
    /// An unwired field
    #[inline]
    pub const fn empty() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// The injected dependency, if wiring has happened
    #[inline]
    pub fn get(&self) -> Option<&Arc<T>> {
        self.cell.get()
    }

    #[inline]
    pub fn is_wired(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Write the dependency; hands the value back if already wired
    #[inline]
    pub(crate) fn assign(&self, value: Arc<T>) -> Result<(), Arc<T>> {
        self.cell.set(value)
    }
}

impl<T: ?Sized> Default for Inject<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: ?Sized> Deref for Inject<T> {
    type Target = T;

    /// # Panics
    ///
    /// Panics if the field has not been wired yet.
    #[inline]
    fn deref(&self) -> &T {
        match self.cell.get() {
            Some(value) => &**value,
            None => panic!(
                "dependency {} accessed before injection",
                std::any::type_name::<T>()
            ),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Inject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inject")
            .field("type", &std::any::type_name::<T>())
            .field("wired", &self.is_wired())
            .finish()
    }
}

/// Type-erased field setter
type Setter =
    Arc<dyn Fn(&(dyn Any + Send + Sync), Box<dyn Any>) -> Result<(), FieldError> + Send + Sync>;

/// A single field of a managed component that must receive a dependency.
#[derive(Clone)]
pub struct InjectionPoint {
    owner: TypeKey,
    field: &'static str,
    declared: TypeKey,
    setter: Setter,
}

impl InjectionPoint {
    /// The component declaring the field
    #[inline]
    pub fn owner(&self) -> TypeKey {
        self.owner
    }

    #[inline]
    pub fn field(&self) -> &'static str {
        self.field
    }

    /// The request type resolved for this field
    #[inline]
    pub fn declared(&self) -> TypeKey {
        self.declared
    }

    /// Write a resolved `Arc<Declared>` (boxed as `dyn Any`) into `instance`.
    pub fn assign(
        &self,
        instance: &(dyn Any + Send + Sync),
        value: Box<dyn Any>,
    ) -> Result<(), FieldError> {
        (self.setter)(instance, value)
    }
}

impl fmt::Debug for InjectionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectionPoint")
            .field("owner", &self.owner.name())
            .field("field", &self.field)
            .field("declared", &self.declared.name())
            .finish()
    }
}

/// Builder collecting the injection points of component `C`.
///
/// # Examples
///
/// ```rust
/// use field_injector::{Inject, InjectionPoints};
///
/// struct Ledger;
/// struct Reception {
///     ledger: Inject<Ledger>,
/// }
///
/// let mut points = InjectionPoints::<Reception>::new();
/// points.field("ledger", |r| &r.ledger);
/// assert_eq!(points.len(), 1);
/// ```
pub struct InjectionPoints<C> {
    points: Vec<InjectionPoint>,
    _owner: PhantomData<fn() -> C>,
}

impl<C: Send + Sync + 'static> InjectionPoints<C> {
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
            _owner: PhantomData,
        }
    }

    /// Declare `name` as an injection point reached through `accessor`.
    pub fn field<T>(&mut self, name: &'static str, accessor: fn(&C) -> &Inject<T>) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let setter = move |instance: &(dyn Any + Send + Sync), value: Box<dyn Any>| {
            let owner = instance
                .downcast_ref::<C>()
                .ok_or(FieldError::OwnerMismatch(std::any::type_name::<C>()))?;
            let value = value
                .downcast::<Arc<T>>()
                .map_err(|_| FieldError::ValueMismatch(std::any::type_name::<T>()))?;
            accessor(owner)
                .assign(*value)
                .map_err(|_| FieldError::AlreadyAssigned)
        };

        self.points.push(InjectionPoint {
            owner: TypeKey::of::<C>(),
            field: name,
            declared: TypeKey::of::<T>(),
            setter: Arc::new(setter),
        });
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InjectionPoint> {
        self.points.iter()
    }

    pub(crate) fn into_vec(self) -> Vec<InjectionPoint> {
        self.points
    }
}

impl<C: Send + Sync + 'static> Default for InjectionPoints<C> {
    fn default() -> Self {
        Self::new()
    }
}
