//! Binding registry
//!
//! Maps abstract request types (trait objects) to the concrete type that
//! satisfies them. Registration is an unconditional upsert; whether the
//! implementation is actually managed is only checked at resolution time.

use crate::TypeKey;
use crate::factory::{ErasedInstance, Resolved};
use crate::storage::type_map;
use ahash::RandomState;
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::Arc;

type Upcast = Arc<dyn Fn(ErasedInstance) -> Option<Resolved> + Send + Sync>;

/// A request type bound to its implementation type.
#[derive(Clone)]
pub struct Binding {
    request: TypeKey,
    implementation: TypeKey,
    upcast: Upcast,
}

impl Binding {
    /// Bind `R` to `C`, using `upcast` to turn the shared `C` into an `R`.
    pub fn new<R, C>(upcast: fn(Arc<C>) -> Arc<R>) -> Self
    where
        R: ?Sized + Send + Sync + 'static,
        C: Send + Sync + 'static,
    {
        let erased = move |instance: ErasedInstance| {
            instance
                .downcast::<C>()
                .ok()
                .map(|typed| Box::new(upcast(typed)) as Resolved)
        };

        Self {
            request: TypeKey::of::<R>(),
            implementation: TypeKey::of::<C>(),
            upcast: Arc::new(erased),
        }
    }

    #[inline]
    pub fn request(&self) -> TypeKey {
        self.request
    }

    #[inline]
    pub fn implementation(&self) -> TypeKey {
        self.implementation
    }

    /// Hand out a cached implementation instance as the request type
    #[inline]
    pub(crate) fn project(&self, instance: ErasedInstance) -> Option<Resolved> {
        (self.upcast)(instance)
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("request", &self.request.name())
            .field("implementation", &self.implementation.name())
            .finish()
    }
}

/// Request type -> binding
pub(crate) struct BindingRegistry {
    bindings: DashMap<TypeId, Binding, RandomState>,
}

impl BindingRegistry {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bindings: type_map(capacity),
        }
    }

    /// Insert or overwrite; returns the implementation previously bound
    #[inline]
    pub fn register(&self, binding: Binding) -> Option<TypeKey> {
        self.bindings
            .insert(binding.request().id(), binding)
            .map(|previous| previous.implementation())
    }

    #[inline]
    pub fn lookup(&self, request: &TypeId) -> Option<Binding> {
        self.bindings.get(request).map(|b| b.value().clone())
    }

    #[inline]
    pub fn contains(&self, request: &TypeId) -> bool {
        self.bindings.contains_key(request)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn request_types(&self) -> Vec<TypeKey> {
        self.bindings.iter().map(|b| b.value().request()).collect()
    }
}

/// Bind a trait object to a concrete component.
///
/// Expands to [`Container::register`](crate::Container::register) with the
/// unsizing upcast spelled out.
///
/// # Examples
///
/// ```rust
/// use field_injector::{bind, BoxError, Component, Container};
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> &'static str;
/// }
///
/// struct Concierge;
///
/// impl Greeter for Concierge {
///     fn greet(&self) -> &'static str {
///         "welcome"
///     }
/// }
///
/// impl Component for Concierge {
///     fn construct() -> Result<Self, BoxError> {
///         Ok(Concierge)
///     }
/// }
///
/// let container = Container::new();
/// container.manage::<Concierge>();
/// bind!(container, dyn Greeter => Concierge);
///
/// let greeter = container.resolve::<dyn Greeter>().unwrap();
/// assert_eq!(greeter.greet(), "welcome");
/// ```
#[macro_export]
macro_rules! bind {
    ($container:expr, $request:ty => $implementation:ty) => {
        $container.register::<$request, $implementation>(
            |instance: ::std::sync::Arc<$implementation>| -> ::std::sync::Arc<$request> { instance },
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Store: Send + Sync {
        fn name(&self) -> &'static str;
    }

    struct Memory;
    impl Store for Memory {
        fn name(&self) -> &'static str {
            "memory"
        }
    }

    struct Disk;
    impl Store for Disk {
        fn name(&self) -> &'static str {
            "disk"
        }
    }

    fn binding<C: Store + 'static>() -> Binding {
        Binding::new::<dyn Store, C>(|c: Arc<C>| -> Arc<dyn Store> { c })
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = BindingRegistry::with_capacity(0);
        assert!(registry.lookup(&TypeId::of::<dyn Store>()).is_none());

        assert!(registry.register(binding::<Memory>()).is_none());

        let found = registry.lookup(&TypeId::of::<dyn Store>()).unwrap();
        assert_eq!(found.request(), TypeKey::of::<dyn Store>());
        assert_eq!(found.implementation(), TypeKey::of::<Memory>());
    }

    #[test]
    fn test_register_overwrites() {
        let registry = BindingRegistry::with_capacity(0);
        registry.register(binding::<Memory>());

        let previous = registry.register(binding::<Disk>());
        assert_eq!(previous, Some(TypeKey::of::<Memory>()));
        assert_eq!(registry.len(), 1);

        let found = registry.lookup(&TypeId::of::<dyn Store>()).unwrap();
        assert_eq!(found.implementation(), TypeKey::of::<Disk>());
    }

    #[test]
    fn test_project_upcasts() {
        let binding = binding::<Disk>();

        let instance: ErasedInstance = Arc::new(Disk);
        let resolved = binding.project(instance).unwrap();
        let store = resolved.downcast::<Arc<dyn Store>>().unwrap();
        assert_eq!(store.name(), "disk");

        let wrong: ErasedInstance = Arc::new(Memory);
        assert!(binding.project(wrong).is_none());
    }
}
