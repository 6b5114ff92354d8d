//! Dependency injection container
//!
//! The `Container` is the public entry point: bootstrap code declares managed
//! components and bindings on it, then resolves the root of the object graph.

use crate::factory::Resolved;
use crate::registry::{Binding, BindingRegistry};
use crate::resolver::{Resolver, Session};
use crate::storage::{ComponentCatalog, InstanceCache};
use crate::{Component, Descriptor, DiError, Result, TypeKey};
use parking_lot::ReentrantMutex;
use std::any::TypeId;
use std::cell::RefCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "logging")]
use tracing::{debug, trace, warn};

/// Singleton inversion-of-control container.
///
/// Cloning is cheap and every clone shares the same registry and instance
/// cache. Resolution that may construct runs under a container-wide
/// reentrant lock, so concurrent requests for a type that is still being
/// built wait for it instead of building a second instance. Fully wired
/// instances are served lock-free.
///
/// The first resolution locks the container against further registration.
///
/// # Examples
///
/// ```rust
/// use field_injector::{bind, BoxError, Component, Container, Inject, InjectionPoints};
///
/// trait RoomStore: Send + Sync {
///     fn free_rooms(&self) -> usize;
/// }
///
/// #[derive(Default)]
/// struct InMemoryRooms;
///
/// impl RoomStore for InMemoryRooms {
///     fn free_rooms(&self) -> usize {
///         12
///     }
/// }
///
/// impl Component for InMemoryRooms {
///     fn construct() -> Result<Self, BoxError> {
///         Ok(InMemoryRooms)
///     }
/// }
///
/// #[derive(Default)]
/// struct FrontDesk {
///     rooms: Inject<dyn RoomStore>,
/// }
///
/// impl Component for FrontDesk {
///     fn construct() -> Result<Self, BoxError> {
///         Ok(FrontDesk::default())
///     }
///
///     fn injection_points(points: &mut InjectionPoints<Self>) {
///         points.field("rooms", |desk| &desk.rooms);
///     }
/// }
///
/// let container = Container::new();
/// container.manage::<InMemoryRooms>();
/// container.manage::<FrontDesk>();
/// bind!(container, dyn RoomStore => InMemoryRooms);
///
/// let desk = container.resolve::<FrontDesk>().unwrap();
/// assert_eq!(desk.rooms.free_rooms(), 12);
/// ```
#[derive(Clone)]
pub struct Container {
    registry: Arc<BindingRegistry>,
    catalog: Arc<ComponentCatalog>,
    cache: Arc<InstanceCache>,
    /// Serializes every resolution that may construct
    creation: Arc<ReentrantMutex<RefCell<Creation>>>,
    /// Set by `lock()` or the first resolution
    locked: Arc<AtomicBool>,
}

impl Container {
    /// Create an empty container.
    #[inline]
    pub fn new() -> Self {
        #[cfg(feature = "logging")]
        debug!(target: "field_injector", "Creating new DI container");

        Self::with_capacity(0)
    }

    /// Create a container with pre-allocated capacity.
    ///
    /// Use this when you know approximately how many components will be managed.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            registry: Arc::new(BindingRegistry::with_capacity(capacity)),
            catalog: Arc::new(ComponentCatalog::with_capacity(capacity)),
            cache: Arc::new(InstanceCache::with_capacity(capacity)),
            creation: Arc::new(ReentrantMutex::new(RefCell::new(Creation::default()))),
            locked: Arc::new(AtomicBool::new(false)),
        }
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.registry, &self.catalog, &self.cache)
    }

    // =========================================================================
    // Registration Methods
    // =========================================================================

    /// Declare `C` as a managed component using its [`Component`] impl.
    ///
    /// # Panics
    ///
    /// Panics if the container is locked.
    #[inline]
    pub fn manage<C: Component>(&self) {
        self.manage_with(Descriptor::<C>::of());
    }

    /// Declare a managed component from an explicit descriptor.
    ///
    /// Replaces any previous descriptor for the same type.
    ///
    /// # Panics
    ///
    /// Panics if the container is locked.
    pub fn manage_with<C: Send + Sync + 'static>(&self, descriptor: Descriptor<C>) {
        self.check_not_locked();
        self.insert_descriptor(descriptor);
    }

    fn insert_descriptor<C: Send + Sync + 'static>(&self, descriptor: Descriptor<C>) {
        #[cfg(feature = "logging")]
        debug!(
            target: "field_injector",
            service = descriptor.key().name(),
            injection_points = descriptor.injection_points().len(),
            has_constructor = descriptor.has_constructor(),
            "Managing component"
        );

        let _replaced = self.catalog.insert(descriptor.erase());

        #[cfg(feature = "logging")]
        if _replaced {
            debug!(
                target: "field_injector",
                service = std::any::type_name::<C>(),
                "Replaced previous component descriptor"
            );
        }
    }

    /// Bind request type `R` to implementation type `C`.
    ///
    /// Unconditional upsert: a later registration for the same `R` wins.
    /// Whether `C` is managed is only checked at resolution time. Prefer the
    /// [`bind!`](crate::bind) macro, which writes the upcast for you.
    ///
    /// # Panics
    ///
    /// Panics if the container is locked.
    #[inline]
    pub fn register<R, C>(&self, upcast: fn(Arc<C>) -> Arc<R>)
    where
        R: ?Sized + Send + Sync + 'static,
        C: Send + Sync + 'static,
    {
        self.register_binding(Binding::new(upcast));
    }

    /// Register a pre-built binding.
    ///
    /// # Panics
    ///
    /// Panics if the container is locked.
    pub fn register_binding(&self, binding: Binding) {
        self.check_not_locked();
        self.insert_binding(binding);
    }

    fn insert_binding(&self, binding: Binding) {
        #[cfg(feature = "logging")]
        {
            if binding.request().is_concrete() {
                warn!(
                    target: "field_injector",
                    request = binding.request().name(),
                    "Binding a concrete request type; it resolves to itself and the binding is never consulted"
                );
            }
            debug!(
                target: "field_injector",
                request = binding.request().name(),
                implementation = binding.implementation().name(),
                binding_count = self.registry.len() + 1,
                "Registering binding"
            );
        }

        let _previous = self.registry.register(binding);

        #[cfg(feature = "logging")]
        if let Some(previous) = _previous {
            debug!(
                target: "field_injector",
                previous = previous.name(),
                "Binding overwrote previous implementation"
            );
        }
    }

    /// Start a fluent batch registration.
    ///
    /// The lock check is done once, here.
    ///
    /// # Example
    ///
    /// ```rust
    /// use field_injector::{BoxError, Component, Container};
    ///
    /// struct Ledger;
    /// impl Component for Ledger {
    ///     fn construct() -> Result<Self, BoxError> {
    ///         Ok(Ledger)
    ///     }
    /// }
    ///
    /// let container = Container::new();
    /// container.register_batch().manage::<Ledger>().done();
    ///
    /// assert!(container.is_managed::<Ledger>());
    /// ```
    #[inline]
    pub fn register_batch(&self) -> BatchBuilder<'_> {
        self.check_not_locked();
        BatchBuilder {
            container: self,
            #[cfg(feature = "logging")]
            count: 0,
        }
    }

    // =========================================================================
    // Resolution Methods
    // =========================================================================

    /// Resolve a request type to its single, fully wired instance.
    ///
    /// `T` is either a concrete managed component or a trait object bound
    /// with [`register`](Self::register). Every call for the same concrete
    /// implementation returns the same `Arc`.
    ///
    /// On error nothing created by this call stays cached.
    pub fn resolve<T>(&self) -> Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let request = TypeKey::of::<T>();
        self.resolve_key(request)?
            .downcast::<Arc<T>>()
            .map(|typed| *typed)
            .map_err(|_| DiError::projection(request))
    }

    /// Alias for [`resolve`](Self::resolve).
    #[inline]
    pub fn get_bean<T>(&self) -> Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolve::<T>()
    }

    /// Resolve, returning `None` on any error.
    #[inline]
    pub fn try_resolve<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolve::<T>().ok()
    }

    fn resolve_key(&self, request: TypeKey) -> Result<Resolved> {
        if let Some(resolved) = self.resolver().resolve_committed(request) {
            #[cfg(feature = "logging")]
            trace!(
                target: "field_injector",
                request = request.name(),
                "Resolved from committed cache"
            );
            return Ok(resolved);
        }

        self.lock();
        let creation = self.creation.lock();

        #[cfg(feature = "logging")]
        trace!(
            target: "field_injector",
            request = request.name(),
            "Resolving (cache miss)"
        );

        let mut pending = Pending::enter(&self.cache, &creation);
        match self.resolver().resolve(request, None, &mut pending.session) {
            Ok(resolved) => {
                let _committed = pending.settle(true);

                #[cfg(feature = "logging")]
                debug!(
                    target: "field_injector",
                    request = request.name(),
                    constructed = pending.session.created().len(),
                    committed = _committed,
                    nested = !pending.outermost,
                    cached_count = self.cache.len(),
                    "Resolution completed"
                );

                Ok(resolved)
            }
            Err(err) => {
                let _discarded = pending.settle(false);

                #[cfg(feature = "logging")]
                debug!(
                    target: "field_injector",
                    request = request.name(),
                    discarded = _discarded,
                    nested = !pending.outermost,
                    error = %err,
                    "Resolution failed"
                );

                Err(err)
            }
        }
    }

    // =========================================================================
    // Query Methods
    // =========================================================================

    /// Check if a binding exists for request type `R`.
    #[inline]
    pub fn is_registered<R: ?Sized + 'static>(&self) -> bool {
        self.registry.contains(&TypeKey::of::<R>().id())
    }

    /// Check if `C` carries the managed-type marker.
    #[inline]
    pub fn is_managed<C: 'static>(&self) -> bool {
        self.catalog.contains(&TypeKey::of::<C>().id())
    }

    /// Check if request type `T` currently resolves to a wired instance
    /// without constructing anything.
    pub fn is_cached<T: ?Sized + 'static>(&self) -> bool {
        let request = TypeKey::of::<T>();
        let implementation = if request.is_concrete() {
            Some(request)
        } else {
            self.registry
                .lookup(&request.id())
                .map(|binding| binding.implementation())
        };
        implementation.is_some_and(|key| self.cache.is_committed(&key.id()))
    }

    /// Number of registered bindings.
    #[inline]
    pub fn binding_count(&self) -> usize {
        self.registry.len()
    }

    /// Number of managed component types.
    #[inline]
    pub fn managed_count(&self) -> usize {
        self.catalog.len()
    }

    /// Number of constructed instances.
    #[inline]
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    /// Request types that have a binding.
    pub fn registered_types(&self) -> Vec<TypeKey> {
        self.registry.request_types()
    }

    // =========================================================================
    // Lifecycle Methods
    // =========================================================================

    /// Lock the container to prevent further registrations.
    ///
    /// Called implicitly by the first resolution.
    #[inline]
    pub fn lock(&self) {
        let _was_locked = self.locked.swap(true, Ordering::AcqRel);

        #[cfg(feature = "logging")]
        if !_was_locked {
            debug!(
                target: "field_injector",
                binding_count = self.registry.len(),
                managed_count = self.catalog.len(),
                "Container locked - no further registrations allowed"
            );
        }
    }

    /// Check if the container is locked.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    /// Panic if locked (internal helper).
    #[inline]
    fn check_not_locked(&self) {
        if self.locked.load(Ordering::Acquire) {
            panic!("Cannot register components: container is locked");
        }
    }
}

/// State shared by every resolution running under the creation lock.
#[derive(Debug, Default)]
struct Creation {
    /// Resolutions currently on the stack (> 1 when a constructor re-enters)
    depth: usize,
    /// Types built by finished nested resolutions, owned by the outermost one
    adopted: Vec<TypeId>,
}

/// Instances created by an in-flight resolution.
///
/// Only the outermost resolution commits. A nested one (a constructor calling
/// back into the container) hands its instances to the outermost one, since
/// they may hold early references it still has to wire. Dropping it unsettled
/// discards them, also when a constructor panics.
struct Pending<'a> {
    cache: &'a InstanceCache,
    creation: &'a RefCell<Creation>,
    session: Session,
    outermost: bool,
    settled: bool,
}

impl<'a> Pending<'a> {
    fn enter(cache: &'a InstanceCache, creation: &'a RefCell<Creation>) -> Self {
        let mut state = creation.borrow_mut();
        state.depth += 1;
        Self {
            cache,
            creation,
            session: Session::default(),
            outermost: state.depth == 1,
            settled: false,
        }
    }

    /// Commit or discard; returns how many cache entries were affected
    fn settle(&mut self, succeeded: bool) -> usize {
        self.settled = true;
        let mut state = self.creation.borrow_mut();
        state.depth -= 1;

        if !succeeded {
            self.cache.discard(self.session.created());
            let mut count = self.session.created().len();
            if self.outermost {
                let adopted = std::mem::take(&mut state.adopted);
                self.cache.discard(&adopted);
                count += adopted.len();
            }
            return count;
        }

        if self.outermost {
            let mut created = std::mem::take(&mut state.adopted);
            created.extend_from_slice(self.session.created());
            self.cache.commit(&created);
            created.len()
        } else {
            state.adopted.extend_from_slice(self.session.created());
            0
        }
    }
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.settle(false);
        }
    }
}

/// Fluent batch registration builder.
pub struct BatchBuilder<'a> {
    container: &'a Container,
    #[cfg(feature = "logging")]
    count: usize,
}

impl<'a> BatchBuilder<'a> {
    fn counted(self) -> Self {
        Self {
            container: self.container,
            #[cfg(feature = "logging")]
            count: self.count + 1,
        }
    }

    /// Manage a component and continue the chain
    #[inline]
    pub fn manage<C: Component>(self) -> Self {
        self.container.insert_descriptor(Descriptor::<C>::of());
        self.counted()
    }

    /// Manage a component from a descriptor and continue the chain
    #[inline]
    pub fn manage_with<C: Send + Sync + 'static>(self, descriptor: Descriptor<C>) -> Self {
        self.container.insert_descriptor(descriptor);
        self.counted()
    }

    /// Register a binding and continue the chain
    #[inline]
    pub fn register<R, C>(self, upcast: fn(Arc<C>) -> Arc<R>) -> Self
    where
        R: ?Sized + Send + Sync + 'static,
        C: Send + Sync + 'static,
    {
        self.container.insert_binding(Binding::new(upcast));
        self.counted()
    }

    /// Finish the batch registration
    #[inline]
    pub fn done(self) {
        #[cfg(feature = "logging")]
        debug!(
            target: "field_injector",
            registrations = self.count,
            "Batch registration completed"
        );
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("binding_count", &self.binding_count())
            .field("managed_count", &self.managed_count())
            .field("cached_count", &self.cached_count())
            .field("locked", &self.is_locked())
            .finish()
    }
}
