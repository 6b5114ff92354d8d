//! Resolution and field injection
//!
//! Turns a request type into a wired instance:
//!
//! 1. concrete requests are their own implementation, abstract ones go
//!    through the binding registry;
//! 2. a cached implementation (wired or still being wired) is returned as is;
//! 3. otherwise the implementation must be managed;
//! 4. it is constructed through its zero-argument constructor;
//! 5. the new instance is cached *before* injection (early reference);
//! 6. every injection point is resolved recursively and assigned;
//! 7. the instance is handed out as the request type.
//!
//! Step 5 is what lets `A -> B -> A` terminate: the inner request for `A`
//! finds the early reference and stops there.

use crate::factory::Resolved;
use crate::registry::{Binding, BindingRegistry};
use crate::storage::{CachedInstance, ComponentCatalog, InstanceCache};
use crate::{DiError, PathStep, ResolutionPath, Result, TypeKey};
use std::any::TypeId;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Bookkeeping for one resolution under the creation lock.
#[derive(Debug, Default)]
pub(crate) struct Session {
    path: Vec<PathStep>,
    created: Vec<TypeId>,
}

impl Session {
    fn enter(&mut self, field: Option<&'static str>, request: TypeKey) {
        self.path.push(PathStep {
            field,
            request: request.name(),
            implementation: None,
        });
    }

    fn resolved_to(&mut self, implementation: TypeKey) {
        if let Some(step) = self.path.last_mut() {
            step.implementation = Some(implementation.name());
        }
    }

    fn leave(&mut self) {
        self.path.pop();
    }

    fn snapshot(&self) -> ResolutionPath {
        ResolutionPath::new(self.path.clone())
    }

    /// Concrete types constructed during this resolution, in order
    pub fn created(&self) -> &[TypeId] {
        &self.created
    }

    /// Current depth of the resolution chain
    pub fn depth(&self) -> usize {
        self.path.len()
    }
}

/// Borrowed view over the container state that runs the algorithm.
pub(crate) struct Resolver<'a> {
    registry: &'a BindingRegistry,
    catalog: &'a ComponentCatalog,
    cache: &'a InstanceCache,
}

impl<'a> Resolver<'a> {
    pub fn new(
        registry: &'a BindingRegistry,
        catalog: &'a ComponentCatalog,
        cache: &'a InstanceCache,
    ) -> Self {
        Self {
            registry,
            catalog,
            cache,
        }
    }

    /// Implementation type for a request, with the binding used (if any)
    fn target(&self, request: TypeKey) -> Option<(TypeKey, Option<Binding>)> {
        if request.is_concrete() {
            return Some((request, None));
        }
        self.registry
            .lookup(&request.id())
            .map(|binding| (binding.implementation(), Some(binding)))
    }

    fn project(
        &self,
        request: TypeKey,
        binding: Option<&Binding>,
        cached: CachedInstance,
    ) -> Result<Resolved> {
        let resolved = match binding {
            Some(binding) => binding.project(cached.instance),
            None => (cached.project)(cached.instance),
        };
        resolved.ok_or_else(|| DiError::projection(request))
    }

    /// Lock-free path: only succeeds for fully wired instances.
    pub fn resolve_committed(&self, request: TypeKey) -> Option<Resolved> {
        let (implementation, binding) = self.target(request)?;
        let cached = self.cache.get_committed(&implementation.id())?;
        self.project(request, binding.as_ref(), cached).ok()
    }

    /// Resolve `request`, reached through `field` of the previous hop.
    ///
    /// The caller must hold the container's creation lock.
    pub fn resolve(
        &self,
        request: TypeKey,
        field: Option<&'static str>,
        session: &mut Session,
    ) -> Result<Resolved> {
        session.enter(field, request);
        let resolved = self.resolve_step(request, session)?;
        session.leave();
        Ok(resolved)
    }

    fn resolve_step(&self, request: TypeKey, session: &mut Session) -> Result<Resolved> {
        let Some((implementation, binding)) = self.target(request) else {
            #[cfg(feature = "logging")]
            debug!(
                target: "field_injector",
                request = request.name(),
                depth = session.depth(),
                "No binding registered for abstract request type"
            );
            return Err(DiError::unbound(request, session.snapshot()));
        };
        session.resolved_to(implementation);

        if let Some(cached) = self.cache.get(&implementation.id()) {
            #[cfg(feature = "logging")]
            trace!(
                target: "field_injector",
                request = request.name(),
                implementation = implementation.name(),
                early = !self.cache.is_committed(&implementation.id()),
                "Instance resolved from cache"
            );
            return self.project(request, binding.as_ref(), cached);
        }

        let Some(descriptor) = self.catalog.get(&implementation.id()) else {
            #[cfg(feature = "logging")]
            debug!(
                target: "field_injector",
                request = request.name(),
                implementation = implementation.name(),
                "Implementation type is not managed"
            );
            return Err(DiError::unmanaged(implementation, session.snapshot()));
        };

        let instance = descriptor.instantiate().map_err(|source| {
            #[cfg(feature = "logging")]
            debug!(
                target: "field_injector",
                service = implementation.name(),
                error = %source,
                "Instantiation failed"
            );
            DiError::instantiation(implementation, source, session.snapshot())
        })?;

        let cached = CachedInstance {
            instance: Arc::clone(&instance),
            project: descriptor.projection(),
        };

        // Early reference: publish before injecting so cycles find it.
        if !self.cache.insert_early(implementation.id(), cached.clone()) {
            // A constructor re-entered the container and built the same type.
            #[cfg(feature = "logging")]
            debug!(
                target: "field_injector",
                service = implementation.name(),
                "Type was cached while constructing, discarding new instance"
            );
            let existing = self
                .cache
                .get(&implementation.id())
                .ok_or_else(|| DiError::projection(request))?;
            return self.project(request, binding.as_ref(), existing);
        }
        session.created.push(implementation.id());

        #[cfg(feature = "logging")]
        debug!(
            target: "field_injector",
            service = implementation.name(),
            injection_points = descriptor.injection_points().len(),
            depth = session.depth(),
            "Constructed instance, published as early reference"
        );

        for point in descriptor.injection_points() {
            let value = self.resolve(point.declared(), Some(point.field()), session)?;

            point.assign(&*instance, value).map_err(|reason| {
                DiError::field_injection(point.owner(), point.field(), reason, session.snapshot())
            })?;

            #[cfg(feature = "logging")]
            trace!(
                target: "field_injector",
                service = implementation.name(),
                field = point.field(),
                dependency = point.declared().name(),
                "Injected field"
            );
        }

        self.project(request, binding.as_ref(), cached)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BoxError, Component, Descriptor, ErrorKind, Inject, InjectionPoints};

    #[derive(Default)]
    struct Manager {
        desk: Inject<Desk>,
    }

    #[derive(Default)]
    struct Desk {
        manager: Inject<Manager>,
    }

    impl Component for Manager {
        fn construct() -> std::result::Result<Self, BoxError> {
            Ok(Self::default())
        }

        fn injection_points(points: &mut InjectionPoints<Self>) {
            points.field("desk", |m| &m.desk);
        }
    }

    impl Component for Desk {
        fn construct() -> std::result::Result<Self, BoxError> {
            Ok(Self::default())
        }

        fn injection_points(points: &mut InjectionPoints<Self>) {
            points.field("manager", |d| &d.manager);
        }
    }

    struct Fixture {
        registry: BindingRegistry,
        catalog: ComponentCatalog,
        cache: InstanceCache,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                registry: BindingRegistry::with_capacity(0),
                catalog: ComponentCatalog::with_capacity(0),
                cache: InstanceCache::with_capacity(0),
            }
        }

        fn resolver(&self) -> Resolver<'_> {
            Resolver::new(&self.registry, &self.catalog, &self.cache)
        }
    }

    #[test]
    fn test_early_reference_is_cached_before_injection() {
        let fixture = Fixture::new();
        fixture.catalog.insert(Descriptor::<Manager>::of().erase());
        fixture.catalog.insert(Descriptor::<Desk>::of().erase());

        let mut session = Session::default();
        let resolved = fixture
            .resolver()
            .resolve(TypeKey::of::<Manager>(), None, &mut session)
            .unwrap();
        let manager = *resolved.downcast::<Arc<Manager>>().unwrap();

        // Manager was published first, then Desk while Manager was still empty
        assert_eq!(
            session.created(),
            &[TypeId::of::<Manager>(), TypeId::of::<Desk>()]
        );
        assert_eq!(session.depth(), 0);

        let desk = manager.desk.get().unwrap();
        assert!(Arc::ptr_eq(desk.manager.get().unwrap(), &manager));

        // Nothing is committed until the container says so
        assert!(fixture.resolver().resolve_committed(TypeKey::of::<Manager>()).is_none());
        fixture.cache.commit(session.created());
        assert!(fixture.resolver().resolve_committed(TypeKey::of::<Manager>()).is_some());
    }

    #[test]
    fn test_failure_path_records_fields() {
        let fixture = Fixture::new();
        fixture.catalog.insert(Descriptor::<Manager>::of().erase());
        // Desk is not managed

        let mut session = Session::default();
        let err = match fixture
            .resolver()
            .resolve(TypeKey::of::<Manager>(), None, &mut session)
        {
            Err(err) => err,
            Ok(_) => panic!("Desk is not managed"),
        };

        assert_eq!(err.kind(), ErrorKind::UnmanagedType);
        let path = err.path().unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path.fields().collect::<Vec<_>>(), vec!["desk"]);
        assert_eq!(session.created(), &[TypeId::of::<Manager>()]);
    }

    #[test]
    fn test_unbound_abstract_request() {
        trait Concierge: Send + Sync {}

        let fixture = Fixture::new();
        let mut session = Session::default();
        let result =
            fixture
                .resolver()
                .resolve(TypeKey::of::<dyn Concierge>(), None, &mut session);

        match result {
            Err(err) => assert_eq!(err.kind(), ErrorKind::UnboundRequest),
            Ok(_) => panic!("expected unbound request"),
        }
        assert!(session.created().is_empty());
        assert_eq!(fixture.cache.len(), 0);
    }
}
