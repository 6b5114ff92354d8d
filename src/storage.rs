//! Concurrent storage for the container
//!
//! Uses DashMap keyed by `TypeId` (hashed with ahash) for the component
//! catalog and the instance cache. Neither map is ever borrowed across a
//! recursive resolution: lookups clone the `Arc` out and drop the shard guard
//! immediately.

use crate::factory::{ComponentDescriptor, ErasedInstance, Projection};
use ahash::RandomState;
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::Arc;

/// Build a map with a shard count suited to the expected size.
///
/// Default DashMap uses num_cpus * 4 shards which is overkill for
/// typical containers with <50 components.
pub(crate) fn type_map<V>(capacity: usize) -> DashMap<TypeId, V, RandomState> {
    let shard_amount = if capacity <= 16 {
        8
    } else if capacity <= 64 {
        16
    } else {
        32
    };
    DashMap::with_capacity_and_hasher_and_shard_amount(capacity, RandomState::new(), shard_amount)
}

// =============================================================================
// Component Catalog
// =============================================================================

/// Descriptors of every managed type, keyed by concrete `TypeId`.
///
/// Presence in the catalog is the managed-type marker.
pub(crate) struct ComponentCatalog {
    descriptors: DashMap<TypeId, Arc<ComponentDescriptor>, RandomState>,
}

impl ComponentCatalog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            descriptors: type_map(capacity),
        }
    }

    /// Insert or replace a descriptor; returns true if one was replaced
    #[inline]
    pub fn insert(&self, descriptor: ComponentDescriptor) -> bool {
        self.descriptors
            .insert(descriptor.key().id(), Arc::new(descriptor))
            .is_some()
    }

    #[inline]
    pub fn get(&self, type_id: &TypeId) -> Option<Arc<ComponentDescriptor>> {
        self.descriptors.get(type_id).map(|d| Arc::clone(d.value()))
    }

    #[inline]
    pub fn contains(&self, type_id: &TypeId) -> bool {
        self.descriptors.contains_key(type_id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }
}

// =============================================================================
// Instance Cache
// =============================================================================

/// A cached instance and how to hand it out as its own type
#[derive(Clone)]
pub(crate) struct CachedInstance {
    pub instance: ErasedInstance,
    pub project: Projection,
}

struct Slot {
    cached: CachedInstance,
    /// False while the resolution that created it is still running
    committed: bool,
}

/// One instance per concrete type.
///
/// Entries are inserted as early references, before their fields are
/// injected, and committed once the outermost resolution that created them
/// succeeds. Committed entries are never replaced or removed.
pub(crate) struct InstanceCache {
    slots: DashMap<TypeId, Slot, RandomState>,
}

impl InstanceCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: type_map(capacity),
        }
    }

    /// Any entry, including early references still being wired
    #[inline]
    pub fn get(&self, type_id: &TypeId) -> Option<CachedInstance> {
        self.slots.get(type_id).map(|slot| slot.cached.clone())
    }

    /// Only fully wired entries
    #[inline]
    pub fn get_committed(&self, type_id: &TypeId) -> Option<CachedInstance> {
        self.slots
            .get(type_id)
            .filter(|slot| slot.committed)
            .map(|slot| slot.cached.clone())
    }

    /// Publish a freshly constructed instance before its injection points
    /// are filled. Returns false (and keeps the existing entry) if the type
    /// is already cached.
    pub fn insert_early(&self, type_id: TypeId, cached: CachedInstance) -> bool {
        use dashmap::mapref::entry::Entry;

        match self.slots.entry(type_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(Slot {
                    cached,
                    committed: false,
                });
                true
            }
        }
    }

    /// Mark entries as fully wired
    pub fn commit(&self, type_ids: &[TypeId]) {
        for type_id in type_ids {
            if let Some(mut slot) = self.slots.get_mut(type_id) {
                slot.committed = true;
            }
        }
    }

    /// Drop uncommitted entries of a failed resolution
    pub fn discard(&self, type_ids: &[TypeId]) {
        for type_id in type_ids {
            self.slots.remove_if(type_id, |_, slot| !slot.committed);
        }
    }

    #[inline]
    pub fn is_committed(&self, type_id: &TypeId) -> bool {
        self.slots.get(type_id).is_some_and(|slot| slot.committed)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }
}

impl std::fmt::Debug for InstanceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceCache")
            .field("count", &self.len())
            .finish()
    }
}
