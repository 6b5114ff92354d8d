//! Runtime type tokens
//!
//! Every request and implementation type is addressed by a [`TypeKey`]. Sized
//! types are concrete and can be constructed directly; unsized types (trait
//! objects) are abstract and must be bound to an implementation first.

use std::any::TypeId;
use std::hash::{Hash, Hasher};

/// Identity of a request or implementation type.
///
/// Equality and hashing only look at the `TypeId`.
#[derive(Debug, Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
    concrete: bool,
}

impl TypeKey {
    /// Token for `T`
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            concrete: is_concrete::<T>(),
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// True when the type can be its own implementation
    #[inline]
    pub fn is_concrete(&self) -> bool {
        self.concrete
    }

    /// True when resolution has to go through a binding
    #[inline]
    pub fn is_abstract(&self) -> bool {
        !self.concrete
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Display for TypeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

/// References to sized types are thin pointers; trait objects and slices
/// carry metadata and are twice as wide.
#[inline]
const fn is_concrete<T: ?Sized>() -> bool {
    std::mem::size_of::<&T>() == std::mem::size_of::<&()>()
}
