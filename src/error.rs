//! Error types for dependency injection

use crate::TypeKey;
use std::fmt;
use thiserror::Error;

/// Boxed error returned by fallible component constructors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// One hop of a resolution: the request type, the concrete type it
/// resolved to, and the field of the previous hop it was reached through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathStep {
    /// Field of the owning component this request was made for
    pub field: Option<&'static str>,
    /// Requested type name
    pub request: &'static str,
    /// Concrete type name, once known
    pub implementation: Option<&'static str>,
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(field) = self.field {
            write!(f, "{field}: ")?;
        }
        f.write_str(self.request)?;
        match self.implementation {
            Some(implementation) if implementation != self.request => {
                write!(f, " => {implementation}")
            }
            _ => Ok(()),
        }
    }
}

/// The chain of types traversed from the outermost request to the failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionPath(Vec<PathStep>);

impl ResolutionPath {
    pub(crate) fn new(steps: Vec<PathStep>) -> Self {
        Self(steps)
    }

    /// Steps from outermost to innermost
    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    /// Number of hops
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for errors raised outside of any resolution
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fields traversed, in order
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().filter_map(|step| step.field)
    }
}

impl fmt::Display for ResolutionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, step) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

/// Why a zero-argument construction failed
#[derive(Error, Debug)]
pub enum ConstructError {
    /// The descriptor carries no constructor
    #[error("no zero-argument constructor declared")]
    MissingConstructor,

    /// The constructor returned an error
    #[error("constructor failed: {0}")]
    Failed(#[source] BoxError),
}

/// Why a resolved dependency could not be written into its field
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    /// The instance handed to the setter is not of the owning type
    #[error("instance is not a {0}")]
    OwnerMismatch(&'static str),

    /// The resolved value is not an `Arc` of the declared type
    #[error("resolved value is not an Arc<{0}>")]
    ValueMismatch(&'static str),

    /// The field was already populated
    #[error("field is already wired")]
    AlreadyAssigned,
}

/// Errors that can occur during dependency injection operations
#[derive(Error, Debug)]
pub enum DiError {
    /// An abstract request type has no registered binding
    #[error("No binding registered for abstract type {type_name} (path: {path})")]
    UnboundRequest {
        type_name: &'static str,
        path: ResolutionPath,
    },

    /// The concrete type was never declared as a managed component
    #[error("Type {type_name} is not a managed component (path: {path})")]
    UnmanagedType {
        type_name: &'static str,
        path: ResolutionPath,
    },

    /// Zero-argument construction failed
    #[error("Failed to instantiate {type_name}: {source} (path: {path})")]
    Instantiation {
        type_name: &'static str,
        #[source]
        source: ConstructError,
        path: ResolutionPath,
    },

    /// A resolved dependency could not be assigned to its field
    #[error("Cannot inject field `{field}` of {owner}: {reason} (path: {path})")]
    FieldInjection {
        owner: &'static str,
        field: &'static str,
        #[source]
        reason: FieldError,
        path: ResolutionPath,
    },

    /// Internal error
    #[error("Internal DI error: {0}")]
    Internal(String),
}

/// Discriminant of [`DiError`], handy for matching in callers and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnboundRequest,
    UnmanagedType,
    Instantiation,
    FieldInjection,
    Internal,
}

impl DiError {
    #[inline]
    pub(crate) fn unbound(request: TypeKey, path: ResolutionPath) -> Self {
        Self::UnboundRequest {
            type_name: request.name(),
            path,
        }
    }

    #[inline]
    pub(crate) fn unmanaged(implementation: TypeKey, path: ResolutionPath) -> Self {
        Self::UnmanagedType {
            type_name: implementation.name(),
            path,
        }
    }

    #[inline]
    pub(crate) fn instantiation(
        implementation: TypeKey,
        source: ConstructError,
        path: ResolutionPath,
    ) -> Self {
        Self::Instantiation {
            type_name: implementation.name(),
            source,
            path,
        }
    }

    #[inline]
    pub(crate) fn field_injection(
        owner: TypeKey,
        field: &'static str,
        reason: FieldError,
        path: ResolutionPath,
    ) -> Self {
        Self::FieldInjection {
            owner: owner.name(),
            field,
            reason,
            path,
        }
    }

    #[inline]
    pub(crate) fn projection(request: TypeKey) -> Self {
        Self::Internal(format!(
            "cached instance could not be projected to {}",
            request.name()
        ))
    }

    /// The kind of failure
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnboundRequest { .. } => ErrorKind::UnboundRequest,
            Self::UnmanagedType { .. } => ErrorKind::UnmanagedType,
            Self::Instantiation { .. } => ErrorKind::Instantiation,
            Self::FieldInjection { .. } => ErrorKind::FieldInjection,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Resolution path at the point of failure, if any
    pub fn path(&self) -> Option<&ResolutionPath> {
        match self {
            Self::UnboundRequest { path, .. }
            | Self::UnmanagedType { path, .. }
            | Self::Instantiation { path, .. }
            | Self::FieldInjection { path, .. } => Some(path),
            Self::Internal(_) => None,
        }
    }
}

/// Result type alias for DI operations
pub type Result<T> = std::result::Result<T, DiError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn step(
        field: Option<&'static str>,
        request: &'static str,
        implementation: Option<&'static str>,
    ) -> PathStep {
        PathStep {
            field,
            request,
            implementation,
        }
    }

    #[test]
    fn test_path_display() {
        let path = ResolutionPath::new(vec![
            step(None, "dyn FrontDesk", Some("Reception")),
            step(Some("guests"), "GuestBook", Some("GuestBook")),
            step(Some("rooms"), "dyn RoomStore", None),
        ]);

        assert_eq!(
            path.to_string(),
            "dyn FrontDesk => Reception -> guests: GuestBook -> rooms: dyn RoomStore"
        );
        assert_eq!(path.fields().collect::<Vec<_>>(), vec!["guests", "rooms"]);
    }

    #[test]
    fn test_empty_path_display() {
        assert_eq!(ResolutionPath::default().to_string(), "<root>");
    }

    #[test]
    fn test_kind_and_path() {
        let err = DiError::UnboundRequest {
            type_name: "dyn RoomStore",
            path: ResolutionPath::new(vec![step(None, "dyn RoomStore", None)]),
        };
        assert_eq!(err.kind(), ErrorKind::UnboundRequest);
        assert_eq!(err.path().map(ResolutionPath::len), Some(1));

        let err = DiError::Internal("boom".into());
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.path().is_none());
    }

    #[test]
    fn test_instantiation_source_chain() {
        use std::error::Error as _;

        let err = DiError::Instantiation {
            type_name: "Ledger",
            source: ConstructError::Failed("disk full".into()),
            path: ResolutionPath::default(),
        };

        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "constructor failed: disk full");
        assert_eq!(source.source().unwrap().to_string(), "disk full");
    }
}
