//! Error types for state documents.

use thiserror::Error;

use crate::value::ValueType;

/// Result type alias for state document operations.
pub type Result<T> = std::result::Result<T, StateError>;

/// Errors returned by [`State`](crate::State) operations.
///
/// Nothing is retried or defaulted internally; every error goes straight back
/// to the caller.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("could not parse state JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("state JSON must be an object at the top level, but got a {found:?}")]
    NotAnObject { found: ValueType },

    #[error("path `{path}` not found: no key `{key}`")]
    NotFound { path: String, key: String },

    #[error("path `{path}` not found: `{key}` is a {found:?}, not an object")]
    NotTraversable {
        path: String,
        key: String,
        found: ValueType,
    },

    #[error("expected a {expected} at `{path}`, but got a {found:?}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: ValueType,
    },

    #[error("could not apply patch: {0}")]
    Patch(#[from] json_patch::PatchError),

    #[error("patch must leave an object at the top level, but left a {found:?}")]
    PatchResult { found: ValueType },
}

impl StateError {
    /// Whether this is a failed path lookup, as opposed to a parse or type error.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StateError::NotFound { .. } | StateError::NotTraversable { .. }
        )
    }

    /// Whether the error was raised while constructing a document from JSON text.
    pub fn is_parse(&self) -> bool {
        matches!(self, StateError::Parse(_) | StateError::NotAnObject { .. })
    }

    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, StateError::TypeMismatch { .. })
    }
}
