//! Type system and member invocation errors

use thiserror::Error;

/// Result type for member bodies (getters, setters, methods, constructors)
pub type InvokeResult<T> = Result<T, InvokeError>;

/// Errors raised while defining, registering or restoring types
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TypeError {
    /// Type name could not be resolved in a registry
    #[error("Undefined type: {name}")]
    UndefinedType {
        /// Type name that was not found
        name: String,
    },

    /// A different type is already registered under this name
    #[error("Duplicate type: {name}")]
    DuplicateType {
        /// Conflicting type name
        name: String,
    },

    /// A type definition is internally inconsistent
    #[error("Invalid definition of {type_name}: {reason}")]
    InvalidDefinition {
        /// Type being built
        type_name: String,
        /// Why the definition was rejected
        reason: String,
    },

    /// A value snapshot could not be restored
    #[error("Snapshot error: {reason}")]
    Snapshot {
        /// Reason for the failure
        reason: String,
    },
}

/// Faults raised by the wrapped target's own member bodies
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InvokeError {
    /// Wrong number of arguments reached a member body
    #[error("Argument count mismatch: expected {expected}, got {actual}")]
    ArgumentCount {
        /// Expected count
        expected: usize,
        /// Actual count
        actual: usize,
    },

    /// A value had the wrong runtime type
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Actual type name
        got: String,
    },

    /// An index argument was out of range
    #[error("Index {index} out of bounds for length {len}")]
    IndexOutOfBounds {
        /// Requested index
        index: i64,
        /// Length of the indexed value
        len: usize,
    },

    /// Arbitrary fault raised by a member body
    #[error("{0}")]
    Fault(String),
}

impl From<String> for InvokeError {
    fn from(s: String) -> Self {
        InvokeError::Fault(s)
    }
}

impl From<&str> for InvokeError {
    fn from(s: &str) -> Self {
        InvokeError::Fault(s.to_string())
    }
}
