//! Projection errors

use thiserror::Error;
use veneer_types::{InvokeError, TypeError};

use crate::args::InvocationKind;

/// Result type for projection operations
pub type ProjectionResult<T> = Result<T, ProjectionError>;

/// Errors raised by the interception engine
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProjectionError {
    /// No member of the owner type fits the requested name, kind and arguments
    #[error("{type_name} has no member '{member}' for {kind}")]
    MemberNotFound {
        /// Type the member was resolved against
        type_name: String,
        /// Requested member
        member: String,
        /// Requested invocation kind
        kind: InvocationKind,
    },

    /// A late-bound type name did not resolve
    #[error("Type '{name}' is not available")]
    TargetUnavailable {
        /// Unresolved type name
        name: String,
    },

    /// The lazy target's factory failed
    #[error("Deferred computation failed: {message}")]
    DeferredComputationFailure {
        /// Fault raised by the factory
        message: String,
    },

    /// Proxy synthesis was asked for an empty, duplicated, non-interface or
    /// unresolvable interface set
    #[error("Invalid interface set: {reason}")]
    InvalidInterfaceSet {
        /// Why the set was rejected
        reason: String,
    },

    /// The member is not declared by any interface of the projection
    #[error("{proxy} does not declare member '{member}'")]
    UndeclaredMember {
        /// Proxy type name
        proxy: String,
        /// Requested member
        member: String,
    },

    /// The member is declared, but not in a shape that fits the request
    #[error("Signature mismatch on '{member}': {reason}")]
    SignatureMismatch {
        /// Member name
        member: String,
        /// What did not fit
        reason: String,
    },

    /// An explicit context type is not an ancestor of the target's type
    #[error("{context} is not a valid context for a {target}")]
    IncompatibleContext {
        /// Requested context type
        context: String,
        /// Target's runtime type
        target: String,
    },

    /// A member body faulted
    #[error(transparent)]
    Invoke(#[from] InvokeError),

    /// A type could not be resolved or restored
    #[error(transparent)]
    Type(#[from] TypeError),

    /// A payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ProjectionError {
    /// Whether this error means "member absent" rather than a fault
    pub fn is_member_not_found(&self) -> bool {
        matches!(self, ProjectionError::MemberNotFound { .. })
    }
}

impl From<serde_json::Error> for ProjectionError {
    fn from(err: serde_json::Error) -> Self {
        ProjectionError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for ProjectionError {
    fn from(err: toml::de::Error) -> Self {
        ProjectionError::Config(err.to_string())
    }
}
