//! Veneer projection engine
//!
//! Presents arbitrary objects as interfaces they were never written against.
//! Member access on a projection goes through a two-stage pipeline:
//! - **Capability check**: the synthesized proxy type declares exactly the
//!   members of the requested interfaces (`proxy` module)
//! - **Binding**: a cached name/kind/argument-shape lookup against the
//!   target's context type (`binder`, `cache`, `interceptor` modules)
//!
//! Targets come in four variants (`target` module): an eager value, a lazy
//! value computed once, a type resolved by name, and the static side of a
//! type. Projections survive serialization through `payload`, and `reflect`
//! holds the permissive boundaries that swallow absence.
//!
//! # Example
//!
//! ```rust,ignore
//! use veneer_engine::Projector;
//! use veneer_types::{Object, PropertyAccess, TypeBuilder, Value};
//!
//! let named = TypeBuilder::interface("acme.INamed")
//!     .property_sig("Name", PropertyAccess::ReadOnly)
//!     .build()?;
//! let user = TypeBuilder::class("acme.User").field("Name").build()?;
//!
//! let obj = Object::alloc(&user);
//! obj.as_object().unwrap().set("Name", "ada");
//!
//! let projection = Projector::default().create_projection(obj, &[named])?;
//! assert_eq!(projection.get("Name")?, Value::from("ada"));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// ============================================================================
// Modules
// ============================================================================

/// Invocation kinds and call-site arguments
pub mod args;

/// Invocation binder
pub mod binder;

/// Invocation cache
pub mod cache;

/// Configuration and shared state
pub mod config;

/// Error types
pub mod error;

/// Interception core
pub mod interceptor;

/// Round-trip payloads
pub mod payload;

/// Projection request API
pub mod projector;

/// Proxy type synthesis
pub mod proxy;

/// Descriptor and wildcard boundaries
pub mod reflect;

/// Target resolution variants
pub mod target;

// ============================================================================
// Re-exports
// ============================================================================

pub use args::{ArgShape, Argument, InvocationKind, CONSTRUCTOR_NAME};
pub use binder::{resolve, ArgSlot, Binding, BoundMember, MatchQuality};
pub use cache::{CacheKey, CacheStats, InvocationCache};
pub use config::{ProjectionConfig, ProjectionOptions};
pub use error::{ProjectionError, ProjectionResult};
pub use interceptor::{CallTarget, ContextSpec, Interceptor, InvocationContext};
pub use payload::{reconstitute, ProjectionPayload, TargetSnapshot, TypeRef, FORMAT_VERSION};
pub use projector::Projector;
pub use proxy::{
    initialize_proxy, InterfaceSet, Projection, ProxyMember, ProxySynthesizer, ProxyType,
    ProxyTypeKey, ShadowedMember,
};
pub use reflect::{describe, DynamicObject, PropertyDescriptor, Wildcard};
pub use target::{Constructor, Deferred, EagerTarget, LateBoundTarget, LazyTarget, StaticTarget};
