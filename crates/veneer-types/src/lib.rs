//! Veneer capability descriptors
//!
//! This crate provides the runtime type model projections bind against:
//! - **Values**: dynamic values and runtime objects (`value`, `object` modules)
//! - **Types**: descriptors, members and the builder that assembles them
//!   (`ty`, `member`, `builder` modules)
//! - **Builtins**: descriptors for primitive values (`builtins` module)
//! - **Registry**: name and id lookup of types (`registry` module)
//! - **Snapshots**: serializable copies of value graphs (`snapshot` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use veneer_types::{TypeBuilder, TypeRegistry, Value, Object};
//!
//! let point = TypeBuilder::class("geo.Point")
//!     .field("x")
//!     .field("y")
//!     .field_constructor(["x", "y"])
//!     .build()?;
//! TypeRegistry::global().register(&point)?;
//!
//! let p = Object::alloc(&point);
//! p.as_object().unwrap().set("x", 3);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// ============================================================================
// Modules
// ============================================================================

/// Builder for class and interface descriptors
pub mod builder;

/// Builtin primitive descriptors
pub mod builtins;

/// Error types
pub mod error;

/// Member definitions
pub mod member;

/// Runtime objects
pub mod object;

/// Type registry
pub mod registry;

/// Value snapshots for serialization
pub mod snapshot;

/// Type descriptors
pub mod ty;

/// Dynamic values
pub mod value;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::TypeBuilder;
pub use builtins::{builtins, type_of, Builtins};
pub use error::{InvokeError, InvokeResult, TypeError};
pub use member::{
    ConstructorDef, FieldDef, IndexerDef, MemberDef, MemberKind, MethodDef, ParameterDefinition,
    PropertyAccess, PropertyDef, Receiver, INDEXER_NAME, NO_PARAMS,
};
pub use object::{Object, ObjectRef};
pub use registry::TypeRegistry;
pub use snapshot::{FieldSnapshot, ValueSnapshot};
pub use ty::{ancestry, Ancestry, TypeDescriptor, TypeHandle, TypeId, TypeKind};
pub use value::{ListRef, Value};
