//! Permissive boundaries around the engine
//!
//! [`DynamicObject`] is the common surface of anything whose members are only
//! known at runtime. [`PropertyDescriptor`] presents one such member as a
//! fixed property for consumers that enumerate property lists, and
//! [`Wildcard`] accepts any member access at all. Both swallow absence where
//! the core interceptor would report it.

mod descriptor;
mod wildcard;

pub use descriptor::{describe, PropertyDescriptor};
pub use wildcard::Wildcard;

use veneer_types::Value;

use crate::error::ProjectionResult;
use crate::interceptor::Interceptor;
use crate::proxy::Projection;

/// Object with runtime-discovered members
pub trait DynamicObject {
    /// Names of the members currently exposed
    fn dynamic_member_names(&self) -> Vec<String>;

    /// Read a member
    fn get_member(&self, name: &str) -> ProjectionResult<Value>;

    /// Write a member
    fn set_member(&self, name: &str, value: Value) -> ProjectionResult<()>;
}

impl DynamicObject for Interceptor {
    fn dynamic_member_names(&self) -> Vec<String> {
        self.member_names()
    }

    fn get_member(&self, name: &str) -> ProjectionResult<Value> {
        self.get(name)
    }

    fn set_member(&self, name: &str, value: Value) -> ProjectionResult<()> {
        self.set(name, value)
    }
}

impl DynamicObject for Projection {
    fn dynamic_member_names(&self) -> Vec<String> {
        self.proxy_type()
            .members()
            .filter(|m| m.is_readable_property() || m.is_writable_property())
            .map(|m| m.name().to_string())
            .collect()
    }

    fn get_member(&self, name: &str) -> ProjectionResult<Value> {
        self.get(name)
    }

    fn set_member(&self, name: &str, value: Value) -> ProjectionResult<()> {
        self.set(name, value)
    }
}
