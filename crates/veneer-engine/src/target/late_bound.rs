use veneer_types::{TypeHandle, TypeRegistry};

use crate::error::ProjectionResult;
use crate::interceptor::{CallTarget, InvocationContext};
use crate::payload::TargetSnapshot;

/// Type-level target named by a string, resolved once at construction
///
/// An unresolved name is not an error: [`CallTarget::is_available`] reports
/// it, and member access through it misses like any absent member.
#[derive(Debug, Clone)]
pub struct LateBoundTarget {
    type_name: String,
    ty: Option<TypeHandle>,
}

impl LateBoundTarget {
    /// Resolve `type_name` in `registry`
    pub fn resolve(type_name: impl Into<String>, registry: &TypeRegistry) -> Self {
        let type_name = type_name.into();
        let ty = registry.resolve(&type_name);
        if ty.is_none() {
            log::debug!("late-bound type '{}' is not available", type_name);
        }
        Self { type_name, ty }
    }

    /// Bind to an already known type
    pub fn for_type(ty: &TypeHandle) -> Self {
        Self {
            type_name: ty.name().to_string(),
            ty: Some(ty.clone()),
        }
    }

    /// Requested type name
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Resolved type, if present
    pub fn resolved(&self) -> Option<&TypeHandle> {
        self.ty.as_ref()
    }
}

impl CallTarget for LateBoundTarget {
    fn call_target(&self) -> ProjectionResult<InvocationContext> {
        Ok(match &self.ty {
            Some(ty) => InvocationContext::for_static(ty.clone()),
            None => InvocationContext::unresolved(self.type_name.clone()),
        })
    }

    fn is_available(&self) -> bool {
        self.ty.is_some()
    }

    fn static_type(&self) -> Option<TypeHandle> {
        self.ty.clone()
    }

    fn capture(&self) -> ProjectionResult<TargetSnapshot> {
        Ok(TargetSnapshot::LateBound {
            type_name: self.type_name.clone(),
        })
    }
}
