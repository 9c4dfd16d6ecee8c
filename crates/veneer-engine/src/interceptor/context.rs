//! Invocation contexts
//!
//! An [`InvocationContext`] is what a call target hands the interceptor: the
//! receiver, the type members are resolved against, and whether resolution is
//! type-level. The context type defaults to the target's runtime type; an
//! explicit one must be the runtime type or one of its ancestors.

use veneer_types::{TypeHandle, Value};

use crate::error::{ProjectionError, ProjectionResult};

/// Explicit context for member resolution
#[derive(Debug, Clone)]
pub enum ContextSpec {
    /// Resolve against this type
    Type(TypeHandle),
    /// Resolve against this value's runtime type
    Value(Value),
}

/// Immutable `{ target, context type, static flag }` record
#[derive(Debug, Clone)]
pub struct InvocationContext {
    target: Option<Value>,
    context_type: Option<TypeHandle>,
    is_static: bool,
    unresolved: Option<String>,
}

impl InvocationContext {
    /// Instance context resolving against the target's runtime type
    pub fn for_instance(target: Value) -> Self {
        Self {
            context_type: target.runtime_type(),
            target: Some(target),
            is_static: false,
            unresolved: None,
        }
    }

    /// Instance context resolving against an explicit context
    pub fn new(target: Value, context: ContextSpec) -> ProjectionResult<Self> {
        let context_type = match context {
            ContextSpec::Type(ty) => ty,
            ContextSpec::Value(value) => {
                value
                    .runtime_type()
                    .ok_or_else(|| ProjectionError::IncompatibleContext {
                        context: value.type_name().to_string(),
                        target: target.type_name().to_string(),
                    })?
            }
        };
        let compatible = !context_type.is_interface()
            && target
                .runtime_type()
                .is_some_and(|rt| rt.is_subtype_of(&context_type));
        if !compatible {
            return Err(ProjectionError::IncompatibleContext {
                context: context_type.name().to_string(),
                target: target.type_name().to_string(),
            });
        }
        Ok(Self {
            target: Some(target),
            context_type: Some(context_type),
            is_static: false,
            unresolved: None,
        })
    }

    /// Type-level context: static members and constructors of `ty`
    pub fn for_static(ty: TypeHandle) -> Self {
        Self {
            target: None,
            context_type: Some(ty),
            is_static: true,
            unresolved: None,
        }
    }

    /// Type-level context for a type name that did not resolve; every lookup
    /// through it is a miss
    pub fn unresolved(type_name: impl Into<String>) -> Self {
        Self {
            target: None,
            context_type: None,
            is_static: true,
            unresolved: Some(type_name.into()),
        }
    }

    /// Receiver of instance members
    pub fn target(&self) -> Option<&Value> {
        self.target.as_ref()
    }

    /// Type members are resolved against
    pub fn context_type(&self) -> Option<&TypeHandle> {
        self.context_type.as_ref()
    }

    /// Whether resolution is type-level
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Name used in diagnostics
    pub fn type_name(&self) -> &str {
        match (&self.context_type, &self.unresolved) {
            (Some(ty), _) => ty.name(),
            (None, Some(name)) => name,
            (None, None) => "null",
        }
    }

    /// Member names visible in this context
    pub fn member_names(&self) -> Vec<String> {
        self.context_type
            .as_ref()
            .map(|ty| ty.member_names(self.is_static))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veneer_types::{Object, TypeBuilder};

    #[test]
    fn test_instance_context_uses_runtime_type() {
        let ty = TypeBuilder::class("test.Box").field("v").build().unwrap();
        let ctx = InvocationContext::for_instance(Object::alloc(&ty));
        assert_eq!(ctx.type_name(), "test.Box");
        assert!(!ctx.is_static());
        assert_eq!(ctx.member_names(), vec!["v"]);
    }

    #[test]
    fn test_explicit_context_must_be_ancestor() {
        let base = TypeBuilder::class("test.Base").build().unwrap();
        let derived = TypeBuilder::class("test.Derived").extends(&base).build().unwrap();
        let other = TypeBuilder::class("test.Other").build().unwrap();
        let target = Object::alloc(&derived);

        let ctx = InvocationContext::new(target.clone(), ContextSpec::Type(base.clone())).unwrap();
        assert_eq!(ctx.type_name(), "test.Base");

        let ctx = InvocationContext::new(target.clone(), ContextSpec::Value(Object::alloc(&base))).unwrap();
        assert_eq!(ctx.type_name(), "test.Base");

        assert!(matches!(
            InvocationContext::new(target, ContextSpec::Type(other)),
            Err(ProjectionError::IncompatibleContext { .. })
        ));
    }

    #[test]
    fn test_static_and_unresolved() {
        let ty = TypeBuilder::class("test.Util").static_field("Version", 3).build().unwrap();
        let ctx = InvocationContext::for_static(ty);
        assert!(ctx.is_static());
        assert!(ctx.target().is_none());
        assert_eq!(ctx.member_names(), vec!["Version"]);

        let ctx = InvocationContext::unresolved("acme.Missing");
        assert!(ctx.context_type().is_none());
        assert_eq!(ctx.type_name(), "acme.Missing");
        assert!(ctx.member_names().is_empty());
    }
}
