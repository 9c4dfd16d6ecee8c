use std::sync::Arc;

use veneer_types::{TypeHandle, Value};

use crate::args::Argument;
use crate::cache::InvocationCache;
use crate::error::ProjectionResult;
use crate::interceptor::{CallTarget, InvocationContext, Interceptor};
use crate::payload::TargetSnapshot;

/// Type-level target: static members and constructors of one type
#[derive(Debug, Clone)]
pub struct StaticTarget {
    ty: TypeHandle,
}

impl StaticTarget {
    /// Target the static side of `ty`
    pub fn new(ty: &TypeHandle) -> Self {
        Self { ty: ty.clone() }
    }

    /// The targeted type
    pub fn ty(&self) -> &TypeHandle {
        &self.ty
    }

    /// Construction capability for the targeted type, sharing `cache`
    pub fn constructor(&self, cache: Arc<InvocationCache>) -> Constructor {
        Constructor {
            interceptor: Interceptor::with_cache(Box::new(self.clone()), cache),
        }
    }
}

impl CallTarget for StaticTarget {
    fn call_target(&self) -> ProjectionResult<InvocationContext> {
        Ok(InvocationContext::for_static(self.ty.clone()))
    }

    fn static_type(&self) -> Option<TypeHandle> {
        Some(self.ty.clone())
    }

    fn capture(&self) -> ProjectionResult<TargetSnapshot> {
        Ok(TargetSnapshot::Static {
            type_name: self.ty.name().to_string(),
        })
    }
}

/// Builds instances of a type, binding constructor arguments the same way
/// method arguments are bound
#[derive(Debug)]
pub struct Constructor {
    interceptor: Interceptor,
}

impl Constructor {
    /// Construct with positional and/or named arguments
    pub fn new_instance(&self, args: &[Argument]) -> ProjectionResult<Value> {
        self.interceptor.construct(args)
    }

    /// Type being constructed
    pub fn ty(&self) -> Option<TypeHandle> {
        self.interceptor.target().static_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::InvocationKind;
    use crate::error::ProjectionError;
    use veneer_types::TypeBuilder;

    fn person() -> TypeHandle {
        TypeBuilder::class("test.Person")
            .field("name")
            .field("age")
            .static_field("Species", "human")
            .field_constructor(["name", "age"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_static_members_only() {
        let ty = person();
        let proxy = Interceptor::with_cache(Box::new(StaticTarget::new(&ty)), Arc::new(InvocationCache::new()));
        assert_eq!(proxy.get("Species").unwrap(), Value::from("human"));
        assert!(matches!(
            proxy.get("name"),
            Err(ProjectionError::MemberNotFound {
                kind: InvocationKind::Get,
                ..
            })
        ));
        assert_eq!(proxy.member_names(), vec!["Species"]);
    }

    #[test]
    fn test_constructor_remaps_names() {
        let ty = person();
        let ctor = StaticTarget::new(&ty).constructor(Arc::new(InvocationCache::new()));
        let value = ctor
            .new_instance(&[Argument::named("age", 30), Argument::named("name", "Ada")])
            .unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.get("name"), Some(Value::from("Ada")));
        assert_eq!(obj.get("age"), Some(Value::Int(30)));
        assert_eq!(ctor.ty().unwrap().name(), "test.Person");

        assert!(ctor.new_instance(&[Argument::positional(1)]).is_err());
    }
}
