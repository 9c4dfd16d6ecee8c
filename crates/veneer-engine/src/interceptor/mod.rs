//! Interception core
//!
//! An [`Interceptor`] owns one wrapped target behind the [`CallTarget`] seam
//! and turns member access into resolve-then-forward: build a cache key from
//! the live context, ask the [`InvocationCache`], run the binding. The four
//! target variants in [`crate::target`] differ only in how they produce the
//! context.

mod context;

pub use context::{ContextSpec, InvocationContext};

use std::fmt;
use std::sync::Arc;

use veneer_types::{TypeHandle, Value};

use crate::args::{ArgShape, Argument, InvocationKind, CONSTRUCTOR_NAME};
use crate::cache::{CacheKey, InvocationCache};
use crate::error::{ProjectionError, ProjectionResult};
use crate::payload::TargetSnapshot;

/// Source of the context every intercepted operation runs against
pub trait CallTarget: Send + Sync + fmt::Debug {
    /// The current invocation context. Lazy targets force their value here.
    fn call_target(&self) -> ProjectionResult<InvocationContext>;

    /// Declared member names of the resolved type
    fn member_names(&self) -> Vec<String> {
        self.call_target()
            .map(|ctx| ctx.member_names())
            .unwrap_or_default()
    }

    /// Whether the target exists in the running process
    fn is_available(&self) -> bool {
        true
    }

    /// Context type known without touching the target, used to key proxy
    /// types
    fn static_type(&self) -> Option<TypeHandle> {
        None
    }

    /// Serializable description of the target
    fn capture(&self) -> ProjectionResult<TargetSnapshot>;
}

/// Resolve-then-forward dispatcher over one wrapped target
pub struct Interceptor {
    target: Box<dyn CallTarget>,
    cache: Arc<InvocationCache>,
}

impl Interceptor {
    /// Interceptor using the process-wide cache
    pub fn new(target: impl CallTarget + 'static) -> Self {
        Self::with_cache(Box::new(target), InvocationCache::global())
    }

    /// Interceptor using a specific cache
    pub fn with_cache(target: Box<dyn CallTarget>, cache: Arc<InvocationCache>) -> Self {
        Self { target, cache }
    }

    /// The wrapped target
    pub fn target(&self) -> &dyn CallTarget {
        self.target.as_ref()
    }

    /// The cache lookups go through
    pub fn cache(&self) -> &Arc<InvocationCache> {
        &self.cache
    }

    /// Current invocation context
    pub fn call_target(&self) -> ProjectionResult<InvocationContext> {
        self.target.call_target()
    }

    /// Whether the target exists in the running process
    pub fn is_available(&self) -> bool {
        self.target.is_available()
    }

    /// The interceptor itself if its target exists, or `TargetUnavailable`
    /// naming the unresolved type
    pub fn require_available(&self) -> ProjectionResult<&Self> {
        if self.target.is_available() {
            return Ok(self);
        }
        let name = self.target.call_target()?.type_name().to_string();
        Err(ProjectionError::TargetUnavailable { name })
    }

    /// Declared member names of the target (empty for an unforced lazy target)
    pub fn member_names(&self) -> Vec<String> {
        self.target.member_names()
    }

    fn dispatch(
        &self,
        member: &str,
        kind: InvocationKind,
        args: &[Argument],
        assigned: Option<Value>,
    ) -> ProjectionResult<Value> {
        let ctx = self.target.call_target()?;
        let not_found = || ProjectionError::MemberNotFound {
            type_name: ctx.type_name().to_string(),
            member: member.to_string(),
            kind,
        };

        let owner = ctx.context_type().ok_or_else(not_found)?;
        let key = CacheKey::new(owner, ctx.is_static(), member, kind, ArgShape::of(args));
        let binding = self.cache.get_or_resolve(owner, key).ok_or_else(not_found)?;

        let values: Vec<Value> = args.iter().map(|a| a.value.clone()).collect();
        Ok(binding.call(&ctx, &values, assigned)?)
    }

    /// Read a field or property
    pub fn get(&self, name: &str) -> ProjectionResult<Value> {
        self.dispatch(name, InvocationKind::Get, &[], None)
    }

    /// Write a field or property
    pub fn set(&self, name: &str, value: impl Into<Value>) -> ProjectionResult<()> {
        self.dispatch(name, InvocationKind::Set, &[], Some(value.into()))
            .map(|_| ())
    }

    /// Call a method
    pub fn invoke(&self, name: &str, args: &[Argument]) -> ProjectionResult<Value> {
        self.dispatch(name, InvocationKind::Invoke, args, None)
    }

    /// Read through the indexer
    pub fn index(&self, args: &[Argument]) -> ProjectionResult<Value> {
        self.dispatch(veneer_types::INDEXER_NAME, InvocationKind::Index, args, None)
    }

    /// Write through the indexer
    pub fn set_index(&self, args: &[Argument], value: impl Into<Value>) -> ProjectionResult<()> {
        self.dispatch(
            veneer_types::INDEXER_NAME,
            InvocationKind::SetIndex,
            args,
            Some(value.into()),
        )
        .map(|_| ())
    }

    /// Call a constructor of a static target
    pub fn construct(&self, args: &[Argument]) -> ProjectionResult<Value> {
        self.dispatch(CONSTRUCTOR_NAME, InvocationKind::Construct, args, None)
    }

    /// Read, with an absent member reported as `None`
    pub fn try_get(&self, name: &str) -> ProjectionResult<Option<Value>> {
        absent_as_none(self.get(name))
    }

    /// Write, with an absent member reported as `false`
    pub fn try_set(&self, name: &str, value: impl Into<Value>) -> ProjectionResult<bool> {
        absent_as_none(self.set(name, value)).map(|done| done.is_some())
    }

    /// Call, with an absent member reported as `None`
    pub fn try_invoke(&self, name: &str, args: &[Argument]) -> ProjectionResult<Option<Value>> {
        absent_as_none(self.invoke(name, args))
    }

    /// Serializable description of the target
    pub fn capture(&self) -> ProjectionResult<TargetSnapshot> {
        self.target.capture()
    }
}

fn absent_as_none<T>(result: ProjectionResult<T>) -> ProjectionResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_member_not_found() => Ok(None),
        Err(err) => Err(err),
    }
}

impl fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptor")
            .field("target", &self.target)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::positional;
    use crate::target::EagerTarget;
    use veneer_types::{InvokeError, Object, TypeBuilder, NO_PARAMS};

    fn counter() -> TypeHandle {
        TypeBuilder::class("test.Counter")
            .field("count")
            .method("Increment", ["by"], |this, args| {
                let obj = this.object()?;
                let next = obj.get("count").and_then(|v| v.as_int()).unwrap_or(0)
                    + args[0].as_int().unwrap_or(1);
                obj.set("count", next);
                Ok(Value::Int(next))
            })
            .method("Fail", NO_PARAMS, |_, _| Err(InvokeError::Fault("boom".into())))
            .build()
            .unwrap()
    }

    fn interceptor(ty: &TypeHandle) -> Interceptor {
        Interceptor::with_cache(
            Box::new(EagerTarget::new(Object::alloc(ty))),
            Arc::new(InvocationCache::new()),
        )
    }

    #[test]
    fn test_get_set_invoke() {
        let ty = counter();
        let proxy = interceptor(&ty);

        proxy.set("count", 1).unwrap();
        assert_eq!(proxy.invoke("Increment", &positional([2])).unwrap(), Value::Int(3));
        assert_eq!(proxy.get("count").unwrap(), Value::Int(3));
        assert_eq!(proxy.member_names(), vec!["count", "Increment", "Fail"]);
    }

    #[test]
    fn test_absent_members() {
        let ty = counter();
        let proxy = interceptor(&ty);

        let err = proxy.get("missing").unwrap_err();
        assert_eq!(
            err,
            ProjectionError::MemberNotFound {
                type_name: "test.Counter".to_string(),
                member: "missing".to_string(),
                kind: InvocationKind::Get,
            }
        );
        assert_eq!(proxy.try_get("missing").unwrap(), None);
        assert!(!proxy.try_set("missing", 1).unwrap());
        assert_eq!(proxy.try_invoke("Increment", &[]).unwrap(), None);
    }

    #[test]
    fn test_member_faults_propagate() {
        let ty = counter();
        let proxy = interceptor(&ty);
        assert_eq!(
            proxy.invoke("Fail", &[]).unwrap_err(),
            ProjectionError::Invoke(InvokeError::Fault("boom".into()))
        );
        assert!(proxy.try_invoke("Fail", &[]).is_err());
    }

    #[test]
    fn test_primitive_targets() {
        let proxy = Interceptor::with_cache(
            Box::new(EagerTarget::new(Value::from("abc"))),
            Arc::new(InvocationCache::new()),
        );
        assert_eq!(proxy.get("Length").unwrap(), Value::Int(3));
        assert_eq!(proxy.index(&positional([0])).unwrap(), Value::from("a"));
        assert!(proxy.set_index(&positional([0]), "z").is_err());
    }
}
