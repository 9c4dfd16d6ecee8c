//! Projections: instances of synthesized proxy types
//!
//! A [`Projection`] exposes exactly the members its proxy type declares and
//! forwards each of them through its embedded [`Interceptor`]. Method calls
//! carry the interface's parameter names, so the binder can remap them onto
//! a target whose parameters are named or ordered differently.

use std::fmt;
use std::sync::Arc;

use veneer_types::{MemberDef, TypeHandle, Value, INDEXER_NAME};

use crate::args::Argument;
use crate::config::ProjectionConfig;
use crate::error::{ProjectionError, ProjectionResult};
use crate::interceptor::Interceptor;
use crate::payload::{ProjectionPayload, TypeRef};
use crate::proxy::synthesizer::{ProxyMember, ProxyType};

/// Bind a proxy type to a target
///
/// `interfaces` must be the set the type was synthesized for.
pub fn initialize_proxy(
    ty: &Arc<ProxyType>,
    target: Interceptor,
    interfaces: &[TypeHandle],
) -> ProjectionResult<Projection> {
    let requested: Vec<_> = interfaces.iter().map(|i| i.id()).collect();
    if requested != ty.interfaces().ids() {
        return Err(ProjectionError::InvalidInterfaceSet {
            reason: format!("interfaces do not match {}", ty.name()),
        });
    }
    Ok(Projection {
        ty: ty.clone(),
        interceptor: target,
        config: ProjectionConfig::default(),
    })
}

/// An object presenting a set of interfaces over a wrapped target
pub struct Projection {
    ty: Arc<ProxyType>,
    interceptor: Interceptor,
    config: ProjectionConfig,
}

impl Projection {
    /// Replace the absence-handling configuration
    pub fn with_config(mut self, config: ProjectionConfig) -> Self {
        self.config = config;
        self
    }

    /// Absence-handling configuration
    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// The synthesized type
    pub fn proxy_type(&self) -> &Arc<ProxyType> {
        &self.ty
    }

    /// The embedded interceptor
    pub fn interceptor(&self) -> &Interceptor {
        &self.interceptor
    }

    /// Requested interfaces
    pub fn interfaces(&self) -> &[TypeHandle] {
        self.ty.interfaces().as_slice()
    }

    /// Whether the projection satisfies `iface`
    pub fn implements(&self, iface: &TypeHandle) -> bool {
        self.ty.implements(iface)
    }

    /// Whether the projection declares `name`
    pub fn declares(&self, name: &str) -> bool {
        self.ty.member(name).is_some()
    }

    /// Declared member names
    pub fn member_names(&self) -> Vec<String> {
        self.ty.member_names()
    }

    /// Whether the wrapped target exists in the running process
    pub fn is_available(&self) -> bool {
        self.interceptor.is_available()
    }

    /// The projection itself if its target exists, or `TargetUnavailable`
    pub fn require_available(&self) -> ProjectionResult<&Self> {
        self.interceptor.require_available()?;
        Ok(self)
    }

    fn declared(&self, name: &str) -> ProjectionResult<&ProxyMember> {
        self.ty.member(name).ok_or_else(|| ProjectionError::UndeclaredMember {
            proxy: self.ty.name().to_string(),
            member: name.to_string(),
        })
    }

    fn absent<T>(
        &self,
        result: ProjectionResult<T>,
        lenient: bool,
        name: &str,
        fallback: impl FnOnce() -> T,
    ) -> ProjectionResult<T> {
        match result {
            Err(err) if lenient && err.is_member_not_found() => {
                log::debug!("{}: target lacks '{}', {}", self.ty.name(), name, err);
                Ok(fallback())
            }
            other => other,
        }
    }

    /// Read a declared property
    pub fn get(&self, name: &str) -> ProjectionResult<Value> {
        let member = self.declared(name)?;
        if !member.is_readable_property() {
            return Err(mismatch(member, "not a readable property"));
        }
        let result = self.interceptor.get(name);
        self.absent(result, self.config.lenient_reads, name, Value::default)
    }

    /// Write a declared property
    pub fn set(&self, name: &str, value: impl Into<Value>) -> ProjectionResult<()> {
        let member = self.declared(name)?;
        if !member.is_writable_property() {
            return Err(mismatch(member, "not a writable property"));
        }
        let result = self.interceptor.set(name, value);
        self.absent(result, self.config.lenient_writes, name, || ())
    }

    /// Call a declared method
    pub fn invoke(&self, name: &str, args: &[Value]) -> ProjectionResult<Value> {
        let member = self.declared(name)?;
        if !member.is_method() {
            return Err(mismatch(member, "not a method"));
        }
        let signature = pick_overload(member, MemberDef::is_method, args.len())?;
        let named: Vec<Argument> = signature
            .params()
            .iter()
            .zip(args)
            .map(|(param, value)| Argument::named(param.name.clone(), value.clone()))
            .collect();
        let result = self.interceptor.invoke(name, &named);
        self.absent(result, !self.config.strict_invocations, name, Value::default)
    }

    /// Read through the declared indexer
    pub fn index(&self, args: &[Value]) -> ProjectionResult<Value> {
        let member = self.declared(INDEXER_NAME)?;
        pick_overload(member, |d| d.is_indexer() && d.is_readable(), args.len())?;
        let result = self.interceptor.index(&positional(args));
        self.absent(result, self.config.lenient_reads, INDEXER_NAME, Value::default)
    }

    /// Write through the declared indexer
    pub fn set_index(&self, args: &[Value], value: impl Into<Value>) -> ProjectionResult<()> {
        let member = self.declared(INDEXER_NAME)?;
        pick_overload(member, |d| d.is_indexer() && d.is_writable(), args.len())?;
        let result = self.interceptor.set_index(&positional(args), value);
        self.absent(result, self.config.lenient_writes, INDEXER_NAME, || ())
    }

    /// Capture a payload that [`reconstitute`](crate::payload::reconstitute)
    /// turns back into an equivalent projection
    pub fn capture(&self) -> ProjectionResult<ProjectionPayload> {
        Ok(ProjectionPayload::new(
            self.ty.context().map(TypeRef::of),
            self.interfaces().iter().map(TypeRef::of).collect(),
            self.interceptor.capture()?,
        ))
    }
}

fn positional(args: &[Value]) -> Vec<Argument> {
    args.iter().cloned().map(Argument::positional).collect()
}

fn mismatch(member: &ProxyMember, reason: &str) -> ProjectionError {
    ProjectionError::SignatureMismatch {
        member: member.name().to_string(),
        reason: format!("{} (declared by {})", reason, member.source().name()),
    }
}

/// Overload taking exactly `arity` arguments, else the first that accepts
/// `arity` with its optional parameters
fn pick_overload(
    member: &ProxyMember,
    fits: impl Fn(&MemberDef) -> bool,
    arity: usize,
) -> ProjectionResult<&MemberDef> {
    let candidates: Vec<&MemberDef> = member.overloads().iter().filter(|d| fits(*d)).collect();
    let exact = candidates.iter().copied().find(|d| d.params().len() == arity);
    exact
        .or_else(|| {
            candidates.iter().copied().find(|d| {
                let required = d.params().iter().filter(|p| !p.is_optional).count();
                required <= arity && arity <= d.params().len()
            })
        })
        .ok_or_else(|| mismatch(member, &format!("no declaration takes {} argument(s)", arity)))
}

impl fmt::Debug for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Projection")
            .field("type", &self.ty.name())
            .field("target", &self.interceptor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InvocationCache;
    use crate::proxy::ProxySynthesizer;
    use crate::target::EagerTarget;
    use veneer_types::{Object, PropertyAccess, TypeBuilder};

    fn person_iface() -> TypeHandle {
        TypeBuilder::interface("test.IPerson")
            .property_sig("Name", PropertyAccess::ReadWrite)
            .property_sig("Nickname", PropertyAccess::ReadOnly)
            .method_sig("Greet", ["greeting"])
            .method_sig("Forget", ["what"])
            .build()
            .unwrap()
    }

    fn person_class() -> TypeHandle {
        TypeBuilder::class("test.Person")
            .field("Name")
            .method("Greet", ["salutation"], |this, args| {
                let name = this.object()?.get("Name").unwrap_or_default();
                Ok(Value::from(format!("{}, {}", args[0], name)))
            })
            .build()
            .unwrap()
    }

    fn project(iface: &TypeHandle, target: Value) -> Projection {
        let ty = ProxySynthesizer::new().build_type(None, iface, &[]).unwrap();
        let interceptor =
            Interceptor::with_cache(Box::new(EagerTarget::new(target)), Arc::new(InvocationCache::new()));
        initialize_proxy(&ty, interceptor, &[iface.clone()]).unwrap()
    }

    #[test]
    fn test_forwarding_with_parameter_remapping() {
        let iface = person_iface();
        let person = Object::alloc(&person_class());
        let proxy = project(&iface, person.clone());

        proxy.set("Name", "Ada").unwrap();
        assert_eq!(person.as_object().unwrap().get("Name"), Some(Value::from("Ada")));
        assert_eq!(proxy.get("Name").unwrap(), Value::from("Ada"));
        assert_eq!(proxy.invoke("Greet", &[Value::from("Hi")]).unwrap(), Value::from("Hi, Ada"));
        assert!(proxy.implements(&iface));
    }

    #[test]
    fn test_absence_handling() {
        let iface = person_iface();
        let proxy = project(&iface, Object::alloc(&person_class()));

        assert_eq!(proxy.get("Nickname").unwrap(), Value::Null);
        assert!(proxy.invoke("Forget", &[Value::from("x")]).unwrap_err().is_member_not_found());

        let strict = project(&iface, Object::alloc(&person_class())).with_config(ProjectionConfig::strict());
        assert!(strict.get("Nickname").unwrap_err().is_member_not_found());

        let relaxed = project(&iface, Object::alloc(&person_class())).with_config(ProjectionConfig {
            strict_invocations: false,
            ..ProjectionConfig::default()
        });
        assert_eq!(relaxed.invoke("Forget", &[Value::from("x")]).unwrap(), Value::Null);
    }

    #[test]
    fn test_undeclared_and_mismatched_members() {
        let iface = person_iface();
        let proxy = project(&iface, Object::alloc(&person_class()));

        assert!(matches!(proxy.get("Age"), Err(ProjectionError::UndeclaredMember { .. })));
        assert!(matches!(proxy.set("Nickname", "x"), Err(ProjectionError::SignatureMismatch { .. })));
        assert!(matches!(proxy.get("Greet"), Err(ProjectionError::SignatureMismatch { .. })));
        assert!(matches!(proxy.invoke("Greet", &[]), Err(ProjectionError::SignatureMismatch { .. })));
        assert!(matches!(proxy.index(&[Value::from(0)]), Err(ProjectionError::UndeclaredMember { .. })));
    }

    #[test]
    fn test_indexer_over_list() {
        let iface = TypeBuilder::interface("test.IIndexable")
            .property_sig("Count", PropertyAccess::ReadOnly)
            .indexer_sig(["i"], PropertyAccess::ReadWrite)
            .build()
            .unwrap();
        let list = Value::list(vec![Value::from(1), Value::from(2)]);
        let proxy = project(&iface, list.clone());

        assert_eq!(proxy.get("Count").unwrap(), Value::Int(2));
        proxy.set_index(&[Value::from(1)], 20).unwrap();
        assert_eq!(proxy.index(&[Value::from(1)]).unwrap(), Value::Int(20));
        assert_eq!(list.as_list().unwrap().read()[1], Value::Int(20));
    }

    #[test]
    fn test_initialize_requires_matching_set() {
        let iface = person_iface();
        let other = TypeBuilder::interface("test.IOther").build().unwrap();
        let ty = ProxySynthesizer::new().build_type(None, &iface, &[]).unwrap();
        let interceptor = Interceptor::new(EagerTarget::new(Value::Null));
        assert!(matches!(
            initialize_proxy(&ty, interceptor, &[other]),
            Err(ProjectionError::InvalidInterfaceSet { .. })
        ));
    }
}
