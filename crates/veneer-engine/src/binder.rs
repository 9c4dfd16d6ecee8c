//! Invocation binder
//!
//! Resolves `(owner type, member name, invocation kind, argument shape)` to a
//! [`Binding`]: a directly callable handle on the member plus the mapping from
//! supplied argument positions to declared parameter positions.
//!
//! Resolution order:
//! 1. Candidates are members with the requested name that fit the kind and the
//!    static/instance mode, searched on the owner and then along its base
//!    chain, in declaration order.
//! 2. The first candidate whose parameters accept the shape exactly wins. Every
//!    supplied name must be a declared parameter name, and omitted trailing
//!    parameters must be optional.
//! 3. For `Invoke` only, a candidate with at least as many parameters as
//!    arguments is accepted with partial remapping. Matching names bind by
//!    name, the rest fill the open positions in order, and any positions still
//!    open must be optional. The candidate with the most matched names wins,
//!    and ties go to the first declared.
//!
//! The binder is a pure function of its inputs; caching lives in
//! [`crate::cache`].

use std::fmt;

use veneer_types::member::{ConstructorFn, Getter, IndexSetter, MethodFn, Setter};
use veneer_types::{
    ancestry, InvokeError, InvokeResult, MemberDef, MemberKind, Object, ParameterDefinition,
    Receiver, TypeHandle, TypeKind, Value,
};

use crate::args::{ArgShape, InvocationKind};
use crate::interceptor::InvocationContext;

/// Where an argument for a declared parameter comes from
#[derive(Debug, Clone, PartialEq)]
pub enum ArgSlot {
    /// The supplied argument at this position
    Supplied(usize),
    /// The parameter's default (null if it declares none)
    Default(Value),
}

/// How a binding was matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchQuality {
    /// Names and arity accepted as supplied
    Exact,
    /// Arguments were partially remapped by name
    Remapped {
        /// Number of arguments bound by name
        matched_names: usize,
    },
}

/// The concrete operation a binding performs
#[derive(Clone)]
pub enum BoundMember {
    /// Instance field slot
    InstanceField {
        /// Slot index
        slot: usize,
    },
    /// Static field slot on the declaring type
    StaticField {
        /// Slot index
        slot: usize,
    },
    /// Property getter
    Getter(Getter),
    /// Property setter
    Setter(Setter),
    /// Method body
    Method(MethodFn),
    /// Indexer read
    IndexGetter(MethodFn),
    /// Indexer write
    IndexSetter(IndexSetter),
    /// Declared constructor
    Constructor(ConstructorFn),
    /// Implicit zero-argument constructor of a class without declared ones
    DefaultConstructor,
}

impl fmt::Debug for BoundMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundMember::InstanceField { slot } => write!(f, "InstanceField({})", slot),
            BoundMember::StaticField { slot } => write!(f, "StaticField({})", slot),
            BoundMember::Getter(_) => write!(f, "Getter"),
            BoundMember::Setter(_) => write!(f, "Setter"),
            BoundMember::Method(_) => write!(f, "Method"),
            BoundMember::IndexGetter(_) => write!(f, "IndexGetter"),
            BoundMember::IndexSetter(_) => write!(f, "IndexSetter"),
            BoundMember::Constructor(_) => write!(f, "Constructor"),
            BoundMember::DefaultConstructor => write!(f, "DefaultConstructor"),
        }
    }
}

/// A resolved, reusable handle to a member
#[derive(Debug, Clone)]
pub struct Binding {
    owner: TypeHandle,
    declared_on: TypeHandle,
    name: String,
    kind: InvocationKind,
    is_static: bool,
    member: BoundMember,
    arg_map: Vec<ArgSlot>,
    quality: MatchQuality,
}

impl Binding {
    /// Type the binding was resolved against
    pub fn owner(&self) -> &TypeHandle {
        &self.owner
    }

    /// Type that declares the bound member (the owner or one of its bases)
    pub fn declared_on(&self) -> &TypeHandle {
        &self.declared_on
    }

    /// Member name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invocation kind
    pub fn kind(&self) -> InvocationKind {
        self.kind
    }

    /// Whether the bound member is type-level
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// The bound operation
    pub fn member(&self) -> &BoundMember {
        &self.member
    }

    /// Declared-parameter sources
    pub fn arg_map(&self) -> &[ArgSlot] {
        &self.arg_map
    }

    /// How the binding was matched
    pub fn quality(&self) -> MatchQuality {
        self.quality
    }

    /// Reorder supplied argument values into declared parameter order
    pub fn arrange(&self, args: &[Value]) -> Vec<Value> {
        self.arg_map
            .iter()
            .map(|slot| match slot {
                ArgSlot::Supplied(i) => args.get(*i).cloned().unwrap_or_default(),
                ArgSlot::Default(v) => v.clone(),
            })
            .collect()
    }

    fn receiver<'a>(&'a self, ctx: &'a InvocationContext) -> InvokeResult<Receiver<'a>> {
        if self.is_static {
            return Ok(Receiver::Type(&self.declared_on));
        }
        ctx.target()
            .map(Receiver::Instance)
            .ok_or_else(|| InvokeError::TypeMismatch {
                expected: "instance".to_string(),
                got: "no target".to_string(),
            })
    }

    /// Run the bound member against `ctx`. `assigned` carries the value of a
    /// `Set`/`SetIndex`; writes return null.
    pub fn call(
        &self,
        ctx: &InvocationContext,
        args: &[Value],
        assigned: Option<Value>,
    ) -> InvokeResult<Value> {
        match &self.member {
            BoundMember::InstanceField { slot } => {
                let receiver = self.receiver(ctx)?;
                let obj = receiver.object()?;
                match assigned {
                    Some(value) => {
                        obj.set_slot(*slot, value);
                        Ok(Value::Null)
                    }
                    None => Ok(obj.get_slot(*slot).unwrap_or_default()),
                }
            }
            BoundMember::StaticField { slot } => match assigned {
                Some(value) => {
                    self.declared_on.set_static_value(*slot, value);
                    Ok(Value::Null)
                }
                None => Ok(self.declared_on.static_value(*slot).unwrap_or_default()),
            },
            BoundMember::Getter(getter) => getter(self.receiver(ctx)?),
            BoundMember::Setter(setter) => {
                setter(self.receiver(ctx)?, assigned.unwrap_or_default())?;
                Ok(Value::Null)
            }
            BoundMember::Method(body) => body(self.receiver(ctx)?, &self.arrange(args)),
            BoundMember::IndexGetter(getter) => getter(self.receiver(ctx)?, &self.arrange(args)),
            BoundMember::IndexSetter(setter) => {
                setter(
                    self.receiver(ctx)?,
                    &self.arrange(args),
                    assigned.unwrap_or_default(),
                )?;
                Ok(Value::Null)
            }
            BoundMember::Constructor(body) => body(&self.owner, &self.arrange(args)),
            BoundMember::DefaultConstructor => Ok(Object::alloc(&self.owner)),
        }
    }
}

/// Resolve a member, or `None` if nothing fits
pub fn resolve(
    owner: &TypeHandle,
    is_static: bool,
    member: &str,
    kind: InvocationKind,
    shape: &ArgShape,
) -> Option<Binding> {
    if kind == InvocationKind::Construct {
        return if is_static {
            resolve_constructor(owner, shape)
        } else {
            None
        };
    }

    let candidates: Vec<(&TypeHandle, &MemberDef)> = ancestry(owner)
        .flat_map(|ty| ty.declared(member).map(move |m| (ty, m)))
        .filter(|(_, m)| m.is_static() == is_static)
        .filter_map(|(ty, m)| bound_member(m, kind).map(|_| (ty, m)))
        .collect();

    let make = |declared_on: &TypeHandle,
                def: &MemberDef,
                arg_map: Vec<ArgSlot>,
                quality: MatchQuality| {
        bound_member(def, kind).map(|bound| Binding {
            owner: owner.clone(),
            declared_on: declared_on.clone(),
            name: member.to_string(),
            kind,
            is_static,
            member: bound,
            arg_map,
            quality,
        })
    };

    if matches!(kind, InvocationKind::Get | InvocationKind::Set) {
        if shape.arity() != 0 {
            return None;
        }
        let &(ty, def) = candidates.first()?;
        return make(ty, def, Vec::new(), MatchQuality::Exact);
    }

    for &(ty, def) in &candidates {
        if let Some(map) = exact_map(def.params(), shape) {
            return make(ty, def, map, MatchQuality::Exact);
        }
    }

    if kind != InvocationKind::Invoke {
        return None;
    }

    let mut best: Option<(&TypeHandle, &MemberDef, Vec<ArgSlot>, usize)> = None;
    for &(ty, def) in &candidates {
        if let Some((map, matched)) = remap(def.params(), shape) {
            if best.as_ref().map_or(true, |(_, _, _, m)| matched > *m) {
                best = Some((ty, def, map, matched));
            }
        }
    }
    let (ty, def, map, matched_names) = best?;
    make(ty, def, map, MatchQuality::Remapped { matched_names })
}

fn resolve_constructor(owner: &TypeHandle, shape: &ArgShape) -> Option<Binding> {
    let make = |body: BoundMember, arg_map: Vec<ArgSlot>, quality: MatchQuality| Binding {
        owner: owner.clone(),
        declared_on: owner.clone(),
        name: crate::args::CONSTRUCTOR_NAME.to_string(),
        kind: InvocationKind::Construct,
        is_static: true,
        member: body,
        arg_map,
        quality,
    };

    let ctors = owner.constructors();
    if ctors.is_empty() {
        return (owner.kind() == TypeKind::Class && shape.arity() == 0)
            .then(|| make(BoundMember::DefaultConstructor, Vec::new(), MatchQuality::Exact));
    }

    for ctor in ctors {
        if let Some(map) = exact_map(&ctor.params, shape) {
            return Some(make(
                BoundMember::Constructor(ctor.body.clone()),
                map,
                MatchQuality::Exact,
            ));
        }
    }

    let mut best: Option<(usize, Vec<ArgSlot>, usize)> = None;
    for (i, ctor) in ctors.iter().enumerate() {
        if let Some((map, matched)) = remap(&ctor.params, shape) {
            if best.as_ref().map_or(true, |(_, _, m)| matched > *m) {
                best = Some((i, map, matched));
            }
        }
    }
    let (i, map, matched_names) = best?;
    Some(make(
        BoundMember::Constructor(ctors[i].body.clone()),
        map,
        MatchQuality::Remapped { matched_names },
    ))
}

/// The operation `def` performs for `kind`, if it supports it
fn bound_member(def: &MemberDef, kind: InvocationKind) -> Option<BoundMember> {
    match (def.kind(), kind) {
        (MemberKind::Field(f), InvocationKind::Get) => Some(field(def, f.slot)),
        (MemberKind::Field(f), InvocationKind::Set) if !f.readonly => Some(field(def, f.slot)),
        (MemberKind::Property(p), InvocationKind::Get) if p.access.can_read() => {
            p.getter.clone().map(BoundMember::Getter)
        }
        (MemberKind::Property(p), InvocationKind::Set) if p.access.can_write() => {
            p.setter.clone().map(BoundMember::Setter)
        }
        (MemberKind::Method(m), InvocationKind::Invoke) => m.body.clone().map(BoundMember::Method),
        (MemberKind::Indexer(i), InvocationKind::Index) if i.access.can_read() => {
            i.getter.clone().map(BoundMember::IndexGetter)
        }
        (MemberKind::Indexer(i), InvocationKind::SetIndex) if i.access.can_write() => {
            i.setter.clone().map(BoundMember::IndexSetter)
        }
        _ => None,
    }
}

fn field(def: &MemberDef, slot: usize) -> BoundMember {
    if def.is_static() {
        BoundMember::StaticField { slot }
    } else {
        BoundMember::InstanceField { slot }
    }
}

/// Accept the shape as supplied: positional arguments fill parameters in
/// order, named ones bind by name, and unfilled parameters must be optional.
fn exact_map(params: &[ParameterDefinition], shape: &ArgShape) -> Option<Vec<ArgSlot>> {
    if shape.arity() > params.len() {
        return None;
    }
    let mut slots: Vec<Option<ArgSlot>> = vec![None; params.len()];
    let mut cursor = 0;
    for (i, name) in shape.names().iter().enumerate() {
        let pos = match name {
            None => {
                cursor += 1;
                cursor - 1
            }
            Some(name) => params.iter().position(|p| &p.name == name)?,
        };
        let slot = slots.get_mut(pos)?;
        if slot.is_some() {
            return None;
        }
        *slot = Some(ArgSlot::Supplied(i));
    }
    slots
        .into_iter()
        .zip(params)
        .map(|(slot, param)| match slot {
            Some(slot) => Some(slot),
            None if param.is_optional => {
                Some(ArgSlot::Default(param.default.clone().unwrap_or_default()))
            }
            None => None,
        })
        .collect()
}

/// Fallback for calls whose names do not line up: bind what matches by
/// name, fill the open parameters in order with the rest, and let trailing
/// optional parameters take their defaults. Returns the mapping and how many
/// arguments matched by name.
fn remap(params: &[ParameterDefinition], shape: &ArgShape) -> Option<(Vec<ArgSlot>, usize)> {
    if shape.arity() > params.len() {
        return None;
    }
    let mut slots: Vec<Option<ArgSlot>> = vec![None; params.len()];
    let mut matched = 0;
    let mut unmatched = Vec::new();
    for (i, name) in shape.names().iter().enumerate() {
        let by_name = name
            .as_deref()
            .and_then(|name| params.iter().position(|p| p.name == name))
            .filter(|&pos| slots[pos].is_none());
        match by_name {
            Some(pos) => {
                slots[pos] = Some(ArgSlot::Supplied(i));
                matched += 1;
            }
            None => unmatched.push(i),
        }
    }
    let mut unmatched = unmatched.into_iter();
    let map = slots
        .into_iter()
        .zip(params)
        .map(|(slot, param)| {
            slot.or_else(|| match unmatched.next() {
                Some(i) => Some(ArgSlot::Supplied(i)),
                None if param.is_optional => {
                    Some(ArgSlot::Default(param.default.clone().unwrap_or_default()))
                }
                None => None,
            })
        })
        .collect::<Option<Vec<_>>>()?;
    Some((map, matched))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::Argument;
    use veneer_types::{ParameterDefinition, TypeBuilder, NO_PARAMS};

    fn greeter() -> TypeHandle {
        TypeBuilder::class("test.Greeter")
            .field("name")
            .static_field("name", "static")
            .method("Greet", ["greeting", "punctuation"], |this, args| {
                let name = this.object()?.get("name").unwrap_or_default();
                Ok(Value::from(format!("{}, {}{}", args[0], name, args[1])))
            })
            .method(
                "Shout",
                vec![ParameterDefinition::new("text"), ParameterDefinition::new("times").with_default(2)],
                |_, args| {
                    let times = args[1].as_int().unwrap_or(1) as usize;
                    Ok(Value::from(args[0].to_string().to_uppercase().repeat(times)))
                },
            )
            .build()
            .unwrap()
    }

    fn names(names: &[Option<&str>]) -> ArgShape {
        let args: Vec<Argument> = names
            .iter()
            .map(|n| match n {
                Some(n) => Argument::named(*n, Value::Null),
                None => Argument::positional(Value::Null),
            })
            .collect();
        ArgShape::of(&args)
    }

    #[test]
    fn test_exact_positional_and_named() {
        let ty = greeter();
        let b = resolve(&ty, false, "Greet", InvocationKind::Invoke, &ArgShape::positional(2)).unwrap();
        assert_eq!(b.quality(), MatchQuality::Exact);
        assert_eq!(b.arg_map(), &[ArgSlot::Supplied(0), ArgSlot::Supplied(1)]);

        let shape = names(&[Some("punctuation"), Some("greeting")]);
        let b = resolve(&ty, false, "Greet", InvocationKind::Invoke, &shape).unwrap();
        assert_eq!(b.quality(), MatchQuality::Exact);
        assert_eq!(b.arg_map(), &[ArgSlot::Supplied(1), ArgSlot::Supplied(0)]);
    }

    #[test]
    fn test_optional_parameters_take_defaults() {
        let ty = greeter();
        let b = resolve(&ty, false, "Shout", InvocationKind::Invoke, &ArgShape::positional(1)).unwrap();
        assert_eq!(b.arg_map(), &[ArgSlot::Supplied(0), ArgSlot::Default(Value::Int(2))]);
        assert_eq!(b.arrange(&[Value::from("hey")]), vec![Value::from("hey"), Value::Int(2)]);
    }

    #[test]
    fn test_partial_name_remapping() {
        let ty = greeter();
        let shape = names(&[Some("salutation"), Some("greeting")]);
        let b = resolve(&ty, false, "Greet", InvocationKind::Invoke, &shape).unwrap();
        assert_eq!(b.quality(), MatchQuality::Remapped { matched_names: 1 });
        assert_eq!(b.arg_map(), &[ArgSlot::Supplied(1), ArgSlot::Supplied(0)]);

        // Remapping is an invocation-only fallback
        assert!(resolve(&ty, false, "Greet", InvocationKind::Invoke, &ArgShape::positional(3)).is_none());
    }

    #[test]
    fn test_remap_fills_optional_trailing() {
        let ty = TypeBuilder::class("test.Salute")
            .method(
                "Greet",
                vec![ParameterDefinition::new("salutation"), ParameterDefinition::new("times").with_default(1)],
                |_, args| {
                    let times = args[1].as_int().unwrap_or(1) as usize;
                    Ok(Value::from(args[0].to_string().repeat(times)))
                },
            )
            .build()
            .unwrap();
        let shape = names(&[Some("greeting")]);
        let b = resolve(&ty, false, "Greet", InvocationKind::Invoke, &shape).unwrap();
        assert_eq!(b.quality(), MatchQuality::Remapped { matched_names: 0 });
        assert_eq!(b.arg_map(), &[ArgSlot::Supplied(0), ArgSlot::Default(Value::Int(1))]);

        // Open required parameters still reject the candidate
        let greeter = greeter();
        assert!(resolve(&greeter, false, "Greet", InvocationKind::Invoke, &names(&[Some("other")])).is_none());
    }

    #[test]
    fn test_name_match_beats_positional() {
        let ty = TypeBuilder::class("test.Overloads")
            .method("Run", ["x", "y"], |_, _| Ok(Value::from("xy")))
            .method("Run", ["a", "b"], |_, _| Ok(Value::from("ab")))
            .build()
            .unwrap();
        let shape = names(&[Some("b"), Some("q")]);
        let b = resolve(&ty, false, "Run", InvocationKind::Invoke, &shape).unwrap();
        assert_eq!(b.quality(), MatchQuality::Remapped { matched_names: 1 });

        let ctx = InvocationContext::for_instance(Object::alloc(&ty));
        let out = b.call(&ctx, &[Value::Null, Value::Null], None);
        assert_eq!(out, Ok(Value::from("ab")));
    }

    #[test]
    fn test_static_and_instance_never_mix() {
        let ty = greeter();
        let instance = resolve(&ty, false, "name", InvocationKind::Get, &ArgShape::empty()).unwrap();
        assert!(matches!(instance.member(), BoundMember::InstanceField { .. }));
        let stat = resolve(&ty, true, "name", InvocationKind::Get, &ArgShape::empty()).unwrap();
        assert!(matches!(stat.member(), BoundMember::StaticField { .. }));
        assert!(resolve(&ty, true, "Greet", InvocationKind::Invoke, &ArgShape::positional(2)).is_none());
    }

    #[test]
    fn test_kind_compatibility() {
        let ty = TypeBuilder::class("test.Kinds")
            .readonly_field("id")
            .property("Label", |_| Ok(Value::from("label")))
            .method("Run", NO_PARAMS, |_, _| Ok(Value::Null))
            .build()
            .unwrap();
        let none = ArgShape::empty();
        assert!(resolve(&ty, false, "id", InvocationKind::Get, &none).is_some());
        assert!(resolve(&ty, false, "id", InvocationKind::Set, &none).is_none());
        assert!(resolve(&ty, false, "Label", InvocationKind::Set, &none).is_none());
        assert!(resolve(&ty, false, "Run", InvocationKind::Get, &none).is_none());
        assert!(resolve(&ty, false, "Missing", InvocationKind::Get, &none).is_none());
    }

    #[test]
    fn test_base_chain_and_shadowing() {
        let base = TypeBuilder::class("test.Base")
            .method("Who", NO_PARAMS, |_, _| Ok(Value::from("base")))
            .method("Only", NO_PARAMS, |_, _| Ok(Value::from("only")))
            .build()
            .unwrap();
        let derived = TypeBuilder::class("test.Derived")
            .extends(&base)
            .method("Who", NO_PARAMS, |_, _| Ok(Value::from("derived")))
            .build()
            .unwrap();
        let none = ArgShape::empty();
        let who = resolve(&derived, false, "Who", InvocationKind::Invoke, &none).unwrap();
        assert_eq!(who.declared_on().name(), "test.Derived");
        let only = resolve(&derived, false, "Only", InvocationKind::Invoke, &none).unwrap();
        assert_eq!(only.declared_on().name(), "test.Base");
        assert_eq!(only.owner().name(), "test.Derived");
    }

    #[test]
    fn test_constructors() {
        let point = TypeBuilder::class("test.Point")
            .field("x")
            .field("y")
            .field_constructor(["x", "y"])
            .build()
            .unwrap();
        let shape = names(&[Some("y"), Some("x")]);
        let b = resolve(&point, true, "", InvocationKind::Construct, &shape).unwrap();
        let ctx = InvocationContext::for_static(point.clone());
        let p = b.call(&ctx, &[Value::from(2), Value::from(1)], None).unwrap();
        assert_eq!(p.as_object().unwrap().get("x"), Some(Value::Int(1)));

        assert!(resolve(&point, false, "", InvocationKind::Construct, &ArgShape::positional(2)).is_none());

        let empty = TypeBuilder::class("test.Empty").build().unwrap();
        let b = resolve(&empty, true, "", InvocationKind::Construct, &ArgShape::empty()).unwrap();
        assert!(matches!(b.member(), BoundMember::DefaultConstructor));
        assert!(resolve(&empty, true, "", InvocationKind::Construct, &ArgShape::positional(1)).is_none());
    }
}
