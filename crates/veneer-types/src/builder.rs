//! Runtime type builder
//!
//! Classes and interfaces are assembled at runtime and frozen into a
//! [`TypeHandle`]. The builder collects definition problems instead of
//! failing on the first one, and `build` reports them all at once.
//!
//! ```rust,ignore
//! let person = TypeBuilder::class("acme.Person")
//!     .field("name")
//!     .method("Greet", ["greeting"], |this, args| {
//!         let name = this.object()?.get("name").unwrap_or_default();
//!         Ok(Value::from(format!("{}, {}", args[0], name)))
//!     })
//!     .field_constructor(["name"])
//!     .build()?;
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::{InvokeError, InvokeResult, TypeError};
use crate::member::{
    params, ConstructorDef, FieldDef, IndexSetter, IndexerDef, MemberDef, MemberKind, MethodDef,
    ParameterDefinition, PropertyAccess, PropertyDef, Receiver, INDEXER_NAME,
};
use crate::object::Object;
use crate::ty::{TypeDescriptor, TypeHandle, TypeId, TypeKind};
use crate::value::Value;

/// Builder for class, interface and primitive descriptors
pub struct TypeBuilder {
    name: String,
    kind: TypeKind,
    base: Option<TypeHandle>,
    extends: Vec<TypeHandle>,
    members: Vec<MemberDef>,
    constructors: Vec<ConstructorDef>,
    statics: Vec<Value>,
    instance_fields: usize,
    problems: Vec<String>,
}

impl TypeBuilder {
    fn new(name: String, kind: TypeKind) -> Self {
        Self {
            name,
            kind,
            base: None,
            extends: Vec::new(),
            members: Vec::new(),
            constructors: Vec::new(),
            statics: Vec::new(),
            instance_fields: 0,
            problems: Vec::new(),
        }
    }

    /// Start a class definition
    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name.into(), TypeKind::Class)
    }

    /// Start an interface definition
    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name.into(), TypeKind::Interface)
    }

    pub(crate) fn primitive(name: &str) -> Self {
        Self::new(name.to_string(), TypeKind::Primitive)
    }

    /// Derive from a base class (classes) or extend an interface (interfaces)
    pub fn extends(mut self, parent: &TypeHandle) -> Self {
        match (self.kind, parent.kind()) {
            (TypeKind::Interface, TypeKind::Interface) => self.extends.push(parent.clone()),
            (TypeKind::Class, TypeKind::Class) => {
                if self.base.is_some() {
                    self.problems.push("a class has at most one base class".to_string());
                }
                self.base = Some(parent.clone());
            }
            (_, kind) => self
                .problems
                .push(format!("cannot extend {} ({:?})", parent.name(), kind)),
        }
        self
    }

    /// Declare an implemented interface
    pub fn implements(mut self, iface: &TypeHandle) -> Self {
        if iface.is_interface() {
            self.extends.push(iface.clone());
        } else {
            self.problems
                .push(format!("{} is not an interface", iface.name()));
        }
        self
    }

    fn push(mut self, name: String, is_static: bool, kind: MemberKind) -> Self {
        self.members.push(MemberDef {
            name,
            is_static,
            kind,
        });
        self
    }

    fn push_field(mut self, name: impl Into<String>, readonly: bool) -> Self {
        let slot = self.instance_fields;
        self.instance_fields += 1;
        self.push(name.into(), false, MemberKind::Field(FieldDef { slot, readonly }))
    }

    /// Declare a writable instance field
    pub fn field(self, name: impl Into<String>) -> Self {
        self.push_field(name, false)
    }

    /// Declare a read-only instance field
    pub fn readonly_field(self, name: impl Into<String>) -> Self {
        self.push_field(name, true)
    }

    /// Declare a static field with its initial value
    pub fn static_field(mut self, name: impl Into<String>, initial: impl Into<Value>) -> Self {
        let slot = self.statics.len();
        self.statics.push(initial.into());
        self.push(name.into(), true, MemberKind::Field(FieldDef { slot, readonly: false }))
    }

    fn push_property(
        self,
        name: String,
        is_static: bool,
        access: PropertyAccess,
        getter: Option<crate::member::Getter>,
        setter: Option<crate::member::Setter>,
    ) -> Self {
        self.push(
            name,
            is_static,
            MemberKind::Property(PropertyDef {
                access,
                getter,
                setter,
            }),
        )
    }

    /// Declare a read-only computed property
    pub fn property<G>(self, name: impl Into<String>, getter: G) -> Self
    where
        G: Fn(Receiver<'_>) -> InvokeResult<Value> + Send + Sync + 'static,
    {
        self.push_property(name.into(), false, PropertyAccess::ReadOnly, Some(Arc::new(getter)), None)
    }

    /// Declare a read/write computed property
    pub fn property_rw<G, S>(self, name: impl Into<String>, getter: G, setter: S) -> Self
    where
        G: Fn(Receiver<'_>) -> InvokeResult<Value> + Send + Sync + 'static,
        S: Fn(Receiver<'_>, Value) -> InvokeResult<()> + Send + Sync + 'static,
    {
        self.push_property(
            name.into(),
            false,
            PropertyAccess::ReadWrite,
            Some(Arc::new(getter)),
            Some(Arc::new(setter)),
        )
    }

    /// Declare a read-only static property
    pub fn static_property<G>(self, name: impl Into<String>, getter: G) -> Self
    where
        G: Fn(Receiver<'_>) -> InvokeResult<Value> + Send + Sync + 'static,
    {
        self.push_property(name.into(), true, PropertyAccess::ReadOnly, Some(Arc::new(getter)), None)
    }

    /// Declare an instance method
    pub fn method<P, F>(self, name: impl Into<String>, parameters: impl IntoIterator<Item = P>, body: F) -> Self
    where
        P: Into<ParameterDefinition>,
        F: Fn(Receiver<'_>, &[Value]) -> InvokeResult<Value> + Send + Sync + 'static,
    {
        let def = MethodDef {
            params: params(parameters),
            body: Some(Arc::new(body)),
        };
        self.push(name.into(), false, MemberKind::Method(def))
    }

    /// Declare a static method
    pub fn static_method<P, F>(
        self,
        name: impl Into<String>,
        parameters: impl IntoIterator<Item = P>,
        body: F,
    ) -> Self
    where
        P: Into<ParameterDefinition>,
        F: Fn(Receiver<'_>, &[Value]) -> InvokeResult<Value> + Send + Sync + 'static,
    {
        let def = MethodDef {
            params: params(parameters),
            body: Some(Arc::new(body)),
        };
        self.push(name.into(), true, MemberKind::Method(def))
    }

    /// Declare a read-only indexer
    pub fn indexer<P, G>(self, parameters: impl IntoIterator<Item = P>, getter: G) -> Self
    where
        P: Into<ParameterDefinition>,
        G: Fn(Receiver<'_>, &[Value]) -> InvokeResult<Value> + Send + Sync + 'static,
    {
        let def = IndexerDef {
            params: params(parameters),
            access: PropertyAccess::ReadOnly,
            getter: Some(Arc::new(getter)),
            setter: None,
        };
        self.push(INDEXER_NAME.to_string(), false, MemberKind::Indexer(def))
    }

    /// Declare a read/write indexer
    pub fn indexer_rw<P, G, S>(self, parameters: impl IntoIterator<Item = P>, getter: G, setter: S) -> Self
    where
        P: Into<ParameterDefinition>,
        G: Fn(Receiver<'_>, &[Value]) -> InvokeResult<Value> + Send + Sync + 'static,
        S: Fn(Receiver<'_>, &[Value], Value) -> InvokeResult<()> + Send + Sync + 'static,
    {
        let setter: IndexSetter = Arc::new(setter);
        let def = IndexerDef {
            params: params(parameters),
            access: PropertyAccess::ReadWrite,
            getter: Some(Arc::new(getter)),
            setter: Some(setter),
        };
        self.push(INDEXER_NAME.to_string(), false, MemberKind::Indexer(def))
    }

    /// Declare a constructor
    pub fn constructor<P, F>(mut self, parameters: impl IntoIterator<Item = P>, body: F) -> Self
    where
        P: Into<ParameterDefinition>,
        F: Fn(&TypeHandle, &[Value]) -> InvokeResult<Value> + Send + Sync + 'static,
    {
        self.constructors.push(ConstructorDef {
            params: params(parameters),
            body: Arc::new(body),
        });
        self
    }

    /// Declare a constructor that assigns each argument to the field of the
    /// same name
    pub fn field_constructor<P>(self, fields: impl IntoIterator<Item = P>) -> Self
    where
        P: Into<ParameterDefinition>,
    {
        let parameters = params(fields);
        let names: Vec<String> = parameters.iter().map(|p| p.name.clone()).collect();
        self.constructor(parameters, move |ty: &TypeHandle, args: &[Value]| {
            let obj = Object::new(ty);
            for (name, value) in names.iter().zip(args) {
                if !obj.set(name, value.clone()) {
                    return Err(InvokeError::Fault(format!(
                        "{} has no field '{}'",
                        ty.name(),
                        name
                    )));
                }
            }
            Ok(Value::Object(Arc::new(obj)))
        })
    }

    /// Declare a property signature (interfaces)
    pub fn property_sig(self, name: impl Into<String>, access: PropertyAccess) -> Self {
        self.push_property(name.into(), false, access, None, None)
    }

    /// Declare a method signature (interfaces)
    pub fn method_sig<P>(self, name: impl Into<String>, parameters: impl IntoIterator<Item = P>) -> Self
    where
        P: Into<ParameterDefinition>,
    {
        let def = MethodDef {
            params: params(parameters),
            body: None,
        };
        self.push(name.into(), false, MemberKind::Method(def))
    }

    /// Declare an indexer signature (interfaces)
    pub fn indexer_sig<P>(self, parameters: impl IntoIterator<Item = P>, access: PropertyAccess) -> Self
    where
        P: Into<ParameterDefinition>,
    {
        let def = IndexerDef {
            params: params(parameters),
            access,
            getter: None,
            setter: None,
        };
        self.push(INDEXER_NAME.to_string(), false, MemberKind::Indexer(def))
    }

    fn validate(&self) -> Vec<String> {
        let mut problems = self.problems.clone();
        let is_interface = self.kind == TypeKind::Interface;

        if is_interface && !self.constructors.is_empty() {
            problems.push("interfaces cannot declare constructors".to_string());
        }

        let mut data_members: Vec<(&str, bool)> = Vec::new();
        for member in &self.members {
            let has_body = match member.kind() {
                MemberKind::Field(_) => {
                    if is_interface {
                        problems.push(format!("interfaces cannot declare field '{}'", member.name()));
                    }
                    true
                }
                MemberKind::Property(p) => p.getter.is_some() || p.setter.is_some(),
                MemberKind::Method(m) => m.body.is_some(),
                MemberKind::Indexer(i) => {
                    if i.params.is_empty() {
                        problems.push("indexers take at least one parameter".to_string());
                    }
                    i.getter.is_some() || i.setter.is_some()
                }
            };
            match (is_interface, has_body) {
                (true, true) if !matches!(member.kind(), MemberKind::Field(_)) => problems.push(
                    format!("interface member '{}' cannot have an implementation", member.name()),
                ),
                (false, false) => problems.push(format!(
                    "class member '{}' has no implementation",
                    member.name()
                )),
                _ => {}
            }

            if matches!(member.kind(), MemberKind::Field(_) | MemberKind::Property(_)) {
                let key = (member.name(), member.is_static());
                if data_members.contains(&key) {
                    problems.push(format!("duplicate member '{}'", member.name()));
                } else {
                    data_members.push(key);
                }
            }
        }
        problems
    }

    /// Validate and freeze the descriptor
    pub fn build(self) -> Result<TypeHandle, TypeError> {
        let problems = self.validate();
        if !problems.is_empty() {
            return Err(TypeError::InvalidDefinition {
                type_name: self.name,
                reason: problems.join("; "),
            });
        }
        Ok(self.finish())
    }

    /// Freeze without validation; only for definitions known to be valid
    pub(crate) fn finish(self) -> TypeHandle {
        let inherited = self.base.as_ref().map_or(0, |b| b.field_count());
        let mut members = self.members;
        for member in members.iter_mut() {
            if let MemberKind::Field(f) = &mut member.kind {
                if !member.is_static {
                    f.slot += inherited;
                }
            }
        }

        let mut member_index: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        for (i, member) in members.iter().enumerate() {
            member_index.entry(member.name.clone()).or_default().push(i);
        }

        Arc::new(TypeDescriptor {
            id: TypeId::next(),
            name: self.name,
            kind: self.kind,
            base: self.base,
            extends: self.extends,
            members,
            member_index,
            constructors: self.constructors,
            field_count: inherited + self.instance_fields,
            statics: RwLock::new(self.statics),
        })
    }
}
