//! Member definitions: the capability table of a type
//!
//! Every member a type declares is a [`MemberDef`]: a name, a static flag and
//! one of four shapes (field, property, method, indexer). Class members carry
//! their implementation as closures; interface members carry only the
//! signature. Constructors are kept apart in [`ConstructorDef`].

use std::fmt;
use std::sync::Arc;

use crate::error::{InvokeError, InvokeResult};
use crate::object::ObjectRef;
use crate::ty::TypeHandle;
use crate::value::Value;

/// Member name under which indexers are declared and resolved
pub const INDEXER_NAME: &str = "Item";

/// Empty parameter list, for zero-argument methods and constructors
pub const NO_PARAMS: [&str; 0] = [];

/// The receiver a member body runs against
#[derive(Debug, Clone, Copy)]
pub enum Receiver<'a> {
    /// An instance member invoked on a value
    Instance(&'a Value),
    /// A static member invoked on a type
    Type(&'a TypeHandle),
}

impl<'a> Receiver<'a> {
    /// The instance value, or an error for a static receiver
    pub fn value(&self) -> InvokeResult<&'a Value> {
        match *self {
            Receiver::Instance(v) => Ok(v),
            Receiver::Type(ty) => Err(InvokeError::TypeMismatch {
                expected: "instance".to_string(),
                got: format!("type {}", ty.name()),
            }),
        }
    }

    /// The instance as an object
    pub fn object(&self) -> InvokeResult<&'a ObjectRef> {
        let value = self.value()?;
        value.as_object().ok_or_else(|| InvokeError::TypeMismatch {
            expected: "object".to_string(),
            got: value.type_name().to_string(),
        })
    }

    /// The type, or an error for an instance receiver
    pub fn type_handle(&self) -> InvokeResult<&'a TypeHandle> {
        match *self {
            Receiver::Type(ty) => Ok(ty),
            Receiver::Instance(v) => Err(InvokeError::TypeMismatch {
                expected: "type".to_string(),
                got: v.type_name().to_string(),
            }),
        }
    }

    /// Whether this is a static receiver
    pub fn is_static(&self) -> bool {
        matches!(self, Receiver::Type(_))
    }
}

/// Property or field read
pub type Getter = Arc<dyn Fn(Receiver<'_>) -> InvokeResult<Value> + Send + Sync>;

/// Property write
pub type Setter = Arc<dyn Fn(Receiver<'_>, Value) -> InvokeResult<()> + Send + Sync>;

/// Method call or indexer read
pub type MethodFn = Arc<dyn Fn(Receiver<'_>, &[Value]) -> InvokeResult<Value> + Send + Sync>;

/// Indexer write
pub type IndexSetter = Arc<dyn Fn(Receiver<'_>, &[Value], Value) -> InvokeResult<()> + Send + Sync>;

/// Constructor body; receives the type being constructed
pub type ConstructorFn = Arc<dyn Fn(&TypeHandle, &[Value]) -> InvokeResult<Value> + Send + Sync>;

/// Read/write capability of a property or indexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyAccess {
    /// Readable only
    ReadOnly,
    /// Writable only
    WriteOnly,
    /// Readable and writable
    ReadWrite,
}

impl PropertyAccess {
    /// Whether reads are allowed
    pub fn can_read(self) -> bool {
        matches!(self, PropertyAccess::ReadOnly | PropertyAccess::ReadWrite)
    }

    /// Whether writes are allowed
    pub fn can_write(self) -> bool {
        matches!(self, PropertyAccess::WriteOnly | PropertyAccess::ReadWrite)
    }
}

/// Parameter definition for method, indexer and constructor signatures
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDefinition {
    /// Parameter name
    pub name: String,
    /// Whether this parameter may be omitted
    pub is_optional: bool,
    /// Value used when the parameter is omitted (null if unset)
    pub default: Option<Value>,
}

impl ParameterDefinition {
    /// Create a required parameter
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_optional: false,
            default: None,
        }
    }

    /// Mark as optional
    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }

    /// Mark as optional with a default value
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.is_optional = true;
        self.default = Some(value.into());
        self
    }
}

impl From<&str> for ParameterDefinition {
    fn from(name: &str) -> Self {
        ParameterDefinition::new(name)
    }
}

impl From<&&str> for ParameterDefinition {
    fn from(name: &&str) -> Self {
        ParameterDefinition::new(*name)
    }
}

impl From<String> for ParameterDefinition {
    fn from(name: String) -> Self {
        ParameterDefinition::new(name)
    }
}

/// Collect anything name-like into a parameter list
pub fn params<I, P>(iter: I) -> Vec<ParameterDefinition>
where
    I: IntoIterator<Item = P>,
    P: Into<ParameterDefinition>,
{
    iter.into_iter().map(Into::into).collect()
}

/// Data field stored in an object (or type) slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Slot index (instance slots for instance fields, static slots otherwise)
    pub slot: usize,
    /// Whether writes are rejected
    pub readonly: bool,
}

/// Computed property
#[derive(Clone)]
pub struct PropertyDef {
    /// Declared access
    pub access: PropertyAccess,
    /// Read body (classes only)
    pub getter: Option<Getter>,
    /// Write body (classes only)
    pub setter: Option<Setter>,
}

/// Method
#[derive(Clone)]
pub struct MethodDef {
    /// Declared parameters
    pub params: Vec<ParameterDefinition>,
    /// Body (classes only)
    pub body: Option<MethodFn>,
}

/// Indexer, declared under [`INDEXER_NAME`]
#[derive(Clone)]
pub struct IndexerDef {
    /// Index parameters
    pub params: Vec<ParameterDefinition>,
    /// Declared access
    pub access: PropertyAccess,
    /// Read body (classes only)
    pub getter: Option<MethodFn>,
    /// Write body (classes only)
    pub setter: Option<IndexSetter>,
}

/// Shape of a member
#[derive(Clone)]
pub enum MemberKind {
    /// Stored field
    Field(FieldDef),
    /// Computed property
    Property(PropertyDef),
    /// Method
    Method(MethodDef),
    /// Indexer
    Indexer(IndexerDef),
}

/// A declared member
#[derive(Clone)]
pub struct MemberDef {
    pub(crate) name: String,
    pub(crate) is_static: bool,
    pub(crate) kind: MemberKind,
}

impl MemberDef {
    /// Member name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the member is type-level
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Member shape
    pub fn kind(&self) -> &MemberKind {
        &self.kind
    }

    /// Declared parameters (empty for fields and properties)
    pub fn params(&self) -> &[ParameterDefinition] {
        match &self.kind {
            MemberKind::Method(m) => &m.params,
            MemberKind::Indexer(i) => &i.params,
            MemberKind::Field(_) | MemberKind::Property(_) => &[],
        }
    }

    /// Whether the member can be read as a value
    pub fn is_readable(&self) -> bool {
        match &self.kind {
            MemberKind::Field(_) => true,
            MemberKind::Property(p) => p.access.can_read(),
            MemberKind::Indexer(i) => i.access.can_read(),
            MemberKind::Method(_) => false,
        }
    }

    /// Whether the member can be written
    pub fn is_writable(&self) -> bool {
        match &self.kind {
            MemberKind::Field(f) => !f.readonly,
            MemberKind::Property(p) => p.access.can_write(),
            MemberKind::Indexer(i) => i.access.can_write(),
            MemberKind::Method(_) => false,
        }
    }

    /// Whether the member is a method
    pub fn is_method(&self) -> bool {
        matches!(self.kind, MemberKind::Method(_))
    }

    /// Whether the member is an indexer
    pub fn is_indexer(&self) -> bool {
        matches!(self.kind, MemberKind::Indexer(_))
    }

    /// Whether two members have the same signature: same category, same
    /// access and the same parameter names in the same order.
    pub fn same_shape(&self, other: &MemberDef) -> bool {
        if self.is_static != other.is_static {
            return false;
        }
        let same_params = || {
            self.params().len() == other.params().len()
                && self
                    .params()
                    .iter()
                    .zip(other.params())
                    .all(|(a, b)| a.name == b.name)
        };
        match (&self.kind, &other.kind) {
            (MemberKind::Field(_) | MemberKind::Property(_), MemberKind::Field(_) | MemberKind::Property(_)) => {
                self.is_readable() == other.is_readable() && self.is_writable() == other.is_writable()
            }
            (MemberKind::Method(_), MemberKind::Method(_)) => same_params(),
            (MemberKind::Indexer(a), MemberKind::Indexer(b)) => a.access == b.access && same_params(),
            _ => false,
        }
    }

    /// Short label of the member category, for diagnostics
    pub fn category(&self) -> &'static str {
        match self.kind {
            MemberKind::Field(_) => "field",
            MemberKind::Property(_) => "property",
            MemberKind::Method(_) => "method",
            MemberKind::Indexer(_) => "indexer",
        }
    }
}

impl fmt::Debug for MemberDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<&str> = self.params().iter().map(|p| p.name.as_str()).collect();
        f.debug_struct("MemberDef")
            .field("name", &self.name)
            .field("category", &self.category())
            .field("is_static", &self.is_static)
            .field("params", &params)
            .finish()
    }
}

/// Constructor definition
#[derive(Clone)]
pub struct ConstructorDef {
    /// Declared parameters
    pub params: Vec<ParameterDefinition>,
    /// Body
    pub body: ConstructorFn,
}

impl fmt::Debug for ConstructorDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<&str> = self.params.iter().map(|p| p.name.as_str()).collect();
        f.debug_struct("ConstructorDef").field("params", &params).finish()
    }
}
