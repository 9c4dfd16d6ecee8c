//! Dynamic values flowing through projections
//!
//! Primitive values (`null`, `bool`, `int`, `float`, `string`) are stored
//! inline. Lists and objects are reference values: cloning a `Value` clones
//! the handle, not the referenced state. Objects compare by identity; lists
//! compare element-wise, and cyclic lists compare and print without looping.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::builtins;
use crate::object::ObjectRef;
use crate::ty::TypeHandle;

/// Shared, mutable list storage
pub type ListRef = Arc<RwLock<Vec<Value>>>;

/// A dynamically typed value
#[derive(Clone, Default)]
pub enum Value {
    /// Absence of a value; also the neutral result of a lenient read
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// UTF-8 string
    Str(String),
    /// Reference to a shared list
    List(ListRef),
    /// Reference to a runtime object
    Object(ObjectRef),
}

impl Value {
    /// Create a string value
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    /// Create a new list value owning `items`
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Arc::new(RwLock::new(items)))
    }

    /// Name of the value's runtime type
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => builtins::BOOL,
            Value::Int(_) => builtins::INT,
            Value::Float(_) => builtins::FLOAT,
            Value::Str(_) => builtins::STRING,
            Value::List(_) => builtins::LIST,
            Value::Object(obj) => obj.ty().name(),
        }
    }

    /// Descriptor of the value's runtime type (`None` for null)
    pub fn runtime_type(&self) -> Option<TypeHandle> {
        match self {
            Value::Null => None,
            Value::Object(obj) => Some(obj.ty().clone()),
            _ => builtins::type_of(self),
        }
    }

    /// Check for null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as float, widening integers
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get the list handle
    pub fn as_list(&self) -> Option<&ListRef> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Get the object handle
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Identity comparison for reference values, equality for primitives
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => self == other,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => lists_eq(a, b, &mut Vec::new()),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Element-wise list equality. A pair of lists already under comparison
/// counts as equal, so self-referencing lists terminate.
fn lists_eq(a: &ListRef, b: &ListRef, pending: &mut Vec<(usize, usize)>) -> bool {
    if Arc::ptr_eq(a, b) {
        return true;
    }
    let pair = (Arc::as_ptr(a) as usize, Arc::as_ptr(b) as usize);
    if pending.contains(&pair) {
        return true;
    }
    // Copy out so no lock is held while nested lists are read
    let (xs, ys) = (a.read().clone(), b.read().clone());
    if xs.len() != ys.len() {
        return false;
    }
    pending.push(pair);
    let equal = xs.iter().zip(&ys).all(|(x, y)| match (x, y) {
        (Value::List(x), Value::List(y)) => lists_eq(x, y, pending),
        _ => x == y,
    });
    pending.pop();
    equal
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Int(i) => write!(f, "Int({})", i),
            Value::Float(x) => write!(f, "Float({})", x),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::List(l) => write!(f, "List(len={})", l.read().len()),
            Value::Object(o) => write!(f, "Object({})", o.ty().name()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        display(self, f, &mut Vec::new())
    }
}

/// `open` holds the lists currently being printed; a list reached again
/// through itself prints as `[...]`
fn display(value: &Value, f: &mut fmt::Formatter<'_>, open: &mut Vec<usize>) -> fmt::Result {
    match value {
        Value::Null => write!(f, "null"),
        Value::Bool(b) => write!(f, "{}", b),
        Value::Int(i) => write!(f, "{}", i),
        Value::Float(x) => write!(f, "{}", x),
        Value::Str(s) => write!(f, "{}", s),
        Value::List(l) => {
            let addr = Arc::as_ptr(l) as usize;
            if open.contains(&addr) {
                return write!(f, "[...]");
            }
            let items = l.read().clone();
            open.push(addr);
            write!(f, "[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                display(item, f, open)?;
            }
            open.pop();
            write!(f, "]")
        }
        Value::Object(o) => write!(f, "<{}>", o.ty().name()),
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<ObjectRef> for Value {
    fn from(o: ObjectRef) -> Self {
        Value::Object(o)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
