//! Builtin primitive descriptors
//!
//! Primitive values get descriptors too, so a projection over a string or a
//! list binds members the same way it does over an object.

use once_cell::sync::Lazy;

use crate::builder::TypeBuilder;
use crate::error::{InvokeError, InvokeResult};
use crate::member::{Receiver, NO_PARAMS};
use crate::ty::TypeHandle;
use crate::value::{ListRef, Value};

/// Name of the boolean type
pub const BOOL: &str = "bool";
/// Name of the integer type
pub const INT: &str = "int";
/// Name of the float type
pub const FLOAT: &str = "float";
/// Name of the string type
pub const STRING: &str = "string";
/// Name of the list type
pub const LIST: &str = "list";

/// The builtin descriptors
pub struct Builtins {
    /// `bool`
    pub bool_type: TypeHandle,
    /// `int`
    pub int_type: TypeHandle,
    /// `float`
    pub float_type: TypeHandle,
    /// `string`
    pub string_type: TypeHandle,
    /// `list`
    pub list_type: TypeHandle,
}

impl Builtins {
    /// All builtin descriptors
    pub fn all(&self) -> [&TypeHandle; 5] {
        [
            &self.bool_type,
            &self.int_type,
            &self.float_type,
            &self.string_type,
            &self.list_type,
        ]
    }
}

static BUILTINS: Lazy<Builtins> = Lazy::new(|| Builtins {
    bool_type: scalar(BOOL),
    int_type: scalar(INT),
    float_type: scalar(FLOAT),
    string_type: string_type(),
    list_type: list_type(),
});

/// Process-wide builtin descriptors
pub fn builtins() -> &'static Builtins {
    &BUILTINS
}

/// Descriptor of a primitive value (`None` for null and objects)
pub fn type_of(value: &Value) -> Option<TypeHandle> {
    let b = builtins();
    let ty = match value {
        Value::Bool(_) => &b.bool_type,
        Value::Int(_) => &b.int_type,
        Value::Float(_) => &b.float_type,
        Value::Str(_) => &b.string_type,
        Value::List(_) => &b.list_type,
        Value::Null | Value::Object(_) => return None,
    };
    Some(ty.clone())
}

fn scalar(name: &str) -> TypeHandle {
    TypeBuilder::primitive(name)
        .method("ToString", NO_PARAMS, |this, _| {
            Ok(Value::Str(this.value()?.to_string()))
        })
        .finish()
}

fn this_str<'a>(this: Receiver<'a>) -> InvokeResult<&'a str> {
    let value = this.value()?;
    value.as_str().ok_or_else(|| InvokeError::TypeMismatch {
        expected: STRING.to_string(),
        got: value.type_name().to_string(),
    })
}

fn this_list<'a>(this: Receiver<'a>) -> InvokeResult<&'a ListRef> {
    let value = this.value()?;
    value.as_list().ok_or_else(|| InvokeError::TypeMismatch {
        expected: LIST.to_string(),
        got: value.type_name().to_string(),
    })
}

fn index_arg(args: &[Value], len: usize) -> InvokeResult<usize> {
    let arg = args.first().ok_or(InvokeError::ArgumentCount {
        expected: 1,
        actual: 0,
    })?;
    let index = arg.as_int().ok_or_else(|| InvokeError::TypeMismatch {
        expected: INT.to_string(),
        got: arg.type_name().to_string(),
    })?;
    if index < 0 || index as usize >= len {
        return Err(InvokeError::IndexOutOfBounds { index, len });
    }
    Ok(index as usize)
}

fn string_type() -> TypeHandle {
    TypeBuilder::primitive(STRING)
        .property("Length", |this| {
            Ok(Value::Int(this_str(this)?.chars().count() as i64))
        })
        .method("ToUpper", NO_PARAMS, |this, _| {
            Ok(Value::Str(this_str(this)?.to_uppercase()))
        })
        .method("ToLower", NO_PARAMS, |this, _| {
            Ok(Value::Str(this_str(this)?.to_lowercase()))
        })
        .method("Contains", ["value"], |this, args| {
            let needle = args[0].to_string();
            Ok(Value::Bool(this_str(this)?.contains(needle.as_str())))
        })
        .method("ToString", NO_PARAMS, |this, _| {
            Ok(Value::str(this_str(this)?))
        })
        .indexer(["index"], |this, args| {
            let s = this_str(this)?;
            let index = index_arg(args, s.chars().count())?;
            Ok(s.chars().nth(index).map(|c| Value::Str(c.to_string())).unwrap_or_default())
        })
        .finish()
}

fn list_type() -> TypeHandle {
    TypeBuilder::primitive(LIST)
        .property("Count", |this| {
            Ok(Value::Int(this_list(this)?.read().len() as i64))
        })
        .method("Add", ["item"], |this, args| {
            this_list(this)?.write().push(args[0].clone());
            Ok(Value::Null)
        })
        .method("Contains", ["item"], |this, args| {
            let items = this_list(this)?.read().clone();
            Ok(Value::Bool(items.contains(&args[0])))
        })
        .method("Clear", NO_PARAMS, |this, _| {
            this_list(this)?.write().clear();
            Ok(Value::Null)
        })
        .method("ToString", NO_PARAMS, |this, _| {
            Ok(Value::Str(this.value()?.to_string()))
        })
        .indexer_rw(
            ["index"],
            |this, args| {
                let items = this_list(this)?.read();
                let index = index_arg(args, items.len())?;
                Ok(items[index].clone())
            },
            |this, args, value| {
                let mut items = this_list(this)?.write();
                let index = index_arg(args, items.len())?;
                items[index] = value;
                Ok(())
            },
        )
        .finish()
}
