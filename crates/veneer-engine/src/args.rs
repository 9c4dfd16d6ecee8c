//! Invocation kinds and argument shapes

use std::fmt;

use veneer_types::Value;

/// Member name used in cache keys for constructor lookups
pub const CONSTRUCTOR_NAME: &str = "new";

/// What the caller is doing with a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvocationKind {
    /// Read a field or property
    Get,
    /// Write a field or property
    Set,
    /// Call a method
    Invoke,
    /// Read through an indexer
    Index,
    /// Write through an indexer
    SetIndex,
    /// Call a constructor (static context only)
    Construct,
}

impl fmt::Display for InvocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InvocationKind::Get => "get",
            InvocationKind::Set => "set",
            InvocationKind::Invoke => "invoke",
            InvocationKind::Index => "index",
            InvocationKind::SetIndex => "index assignment",
            InvocationKind::Construct => "construction",
        };
        f.write_str(name)
    }
}

/// A supplied argument, optionally named
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    /// Keyword name, if the caller supplied one
    pub name: Option<String>,
    /// Argument value
    pub value: Value,
}

impl Argument {
    /// Positional argument
    pub fn positional(value: impl Into<Value>) -> Self {
        Self {
            name: None,
            value: value.into(),
        }
    }

    /// Named argument
    pub fn named(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: Some(name.into()),
            value: value.into(),
        }
    }
}

impl From<Value> for Argument {
    fn from(value: Value) -> Self {
        Argument::positional(value)
    }
}

/// Wrap plain values as positional arguments
pub fn positional<I, V>(values: I) -> Vec<Argument>
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    values.into_iter().map(Argument::positional).collect()
}

/// Arity plus the optional name of each argument position
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ArgShape(Vec<Option<String>>);

impl ArgShape {
    /// Shape with no arguments
    pub fn empty() -> Self {
        Self::default()
    }

    /// Shape of `n` positional arguments
    pub fn positional(n: usize) -> Self {
        Self(vec![None; n])
    }

    /// Shape of a supplied argument list
    pub fn of(args: &[Argument]) -> Self {
        Self(args.iter().map(|a| a.name.clone()).collect())
    }

    /// Number of arguments
    pub fn arity(&self) -> usize {
        self.0.len()
    }

    /// Name at each position
    pub fn names(&self) -> &[Option<String>] {
        &self.0
    }

    /// Whether any argument is named
    pub fn has_names(&self) -> bool {
        self.0.iter().any(Option::is_some)
    }
}

impl fmt::Display for ArgShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, name) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match name {
                Some(name) => write!(f, "{}:", name)?,
                None => write!(f, "_")?,
            }
        }
        write!(f, ")")
    }
}
