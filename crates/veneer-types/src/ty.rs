//! Type descriptors
//!
//! A [`TypeDescriptor`] is the capability table a projection binds against:
//! its name, kind, base class, extended interfaces, declared members and
//! constructors. Descriptors are immutable once built (static field storage
//! aside) and shared as [`TypeHandle`]s, which is what makes it sound to cache
//! member resolutions by [`TypeId`] for the lifetime of the process.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::member::{ConstructorDef, MemberDef, MemberKind};
use crate::value::Value;

/// Process-unique identifier of a type descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(u32);

impl TypeId {
    /// Allocate a fresh identifier
    pub(crate) fn next() -> Self {
        static NEXT_ID: AtomicU32 = AtomicU32::new(1);
        TypeId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Create from a raw value (for payloads carrying a type identity)
    pub fn from_raw(raw: u32) -> Self {
        TypeId(raw)
    }

    /// Get the raw ID value
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

/// What a descriptor describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Concrete class with implemented members
    Class,
    /// Interface: member signatures only
    Interface,
    /// Builtin primitive (bool, int, float, string, list)
    Primitive,
}

/// Shared handle to a type descriptor
pub type TypeHandle = Arc<TypeDescriptor>;

/// Runtime description of a class, interface or primitive type
pub struct TypeDescriptor {
    pub(crate) id: TypeId,
    pub(crate) name: String,
    pub(crate) kind: TypeKind,
    pub(crate) base: Option<TypeHandle>,
    pub(crate) extends: Vec<TypeHandle>,
    pub(crate) members: Vec<MemberDef>,
    pub(crate) member_index: FxHashMap<String, Vec<usize>>,
    pub(crate) constructors: Vec<ConstructorDef>,
    /// Total instance slots, inherited ones included
    pub(crate) field_count: usize,
    pub(crate) statics: RwLock<Vec<Value>>,
}

impl TypeDescriptor {
    /// Unique type ID
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully-qualified name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type kind
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Whether this is an interface
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    /// Base class, if any
    pub fn base(&self) -> Option<&TypeHandle> {
        self.base.as_ref()
    }

    /// Interfaces this type implements (classes) or extends (interfaces)
    pub fn extends(&self) -> &[TypeHandle] {
        &self.extends
    }

    /// Members declared directly on this type, in declaration order
    pub fn members(&self) -> &[MemberDef] {
        &self.members
    }

    /// Members with `name` declared directly on this type
    pub fn declared<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a MemberDef> + 'a {
        let indices: &'a [usize] = self
            .member_index
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        indices.iter().map(move |&i| &self.members[i])
    }

    /// Declared constructors
    pub fn constructors(&self) -> &[ConstructorDef] {
        &self.constructors
    }

    /// Number of instance field slots, inherited ones included
    pub fn field_count(&self) -> usize {
        self.field_count
    }

    /// Slot of the instance field `name`, searching the base chain
    pub fn field_slot(&self, name: &str) -> Option<usize> {
        let own = self.declared(name).find_map(|m| match m.kind() {
            MemberKind::Field(f) if !m.is_static() => Some(f.slot),
            _ => None,
        });
        own.or_else(|| self.base.as_ref().and_then(|b| b.field_slot(name)))
    }

    /// Instance fields as `(name, slot)`, base fields first
    pub fn instance_fields(&self) -> Vec<(String, usize)> {
        let mut fields = self
            .base
            .as_ref()
            .map(|b| b.instance_fields())
            .unwrap_or_default();
        for member in &self.members {
            if let MemberKind::Field(f) = member.kind() {
                if !member.is_static() {
                    fields.push((member.name.clone(), f.slot));
                }
            }
        }
        fields
    }

    /// Names of members visible in the given mode, base chain included,
    /// first occurrence first
    pub fn member_names(&self, is_static: bool) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let mut current = Some(self);
        while let Some(ty) = current {
            for member in ty.members.iter().filter(|m| m.is_static() == is_static) {
                if !names.iter().any(|n| n == member.name()) {
                    names.push(member.name.clone());
                }
            }
            current = ty.base.as_deref();
        }
        names
    }

    /// Read a static field slot
    pub fn static_value(&self, slot: usize) -> Option<Value> {
        self.statics.read().get(slot).cloned()
    }

    /// Write a static field slot; returns false if the slot does not exist
    pub fn set_static_value(&self, slot: usize, value: Value) -> bool {
        match self.statics.write().get_mut(slot) {
            Some(v) => {
                *v = value;
                true
            }
            None => false,
        }
    }

    /// Whether this type is `other`, derives from it, or implements it
    pub fn is_subtype_of(&self, other: &TypeDescriptor) -> bool {
        self.id == other.id
            || self.base.as_ref().is_some_and(|b| b.is_subtype_of(other))
            || self.extends.iter().any(|i| i.is_subtype_of(other))
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("base", &self.base.as_ref().map(|b| b.name()))
            .field("members", &self.members.len())
            .finish()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Walks a type and its base classes, most derived first
pub struct Ancestry<'a> {
    next: Option<&'a TypeHandle>,
}

impl<'a> Iterator for Ancestry<'a> {
    type Item = &'a TypeHandle;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.base();
        Some(current)
    }
}

/// Iterate `ty` and its base chain
pub fn ancestry(ty: &TypeHandle) -> Ancestry<'_> {
    Ancestry { next: Some(ty) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TypeBuilder;
    use crate::member::NO_PARAMS;

    #[test]
    fn test_type_ids_are_unique() {
        let a = TypeId::next();
        let b = TypeId::next();
        assert_ne!(a, b);
        assert_eq!(TypeId::from_raw(a.as_u32()), a);
    }

    #[test]
    fn test_member_names_follow_mode_and_base_chain() {
        let base = TypeBuilder::class("test.Base")
            .field("id")
            .static_field("Count", 0)
            .build()
            .unwrap();
        let derived = TypeBuilder::class("test.Derived")
            .extends(&base)
            .field("name")
            .method("Describe", NO_PARAMS, |_, _| Ok(Value::Null))
            .build()
            .unwrap();

        assert_eq!(derived.member_names(false), vec!["name", "Describe", "id"]);
        assert_eq!(derived.member_names(true), vec!["Count"]);
    }

    #[test]
    fn test_ancestry_and_subtyping() {
        let iface = TypeBuilder::interface("test.INamed").build().unwrap();
        let base = TypeBuilder::class("test.A").implements(&iface).build().unwrap();
        let derived = TypeBuilder::class("test.B").extends(&base).build().unwrap();

        let names: Vec<&str> = ancestry(&derived).map(|t| t.name()).collect();
        assert_eq!(names, vec!["test.B", "test.A"]);
        assert!(derived.is_subtype_of(&base));
        assert!(derived.is_subtype_of(&iface));
        assert!(!base.is_subtype_of(&derived));
    }

    #[test]
    fn test_static_storage() {
        let ty = TypeBuilder::class("test.Counter")
            .static_field("Count", 5)
            .build()
            .unwrap();
        assert_eq!(ty.static_value(0), Some(Value::Int(5)));
        assert!(ty.set_static_value(0, Value::Int(6)));
        assert_eq!(ty.static_value(0), Some(Value::Int(6)));
        assert!(!ty.set_static_value(3, Value::Null));
    }
}
