//! Runtime object instances
//!
//! An object is a type handle plus a slot vector. Slot indices come from the
//! type's field layout; a derived class lays out its base's fields first, so
//! slot `n` means the same field for a base type and every type derived from it.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::ty::TypeHandle;
use crate::value::Value;

/// Shared handle to an object
pub type ObjectRef = Arc<Object>;

/// A runtime instance of a class descriptor
pub struct Object {
    ty: TypeHandle,
    fields: RwLock<Vec<Value>>,
}

impl Object {
    /// Create an object with every field set to null
    pub fn new(ty: &TypeHandle) -> Self {
        Self {
            ty: ty.clone(),
            fields: RwLock::new(vec![Value::Null; ty.field_count()]),
        }
    }

    /// Create an object and wrap it as a value
    pub fn alloc(ty: &TypeHandle) -> Value {
        Value::Object(Arc::new(Self::new(ty)))
    }

    /// The object's class
    pub fn ty(&self) -> &TypeHandle {
        &self.ty
    }

    /// Number of field slots
    pub fn field_count(&self) -> usize {
        self.fields.read().len()
    }

    /// Read a field slot
    pub fn get_slot(&self, slot: usize) -> Option<Value> {
        self.fields.read().get(slot).cloned()
    }

    /// Write a field slot; returns false if the slot does not exist
    pub fn set_slot(&self, slot: usize, value: Value) -> bool {
        match self.fields.write().get_mut(slot) {
            Some(field) => {
                *field = value;
                true
            }
            None => false,
        }
    }

    /// Read a field by name
    pub fn get(&self, name: &str) -> Option<Value> {
        self.ty.field_slot(name).and_then(|slot| self.get_slot(slot))
    }

    /// Write a field by name; returns false if the field does not exist
    pub fn set(&self, name: &str, value: impl Into<Value>) -> bool {
        match self.ty.field_slot(name) {
            Some(slot) => self.set_slot(slot, value.into()),
            None => false,
        }
    }

    /// Copy of all slot values
    pub fn slots(&self) -> Vec<Value> {
        self.fields.read().clone()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("type", &self.ty.name())
            .field("fields", &self.field_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TypeBuilder;

    #[test]
    fn test_object_fields_by_name() {
        let ty = TypeBuilder::class("test.Point")
            .field("x")
            .field("y")
            .build()
            .unwrap();
        let obj = Object::new(&ty);

        assert_eq!(obj.field_count(), 2);
        assert!(obj.set("x", 3));
        assert_eq!(obj.get("x"), Some(Value::Int(3)));
        assert_eq!(obj.get("y"), Some(Value::Null));
        assert!(!obj.set("z", 1));
        assert_eq!(obj.get("z"), None);
    }

    #[test]
    fn test_derived_layout_keeps_base_slots() {
        let base = TypeBuilder::class("test.Shape").field("name").build().unwrap();
        let derived = TypeBuilder::class("test.Circle")
            .extends(&base)
            .field("radius")
            .build()
            .unwrap();

        assert_eq!(derived.field_slot("name"), base.field_slot("name"));
        assert_eq!(derived.field_slot("radius"), Some(1));

        let obj = Object::new(&derived);
        obj.set("name", "c");
        assert_eq!(obj.get_slot(0), Some(Value::from("c")));
    }
}
