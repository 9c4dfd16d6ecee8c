//! Value snapshots
//!
//! A [`ValueSnapshot`] is a serde-friendly copy of a value graph. Objects and
//! lists get a per-capture id on first visit; later visits of the same
//! reference become [`ValueSnapshot::Ref`], so shared and cyclic references
//! come back as shared and cyclic.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::object::Object;
use crate::registry::TypeRegistry;
use crate::value::Value;

/// Serializable copy of a [`Value`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum ValueSnapshot {
    /// `null`
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// String
    Str(String),
    /// First visit of a list
    List {
        /// Capture-local id
        id: u32,
        /// Elements
        items: Vec<ValueSnapshot>,
    },
    /// First visit of an object
    Object {
        /// Capture-local id
        id: u32,
        /// Fully-qualified class name
        type_name: String,
        /// Instance fields in layout order
        fields: Vec<FieldSnapshot>,
    },
    /// Back-reference to an already captured list or object
    Ref(u32),
}

/// One captured instance field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSnapshot {
    /// Field name
    pub name: String,
    /// Field value
    pub value: ValueSnapshot,
}

impl ValueSnapshot {
    /// Capture a value graph
    pub fn capture(value: &Value) -> Self {
        Capture::default().visit(value)
    }

    /// Rebuild the value graph, resolving class names through `registry`
    pub fn restore(&self, registry: &TypeRegistry) -> Result<Value, TypeError> {
        Restore {
            registry,
            seen: FxHashMap::default(),
        }
        .visit(self)
    }

    /// Class name of the captured root, if it is an object
    pub fn type_name(&self) -> Option<&str> {
        match self {
            ValueSnapshot::Object { type_name, .. } => Some(type_name),
            _ => None,
        }
    }
}

#[derive(Default)]
struct Capture {
    ids: FxHashMap<usize, u32>,
}

impl Capture {
    fn id_for(&mut self, addr: usize) -> Result<u32, u32> {
        if let Some(&id) = self.ids.get(&addr) {
            return Err(id);
        }
        let id = self.ids.len() as u32;
        self.ids.insert(addr, id);
        Ok(id)
    }

    fn visit(&mut self, value: &Value) -> ValueSnapshot {
        match value {
            Value::Null => ValueSnapshot::Null,
            Value::Bool(b) => ValueSnapshot::Bool(*b),
            Value::Int(i) => ValueSnapshot::Int(*i),
            Value::Float(x) => ValueSnapshot::Float(*x),
            Value::Str(s) => ValueSnapshot::Str(s.clone()),
            Value::List(list) => {
                let id = match self.id_for(Arc::as_ptr(list) as *const () as usize) {
                    Ok(id) => id,
                    Err(seen) => return ValueSnapshot::Ref(seen),
                };
                let items = list.read().clone();
                ValueSnapshot::List {
                    id,
                    items: items.iter().map(|v| self.visit(v)).collect(),
                }
            }
            Value::Object(obj) => {
                let id = match self.id_for(Arc::as_ptr(obj) as *const () as usize) {
                    Ok(id) => id,
                    Err(seen) => return ValueSnapshot::Ref(seen),
                };
                let fields = obj
                    .ty()
                    .instance_fields()
                    .into_iter()
                    .map(|(name, slot)| {
                        let value = obj.get_slot(slot).unwrap_or_default();
                        FieldSnapshot {
                            name,
                            value: self.visit(&value),
                        }
                    })
                    .collect();
                ValueSnapshot::Object {
                    id,
                    type_name: obj.ty().name().to_string(),
                    fields,
                }
            }
        }
    }
}

struct Restore<'r> {
    registry: &'r TypeRegistry,
    seen: FxHashMap<u32, Value>,
}

impl Restore<'_> {
    fn visit(&mut self, snapshot: &ValueSnapshot) -> Result<Value, TypeError> {
        Ok(match snapshot {
            ValueSnapshot::Null => Value::Null,
            ValueSnapshot::Bool(b) => Value::Bool(*b),
            ValueSnapshot::Int(i) => Value::Int(*i),
            ValueSnapshot::Float(x) => Value::Float(*x),
            ValueSnapshot::Str(s) => Value::Str(s.clone()),
            ValueSnapshot::Ref(id) => self.seen.get(id).cloned().ok_or_else(|| {
                TypeError::Snapshot {
                    reason: format!("dangling reference #{}", id),
                }
            })?,
            ValueSnapshot::List { id, items } => {
                let value = Value::list(Vec::with_capacity(items.len()));
                self.seen.insert(*id, value.clone());
                let mut restored = Vec::with_capacity(items.len());
                for item in items {
                    restored.push(self.visit(item)?);
                }
                if let Value::List(list) = &value {
                    *list.write() = restored;
                }
                value
            }
            ValueSnapshot::Object {
                id,
                type_name,
                fields,
            } => {
                let ty = self.registry.require(type_name)?;
                let value = Object::alloc(&ty);
                self.seen.insert(*id, value.clone());
                let layout = ty.instance_fields();
                for (i, field) in fields.iter().enumerate() {
                    let slot = match layout.get(i) {
                        Some((name, slot)) if *name == field.name => *slot,
                        _ => ty.field_slot(&field.name).ok_or_else(|| TypeError::Snapshot {
                            reason: format!("{} has no field '{}'", type_name, field.name),
                        })?,
                    };
                    let restored = self.visit(&field.value)?;
                    if let Value::Object(obj) = &value {
                        obj.set_slot(slot, restored);
                    }
                }
                value
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TypeBuilder;

    fn node_registry() -> (TypeRegistry, crate::ty::TypeHandle) {
        let registry = TypeRegistry::new();
        let node = TypeBuilder::class("test.Node")
            .field("label")
            .field("next")
            .build()
            .unwrap();
        registry.register(&node).unwrap();
        (registry, node)
    }

    #[test]
    fn test_primitives_and_lists() {
        let registry = TypeRegistry::new();
        let value = Value::list(vec![Value::from(1), Value::from("a"), Value::Null]);
        let snapshot = ValueSnapshot::capture(&value);
        assert_eq!(snapshot.restore(&registry).unwrap(), value);
    }

    #[test]
    fn test_cycle_survives() {
        let (registry, node) = node_registry();
        let a = Object::alloc(&node);
        let b = Object::alloc(&node);
        let (oa, ob) = (a.as_object().unwrap(), b.as_object().unwrap());
        oa.set("label", "a");
        oa.set("next", b.clone());
        ob.set("label", "b");
        ob.set("next", a.clone());

        let snapshot = ValueSnapshot::capture(&a);
        let json = serde_json::to_string(&snapshot).unwrap();
        let decoded: ValueSnapshot = serde_json::from_str(&json).unwrap();
        let restored = decoded.restore(&registry).unwrap();

        let ra = restored.as_object().unwrap();
        let rb = ra.get("next").unwrap();
        assert_eq!(rb.as_object().unwrap().get("label"), Some(Value::from("b")));
        assert!(rb.as_object().unwrap().get("next").unwrap().same(&restored));
    }

    #[test]
    fn test_self_referencing_list_round_trip() {
        let list = Value::list(vec![Value::from(1)]);
        list.as_list().unwrap().write().push(list.clone());

        let json = serde_json::to_string(&ValueSnapshot::capture(&list)).unwrap();
        let decoded: ValueSnapshot = serde_json::from_str(&json).unwrap();
        let restored = decoded.restore(&TypeRegistry::new()).unwrap();

        assert!(!restored.same(&list));
        assert_eq!(restored, list);
        assert!(restored.as_list().unwrap().read()[1].same(&restored));
        assert_eq!(restored.to_string(), "[1, [...]]");
    }

    #[test]
    fn test_unknown_type_fails() {
        let (_, node) = node_registry();
        let snapshot = ValueSnapshot::capture(&Object::alloc(&node));
        assert_eq!(snapshot.type_name(), Some("test.Node"));
        assert!(matches!(
            snapshot.restore(&TypeRegistry::new()),
            Err(TypeError::UndefinedType { .. })
        ));
    }

    #[test]
    fn test_dangling_ref_fails() {
        let registry = TypeRegistry::new();
        assert!(matches!(
            ValueSnapshot::Ref(7).restore(&registry),
            Err(TypeError::Snapshot { .. })
        ));
    }
}
