//! Type registry
//!
//! Maps names and ids to descriptors. Late-bound targets resolve their type
//! name here and reconstitution resolves payload type references here.

use std::hash::BuildHasherDefault;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use rustc_hash::FxHasher;

use crate::builtins::builtins;
use crate::error::TypeError;
use crate::ty::{TypeHandle, TypeId};

type FxDashMap<K, V> = DashMap<K, V, BuildHasherDefault<FxHasher>>;

/// Concurrent name/id to descriptor map
#[derive(Default)]
pub struct TypeRegistry {
    by_name: FxDashMap<String, TypeHandle>,
    by_id: FxDashMap<TypeId, TypeHandle>,
}

static GLOBAL: Lazy<Arc<TypeRegistry>> = Lazy::new(|| Arc::new(TypeRegistry::new()));

impl TypeRegistry {
    /// Registry pre-populated with the builtin types
    pub fn new() -> Self {
        let registry = Self::empty();
        for ty in builtins().all() {
            registry.insert(ty.clone());
        }
        registry
    }

    /// Registry without builtins
    pub fn empty() -> Self {
        Self::default()
    }

    /// Process-wide registry
    pub fn global() -> Arc<TypeRegistry> {
        GLOBAL.clone()
    }

    fn insert(&self, ty: TypeHandle) {
        self.by_id.insert(ty.id(), ty.clone());
        self.by_name.insert(ty.name().to_string(), ty);
    }

    /// Register a type. Registering the same descriptor twice is a no-op;
    /// a different descriptor under a taken name is rejected.
    pub fn register(&self, ty: &TypeHandle) -> Result<(), TypeError> {
        match self.by_name.entry(ty.name().to_string()) {
            Entry::Occupied(existing) if existing.get().id() == ty.id() => Ok(()),
            Entry::Occupied(_) => Err(TypeError::DuplicateType {
                name: ty.name().to_string(),
            }),
            Entry::Vacant(slot) => {
                self.by_id.insert(ty.id(), ty.clone());
                slot.insert(ty.clone());
                Ok(())
            }
        }
    }

    /// Look up a type by name
    pub fn resolve(&self, name: &str) -> Option<TypeHandle> {
        self.by_name.get(name).map(|r| r.value().clone())
    }

    /// Look up a type by name, failing with `UndefinedType`
    pub fn require(&self, name: &str) -> Result<TypeHandle, TypeError> {
        self.resolve(name).ok_or_else(|| TypeError::UndefinedType {
            name: name.to_string(),
        })
    }

    /// Look up a type by id
    pub fn get(&self, id: TypeId) -> Option<TypeHandle> {
        self.by_id.get(&id).map(|r| r.value().clone())
    }

    /// Whether a type with this name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.by_name.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }
}
