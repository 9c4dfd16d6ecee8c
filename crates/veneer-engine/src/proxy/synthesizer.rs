//! Proxy type synthesis
//!
//! A [`ProxyType`] is the member table of "an object implementing these
//! interfaces": every member the requested interfaces declare, inherited ones
//! included, each attributed to the interface that supplies it. Proxy types
//! are memoized by `(context type, interface ids)`, so asking twice for the
//! same set over the same context yields the same `Arc`.
//!
//! Name collisions are resolved first-declared-wins in interface order
//! (depth-first through `extends`). Later declarations are kept as
//! [`ShadowedMember`] records, whether or not their signatures agree.

use std::fmt;
use std::hash::BuildHasherDefault;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use rustc_hash::{FxHashMap, FxHashSet, FxHasher};
use veneer_types::{MemberDef, TypeHandle, TypeId};

use crate::error::{ProjectionError, ProjectionResult};

type FxDashMap<K, V> = DashMap<K, V, BuildHasherDefault<FxHasher>>;

/// Ordered, validated, duplicate-free list of interfaces
#[derive(Debug, Clone)]
pub struct InterfaceSet(Vec<TypeHandle>);

impl InterfaceSet {
    /// Validate a requested set: non-empty, interfaces only, no duplicates
    pub fn new(interfaces: impl IntoIterator<Item = TypeHandle>) -> ProjectionResult<Self> {
        let interfaces: Vec<TypeHandle> = interfaces.into_iter().collect();
        if interfaces.is_empty() {
            return Err(ProjectionError::InvalidInterfaceSet {
                reason: "no interfaces requested".to_string(),
            });
        }
        let mut seen = FxHashSet::default();
        for iface in &interfaces {
            if !iface.is_interface() {
                return Err(ProjectionError::InvalidInterfaceSet {
                    reason: format!("{} is not an interface", iface.name()),
                });
            }
            if !seen.insert(iface.id()) {
                return Err(ProjectionError::InvalidInterfaceSet {
                    reason: format!("{} is requested more than once", iface.name()),
                });
            }
        }
        Ok(Self(interfaces))
    }

    /// Validate a borrowed list
    pub fn from_slice(interfaces: &[TypeHandle]) -> ProjectionResult<Self> {
        Self::new(interfaces.iter().cloned())
    }

    /// First interface of the set
    pub fn primary(&self) -> &TypeHandle {
        &self.0[0]
    }

    /// Interfaces in request order
    pub fn as_slice(&self) -> &[TypeHandle] {
        &self.0
    }

    /// Interface ids in request order
    pub fn ids(&self) -> Vec<TypeId> {
        self.0.iter().map(|i| i.id()).collect()
    }

    /// Number of requested interfaces
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a validated set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Memoization key of a proxy type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProxyTypeKey {
    /// Context type, if known when the proxy was requested
    pub context: Option<TypeId>,
    /// Requested interfaces, in order
    pub interfaces: Vec<TypeId>,
}

/// A member of a proxy type
#[derive(Debug, Clone)]
pub struct ProxyMember {
    name: String,
    source: TypeHandle,
    overloads: Vec<MemberDef>,
}

impl ProxyMember {
    /// Member name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Interface that supplies this member
    pub fn source(&self) -> &TypeHandle {
        &self.source
    }

    /// Declarations of this name on the supplying interface
    pub fn overloads(&self) -> &[MemberDef] {
        &self.overloads
    }

    /// Whether the member is a method
    pub fn is_method(&self) -> bool {
        self.overloads.iter().any(MemberDef::is_method)
    }

    /// Whether the member is an indexer
    pub fn is_indexer(&self) -> bool {
        self.overloads.iter().any(MemberDef::is_indexer)
    }

    /// Whether the member reads as a property
    pub fn is_readable_property(&self) -> bool {
        self.overloads
            .iter()
            .any(|d| !d.is_method() && !d.is_indexer() && d.is_readable())
    }

    /// Whether the member writes as a property
    pub fn is_writable_property(&self) -> bool {
        self.overloads
            .iter()
            .any(|d| !d.is_method() && !d.is_indexer() && d.is_writable())
    }
}

/// A declaration that lost a name collision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowedMember {
    /// Colliding name
    pub name: String,
    /// Interface whose declaration is used
    pub kept_from: String,
    /// Interface whose declaration is ignored
    pub shadowed_from: String,
    /// Whether the ignored declaration has the same signature
    pub compatible: bool,
}

/// Synthesized member table for an interface set
pub struct ProxyType {
    id: u32,
    name: String,
    context: Option<TypeHandle>,
    interfaces: InterfaceSet,
    flattened: Vec<TypeHandle>,
    members: FxHashMap<String, ProxyMember>,
    order: Vec<String>,
    shadowed: Vec<ShadowedMember>,
}

impl ProxyType {
    fn synthesize(context: Option<TypeHandle>, interfaces: InterfaceSet) -> Self {
        static NEXT_ID: AtomicU32 = AtomicU32::new(1);

        let mut flattened = Vec::new();
        let mut visited = FxHashSet::default();
        for iface in interfaces.as_slice() {
            flatten(iface, &mut visited, &mut flattened);
        }

        let mut members: FxHashMap<String, ProxyMember> = FxHashMap::default();
        let mut order = Vec::new();
        let mut shadowed = Vec::new();
        for iface in &flattened {
            for def in iface.members().iter().filter(|m| !m.is_static()) {
                match members.get_mut(def.name()) {
                    None => {
                        order.push(def.name().to_string());
                        members.insert(
                            def.name().to_string(),
                            ProxyMember {
                                name: def.name().to_string(),
                                source: iface.clone(),
                                overloads: vec![def.clone()],
                            },
                        );
                    }
                    Some(existing) if existing.source.id() == iface.id() => {
                        existing.overloads.push(def.clone());
                    }
                    Some(existing) => {
                        let compatible = existing.overloads.iter().any(|o| o.same_shape(def));
                        log::debug!(
                            "{}.{} shadowed by {}.{}{}",
                            iface.name(),
                            def.name(),
                            existing.source.name(),
                            def.name(),
                            if compatible { "" } else { " (incompatible signature)" }
                        );
                        shadowed.push(ShadowedMember {
                            name: def.name().to_string(),
                            kept_from: existing.source.name().to_string(),
                            shadowed_from: iface.name().to_string(),
                            compatible,
                        });
                    }
                }
            }
        }

        let names: Vec<&str> = interfaces.as_slice().iter().map(|i| i.name()).collect();
        let name = match &context {
            Some(ctx) => format!("Proxy[{}] over {}", names.join(", "), ctx.name()),
            None => format!("Proxy[{}]", names.join(", ")),
        };

        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            name,
            context,
            interfaces,
            flattened,
            members,
            order,
            shadowed,
        }
    }

    /// Process-unique proxy type id
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Context type the proxy was built for
    pub fn context(&self) -> Option<&TypeHandle> {
        self.context.as_ref()
    }

    /// Requested interfaces
    pub fn interfaces(&self) -> &InterfaceSet {
        &self.interfaces
    }

    /// Memoization key
    pub fn key(&self) -> ProxyTypeKey {
        ProxyTypeKey {
            context: self.context.as_ref().map(|c| c.id()),
            interfaces: self.interfaces.ids(),
        }
    }

    /// Whether `iface` is requested or inherited by a requested interface
    pub fn implements(&self, iface: &TypeHandle) -> bool {
        self.flattened.iter().any(|i| i.id() == iface.id())
    }

    /// Member by name
    pub fn member(&self, name: &str) -> Option<&ProxyMember> {
        self.members.get(name)
    }

    /// Members in declaration order
    pub fn members(&self) -> impl Iterator<Item = &ProxyMember> + '_ {
        self.order.iter().filter_map(|name| self.members.get(name))
    }

    /// Member names in declaration order
    pub fn member_names(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Declarations that lost a name collision
    pub fn shadowed(&self) -> &[ShadowedMember] {
        &self.shadowed
    }
}

impl fmt::Debug for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyType")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("members", &self.order)
            .finish()
    }
}

fn flatten(iface: &TypeHandle, visited: &mut FxHashSet<TypeId>, out: &mut Vec<TypeHandle>) {
    if !visited.insert(iface.id()) {
        return;
    }
    out.push(iface.clone());
    for parent in iface.extends() {
        flatten(parent, visited, out);
    }
}

/// Memoizing proxy type factory
#[derive(Default)]
pub struct ProxySynthesizer {
    types: FxDashMap<ProxyTypeKey, Arc<ProxyType>>,
}

static GLOBAL: Lazy<Arc<ProxySynthesizer>> = Lazy::new(|| Arc::new(ProxySynthesizer::new()));

impl ProxySynthesizer {
    /// Empty synthesizer
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide synthesizer
    pub fn global() -> Arc<ProxySynthesizer> {
        GLOBAL.clone()
    }

    /// Proxy type for `primary` plus `additional`, over `context`
    pub fn build_type(
        &self,
        context: Option<&TypeHandle>,
        primary: &TypeHandle,
        additional: &[TypeHandle],
    ) -> ProjectionResult<Arc<ProxyType>> {
        let set = InterfaceSet::new(std::iter::once(primary.clone()).chain(additional.iter().cloned()))?;
        Ok(self.build_for(context, set))
    }

    /// Proxy type for a validated set
    pub fn build_for(&self, context: Option<&TypeHandle>, interfaces: InterfaceSet) -> Arc<ProxyType> {
        let key = ProxyTypeKey {
            context: context.map(|c| c.id()),
            interfaces: interfaces.ids(),
        };
        if let Some(existing) = self.types.get(&key) {
            return existing.value().clone();
        }
        self.types
            .entry(key)
            .or_insert_with(|| {
                let ty = ProxyType::synthesize(context.cloned(), interfaces);
                log::debug!("synthesized {} ({} members)", ty.name(), ty.order.len());
                Arc::new(ty)
            })
            .value()
            .clone()
    }

    /// Number of memoized proxy types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether nothing has been synthesized
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veneer_types::{PropertyAccess, TypeBuilder, NO_PARAMS};

    fn named() -> TypeHandle {
        TypeBuilder::interface("test.INamed")
            .property_sig("Name", PropertyAccess::ReadOnly)
            .build()
            .unwrap()
    }

    #[test]
    fn test_invalid_sets() {
        let class = TypeBuilder::class("test.NotIface").build().unwrap();
        let iface = named();
        assert!(matches!(InterfaceSet::new(vec![]), Err(ProjectionError::InvalidInterfaceSet { .. })));
        assert!(matches!(
            InterfaceSet::new(vec![class]),
            Err(ProjectionError::InvalidInterfaceSet { .. })
        ));
        assert!(matches!(
            InterfaceSet::new(vec![iface.clone(), iface]),
            Err(ProjectionError::InvalidInterfaceSet { .. })
        ));
    }

    #[test]
    fn test_memoized_by_context_and_set() {
        let synth = ProxySynthesizer::new();
        let a = named();
        let b = TypeBuilder::interface("test.IAged")
            .property_sig("Age", PropertyAccess::ReadOnly)
            .build()
            .unwrap();

        let first = synth.build_type(None, &a, &[b.clone()]).unwrap();
        let second = synth.build_type(None, &a, &[b.clone()]).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let reversed = synth.build_type(None, &b, &[a.clone()]).unwrap();
        assert!(!Arc::ptr_eq(&first, &reversed));
        assert_eq!(synth.len(), 2);
        assert_eq!(first.member_names(), vec!["Name", "Age"]);
        assert_eq!(first.name(), "Proxy[test.INamed, test.IAged]");
    }

    #[test]
    fn test_inherited_members_are_flattened() {
        let base = named();
        let derived = TypeBuilder::interface("test.IPerson")
            .extends(&base)
            .method_sig("Greet", ["greeting"])
            .build()
            .unwrap();
        let ty = ProxySynthesizer::new().build_type(None, &derived, &[]).unwrap();

        assert_eq!(ty.member_names(), vec!["Greet", "Name"]);
        assert_eq!(ty.member("Name").unwrap().source().name(), "test.INamed");
        assert!(ty.implements(&base));
    }

    #[test]
    fn test_first_declared_wins() {
        let a = TypeBuilder::interface("test.IA")
            .property_sig("Value", PropertyAccess::ReadOnly)
            .build()
            .unwrap();
        let b = TypeBuilder::interface("test.IB")
            .method_sig("Value", NO_PARAMS)
            .build()
            .unwrap();
        let synth = ProxySynthesizer::new();

        let ab = synth.build_type(None, &a, &[b.clone()]).unwrap();
        assert_eq!(ab.member("Value").unwrap().source().name(), "test.IA");
        assert!(ab.member("Value").unwrap().is_readable_property());
        assert_eq!(
            ab.shadowed(),
            &[ShadowedMember {
                name: "Value".to_string(),
                kept_from: "test.IA".to_string(),
                shadowed_from: "test.IB".to_string(),
                compatible: false,
            }]
        );

        let ba = synth.build_type(None, &b, &[a]).unwrap();
        assert_eq!(ba.member("Value").unwrap().source().name(), "test.IB");
        assert!(ba.member("Value").unwrap().is_method());
    }

    #[test]
    fn test_overloads_come_from_one_interface() {
        let a = TypeBuilder::interface("test.IWriter")
            .method_sig("Write", ["text"])
            .method_sig("Write", ["text", "newline"])
            .build()
            .unwrap();
        let ty = ProxySynthesizer::new().build_type(None, &a, &[]).unwrap();
        assert_eq!(ty.member("Write").unwrap().overloads().len(), 2);
        assert!(ty.shadowed().is_empty());
    }
}
