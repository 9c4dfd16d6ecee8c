//! Invocation cache
//!
//! Process-wide memo of binder results keyed by [`CacheKey`]. Both outcomes
//! are stored: a resolved binding and a definitive "not found". Entries are
//! never evicted; descriptors are immutable, so a key resolves the same way
//! for the lifetime of the process.

use std::hash::BuildHasherDefault;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use rustc_hash::FxHasher;
use veneer_types::{TypeHandle, TypeId};

use crate::args::{ArgShape, InvocationKind};
use crate::binder::{self, Binding};

type FxDashMap<K, V> = DashMap<K, V, BuildHasherDefault<FxHasher>>;

/// Identity of a member lookup
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Type the lookup resolves against
    pub owner: TypeId,
    /// Type-level or instance-level lookup
    pub is_static: bool,
    /// Member name
    pub member: String,
    /// Invocation kind
    pub kind: InvocationKind,
    /// Arity and argument names
    pub shape: ArgShape,
}

impl CacheKey {
    /// Key for a lookup on `owner`
    pub fn new(
        owner: &TypeHandle,
        is_static: bool,
        member: impl Into<String>,
        kind: InvocationKind,
        shape: ArgShape,
    ) -> Self {
        Self {
            owner: owner.id(),
            is_static,
            member: member.into(),
            kind,
            shape,
        }
    }
}

/// Cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that ran the binder
    pub misses: u64,
    /// Stored entries
    pub entries: usize,
}

/// Concurrent `CacheKey -> Binding | NotFound` map
#[derive(Default)]
pub struct InvocationCache {
    entries: FxDashMap<CacheKey, Option<Arc<Binding>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

static GLOBAL: Lazy<Arc<InvocationCache>> = Lazy::new(|| Arc::new(InvocationCache::new()));

impl InvocationCache {
    /// Empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide cache shared by every interceptor that is not given its own
    pub fn global() -> Arc<InvocationCache> {
        GLOBAL.clone()
    }

    /// Return the memoized outcome for `key`, resolving against `owner` on a
    /// miss. Concurrent misses may both run the binder; the first insert wins
    /// and every caller gets the stored entry.
    pub fn get_or_resolve(&self, owner: &TypeHandle, key: CacheKey) -> Option<Arc<Binding>> {
        debug_assert_eq!(owner.id(), key.owner);

        if let Some(entry) = self.entries.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return entry.value().clone();
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let resolved = binder::resolve(owner, key.is_static, &key.member, key.kind, &key.shape)
            .map(Arc::new);
        log::trace!(
            "resolved {}.{}{} for {}: {}",
            owner.name(),
            key.member,
            key.shape,
            key.kind,
            if resolved.is_some() { "bound" } else { "not found" }
        );

        self.entries.entry(key).or_insert(resolved).value().clone()
    }

    /// Whether `key` has been resolved
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }
}
