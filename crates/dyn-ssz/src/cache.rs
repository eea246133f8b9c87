//! Insert-once cache keyed by type.

use std::any::TypeId;

use dashmap::DashMap;

/// Per-engine map from a type to a value derived from it.
///
/// Entries are pure functions of the type and the engine's registry, so
/// concurrent first lookups may compute the same value twice; the first
/// inserted value wins.  Lookups only touch the shard holding the type and
/// never wait on other readers.
#[derive(Debug)]
pub(crate) struct TypeCache<V> {
    entries: DashMap<TypeId, V>,
}

impl<V: Clone> TypeCache<V> {
    pub(crate) fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub(crate) fn get(&self, id: TypeId) -> Option<V> {
        self.entries.get(&id).map(|entry| entry.value().clone())
    }

    /// Inserts the value unless an entry already exists, returning whichever
    /// value ends up stored.
    pub(crate) fn insert(&self, id: TypeId, value: V) -> V {
        self.entries.entry(id).or_insert(value).value().clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
