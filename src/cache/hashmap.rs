//! HashMap-backed dominance map.
//!
//! Maps a canonical search-state key to the best lower bound seen for it and
//! the node holding that bound. A new state is admitted only if it strictly
//! improves on the stored bound; ties keep the state that arrived first.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;

use crate::storage::NodeId;

/// Best known state for one key.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CacheEntry {
    pub lower_bound: f64,
    pub node: NodeId,
}

/// Outcome of offering a new state to the cache.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Admission {
    /// First state with this key; stored.
    Inserted(NodeId),
    /// Strictly better than the stored state, which is now dominated.
    Replaced { node: NodeId, old: NodeId },
    /// An equal or better state is already known; nothing was allocated.
    Rejected,
}

/// A dominance map backed by [HashMap].
///
/// Entries are never evicted: a stored bound stays valid even after its node
/// has been freed, since freeing only happens once the node's subtree cannot
/// improve the incumbent.
pub struct HashMapCache<K> {
    map: HashMap<K, CacheEntry>,
    hits: usize,
    misses: usize,
    replacements: usize,
}

impl<K> Default for HashMapCache<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> HashMapCache<K> {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
            hits: 0,
            misses: 0,
            replacements: 0,
        }
    }

    /// Returns the number of entries in the cache.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Lookups that found an existing key.
    pub fn hits(&self) -> usize {
        self.hits
    }

    /// Lookups that found no existing key.
    pub fn misses(&self) -> usize {
        self.misses
    }

    /// Hits where the new state beat the stored one.
    pub fn replacements(&self) -> usize {
        self.replacements
    }
}

impl<K> HashMapCache<K>
where
    K: Hash + Eq,
{
    /// Looks up a key in the cache.
    pub fn get(&self, key: &K) -> Option<&CacheEntry> {
        self.map.get(key)
    }

    /// Offers a state with the given lower bound. `alloc` creates its node and
    /// is only called if the state is admitted.
    pub fn admit(&mut self, key: K, lower_bound: f64, alloc: impl FnOnce() -> NodeId) -> Admission {
        match self.map.entry(key) {
            Entry::Occupied(mut e) => {
                self.hits += 1;
                if e.get().lower_bound <= lower_bound {
                    return Admission::Rejected;
                }
                let old = e.get().node;
                let node = alloc();
                e.insert(CacheEntry { lower_bound, node });
                self.replacements += 1;
                Admission::Replaced { node, old }
            }
            Entry::Vacant(e) => {
                self.misses += 1;
                let node = alloc();
                e.insert(CacheEntry { lower_bound, node });
                Admission::Inserted(node)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;

    #[test]
    fn test_admit_insert_then_reject() {
        let mut nodes = Storage::new();
        let mut cache = HashMapCache::<(u64, u64)>::new();

        let a = cache.admit((1, 2), 0.3, || nodes.add(()));
        assert!(matches!(a, Admission::Inserted(_)));

        // Equal bound: the first state wins and no node is allocated.
        let b = cache.admit((1, 2), 0.3, || nodes.add(()));
        assert_eq!(b, Admission::Rejected);
        assert_eq!(nodes.real_size(), 1);

        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_admit_replaces_worse_entry() {
        let mut nodes = Storage::new();
        let mut cache = HashMapCache::<Vec<u32>>::new();

        let Admission::Inserted(first) = cache.admit(vec![1, 2], 0.5, || nodes.add(())) else {
            panic!("expected insertion");
        };
        let Admission::Replaced { node, old } = cache.admit(vec![1, 2], 0.2, || nodes.add(())) else {
            panic!("expected replacement");
        };
        assert_eq!(old, first);
        assert_ne!(node, first);
        assert_eq!(cache.get(&vec![1, 2]).unwrap().node, node);
        assert_eq!(cache.replacements(), 1);
    }

    #[test]
    fn test_distinct_keys() {
        let mut nodes = Storage::new();
        let mut cache = HashMapCache::<(u64, u64)>::new();

        for i in 0..1000 {
            cache.admit((i, 0), i as f64, || nodes.add(()));
        }
        assert_eq!(cache.len(), 1000);
        assert_eq!(cache.misses(), 1000);
        assert_eq!(cache.hits(), 0);
    }
}
