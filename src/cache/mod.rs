//! Symmetry-aware prefix caches.
//!
//! Different orderings of the same rules often lead to equivalent search
//! states. The cache collapses them: of all states sharing a key, only the one
//! with the smallest lower bound is kept in the search.
//!
//! | Map type | Key | Catches |
//! |----------|-----|---------|
//! | [`MapType::None`] | - | nothing, every child is inserted |
//! | [`MapType::Prefix`] | sorted rule indices of the prefix | all orderings of the same rule set |
//! | [`MapType::Captured`] | not-yet-captured bit vector | all prefixes leaving the same samples |
//!
//! Both keys are sound for dominance: prefixes with the same key leave the
//! same samples uncaptured, so their completions coincide and the one with
//! the lower bound can never do worse. The cache changes how much of the tree
//! is searched, not which objective is certified.

mod hashmap;

pub use hashmap::{Admission, CacheEntry, HashMapCache};

use crate::bitset::BitSet;
use crate::config::MapType;
use crate::storage::NodeId;
use crate::types::RuleId;

/// The prefix cache selected by [`MapType`].
pub enum PrefixCache {
    None,
    Prefix(HashMapCache<Vec<RuleId>>),
    Captured(HashMapCache<BitSet>),
}

impl PrefixCache {
    pub fn new(map_type: MapType) -> Self {
        match map_type {
            MapType::None => PrefixCache::None,
            MapType::Prefix => PrefixCache::Prefix(HashMapCache::new()),
            MapType::Captured => PrefixCache::Captured(HashMapCache::new()),
        }
    }

    /// Offers the child appending `rule` to `parent_prefix`.
    ///
    /// `remaining` yields the child's not-yet-captured samples and is only
    /// evaluated by the captured map. `alloc` creates the child node and is
    /// only called if the child is admitted.
    pub fn admit(
        &mut self,
        parent_prefix: &[RuleId],
        rule: RuleId,
        remaining: impl FnOnce() -> BitSet,
        lower_bound: f64,
        alloc: impl FnOnce() -> NodeId,
    ) -> Admission {
        match self {
            PrefixCache::None => Admission::Inserted(alloc()),
            PrefixCache::Prefix(cache) => {
                let mut key = Vec::with_capacity(parent_prefix.len() + 1);
                key.extend_from_slice(parent_prefix);
                key.push(rule);
                key.sort_unstable();
                cache.admit(key, lower_bound, alloc)
            }
            PrefixCache::Captured(cache) => cache.admit(remaining(), lower_bound, alloc),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PrefixCache::None => 0,
            PrefixCache::Prefix(cache) => cache.len(),
            PrefixCache::Captured(cache) => cache.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> usize {
        match self {
            PrefixCache::None => 0,
            PrefixCache::Prefix(cache) => cache.hits(),
            PrefixCache::Captured(cache) => cache.hits(),
        }
    }

    pub fn misses(&self) -> usize {
        match self {
            PrefixCache::None => 0,
            PrefixCache::Prefix(cache) => cache.misses(),
            PrefixCache::Captured(cache) => cache.misses(),
        }
    }

    pub fn replacements(&self) -> usize {
        match self {
            PrefixCache::None => 0,
            PrefixCache::Prefix(cache) => cache.replacements(),
            PrefixCache::Captured(cache) => cache.replacements(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;

    fn r(i: u32) -> RuleId {
        RuleId::new(i)
    }

    #[test]
    fn test_none_always_inserts() {
        let mut nodes = Storage::new();
        let mut cache = PrefixCache::new(MapType::None);
        for _ in 0..3 {
            let a = cache.admit(&[r(1)], r(2), || BitSet::zeros(4), 0.1, || nodes.add(()));
            assert!(matches!(a, Admission::Inserted(_)));
        }
        assert!(cache.is_empty());
        assert_eq!(nodes.real_size(), 3);
    }

    #[test]
    fn test_prefix_catches_permutations() {
        let mut nodes = Storage::new();
        let mut cache = PrefixCache::new(MapType::Prefix);

        let a = cache.admit(&[r(1)], r(2), || unreachable!(), 0.3, || nodes.add(()));
        assert!(matches!(a, Admission::Inserted(_)));

        // Same rule set, other order, worse bound.
        let b = cache.admit(&[r(2)], r(1), || unreachable!(), 0.4, || nodes.add(()));
        assert_eq!(b, Admission::Rejected);

        // Same rule set, other order, better bound.
        let c = cache.admit(&[r(2)], r(1), || unreachable!(), 0.2, || nodes.add(()));
        assert!(matches!(c, Admission::Replaced { .. }));

        // Different rule set.
        let d = cache.admit(&[r(2)], r(3), || unreachable!(), 0.9, || nodes.add(()));
        assert!(matches!(d, Admission::Inserted(_)));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_captured_keys_by_remaining_samples() {
        let mut nodes = Storage::new();
        let mut cache = PrefixCache::new(MapType::Captured);
        let remaining = BitSet::from_indices(8, [0, 3]);

        let a = cache.admit(&[r(1)], r(2), || remaining.clone(), 0.3, || nodes.add(()));
        assert!(matches!(a, Admission::Inserted(_)));

        // Unrelated rules leaving the same samples are equivalent.
        let b = cache.admit(&[r(5)], r(7), || remaining.clone(), 0.3, || nodes.add(()));
        assert_eq!(b, Admission::Rejected);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }
}
