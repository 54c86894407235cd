//! Generation-checked slot storage for search-tree nodes.
//!
//! Nodes are addressed by [`NodeId`], a (slot, generation) pair. Freed slots
//! are reused, and every reuse bumps the slot generation, so a stale id left
//! behind in the queue or the prefix cache never resolves to the new occupant.

use std::fmt;

/// Handle to a node in [`Storage`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Returns the slot index.
    pub const fn index(self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}#{}", self.index, self.generation)
    }
}

struct Slot<T> {
    value: Option<T>,
    generation: u32,
}

pub struct Storage<T> {
    data: Vec<Slot<T>>,
    /// Freed slots, reused last-in first-out.
    free: Vec<usize>,
    /// Number of occupied cells.
    real_size: usize,
}

impl<T> Default for Storage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Storage<T> {
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            free: Vec::new(),
            real_size: 0,
        }
    }

    /// Number of allocated slots, occupied or not.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of occupied slots.
    pub fn real_size(&self) -> usize {
        self.real_size
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        match self.data.get(id.index()) {
            Some(slot) if slot.generation == id.generation => slot.value.as_ref(),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        match self.data.get_mut(id.index()) {
            Some(slot) if slot.generation == id.generation => slot.value.as_mut(),
            _ => None,
        }
    }

    /// Stores `value`, reusing the most recently freed slot, and returns its handle.
    pub fn add(&mut self, value: T) -> NodeId {
        let index = self.free.pop().unwrap_or_else(|| {
            self.data.push(Slot {
                value: None,
                generation: 0,
            });
            self.data.len() - 1
        });

        let slot = &mut self.data[index];
        debug_assert!(slot.value.is_none(), "Slot {} is occupied", index);
        slot.value = Some(value);
        self.real_size += 1;

        NodeId {
            index: index as u32,
            generation: slot.generation,
        }
    }

    /// Frees the slot behind `id`, returning its value. Stale ids are ignored.
    pub fn drop(&mut self, id: NodeId) -> Option<T> {
        let slot = self.data.get_mut(id.index())?;
        if slot.generation != id.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());
        self.real_size -= 1;
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_get() {
        let mut storage = Storage::new();
        let a = storage.add(42);
        let b = storage.add(7);
        assert_eq!(storage.get(a), Some(&42));
        assert_eq!(storage.get(b), Some(&7));
        assert_eq!(storage.real_size(), 2);
    }

    #[test]
    fn test_drop() {
        let mut storage = Storage::new();
        let index = storage.add(42);
        assert!(storage.contains(index));
        assert_eq!(storage.drop(index), Some(42));
        assert!(!storage.contains(index));
        assert_eq!(storage.drop(index), None);
        assert_eq!(storage.real_size(), 0);
    }

    #[test]
    fn test_slot_reuse_bumps_generation() {
        let mut storage = Storage::new();
        let a = storage.add(1);
        let _b = storage.add(2);
        storage.drop(a);

        let c = storage.add(3);
        assert_eq!(c.index(), a.index());
        assert_ne!(c, a);
        assert_eq!(storage.get(a), None);
        assert_eq!(storage.get(c), Some(&3));
        assert_eq!(storage.capacity(), 2);
    }

    #[test]
    fn test_get_mut() {
        let mut storage = Storage::new();
        let a = storage.add(1);
        *storage.get_mut(a).unwrap() += 10;
        assert_eq!(storage.get(a), Some(&11));
    }
}
