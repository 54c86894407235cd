//! Frontier of partial rule lists waiting to be expanded.
//!
//! A binary heap ordered by the configured [`Policy`]. Every entry carries an
//! insertion sequence number as the final tie-break: earlier first for all
//! policies except depth-first, which takes the latest. Children of one node
//! are pushed in ascending rule index, so ties resolve to the lower index.
//!
//! Entries are never removed from the middle. Nodes that become dominated or
//! hopeless stay queued and are skipped when popped.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::config::Policy;
use crate::storage::NodeId;
use crate::tree::Node;

#[derive(Debug, Copy, Clone)]
struct Entry {
    primary: f64,
    secondary: usize,
    order: u64,
    node: NodeId,
}

impl Entry {
    fn key_cmp(&self, other: &Self) -> Ordering {
        self.primary
            .total_cmp(&other.primary)
            .then(self.secondary.cmp(&other.secondary))
            .then(self.order.cmp(&other.order))
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.key_cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // BinaryHeap pops the maximum; the smallest key must come out first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.key_cmp(self)
    }
}

pub struct Queue {
    policy: Policy,
    heap: BinaryHeap<Entry>,
    pushed: u64,
    max_len: usize,
}

impl Queue {
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            heap: BinaryHeap::new(),
            pushed: 0,
            max_len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Largest length the queue has reached.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn push(&mut self, id: NodeId, node: &Node) {
        let seq = self.pushed;
        self.pushed += 1;

        let (primary, secondary, order) = match self.policy {
            Policy::Bfs => (node.depth as f64, 0, seq),
            Policy::Dfs => (0.0, 0, u64::MAX - seq),
            Policy::Curious => (node.lower_bound, node.num_captured, seq),
            Policy::LowerBound => (node.lower_bound, 0, seq),
            Policy::Objective => (node.objective, 0, seq),
        };
        self.heap.push(Entry {
            primary,
            secondary,
            order,
            node: id,
        });
        self.max_len = self.max_len.max(self.heap.len());
    }

    pub fn pop(&mut self) -> Option<NodeId> {
        self.heap.pop().map(|e| e.node)
    }

    pub fn peek(&self) -> Option<NodeId> {
        self.heap.peek().map(|e| e.node)
    }

    /// Queued node ids, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.heap.iter().map(|e| e.node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;
    use crate::types::RuleId;

    fn node(depth: usize, lower_bound: f64, objective: f64, num_captured: usize) -> Node {
        let mut parents = Storage::new();
        let parent = parents.add(());
        Node::child(
            parent,
            depth,
            RuleId::new(0),
            true,
            true,
            lower_bound,
            objective,
            num_captured,
        )
    }

    fn drain(policy: Policy, nodes: &[Node]) -> Vec<usize> {
        let mut storage = Storage::new();
        let mut queue = Queue::new(policy);
        let ids: Vec<NodeId> = nodes.iter().map(|n| storage.add(*n)).collect();
        for (id, n) in ids.iter().zip(nodes) {
            queue.push(*id, n);
        }
        std::iter::from_fn(|| queue.pop())
            .map(|id| ids.iter().position(|&x| x == id).unwrap())
            .collect()
    }

    fn sample() -> Vec<Node> {
        vec![
            node(2, 0.30, 0.40, 5),
            node(1, 0.10, 0.50, 3),
            node(1, 0.10, 0.20, 1),
            node(3, 0.05, 0.45, 7),
        ]
    }

    #[test]
    fn test_bfs() {
        assert_eq!(drain(Policy::Bfs, &sample()), vec![1, 2, 0, 3]);
    }

    #[test]
    fn test_dfs() {
        assert_eq!(drain(Policy::Dfs, &sample()), vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_lower_bound_ties_by_insertion() {
        assert_eq!(drain(Policy::LowerBound, &sample()), vec![3, 1, 2, 0]);
    }

    #[test]
    fn test_curious_ties_by_captured() {
        assert_eq!(drain(Policy::Curious, &sample()), vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_objective() {
        assert_eq!(drain(Policy::Objective, &sample()), vec![2, 0, 3, 1]);
    }

    #[test]
    fn test_max_len() {
        let mut storage = Storage::new();
        let mut queue = Queue::new(Policy::Bfs);
        let n = node(1, 0.0, 0.0, 0);
        let a = storage.add(n);
        queue.push(a, &n);
        queue.push(a, &n);
        queue.pop();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.max_len(), 2);
        assert_eq!(queue.peek(), Some(a));
    }
}
