//! The search tree of partial rule lists.
//!
//! Each node stands for a prefix: the rule it appends and a link to the node
//! of the prefix it extends. Children therefore share their whole prefix with
//! the parent structurally. The captured vector of a node is not stored; it is
//! rebuilt from the rules on the path to the root when the node is expanded.
//!
//! A node stays alive while it is queued or while any of its children is
//! alive. Once it has been expanded and its last child is gone, it is freed
//! and the release propagates to its ancestors.

use log::debug;

use crate::bitset::BitSet;
use crate::rule::RuleSet;
use crate::storage::{NodeId, Storage};
use crate::types::RuleId;

/// One partial rule list.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Node {
    /// Rule appended by this node; `None` for the empty prefix.
    pub rule: Option<RuleId>,
    pub parent: Option<NodeId>,
    /// Number of rules in the prefix.
    pub depth: usize,
    /// Label predicted for the samples this node's rule captures.
    pub prediction: bool,
    /// Label predicted for samples no rule of the prefix captures.
    pub default_prediction: bool,
    /// Misclassification rate on captured samples plus `c` times the depth.
    pub lower_bound: f64,
    /// Lower bound plus the default rule's misclassification rate.
    pub objective: f64,
    /// Samples captured by the whole prefix.
    pub num_captured: usize,
    live_children: usize,
    expanded: bool,
    deleted: bool,
}

impl Node {
    /// The empty prefix: everything falls through to the default rule.
    pub fn root(default_prediction: bool, objective: f64) -> Self {
        Self {
            rule: None,
            parent: None,
            depth: 0,
            prediction: default_prediction,
            default_prediction,
            lower_bound: 0.0,
            objective,
            num_captured: 0,
            live_children: 0,
            expanded: false,
            deleted: false,
        }
    }

    /// A child appending `rule` to the prefix of `parent`.
    #[allow(clippy::too_many_arguments)]
    pub fn child(
        parent: NodeId,
        depth: usize,
        rule: RuleId,
        prediction: bool,
        default_prediction: bool,
        lower_bound: f64,
        objective: f64,
        num_captured: usize,
    ) -> Self {
        Self {
            rule: Some(rule),
            parent: Some(parent),
            depth,
            prediction,
            default_prediction,
            lower_bound,
            objective,
            num_captured,
            live_children: 0,
            expanded: false,
            deleted: false,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn live_children(&self) -> usize {
        self.live_children
    }
}

/// Prefix of a node, root first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prefix {
    pub rules: Vec<RuleId>,
    pub predictions: Vec<bool>,
}

pub struct Tree {
    storage: Storage<Node>,
    root: NodeId,
    freed: usize,
}

impl Tree {
    pub fn new(root: Node) -> Self {
        let mut storage = Storage::new();
        let root = storage.add(root);
        Self {
            storage,
            root,
            freed: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.storage.real_size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of nodes freed so far.
    pub fn freed(&self) -> usize {
        self.freed
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.storage.get(id)
    }

    /// Adds `node` as a child of its parent.
    pub fn add_child(&mut self, node: Node) -> NodeId {
        let parent = node.parent;
        let id = self.storage.add(node);
        if let Some(p) = parent.and_then(|p| self.storage.get_mut(p)) {
            p.live_children += 1;
        }
        id
    }

    /// Marks a node as dominated. It is freed when popped, or when its last child goes.
    pub fn mark_deleted(&mut self, id: NodeId) {
        if let Some(node) = self.storage.get_mut(id) {
            node.deleted = true;
        }
    }

    pub fn mark_expanded(&mut self, id: NodeId) {
        if let Some(node) = self.storage.get_mut(id) {
            node.expanded = true;
        }
    }

    /// Whether `id` is gone, or it or one of its ancestors was dominated.
    pub fn is_stale(&self, id: NodeId) -> bool {
        let mut current = self.storage.get(id);
        if current.is_none() {
            return true;
        }
        while let Some(node) = current {
            if node.deleted {
                return true;
            }
            current = node.parent.and_then(|p| self.storage.get(p));
        }
        false
    }

    /// Rules and predictions from the root down to `id`.
    pub fn prefix(&self, id: NodeId) -> Prefix {
        let mut rules = Vec::new();
        let mut predictions = Vec::new();
        let mut current = self.storage.get(id);
        while let Some(node) = current {
            if let Some(rule) = node.rule {
                rules.push(rule);
                predictions.push(node.prediction);
            }
            current = node.parent.and_then(|p| self.storage.get(p));
        }
        rules.reverse();
        predictions.reverse();
        Prefix { rules, predictions }
    }

    /// Samples not captured by any rule of `prefix`.
    pub fn not_captured(rules: &RuleSet, prefix: &[RuleId], n_samples: usize) -> BitSet {
        let mut not_captured = BitSet::ones(n_samples);
        for &rule in prefix {
            not_captured.and_not_assign(&rules.get(rule).captured);
        }
        not_captured
    }

    /// Frees `id` if nothing below it is alive any more, then walks up
    /// releasing every expanded ancestor left without children.
    ///
    /// The root is never freed. Returns the number of nodes freed.
    pub fn release(&mut self, id: NodeId) -> usize {
        let mut freed = 0;
        let mut current = id;
        loop {
            if current == self.root {
                break;
            }
            let Some(node) = self.storage.get(current) else {
                break;
            };
            if node.live_children > 0 {
                break;
            }
            let parent = node.parent;
            self.storage.drop(current);
            freed += 1;

            let Some(parent) = parent else {
                break;
            };
            match self.storage.get_mut(parent) {
                Some(p) => {
                    p.live_children -= 1;
                    if !p.expanded {
                        break;
                    }
                }
                None => break,
            }
            current = parent;
        }
        if freed > 0 {
            debug!("release({}): freed {} node(s)", id, freed);
        }
        self.freed += freed;
        freed
    }
}
