//! Branch-and-bound search session.
//!
//! A [`Session`] owns everything one search needs: the dataset, the mined
//! rules, the search tree, the frontier queue and the prefix cache. The caller
//! drives it in bounded batches with [`Session::step_batch`] and finalizes it
//! with [`Session::end`]:
//!
//! ```text
//! begin ─► Running ─┬─► Exhausted ──────┐
//!                   ├─► BudgetExhausted ├─► Finalized
//!                   └─► Interrupted ────┘
//! ```
//!
//! Only a session that ran until its queue was empty certifies optimality.

use std::fmt;

use log::{debug, info};
use num_bigint::BigUint;

use crate::bitset::BitSet;
use crate::bound::{log10, Bounds, PruneReason};
use crate::cache::{Admission, PrefixCache};
use crate::config::Config;
use crate::data::{BinaryMatrix, Dataset};
use crate::error::{CorelsError, Result};
use crate::queue::Queue;
use crate::rule::RuleSet;
use crate::rulelist::{RuleEntry, RuleList};
use crate::storage::NodeId;
use crate::tree::{Node, Tree};
use crate::types::RuleId;

/// Steps between two progress lines.
const PROGRESS_INTERVAL: usize = 1000;

/// Lifecycle of a session.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SearchState {
    /// Nodes are left to expand.
    Running,
    /// The queue ran empty: the incumbent is optimal.
    Exhausted,
    /// The step budget `n_iter` is spent.
    BudgetExhausted,
    /// The caller asked to stop.
    Interrupted,
    /// The result has been extracted.
    Finalized,
}

impl fmt::Display for SearchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchState::Running => "running",
            SearchState::Exhausted => "exhausted",
            SearchState::BudgetExhausted => "budget exhausted",
            SearchState::Interrupted => "interrupted",
            SearchState::Finalized => "finalized",
        };
        f.write_str(name)
    }
}

/// Counters collected while searching.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes popped and expanded.
    pub steps: usize,
    /// Children evaluated by the bound engine.
    pub evaluated: usize,
    /// Children added to the tree and queue.
    pub inserted: usize,
    /// Children capturing no remaining sample.
    pub subsumed: usize,
    pub pruned_lower_bound: usize,
    pub pruned_support: usize,
    pub pruned_lookahead: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub cache_replacements: usize,
    /// Times the incumbent objective went down.
    pub improvements: usize,
    pub max_queue_len: usize,
    /// Nodes released back to the arena.
    pub garbage_collected: usize,
}

impl fmt::Display for SearchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "steps={} evaluated={} inserted={} subsumed={} pruned(lb={} support={} lookahead={}) \
             cache(hits={} misses={} replaced={}) improvements={} max_queue={} gc={}",
            self.steps,
            self.evaluated,
            self.inserted,
            self.subsumed,
            self.pruned_lower_bound,
            self.pruned_support,
            self.pruned_lookahead,
            self.cache_hits,
            self.cache_misses,
            self.cache_replacements,
            self.improvements,
            self.max_queue_len,
            self.garbage_collected
        )
    }
}

/// Best complete rule list found so far.
#[derive(Debug, Clone)]
struct Incumbent {
    rules: Vec<RuleId>,
    predictions: Vec<bool>,
    default_prediction: bool,
    objective: f64,
}

pub struct Session {
    data: Dataset,
    rules: RuleSet,
    config: Config,
    bounds: Bounds,
    tree: Tree,
    queue: Queue,
    cache: PrefixCache,
    incumbent: Incumbent,
    state: SearchState,
    stats: SearchStats,
    features: Vec<String>,
    prediction_name: String,
    remaining_space: Option<BigUint>,
    result: Option<RuleList>,
}

impl Session {
    /// Validates the inputs, mines the candidate rules and seeds the queue
    /// with the empty prefix.
    pub fn begin(
        samples: &BinaryMatrix,
        labels: &[bool],
        features: Vec<String>,
        prediction_name: impl Into<String>,
        config: Config,
    ) -> Result<Self> {
        config.validate()?;
        let data = Dataset::new(samples, labels)?;
        check_features(&features, data.n_features())?;
        let rules = RuleSet::mine(&data, config.max_card, config.min_support);
        Self::with_rules(data, rules, features, prediction_name, config)
    }

    /// Starts a search over an already mined rule set.
    pub fn with_rules(
        data: Dataset,
        rules: RuleSet,
        features: Vec<String>,
        prediction_name: impl Into<String>,
        config: Config,
    ) -> Result<Self> {
        config.validate()?;
        check_features(&features, data.n_features())?;
        let prediction_name = prediction_name.into();

        let n = data.n_samples();
        let bounds = Bounds::new(&config, n);
        let (default_prediction, correct) = data.majority(&BitSet::ones(n));
        let objective = bounds.objective(n - correct, 0);

        let root = Node::root(default_prediction, objective);
        let tree = Tree::new(root);
        let mut queue = Queue::new(config.policy);
        queue.push(tree.root(), &root);

        let session = Self {
            cache: PrefixCache::new(config.map_type),
            incumbent: Incumbent {
                rules: Vec::new(),
                predictions: Vec::new(),
                default_prediction,
                objective,
            },
            state: SearchState::Running,
            stats: SearchStats::default(),
            remaining_space: None,
            result: None,
            data,
            rules,
            config,
            bounds,
            tree,
            queue,
            features,
            prediction_name,
        };
        session.log_setup();
        Ok(session)
    }

    fn log_setup(&self) {
        let verbosity = self.config.verbosity;
        if verbosity.log {
            info!(
                "corels-rs {}: {} samples, {} features, {} rules",
                env!("CARGO_PKG_VERSION"),
                self.data.n_samples(),
                self.data.n_features(),
                self.rules.len()
            );
            info!(
                "c={} n_iter={} policy={} map_type={} ablation={} max_card={} min_support={}",
                self.config.c,
                self.config.n_iter,
                self.config.policy,
                self.config.map_type,
                self.config.ablation.id(),
                self.config.max_card,
                self.config.min_support
            );
        }
        if verbosity.rule {
            for (id, rule) in self.rules.iter() {
                info!(
                    "rule {} [{}]: support {:.4}, captures {}",
                    id,
                    rule.antecedent.display_with(&self.features),
                    rule.support(),
                    rule.support_count()
                );
                if verbosity.samples {
                    info!("  {}", rule.captured);
                }
            }
        }
        if verbosity.label {
            for label in [false, true] {
                let samples = self.data.label(label);
                info!("label {}={}: captures {}", self.prediction_name, label, samples.count());
                if verbosity.samples {
                    info!("  {}", samples);
                }
            }
        }
        if verbosity.progress {
            info!(
                "default rule predicts {} with objective {:.6}",
                self.incumbent.default_prediction, self.incumbent.objective
            );
        }
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Objective of the best rule list found so far.
    pub fn min_objective(&self) -> f64 {
        self.incumbent.objective
    }

    /// Number of entries in the queue, including stale ones not yet popped.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Number of live nodes in the search tree.
    pub fn tree_size(&self) -> usize {
        self.tree.len()
    }

    pub fn stats(&self) -> SearchStats {
        SearchStats {
            cache_hits: self.cache.hits(),
            cache_misses: self.cache.misses(),
            cache_replacements: self.cache.replacements(),
            max_queue_len: self.queue.max_len(),
            garbage_collected: self.tree.freed(),
            ..self.stats
        }
    }

    /// Upper bound on the rule lists not yet ruled out, as of the last batch.
    ///
    /// Only tracked when `calculate_size` is set.
    pub fn remaining_space(&self) -> Option<&BigUint> {
        self.remaining_space.as_ref()
    }

    /// Whether `step` may still do work.
    pub fn has_more(&self) -> bool {
        self.state == SearchState::Running
    }

    /// Pops and expands one node. Returns whether more work remains.
    pub fn step(&mut self) -> Result<bool> {
        if self.state == SearchState::Finalized {
            return Err(CorelsError::state("Cannot step a finalized session"));
        }
        self.settle();
        if self.state != SearchState::Running {
            return Ok(false);
        }

        // `settle` left a live node at the front.
        let Some(id) = self.queue.pop() else {
            self.state = SearchState::Exhausted;
            return Ok(false);
        };
        self.stats.steps += 1;
        self.expand(id);

        if self.config.verbosity.progress && self.stats.steps % PROGRESS_INTERVAL == 0 {
            info!(
                "step {}: queue {}, tree {}, cache {}, min objective {:.6}",
                self.stats.steps,
                self.queue.len(),
                self.tree.len(),
                self.cache.len(),
                self.incumbent.objective
            );
        }

        self.settle();
        Ok(self.has_more())
    }

    /// Runs up to `max_steps` steps. Returns whether more work remains.
    pub fn step_batch(&mut self, max_steps: usize) -> Result<bool> {
        if self.state == SearchState::Finalized {
            return Err(CorelsError::state("Cannot step a finalized session"));
        }
        for _ in 0..max_steps {
            if !self.step()? {
                break;
            }
        }
        if self.config.calculate_size {
            let size = self.compute_remaining_space();
            if self.config.verbosity.progress {
                info!("remaining search space: 10^{:.3}", log10(&size));
            }
            self.remaining_space = Some(size);
        }
        Ok(self.has_more())
    }

    /// Requests an early stop. The next `end` yields an uncertified list.
    pub fn interrupt(&mut self) {
        if self.state == SearchState::Running {
            debug!("interrupt() after {} step(s)", self.stats.steps);
            self.state = SearchState::Interrupted;
        }
    }

    /// Finalizes the session and extracts the best rule list.
    ///
    /// The list is certified optimal only if `early` is false and the queue
    /// was exhausted. Calling `end` again returns the same list.
    pub fn end(&mut self, early: bool) -> Result<RuleList> {
        if let Some(result) = &self.result {
            return Ok(result.clone());
        }

        let certified = !early && self.state == SearchState::Exhausted;
        let entries = self
            .incumbent
            .rules
            .iter()
            .zip(&self.incumbent.predictions)
            .map(|(&id, &prediction)| RuleEntry {
                antecedent: self.rules.get(id).antecedent.clone(),
                prediction,
            })
            .collect();
        let result = RuleList::new(
            entries,
            self.incumbent.default_prediction,
            self.features.clone(),
            self.prediction_name.clone(),
            certified,
        );

        if self.config.verbosity.progress {
            info!(
                "search {} after {} step(s): objective {:.6}, {} rule(s), {}",
                self.state,
                self.stats.steps,
                self.incumbent.objective,
                result.len(),
                if certified { "certified optimal" } else { "not certified" }
            );
            info!("{}", self.stats());
        }

        self.state = SearchState::Finalized;
        self.result = Some(result.clone());
        Ok(result)
    }

    /// Drops stale or hopeless nodes from the front of the queue, then moves
    /// a running session to its terminal state if no work is left.
    fn settle(&mut self) {
        if self.state != SearchState::Running {
            return;
        }
        while let Some(id) = self.queue.peek() {
            if self.is_expandable(id) {
                break;
            }
            self.queue.pop();
            self.tree.release(id);
        }
        if self.queue.is_empty() {
            self.state = SearchState::Exhausted;
        } else if self.stats.steps >= self.config.n_iter {
            self.state = SearchState::BudgetExhausted;
        }
    }

    fn is_expandable(&self, id: NodeId) -> bool {
        match self.tree.get(id) {
            Some(node) => {
                !self.tree.is_stale(id) && self.bounds.worth_expanding(node.lower_bound, self.incumbent.objective)
            }
            None => false,
        }
    }

    /// Evaluates every rule not yet in the prefix of `id` as its next rule.
    fn expand(&mut self, id: NodeId) {
        let Some(&node) = self.tree.get(id) else {
            return;
        };
        let Session {
            data,
            rules,
            bounds,
            tree,
            queue,
            cache,
            incumbent,
            stats,
            config,
            ..
        } = self;

        let prefix = tree.prefix(id);
        let not_captured = Tree::not_captured(rules, &prefix.rules, data.n_samples());
        let mut in_prefix = vec![false; rules.len()];
        for rule in &prefix.rules {
            in_prefix[rule.index()] = true;
        }

        for (rule_id, rule) in rules.iter() {
            if in_prefix[rule_id.index()] {
                continue;
            }
            stats.evaluated += 1;
            let eval = match bounds.evaluate(data, &node, &not_captured, &rule.captured, incumbent.objective) {
                Ok(eval) => eval,
                Err(PruneReason::Subsumed) => {
                    stats.subsumed += 1;
                    continue;
                }
                Err(PruneReason::Support) => {
                    stats.pruned_support += 1;
                    continue;
                }
                Err(PruneReason::LowerBound) => {
                    stats.pruned_lower_bound += 1;
                    continue;
                }
            };

            if eval.objective < incumbent.objective {
                incumbent.rules = prefix.rules.clone();
                incumbent.rules.push(rule_id);
                incumbent.predictions = prefix.predictions.clone();
                incumbent.predictions.push(eval.prediction);
                incumbent.default_prediction = eval.default_prediction;
                incumbent.objective = eval.objective;
                stats.improvements += 1;
                if config.verbosity.progress {
                    info!(
                        "step {}: new min objective {:.6} with {} rule(s)",
                        stats.steps,
                        eval.objective,
                        incumbent.rules.len()
                    );
                }
            }

            // Nothing left to capture: no child can do better.
            if eval.num_remaining == 0 {
                continue;
            }
            if !bounds.worth_expanding(eval.lower_bound, incumbent.objective) {
                if config.ablation.lookahead_bound() {
                    stats.pruned_lookahead += 1;
                } else {
                    stats.pruned_lower_bound += 1;
                }
                continue;
            }

            let child = Node::child(
                id,
                node.depth + 1,
                rule_id,
                eval.prediction,
                eval.default_prediction,
                eval.lower_bound,
                eval.objective,
                eval.num_captured,
            );
            let admission = cache.admit(
                &prefix.rules,
                rule_id,
                || not_captured.and_not(&rule.captured),
                eval.lower_bound,
                || tree.add_child(child),
            );
            match admission {
                Admission::Inserted(child_id) => {
                    queue.push(child_id, &child);
                    stats.inserted += 1;
                }
                Admission::Replaced { node: child_id, old } => {
                    tree.mark_deleted(old);
                    queue.push(child_id, &child);
                    stats.inserted += 1;
                }
                Admission::Rejected => {}
            }
        }

        tree.mark_expanded(id);
        if tree.get(id).map_or(false, |n| n.live_children() == 0) {
            tree.release(id);
        }
    }

    fn compute_remaining_space(&self) -> BigUint {
        let num_rules = self.rules.len();
        let mut total = BigUint::from(0u32);
        for id in self.queue.iter() {
            if !self.is_expandable(id) {
                continue;
            }
            if let Some(node) = self.tree.get(id) {
                total += self.bounds.remaining_extensions(
                    num_rules,
                    node.depth,
                    node.lower_bound,
                    self.incumbent.objective,
                );
            }
        }
        total
    }
}

fn check_features(features: &[String], n_features: usize) -> Result<()> {
    if features.len() != n_features {
        return Err(CorelsError::shape(format!(
            "Feature count mismatch between sample data ({}) and feature names ({})",
            n_features,
            features.len()
        )));
    }
    Ok(())
}
