//! Objective and pruning bounds.
//!
//! # Objective
//!
//! For a rule list `d` of length `K` over `n` samples:
//!
//! ```text
//! R(d) = misclassified(d) / n + c · K
//! ```
//!
//! # Lower bound
//!
//! For a prefix `p`, only the samples captured by `p` are already committed:
//!
//! ```text
//! b(p) = misclassified_captured(p) / n + c · |p|
//! ```
//!
//! Appending rules never un-misclassifies a captured sample and every rule
//! costs another `c`, so `b(p) ≤ R(d)` for every rule list `d` starting with
//! `p`. A child whose bound already reaches the best objective found so far is
//! pruned; ties are pruned too since they cannot improve the certified value.
//!
//! # Antecedent support bound
//!
//! A rule appended to `p` whose correctly classified captured samples number
//! fewer than `c · n` cannot belong to an optimal list: dropping it changes the
//! misclassification by less than `c` and saves `c`. The same holds for its
//! plain capture. Captures below the `min_support` fraction of the samples are
//! rejected as well, mirroring the support window applied at mining time. The
//! bound is switched on or off as a whole ([`Ablation::NoSupportBound`]).
//!
//! # Lookahead bound
//!
//! A child is only worth queueing if one of its own children could still beat
//! the incumbent. Any child of `p` costs at least `b(p) + c`, so `p` is kept
//! only while `b(p) + c < R*` ([`Ablation::NoLookahead`] disables this).
//!
//! # Remaining search space
//!
//! A queued prefix at depth `d` with bound `b` can still grow by at most
//! `K = min(R - d, ⌊(R* - b) / c⌋)` rules before its bound passes the
//! incumbent `R*`, giving at most `Σ_{k=0..K} (R - d)! / (R - d - k)!` rule
//! lists below it. Summed over the queue this is an upper bound on the work
//! left, computed exactly with [`BigUint`].

use num_bigint::BigUint;

use crate::bitset::BitSet;
use crate::config::{Ablation, Config};
use crate::data::Dataset;
use crate::tree::Node;

/// Why a child was discarded.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PruneReason {
    /// Captures no remaining sample.
    Subsumed,
    /// Fails the antecedent support bound.
    Support,
    /// Lower bound reaches the incumbent objective.
    LowerBound,
}

/// A child that survived pruning, with its bound and objective.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Evaluation {
    /// Label predicted for the newly captured samples.
    pub prediction: bool,
    /// Label predicted for the samples still uncaptured.
    pub default_prediction: bool,
    pub lower_bound: f64,
    pub objective: f64,
    /// Samples captured by the child's whole prefix.
    pub num_captured: usize,
    /// Samples left for the default rule.
    pub num_remaining: usize,
}

/// Bound engine parameters fixed for a session.
#[derive(Debug, Clone)]
pub struct Bounds {
    c: f64,
    n_samples: f64,
    ablation: Ablation,
    /// Minimum capture count, as a sample count.
    min_capture: f64,
    /// Minimum correctly classified capture count, as a sample count.
    min_correct: f64,
}

impl Bounds {
    pub fn new(config: &Config, n_samples: usize) -> Self {
        let n = n_samples as f64;
        Self {
            c: config.c,
            n_samples: n,
            ablation: config.ablation,
            min_capture: config.min_support.max(config.c) * n,
            min_correct: config.c * n,
        }
    }

    /// Objective of a rule list with `misclassified` errors and `length` rules.
    pub fn objective(&self, misclassified: usize, length: usize) -> f64 {
        misclassified as f64 / self.n_samples + self.c * length as f64
    }

    /// Evaluates appending `rule_captured` to `parent`, whose prefix leaves
    /// `not_captured` for the default rule.
    pub fn evaluate(
        &self,
        data: &Dataset,
        parent: &Node,
        not_captured: &BitSet,
        rule_captured: &BitSet,
        min_objective: f64,
    ) -> Result<Evaluation, PruneReason> {
        let num_captured = not_captured.and_count(rule_captured);
        if num_captured == 0 {
            return Err(PruneReason::Subsumed);
        }
        let support_bound = self.ablation.support_bound();
        if support_bound && (num_captured as f64) < self.min_capture {
            return Err(PruneReason::Support);
        }

        let captured = not_captured.and(rule_captured);
        let (prediction, correct) = data.majority(&captured);
        if support_bound && (correct as f64) < self.min_correct {
            return Err(PruneReason::Support);
        }

        let lower_bound = parent.lower_bound + (num_captured - correct) as f64 / self.n_samples + self.c;
        if lower_bound >= min_objective {
            return Err(PruneReason::LowerBound);
        }

        let remaining = not_captured.and_not(rule_captured);
        let (default_prediction, default_correct) = data.majority(&remaining);
        let num_remaining = remaining.count();
        let objective = lower_bound + (num_remaining - default_correct) as f64 / self.n_samples;

        Ok(Evaluation {
            prediction,
            default_prediction,
            lower_bound,
            objective,
            num_captured: parent.num_captured + num_captured,
            num_remaining,
        })
    }

    /// Whether a prefix with this bound may still have children beating `min_objective`.
    pub fn worth_expanding(&self, lower_bound: f64, min_objective: f64) -> bool {
        if self.ablation.lookahead_bound() {
            lower_bound + self.c < min_objective
        } else {
            lower_bound < min_objective
        }
    }

    /// Upper bound on the number of rule lists extending a queued prefix.
    pub fn remaining_extensions(&self, num_rules: usize, depth: usize, lower_bound: f64, min_objective: f64) -> BigUint {
        let free = num_rules.saturating_sub(depth);
        let max_more = if self.c > 0.0 {
            let slack = ((min_objective - lower_bound) / self.c).floor();
            if slack <= 0.0 {
                0
            } else {
                (slack as usize).min(free)
            }
        } else {
            free
        };

        let mut total = BigUint::from(1u32);
        let mut term = BigUint::from(1u32);
        for k in 1..=max_more {
            term *= BigUint::from(free - k + 1);
            total += &term;
        }
        total
    }
}

/// Base-10 logarithm of a big unsigned integer, for reporting.
pub fn log10(value: &BigUint) -> f64 {
    let digits = value.to_str_radix(10);
    if digits == "0" {
        return f64::NEG_INFINITY;
    }
    let lead = &digits[..digits.len().min(15)];
    let lead_value: f64 = lead.parse().unwrap_or(1.0);
    lead_value.log10() + (digits.len() - lead.len()) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::BinaryMatrix;
    use crate::storage::Storage;
    use crate::types::RuleId;

    fn data() -> Dataset {
        // Feature 0 separates the labels except for sample 3.
        let x = BinaryMatrix::from_u8_rows(&[[1u8, 0], [1, 1], [0, 1], [0, 0]]).unwrap();
        Dataset::new(&x, &[true, true, false, true]).unwrap()
    }

    fn root() -> Node {
        Node::root(true, 0.25)
    }

    #[test]
    fn test_objective() {
        let config = Config::default().with_c(0.1);
        let bounds = Bounds::new(&config, 4);
        assert!((bounds.objective(1, 2) - 0.45).abs() < 1e-12);
        assert_eq!(bounds.objective(0, 0), 0.0);
    }

    #[test]
    fn test_evaluate_child() {
        let data = data();
        let config = Config::default().with_c(0.01);
        let bounds = Bounds::new(&config, 4);
        let all = BitSet::ones(4);

        let e = bounds.evaluate(&data, &root(), &all, data.feature(0), 1.0).unwrap();
        assert!(e.prediction);
        assert_eq!(e.num_captured, 2);
        assert_eq!(e.num_remaining, 2);
        // Captured samples are all labelled true: bound is just c.
        assert!((e.lower_bound - 0.01).abs() < 1e-12);
        // Remaining {2: false, 3: true}: tie goes to true, one error.
        assert!(e.default_prediction);
        assert!((e.objective - 0.26).abs() < 1e-12);
    }

    #[test]
    fn test_subsumed_rule() {
        let data = data();
        let bounds = Bounds::new(&Config::default(), 4);
        let nothing_left = BitSet::zeros(4);
        let r = bounds.evaluate(&data, &root(), &nothing_left, data.feature(0), 1.0);
        assert_eq!(r, Err(PruneReason::Subsumed));
    }

    #[test]
    fn test_lower_bound_prunes_ties() {
        let data = data();
        let config = Config::default().with_c(0.25);
        let bounds = Bounds::new(&config, 4);
        let all = BitSet::ones(4);
        // Bound is exactly c = 0.25, equal to the incumbent.
        let r = bounds.evaluate(&data, &root(), &all, data.feature(0), 0.25);
        assert_eq!(r, Err(PruneReason::LowerBound));
    }

    #[test]
    fn test_support_bound_and_ablation() {
        let data = data();
        let all = BitSet::ones(4);
        let one_sample = BitSet::from_indices(4, [3]);

        // c = 0.3 requires at least 1.2 correctly captured samples.
        let config = Config::default().with_c(0.3);
        let bounds = Bounds::new(&config, 4);
        let r = bounds.evaluate(&data, &root(), &all, &one_sample, 10.0);
        assert_eq!(r, Err(PruneReason::Support));

        let bounds = Bounds::new(&config.with_ablation(Ablation::NoSupportBound), 4);
        assert!(bounds.evaluate(&data, &root(), &all, &one_sample, 10.0).is_ok());
    }

    #[test]
    fn test_lookahead() {
        let config = Config::default().with_c(0.1);
        let bounds = Bounds::new(&config, 10);
        assert!(bounds.worth_expanding(0.1, 0.25));
        assert!(!bounds.worth_expanding(0.15, 0.25));

        let bounds = Bounds::new(&config.with_ablation(Ablation::NoLookahead), 10);
        assert!(bounds.worth_expanding(0.15, 0.25));
        assert!(!bounds.worth_expanding(0.25, 0.25));
    }

    #[test]
    fn test_remaining_extensions() {
        let config = Config::default().with_c(0.1);
        let bounds = Bounds::new(&config, 10);
        // Slack for 2 more rules out of 4 free: 1 + 4 + 4*3 = 17.
        assert_eq!(bounds.remaining_extensions(5, 1, 0.1, 0.35), BigUint::from(17u32));
        // No slack at all: only the prefix itself.
        assert_eq!(bounds.remaining_extensions(5, 1, 0.4, 0.35), BigUint::from(1u32));
        // Capped by the number of unused rules: 1 + 2 + 2 = 5.
        assert_eq!(bounds.remaining_extensions(3, 1, 0.0, 10.0), BigUint::from(5u32));
    }

    #[test]
    fn test_log10() {
        assert!((log10(&BigUint::from(1000u32)) - 3.0).abs() < 1e-12);
        assert!((log10(&BigUint::from(2u32)) - 2f64.log10()).abs() < 1e-12);
        let big = BigUint::from(10u32).pow(40);
        assert!((log10(&big) - 40.0).abs() < 1e-9);
        assert_eq!(log10(&BigUint::from(0u32)), f64::NEG_INFINITY);
    }

    #[test]
    fn test_lower_bound_accumulates_from_parent() {
        let data = data();
        let config = Config::default().with_c(0.01);
        let bounds = Bounds::new(&config, 4);

        let mut storage = Storage::new();
        let root_id = storage.add(());
        let parent = Node::child(root_id, 1, RuleId::new(0), true, true, 0.26, 0.5, 1);
        let not_captured = BitSet::from_indices(4, [1, 2, 3]);
        // Feature 1 captures {1: true, 2: false}: one error either way.
        let e = bounds.evaluate(&data, &parent, &not_captured, data.feature(1), 1.0).unwrap();
        assert!((e.lower_bound - (0.26 + 0.25 + 0.01)).abs() < 1e-12);
        assert_eq!(e.num_captured, 3);
    }
}
