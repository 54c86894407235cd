//! Candidate rules and the rule miner.
//!
//! A rule is an antecedent (a conjunction of feature literals) together with
//! the bit vector of training samples it captures. The miner enumerates every
//! conjunction of at most `max_card` literals over distinct features and keeps
//! those whose support lies in `[min_support, 1 - min_support]`.
//!
//! Enumeration order is fixed: by cardinality, then by the ascending list of
//! features, then by polarity with `true` before `false`. The position of a
//! rule in this order is its [`RuleId`] and breaks ties later in the search.

use std::fmt;

use log::debug;

use crate::bitset::BitSet;
use crate::config::MAX_CARD;
use crate::data::Dataset;
use crate::types::{Literal, RuleId};

/// A conjunction of feature literals over distinct features.
///
/// The empty antecedent is always satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Antecedent(Vec<Literal>);

impl Antecedent {
    /// Creates an antecedent from literals, ordering them by feature.
    pub fn new(literals: impl IntoIterator<Item = Literal>) -> Self {
        let mut literals: Vec<Literal> = literals.into_iter().collect();
        literals.sort();
        Antecedent(literals)
    }

    pub fn literals(&self) -> &[Literal] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if the sample row satisfies every literal.
    pub fn matches(&self, row: &[bool]) -> bool {
        self.0.iter().all(|lit| lit.matches(row))
    }

    /// Computes the captured vector over the training data.
    pub fn capture(&self, data: &Dataset) -> BitSet {
        let mut captured = BitSet::ones(data.n_samples());
        for lit in &self.0 {
            let feature = data.feature(lit.feature());
            if lit.polarity() {
                captured = captured.and(feature);
            } else {
                captured.and_not_assign(feature);
            }
        }
        captured
    }

    /// Formats the antecedent as `a && not b` using the given feature names.
    pub fn display_with<'a>(&'a self, names: &'a [String]) -> AntecedentDisplay<'a> {
        AntecedentDisplay { antecedent: self, names }
    }
}

/// Helper returned by [`Antecedent::display_with`].
pub struct AntecedentDisplay<'a> {
    antecedent: &'a Antecedent,
    names: &'a [String],
}

impl fmt::Display for AntecedentDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, lit) in self.antecedent.literals().iter().enumerate() {
            if i > 0 {
                write!(f, " && ")?;
            }
            write!(f, "{}", lit.display_with(self.names))?;
        }
        Ok(())
    }
}

/// A mined candidate rule. Immutable once mined.
#[derive(Debug, Clone)]
pub struct Rule {
    pub antecedent: Antecedent,
    /// Training samples satisfying the antecedent.
    pub captured: BitSet,
}

impl Rule {
    /// Number of training samples captured.
    pub fn support_count(&self) -> usize {
        self.captured.count()
    }

    /// Fraction of training samples captured.
    pub fn support(&self) -> f64 {
        self.support_count() as f64 / self.captured.width() as f64
    }
}

/// The full, ordered set of candidate rules shared by the whole search.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Mines all antecedents of at most `max_card` literals with support in
    /// `[min_support, 1 - min_support]`.
    pub fn mine(data: &Dataset, max_card: usize, min_support: f64) -> Self {
        let n = data.n_samples() as f64;
        let m = data.n_features();
        let mut rules = Vec::new();
        let mut considered = 0usize;

        for card in 1..=max_card.min(m).min(MAX_CARD) {
            for_each_combination(m, card, |features| {
                for mask in 0..(1u32 << card) {
                    considered += 1;
                    let literals = features.iter().enumerate().map(|(k, &j)| {
                        if mask & (1u32 << k) == 0 {
                            Literal::positive(j as u32)
                        } else {
                            Literal::negative(j as u32)
                        }
                    });
                    let antecedent = Antecedent::new(literals);
                    let captured = antecedent.capture(data);
                    let support = captured.count() as f64 / n;
                    if support >= min_support && support <= 1.0 - min_support {
                        rules.push(Rule { antecedent, captured });
                    }
                }
            });
        }

        debug!(
            "mine(max_card = {}, min_support = {}): kept {} of {} antecedents",
            max_card,
            min_support,
            rules.len(),
            considered
        );
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, id: RuleId) -> &Rule {
        &self.rules[id.index()]
    }

    pub fn ids(&self) -> impl Iterator<Item = RuleId> {
        (0..self.rules.len() as u32).map(RuleId::new)
    }

    pub fn iter(&self) -> impl Iterator<Item = (RuleId, &Rule)> {
        self.ids().zip(&self.rules)
    }
}

/// Calls `f` with every ascending `k`-subset of `0..n`, in lexicographic order.
fn for_each_combination(n: usize, k: usize, mut f: impl FnMut(&[usize])) {
    if k == 0 || k > n {
        return;
    }
    let mut idx: Vec<usize> = (0..k).collect();
    loop {
        f(&idx);
        // Find the rightmost position that can still be advanced.
        let mut i = k;
        loop {
            if i == 0 {
                return;
            }
            i -= 1;
            if idx[i] < n - k + i {
                break;
            }
            if i == 0 {
                return;
            }
        }
        idx[i] += 1;
        for j in i + 1..k {
            idx[j] = idx[j - 1] + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::BinaryMatrix;

    fn toy() -> Dataset {
        let x = BinaryMatrix::from_u8_rows(&[[1u8, 0, 1], [0, 1, 0], [1, 1, 1]]).unwrap();
        Dataset::new(&x, &[true, false, true]).unwrap()
    }

    #[test]
    fn test_combinations() {
        let mut all = Vec::new();
        for_each_combination(4, 2, |c| all.push(c.to_vec()));
        assert_eq!(
            all,
            vec![vec![0, 1], vec![0, 2], vec![0, 3], vec![1, 2], vec![1, 3], vec![2, 3]]
        );

        let mut count = 0;
        for_each_combination(3, 3, |_| count += 1);
        assert_eq!(count, 1);

        for_each_combination(2, 3, |_| panic!("no 3-subsets of 2 elements"));
    }

    #[test]
    fn test_capture() {
        let data = toy();
        let a = Antecedent::new([Literal::positive(0), Literal::negative(1)]);
        assert_eq!(a.capture(&data).iter().collect::<Vec<_>>(), vec![0]);
        assert!(a.matches(&[true, false, false]));
        assert!(!a.matches(&[true, true, false]));
        assert_eq!(Antecedent::default().capture(&data).count(), 3);
    }

    #[test]
    fn test_mine_single_literals() {
        let data = toy();
        let rules = RuleSet::mine(&data, 1, 0.0);
        // 3 features, 2 polarities each, support filter [0, 1] keeps all.
        assert_eq!(rules.len(), 6);
        let first = rules.get(RuleId::new(0));
        assert_eq!(first.antecedent.literals(), &[Literal::positive(0)]);
        let second = rules.get(RuleId::new(1));
        assert_eq!(second.antecedent.literals(), &[Literal::negative(0)]);
    }

    #[test]
    fn test_mine_support_filter() {
        let data = toy();
        // Supports over 3 samples are multiples of 1/3, none equals 0.5.
        let rules = RuleSet::mine(&data, 2, 0.5);
        assert!(rules.is_empty());

        let rules = RuleSet::mine(&data, 2, 0.01);
        assert!(rules.iter().all(|(_, r)| (1..=2).contains(&r.support_count())));
        assert!(rules.iter().any(|(_, r)| r.antecedent.len() == 2));
    }

    #[test]
    fn test_mine_is_deterministic() {
        let data = toy();
        let a = RuleSet::mine(&data, 2, 0.01);
        let b = RuleSet::mine(&data, 2, 0.01);
        let names = |rs: &RuleSet| {
            rs.iter()
                .map(|(_, r)| r.antecedent.literals().to_vec())
                .collect::<Vec<_>>()
        };
        assert_eq!(names(&a), names(&b));
    }

    #[test]
    fn test_mine_caps_cardinality() {
        let data = toy();
        let full = RuleSet::mine(&data, 3, 0.0);
        let huge = RuleSet::mine(&data, 64, 0.0);
        assert_eq!(huge.len(), full.len());
    }

    #[test]
    fn test_antecedent_display() {
        let names = vec!["a".to_string(), "b".to_string()];
        let a = Antecedent::new([Literal::negative(1), Literal::positive(0)]);
        assert_eq!(a.display_with(&names).to_string(), "a && not b");
    }
}
