//! Type-safe wrappers for feature literals and rule identifiers.
//!
//! This module provides newtype wrappers that keep feature indices, rule
//! indices and signed literals apart, preventing common mix-ups in the
//! search code.

use std::fmt;

/// A feature test: feature `feature` (0-indexed) must equal `polarity`.
///
/// The signed encoding is 1-indexed, DIMACS-style: feature `j` tested for
/// `true` is `j + 1`, tested for `false` is `-(j + 1)`. Zero is reserved.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Literal {
    feature: u32,
    polarity: bool,
}

impl Literal {
    /// Creates a literal requiring `feature` to be `true`.
    pub const fn positive(feature: u32) -> Self {
        Literal { feature, polarity: true }
    }

    /// Creates a literal requiring `feature` to be `false`.
    pub const fn negative(feature: u32) -> Self {
        Literal { feature, polarity: false }
    }

    /// Returns the 0-indexed feature this literal tests.
    pub const fn feature(self) -> usize {
        self.feature as usize
    }

    /// Returns the value the feature must take.
    pub const fn polarity(self) -> bool {
        self.polarity
    }

    /// Evaluates the literal against one sample row.
    #[inline]
    pub fn matches(self, row: &[bool]) -> bool {
        row[self.feature()] == self.polarity
    }

    /// Converts to the signed 1-indexed encoding.
    pub fn to_signed(self) -> i64 {
        let v = self.feature as i64 + 1;
        if self.polarity {
            v
        } else {
            -v
        }
    }

    /// Converts from the signed 1-indexed encoding. Returns `None` for zero.
    pub fn from_signed(value: i64) -> Option<Self> {
        if value == 0 {
            return None;
        }
        let feature = u32::try_from(value.unsigned_abs() - 1).ok()?;
        Some(Literal {
            feature,
            polarity: value > 0,
        })
    }

    /// Formats the literal using the given feature names.
    pub fn display_with<'a>(self, names: &'a [String]) -> LiteralDisplay<'a> {
        LiteralDisplay { lit: self, names }
    }
}

impl std::ops::Neg for Literal {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Literal {
            feature: self.feature,
            polarity: !self.polarity,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_signed())
    }
}

/// Helper returned by [`Literal::display_with`].
pub struct LiteralDisplay<'a> {
    lit: Literal,
    names: &'a [String],
}

impl fmt::Display for LiteralDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.names.get(self.lit.feature()).map(String::as_str);
        match (name, self.lit.polarity()) {
            (Some(name), true) => write!(f, "{}", name),
            (Some(name), false) => write!(f, "not {}", name),
            (None, true) => write!(f, "feature{}", self.lit.feature() + 1),
            (None, false) => write!(f, "not feature{}", self.lit.feature() + 1),
        }
    }
}

/// Index of a candidate rule in the mined [`RuleSet`][crate::rule::RuleSet].
///
/// Candidate indices are stable for the whole search and define the
/// tie-breaking order between otherwise equivalent rules.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RuleId(u32);

impl RuleId {
    /// Creates a new rule id.
    pub const fn new(index: u32) -> Self {
        RuleId(index)
    }

    /// Returns the raw index as a `usize`.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

impl From<RuleId> for usize {
    fn from(id: RuleId) -> Self {
        id.0 as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_signed_encoding() {
        let pos = Literal::positive(0);
        let neg = Literal::negative(4);
        assert_eq!(pos.to_signed(), 1);
        assert_eq!(neg.to_signed(), -5);
        assert_eq!(Literal::from_signed(1), Some(pos));
        assert_eq!(Literal::from_signed(-5), Some(neg));
        assert_eq!(Literal::from_signed(0), None);
    }

    #[test]
    fn test_literal_negation() {
        let pos = Literal::positive(2);
        assert_eq!(-pos, Literal::negative(2));
        assert_eq!(-(-pos), pos);
    }

    #[test]
    fn test_literal_matches() {
        let row = [true, false];
        assert!(Literal::positive(0).matches(&row));
        assert!(!Literal::negative(0).matches(&row));
        assert!(Literal::negative(1).matches(&row));
    }

    #[test]
    fn test_literal_display_with_names() {
        let names = vec!["age>30".to_string()];
        assert_eq!(Literal::positive(0).display_with(&names).to_string(), "age>30");
        assert_eq!(Literal::negative(0).display_with(&names).to_string(), "not age>30");
        assert_eq!(Literal::positive(3).display_with(&names).to_string(), "feature4");
    }

    #[test]
    fn test_rule_id_order() {
        let r1 = RuleId::new(1);
        let r2 = RuleId::new(2);
        assert!(r1 < r2);
        assert_eq!(r2.index(), 2);
        assert_eq!(r1.to_string(), "r1");
    }
}
