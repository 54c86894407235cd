//! Search configuration.
//!
//! All validation happens in [`Config::validate`], before any search state is
//! created. The defaults match the reference CORELS classifier.

use std::fmt;
use std::str::FromStr;

use crate::error::{CorelsError, Result};

/// Order in which frontier nodes are popped from the queue.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum Policy {
    /// Breadth-first: shallower prefixes first, FIFO within a depth.
    Bfs,
    /// Lowest lower bound first, then fewest captured samples.
    Curious,
    /// Lowest lower bound first.
    #[default]
    LowerBound,
    /// Lowest objective first.
    Objective,
    /// Depth-first: most recently inserted node first.
    Dfs,
}

impl Policy {
    pub const ALL: [Policy; 5] = [
        Policy::Bfs,
        Policy::Curious,
        Policy::LowerBound,
        Policy::Objective,
        Policy::Dfs,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Policy::Bfs => "bfs",
            Policy::Curious => "curious",
            Policy::LowerBound => "lower_bound",
            Policy::Objective => "objective",
            Policy::Dfs => "dfs",
        }
    }

    /// Looks up a policy by its numeric id (position in [`Policy::ALL`]).
    pub fn from_id(id: usize) -> Result<Self> {
        Self::ALL
            .get(id)
            .copied()
            .ok_or_else(|| CorelsError::config(format!("Unknown search policy id {}", id)))
    }
}

impl FromStr for Policy {
    type Err = CorelsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL.into_iter().find(|p| p.name() == s).ok_or_else(|| {
            CorelsError::config(format!(
                "Search policy must be one of {:?}, got: {}",
                Self::ALL.map(Policy::name),
                s
            ))
        })
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind of symmetry-aware prefix cache.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum MapType {
    /// No cache: every child is inserted as computed.
    None,
    /// Keyed by the set of rules in the prefix, regardless of their order.
    #[default]
    Prefix,
    /// Keyed by the vector of samples not yet captured.
    Captured,
}

impl MapType {
    pub const ALL: [MapType; 3] = [MapType::None, MapType::Prefix, MapType::Captured];

    pub fn name(self) -> &'static str {
        match self {
            MapType::None => "none",
            MapType::Prefix => "prefix",
            MapType::Captured => "captured",
        }
    }

    pub fn from_id(id: usize) -> Result<Self> {
        Self::ALL
            .get(id)
            .copied()
            .ok_or_else(|| CorelsError::config(format!("Unknown map type id {}", id)))
    }
}

impl FromStr for MapType {
    type Err = CorelsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL.into_iter().find(|m| m.name() == s).ok_or_else(|| {
            CorelsError::config(format!(
                "Map type must be one of {:?}, got: {}",
                Self::ALL.map(MapType::name),
                s
            ))
        })
    }
}

impl fmt::Display for MapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which optional bounds are switched off.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum Ablation {
    /// All bounds active.
    #[default]
    None,
    /// Antecedent support bound disabled.
    NoSupportBound,
    /// Lookahead bound disabled.
    NoLookahead,
}

impl Ablation {
    pub fn from_id(id: i64) -> Result<Self> {
        match id {
            0 => Ok(Ablation::None),
            1 => Ok(Ablation::NoSupportBound),
            2 => Ok(Ablation::NoLookahead),
            _ => Err(CorelsError::config(format!(
                "Ablation must be an integer between 0 and 2, inclusive, got: {}",
                id
            ))),
        }
    }

    pub fn id(self) -> u8 {
        match self {
            Ablation::None => 0,
            Ablation::NoSupportBound => 1,
            Ablation::NoLookahead => 2,
        }
    }

    pub fn support_bound(self) -> bool {
        self != Ablation::NoSupportBound
    }

    pub fn lookahead_bound(self) -> bool {
        self != Ablation::NoLookahead
    }
}

/// The recognized verbosity flags, already expanded and validated.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct Verbosity {
    /// Summary line for every mined rule.
    pub rule: bool,
    /// Summary line for every label.
    pub label: bool,
    /// Full bit-vector dump of rules and/or labels.
    pub samples: bool,
    /// Periodic progress messages.
    pub progress: bool,
    /// Environment and configuration line at session start.
    pub log: bool,
}

impl Verbosity {
    pub const FLAGS: [&'static str; 6] = ["rule", "label", "samples", "progress", "log", "loud"];

    /// No output at all.
    pub fn quiet() -> Self {
        Self::default()
    }

    /// Parses a list of flag names. `loud` enables `progress`, `log`, `label` and `rule`.
    pub fn from_flags<S: AsRef<str>>(flags: &[S]) -> Result<Self> {
        let mut v = Self::default();
        for flag in flags {
            match flag.as_ref() {
                "rule" => v.rule = true,
                "label" => v.label = true,
                "samples" => v.samples = true,
                "progress" => v.progress = true,
                "log" => v.log = true,
                "loud" => {
                    v.progress = true;
                    v.log = true;
                    v.label = true;
                    v.rule = true;
                }
                other => {
                    return Err(CorelsError::config(format!(
                        "Verbosities must be one of {:?}, got: {}",
                        Self::FLAGS,
                        other
                    )))
                }
            }
        }
        v.validate()?;
        Ok(v)
    }

    pub fn validate(&self) -> Result<()> {
        if self.samples && !self.rule && !self.label {
            return Err(CorelsError::config(
                "'samples' verbosity option must be combined with at least one of 'rule' or 'label'",
            ));
        }
        Ok(())
    }
}

impl FromStr for Verbosity {
    type Err = CorelsError;

    /// Parses a comma-separated flag list; the empty string is quiet.
    fn from_str(s: &str) -> Result<Self> {
        let flags: Vec<&str> = s.split(',').map(str::trim).filter(|f| !f.is_empty()).collect();
        Self::from_flags(&flags)
    }
}

/// Largest antecedent size; polarity masks are enumerated as `u32` bits.
pub const MAX_CARD: usize = 31;

/// Configuration of one rule-list search.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Regularization: objective penalty per rule.
    pub c: f64,
    /// Maximum number of scheduler steps per fit.
    pub n_iter: usize,
    pub map_type: MapType,
    pub policy: Policy,
    pub verbosity: Verbosity,
    pub ablation: Ablation,
    /// Maximum number of literals in a mined antecedent.
    pub max_card: usize,
    /// Minimum fraction of samples a rule must capture; `1 - min_support` is the maximum.
    pub min_support: f64,
    /// Track the size of the remaining search space.
    pub calculate_size: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            c: 0.01,
            n_iter: 10000,
            map_type: MapType::default(),
            policy: Policy::default(),
            verbosity: Verbosity {
                progress: true,
                ..Verbosity::default()
            },
            ablation: Ablation::default(),
            max_card: 2,
            min_support: 0.01,
            calculate_size: false,
        }
    }
}

impl Config {
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn with_n_iter(mut self, n_iter: usize) -> Self {
        self.n_iter = n_iter;
        self
    }

    pub fn with_map_type(mut self, map_type: MapType) -> Self {
        self.map_type = map_type;
        self
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_ablation(mut self, ablation: Ablation) -> Self {
        self.ablation = ablation;
        self
    }

    pub fn with_max_card(mut self, max_card: usize) -> Self {
        self.max_card = max_card;
        self
    }

    pub fn with_min_support(mut self, min_support: f64) -> Self {
        self.min_support = min_support;
        self
    }

    pub fn with_calculate_size(mut self, calculate_size: bool) -> Self {
        self.calculate_size = calculate_size;
        self
    }

    /// Checks every numeric range. Enum-valued fields are valid by construction.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.c) {
            return Err(CorelsError::config(format!(
                "Regularization constant (c) must be a float between 0.0 and 1.0, got: {}",
                self.c
            )));
        }
        if !(0.0..=1.0).contains(&self.min_support) {
            return Err(CorelsError::config(format!(
                "Minimum support must be a float between 0.0 and 1.0, got: {}",
                self.min_support
            )));
        }
        if !(1..=MAX_CARD).contains(&self.max_card) {
            return Err(CorelsError::config(format!(
                "Max cardinality must be an integer between 1 and {}, got: {}",
                MAX_CARD, self.max_card
            )));
        }
        self.verbosity.validate()
    }
}
