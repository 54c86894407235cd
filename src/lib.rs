//! # corels-rs: Certifiably Optimal Rule Lists in Rust
//!
//! **`corels-rs`** learns rule lists over binary features by branch-and-bound,
//! and certifies that the list it returns minimizes the regularized objective
//! `misclassification rate + c · (number of rules)`.
//!
//! ## What is a rule list?
//!
//! An ordered sequence of `if antecedent then prediction` rules followed by a
//! default prediction. Each antecedent is a conjunction of feature literals.
//! A sample is classified by the first rule it satisfies:
//!
//! ```text
//! if [age_over_30 && not smoker]:
//!   healthy = True
//! else if [exercises]:
//!   healthy = True
//! else:
//!   healthy = False
//! ```
//!
//! ## Key Features
//!
//! - **Certified**: when the search runs to completion the result is provably optimal.
//! - **Resumable**: the [`Session`][crate::search::Session] is driven in bounded batches and can be stopped at any time with a valid, uncertified result.
//! - **Symmetry-aware**: permutations of a prefix, or prefixes leaving the same samples, are collapsed by the [`cache`].
//! - **Pluggable search order**: breadth-first, depth-first, lower bound, objective or curiosity ([`Policy`][crate::config::Policy]).
//!
//! ## Basic Usage
//!
//! ```rust
//! use corels_rs::classifier::Classifier;
//! use corels_rs::config::{Config, Verbosity};
//! use corels_rs::data::BinaryMatrix;
//!
//! let x = BinaryMatrix::from_u8_rows(&[[1u8, 0, 1], [0, 1, 0], [1, 1, 1]]).unwrap();
//! let y = [true, false, true];
//!
//! let config = Config::default().with_c(0.01).with_verbosity(Verbosity::quiet());
//! let mut clf = Classifier::new(config);
//! let rl = clf.fit(&x, &y, &[], "prediction").unwrap();
//! assert!(rl.is_certified());
//!
//! assert_eq!(clf.predict(&x).unwrap(), y);
//! assert_eq!(clf.score(&x, &y).unwrap(), 1.0);
//! ```
//!
//! ## Core Components
//!
//! - **[`search`]**: The branch-and-bound [`Session`][crate::search::Session] state machine.
//! - **[`bound`]**: Objective, lower bound, and pruning bounds.
//! - **[`rule`]**: Candidate rules and the rule miner.
//! - **[`rulelist`]**: The learned model, its display and JSON persistence.
//! - **[`classifier`]**: A fit / predict / score driver on top of the session.

pub mod bitset;
pub mod bound;
pub mod cache;
pub mod classifier;
pub mod config;
pub mod data;
pub mod error;
pub mod queue;
pub mod rule;
pub mod rulelist;
pub mod search;
pub mod storage;
pub mod tree;
pub mod types;
