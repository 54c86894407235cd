//! High-level fit / predict driver.

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use log::info;

use crate::config::Config;
use crate::data::BinaryMatrix;
use crate::error::{CorelsError, Result};
use crate::rulelist::RuleList;
use crate::search::{SearchStats, Session};

/// Steps run between two checks of the interrupt flag.
const BATCH_STEPS: usize = 1000;

/// Learns a certifiably optimal rule list and classifies with it.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    config: Config,
    rule_list: Option<RuleList>,
    stats: Option<SearchStats>,
}

impl Classifier {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            rule_list: None,
            stats: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The fitted rule list, if any.
    pub fn rule_list(&self) -> Option<&RuleList> {
        self.rule_list.as_ref()
    }

    /// Counters of the last fit.
    pub fn stats(&self) -> Option<&SearchStats> {
        self.stats.as_ref()
    }

    /// Searches for the optimal rule list on `samples` and `labels`.
    ///
    /// Empty `features` defaults to `feature1, feature2, ...`.
    pub fn fit(
        &mut self,
        samples: &BinaryMatrix,
        labels: &[bool],
        features: &[String],
        prediction_name: &str,
    ) -> Result<&RuleList> {
        let never = AtomicBool::new(false);
        self.fit_interruptible(samples, labels, features, prediction_name, &never)
    }

    /// Like [`fit`][Self::fit], but stops early once `stop` is set.
    ///
    /// The flag is checked between batches of steps. A stopped fit still
    /// yields a valid rule list, not certified optimal.
    pub fn fit_interruptible(
        &mut self,
        samples: &BinaryMatrix,
        labels: &[bool],
        features: &[String],
        prediction_name: &str,
        stop: &AtomicBool,
    ) -> Result<&RuleList> {
        let features = if features.is_empty() {
            (1..=samples.n_cols()).map(|i| format!("feature{}", i)).collect()
        } else {
            features.to_vec()
        };

        let mut session = Session::begin(samples, labels, features, prediction_name, self.config.clone())?;
        let mut early = false;
        while session.step_batch(BATCH_STEPS)? {
            if stop.load(Ordering::Relaxed) {
                info!("Exiting early");
                session.interrupt();
                early = true;
                break;
            }
        }

        let rule_list = session.end(early)?;
        self.stats = Some(session.stats());
        Ok(&*self.rule_list.insert(rule_list))
    }

    fn fitted(&self) -> Result<&RuleList> {
        self.rule_list
            .as_ref()
            .ok_or_else(|| CorelsError::state("This classifier is not fitted yet"))
    }

    pub fn predict(&self, samples: &BinaryMatrix) -> Result<Vec<bool>> {
        self.fitted()?.predict(samples)
    }

    /// Accuracy of the fitted rule list on `samples`, in `[0, 1]`.
    pub fn score(&self, samples: &BinaryMatrix, labels: &[bool]) -> Result<f64> {
        if samples.n_rows() != labels.len() {
            return Err(CorelsError::shape(format!(
                "Found input variables with inconsistent numbers of samples: [{}, {}]",
                samples.n_rows(),
                labels.len()
            )));
        }
        let predictions = self.predict(samples)?;
        score_predictions(&predictions, labels)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.fitted()?.save(path)
    }

    /// Restores a saved rule list. The configuration is kept as is.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<&RuleList> {
        let rule_list = RuleList::load(path)?;
        self.stats = None;
        Ok(&*self.rule_list.insert(rule_list))
    }
}

/// Fraction of `predictions` equal to `labels`.
pub fn score_predictions(predictions: &[bool], labels: &[bool]) -> Result<f64> {
    if predictions.len() != labels.len() {
        return Err(CorelsError::shape(format!(
            "Found input variables with inconsistent numbers of samples: [{}, {}]",
            predictions.len(),
            labels.len()
        )));
    }
    if labels.is_empty() {
        return Err(CorelsError::shape("Cannot score zero samples"));
    }
    let correct = predictions.iter().zip(labels).filter(|(p, l)| p == l).count();
    Ok(correct as f64 / labels.len() as f64)
}

impl fmt::Display for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.rule_list {
            Some(rl) => write!(f, "{}", rl),
            None => write!(f, "Classifier (not fitted)"),
        }
    }
}
