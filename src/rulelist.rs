//! Learned rule lists: evaluation, display and persistence.
//!
//! A rule list is an ordered sequence of `if antecedent then prediction`
//! rules followed by a default prediction. A sample is classified by the
//! first rule whose antecedent it satisfies.
//!
//! Rule lists are persisted as a JSON record with four fields:
//!
//! ```json
//! {
//!   "features": ["a", "b"],
//!   "rules": [{ "antecedent": [1, -2], "prediction": true }],
//!   "default_prediction": false,
//!   "prediction_name": "label"
//! }
//! ```
//!
//! Antecedent literals are 1-based feature indices, negative when negated.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::data::BinaryMatrix;
use crate::error::{CorelsError, Result};
use crate::rule::Antecedent;
use crate::types::Literal;

/// One `if antecedent then prediction` rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleEntry {
    pub antecedent: Antecedent,
    pub prediction: bool,
}

/// An ordered rule list with its default prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleList {
    rules: Vec<RuleEntry>,
    default_prediction: bool,
    features: Vec<String>,
    prediction_name: String,
    certified: bool,
}

impl RuleList {
    pub fn new(
        rules: Vec<RuleEntry>,
        default_prediction: bool,
        features: Vec<String>,
        prediction_name: impl Into<String>,
        certified: bool,
    ) -> Self {
        Self {
            rules,
            default_prediction,
            features,
            prediction_name: prediction_name.into(),
            certified,
        }
    }

    /// Rules before the default, in evaluation order.
    pub fn rules(&self) -> &[RuleEntry] {
        &self.rules
    }

    pub fn default_prediction(&self) -> bool {
        self.default_prediction
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn prediction_name(&self) -> &str {
        &self.prediction_name
    }

    /// Whether the search proved this list optimal.
    ///
    /// Lists restored from a record are never certified.
    pub fn is_certified(&self) -> bool {
        self.certified
    }

    /// Number of rules, not counting the default.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Classifies one sample.
    pub fn predict_one(&self, row: &[bool]) -> bool {
        self.rules
            .iter()
            .find(|r| r.antecedent.matches(row))
            .map_or(self.default_prediction, |r| r.prediction)
    }

    /// Classifies every row of `samples`.
    pub fn predict(&self, samples: &BinaryMatrix) -> Result<Vec<bool>> {
        if samples.n_cols() != self.features.len() {
            return Err(CorelsError::shape(format!(
                "Feature count mismatch between eval data ({}) and feature names ({})",
                samples.n_cols(),
                self.features.len()
            )));
        }
        Ok(samples.rows().map(|row| self.predict_one(row)).collect())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_record())?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let record: RuleListRecord = serde_json::from_str(text)?;
        Self::from_record(record)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, &self.to_record())?;
        writer.flush()?;
        debug!("save({}): {} rule(s)", path.display(), self.len());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let record: RuleListRecord = serde_json::from_reader(reader)?;
        let rl = Self::from_record(record)?;
        debug!("load({}): {} rule(s)", path.display(), rl.len());
        Ok(rl)
    }

    fn to_record(&self) -> RuleListRecord {
        RuleListRecord {
            features: Some(self.features.clone()),
            rules: Some(
                self.rules
                    .iter()
                    .map(|r| RuleRecord {
                        antecedent: Some(r.antecedent.literals().iter().map(|l| l.to_signed()).collect()),
                        prediction: Some(r.prediction),
                    })
                    .collect(),
            ),
            default_prediction: Some(self.default_prediction),
            prediction_name: Some(self.prediction_name.clone()),
        }
    }

    fn from_record(record: RuleListRecord) -> Result<Self> {
        let features = record.features.ok_or_else(|| missing("features"))?;
        let records = record.rules.ok_or_else(|| missing("rules"))?;
        let default_prediction = record.default_prediction.ok_or_else(|| missing("default_prediction"))?;
        let prediction_name = record.prediction_name.ok_or_else(|| missing("prediction_name"))?;

        let mut rules = Vec::with_capacity(records.len());
        for (i, r) in records.into_iter().enumerate() {
            let signed = r.antecedent.ok_or_else(|| missing(&format!("rules[{}].antecedent", i)))?;
            let prediction = r.prediction.ok_or_else(|| missing(&format!("rules[{}].prediction", i)))?;
            if signed.is_empty() {
                return Err(CorelsError::record(format!("Rule {} has an empty antecedent", i)));
            }

            let mut literals = Vec::with_capacity(signed.len());
            for value in signed {
                let lit = Literal::from_signed(value)
                    .filter(|l| l.feature() < features.len())
                    .ok_or_else(|| {
                        CorelsError::record(format!(
                            "Rule {} references feature {} but only {} features are named",
                            i,
                            value,
                            features.len()
                        ))
                    })?;
                if literals.iter().any(|l: &Literal| l.feature() == lit.feature()) {
                    return Err(CorelsError::record(format!(
                        "Rule {} uses feature {} twice",
                        i,
                        lit.feature() + 1
                    )));
                }
                literals.push(lit);
            }
            rules.push(RuleEntry {
                antecedent: Antecedent::new(literals),
                prediction,
            });
        }

        Ok(Self {
            rules,
            default_prediction,
            features,
            prediction_name,
            certified: false,
        })
    }
}

fn missing(field: &str) -> CorelsError {
    CorelsError::record(format!("Rule list record is missing '{}'", field))
}

/// On-disk form. Every field is required; options only make a missing field
/// a [`CorelsError::Record`] instead of a JSON error.
#[derive(Debug, Serialize, Deserialize)]
struct RuleListRecord {
    features: Option<Vec<String>>,
    rules: Option<Vec<RuleRecord>>,
    default_prediction: Option<bool>,
    prediction_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RuleRecord {
    antecedent: Option<Vec<i64>>,
    prediction: Option<bool>,
}

fn py_bool(b: bool) -> &'static str {
    if b {
        "True"
    } else {
        "False"
    }
}

impl fmt::Display for RuleList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "RULELIST:")?;
        if self.rules.is_empty() {
            return writeln!(f, "{} = {}", self.prediction_name, py_bool(self.default_prediction));
        }
        for (i, rule) in self.rules.iter().enumerate() {
            let keyword = if i == 0 { "if" } else { "else if" };
            writeln!(f, "{} [{}]:", keyword, rule.antecedent.display_with(&self.features))?;
            writeln!(f, "  {} = {}", self.prediction_name, py_bool(rule.prediction))?;
        }
        writeln!(f, "else:")?;
        writeln!(f, "  {} = {}", self.prediction_name, py_bool(self.default_prediction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RuleList {
        let features = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let rules = vec![
            RuleEntry {
                antecedent: Antecedent::new([Literal::positive(0), Literal::negative(1)]),
                prediction: true,
            },
            RuleEntry {
                antecedent: Antecedent::new([Literal::positive(2)]),
                prediction: false,
            },
        ];
        RuleList::new(rules, true, features, "label", true)
    }

    #[test]
    fn test_predict_first_match_wins() {
        let rl = sample();
        assert!(rl.predict_one(&[true, false, true]));
        assert!(!rl.predict_one(&[true, true, true]));
        assert!(rl.predict_one(&[false, false, false]));
    }

    #[test]
    fn test_predict_checks_feature_count() {
        let rl = sample();
        let x = BinaryMatrix::from_u8_rows(&[[1u8, 0]]).unwrap();
        assert!(matches!(rl.predict(&x), Err(CorelsError::Shape(_))));
    }

    #[test]
    fn test_display() {
        let expected = "\
RULELIST:
if [a && not b]:
  label = True
else if [c]:
  label = False
else:
  label = True
";
        assert_eq!(sample().to_string(), expected);

        let default_only = RuleList::new(Vec::new(), false, vec!["a".to_string()], "label", true);
        assert_eq!(default_only.to_string(), "RULELIST:\nlabel = False\n");
    }

    #[test]
    fn test_json_round_trip_drops_certificate() {
        let rl = sample();
        let json = rl.to_json().unwrap();
        let back = RuleList::from_json(&json).unwrap();
        assert_eq!(back.rules(), rl.rules());
        assert_eq!(back.features(), rl.features());
        assert_eq!(back.default_prediction(), rl.default_prediction());
        assert_eq!(back.prediction_name(), "label");
        assert!(!back.is_certified());
    }

    #[test]
    fn test_record_missing_field() {
        let json = r#"{"features": ["a"], "rules": [], "prediction_name": "label"}"#;
        let err = RuleList::from_json(json).unwrap_err();
        assert!(matches!(err, CorelsError::Record(ref msg) if msg.contains("default_prediction")));
    }

    #[test]
    fn test_record_rejects_unknown_feature() {
        let json = r#"{"features": ["a"], "rules": [{"antecedent": [2], "prediction": true}],
                       "default_prediction": false, "prediction_name": "label"}"#;
        assert!(matches!(RuleList::from_json(json), Err(CorelsError::Record(_))));

        let json = r#"{"features": ["a"], "rules": [{"antecedent": [1, -1], "prediction": true}],
                       "default_prediction": false, "prediction_name": "label"}"#;
        assert!(matches!(RuleList::from_json(json), Err(CorelsError::Record(_))));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(RuleList::from_json("{"), Err(CorelsError::Json(_))));
    }
}
