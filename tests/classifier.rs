//! Tests for the classifier driver and rule list persistence.

use std::fs;
use std::path::PathBuf;

use corels_rs::classifier::{score_predictions, Classifier};
use corels_rs::config::{Config, Verbosity};
use corels_rs::data::BinaryMatrix;
use corels_rs::error::CorelsError;
use corels_rs::rulelist::RuleList;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("corels-rs-{}-{}.json", std::process::id(), name))
}

fn dataset() -> (BinaryMatrix, Vec<bool>) {
    let x = BinaryMatrix::from_u8_rows(&[
        [1u8, 0, 1, 0],
        [0, 1, 0, 0],
        [1, 1, 1, 1],
        [0, 0, 1, 1],
        [1, 0, 0, 1],
        [0, 1, 1, 0],
        [1, 1, 0, 0],
        [0, 0, 0, 1],
    ])
    .unwrap();
    let y = vec![true, false, true, false, true, true, false, false];
    (x, y)
}

fn fitted() -> Classifier {
    let (x, y) = dataset();
    let features: Vec<String> = ["age", "smoker", "exercise", "diet"].iter().map(|s| s.to_string()).collect();
    let mut clf = Classifier::new(Config::default().with_verbosity(Verbosity::quiet()));
    clf.fit(&x, &y, &features, "healthy").unwrap();
    clf
}

#[test]
fn save_and_load_round_trip() {
    let clf = fitted();
    let (x, y) = dataset();
    let path = temp_path("round-trip");
    clf.save(&path).unwrap();

    let mut restored = Classifier::default();
    let rl = restored.load(&path).unwrap();
    assert_eq!(rl.features(), clf.rule_list().unwrap().features());
    assert_eq!(rl.prediction_name(), "healthy");
    assert!(!rl.is_certified());

    assert_eq!(restored.predict(&x).unwrap(), clf.predict(&x).unwrap());
    assert_eq!(restored.score(&x, &y).unwrap(), clf.score(&x, &y).unwrap());
    assert_eq!(restored.to_string(), clf.to_string());
    fs::remove_file(&path).unwrap();
}

#[test]
fn load_rejects_incomplete_record() {
    let path = temp_path("incomplete");
    fs::write(&path, r#"{"rules": [], "default_prediction": true, "prediction_name": "y"}"#).unwrap();
    let mut clf = Classifier::default();
    let err = clf.load(&path).unwrap_err();
    assert!(matches!(err, CorelsError::Record(_)), "{}", err);
    assert!(clf.rule_list().is_none());
    fs::remove_file(&path).unwrap();
}

#[test]
fn load_missing_file() {
    let mut clf = Classifier::default();
    let err = clf.load(temp_path("does-not-exist")).unwrap_err();
    assert!(matches!(err, CorelsError::Io(_)));
}

#[test]
fn save_unfitted_fails() {
    let clf = Classifier::default();
    assert!(matches!(clf.save(temp_path("unfitted")), Err(CorelsError::State(_))));
}

#[test]
fn predict_checks_feature_count() {
    let clf = fitted();
    let x = BinaryMatrix::from_u8_rows(&[[1u8, 0, 1]]).unwrap();
    assert!(matches!(clf.predict(&x), Err(CorelsError::Shape(_))));
}

#[test]
fn fit_rejects_bad_inputs() {
    let (x, y) = dataset();
    let mut clf = Classifier::new(Config::default().with_c(2.0));
    assert!(matches!(clf.fit(&x, &y, &[], "y"), Err(CorelsError::Config(_))));

    let mut clf = Classifier::default();
    assert!(matches!(clf.fit(&x, &y[..3], &[], "y"), Err(CorelsError::Shape(_))));
    let two_names = vec!["a".to_string(), "b".to_string()];
    assert!(matches!(clf.fit(&x, &y, &two_names, "y"), Err(CorelsError::Shape(_))));
}

#[test]
fn display_uses_feature_names() {
    let clf = fitted();
    let text = clf.to_string();
    assert!(text.starts_with("RULELIST:\n"));
    assert!(text.contains("healthy = "));
    let rl = clf.rule_list().unwrap();
    if !rl.is_empty() {
        assert!(text.contains("if ["));
        assert!(text.contains("else:\n"));
    }
}

#[test]
fn json_text_round_trip() {
    let rl = fitted().rule_list().unwrap().clone();
    let back = RuleList::from_json(&rl.to_json().unwrap()).unwrap();
    assert_eq!(back.rules(), rl.rules());
    assert_eq!(back.to_string(), rl.to_string());
}

#[test]
fn score_precomputed_predictions() {
    let (x, y) = dataset();
    let clf = fitted();
    let predictions = clf.predict(&x).unwrap();
    assert_eq!(score_predictions(&predictions, &y).unwrap(), clf.score(&x, &y).unwrap());
}
