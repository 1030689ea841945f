//! Integration tests for the prediction handler with portable artifacts
//!
//! Tests cover:
//! - End-to-end prediction matching a direct call on the artifact
//! - Determinism across repeated calls
//! - Validation failures (missing key, out-of-range value)
//! - Artifact load failures and predictor failures

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use cqp_common::artifact::{
    ArtifactStore, CachedArtifactStore, PortableArtifactStore, PortableModel, Predictor,
};
use cqp_common::config::CqpConfig;
use cqp_common::{
    Error, ModelCatalog, ModelEntry, PredictionHandler, PredictionRequest, Result, TabularRecord,
};
use tempfile::TempDir;

const ACIDITY_BALANCE: &str = "model_Acidity_Balance_5.pkl";

fn built_in_catalog() -> Arc<ModelCatalog> {
    let config = CqpConfig::built_in().unwrap();
    Arc::new(ModelCatalog::from_config(&config.catalog).unwrap())
}

/// Write a portable export for `identifier` into `dir`
fn write_export(dir: &Path, identifier: &str, json: &str) {
    let path = dir.join(identifier).with_extension("json");
    std::fs::write(path, json).expect("Should write artifact");
}

const ACIDITY_BALANCE_EXPORT: &str = r#"{
    "features": ["Acidity", "Balance"],
    "rmse": 0.34532259446732716,
    "intercept": 2.1,
    "coefficients": { "Acidity": 0.46, "Balance": 0.52 },
    "categories": { "Brazil": -0.04, "Ethiopia": 0.11, "Colombia": 0.02 },
    "handle_unknown": "error"
}"#;

fn setup() -> (TempDir, PredictionHandler) {
    let dir = TempDir::new().unwrap();
    write_export(dir.path(), ACIDITY_BALANCE, ACIDITY_BALANCE_EXPORT);
    let store = Arc::new(PortableArtifactStore::new(dir.path()));
    let handler = PredictionHandler::new(built_in_catalog(), store);
    (dir, handler)
}

fn values(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

#[tokio::test]
async fn test_end_to_end_matches_direct_artifact_call() {
    let (_dir, handler) = setup();
    let entry = handler.catalog().entry(ACIDITY_BALANCE).unwrap().clone();
    assert_eq!(entry.feature_names(), vec!["Acidity", "Balance"]);

    let input = values(&[("Acidity", 7.5), ("Balance", 6.8)]);
    let result = handler.predict(&entry, "Brazil", &input).await.unwrap();

    // Same row scored directly by the artifact
    let model: PortableModel = serde_json::from_str(ACIDITY_BALANCE_EXPORT).unwrap();
    let record = TabularRecord::build(&entry, &PredictionRequest::new("Brazil", input)).unwrap();
    assert_eq!(
        record.columns(),
        ["CountryOfOrigin", "Acidity", "Balance"]
    );
    let direct = model.predict(&record).await.unwrap();

    assert_eq!(result.prediction, direct);
    assert_eq!(result.model, ACIDITY_BALANCE);
    assert_eq!(result.rmse, Some(0.34532259446732716));

    let expected = 2.1 + 0.46 * 7.5 + 0.52 * 6.8 - 0.04;
    assert!((result.score().unwrap() - expected).abs() < 1e-9);
}

#[tokio::test]
async fn test_repeated_predictions_are_identical() {
    let (_dir, handler) = setup();
    let entry = handler.catalog().entry(ACIDITY_BALANCE).unwrap().clone();
    let input = values(&[("Acidity", 8.25), ("Balance", 7.75)]);

    let first = handler.predict(&entry, "Ethiopia", &input).await.unwrap();
    for _ in 0..5 {
        let again = handler.predict(&entry, "Ethiopia", &input).await.unwrap();
        assert_eq!(again, first);
    }
}

#[tokio::test]
async fn test_missing_feature_is_validation_error() {
    let (_dir, handler) = setup();
    let entry = handler.catalog().entry(ACIDITY_BALANCE).unwrap().clone();

    let result = handler
        .predict(&entry, "Brazil", &values(&[("Acidity", 7.5)]))
        .await;
    assert!(matches!(result, Err(Error::Validation(_))));
}

#[tokio::test]
async fn test_out_of_range_value_is_validation_error() {
    let (_dir, handler) = setup();
    let entry = handler.catalog().entry(ACIDITY_BALANCE).unwrap().clone();

    for bad in [4.9, 10.5] {
        let result = handler
            .predict(&entry, "Brazil", &values(&[("Acidity", bad), ("Balance", 6.8)]))
            .await;
        assert!(matches!(result, Err(Error::Validation(_))), "{} accepted", bad);
    }
}

#[tokio::test]
async fn test_unseen_country_is_prediction_error() {
    let (_dir, handler) = setup();
    let entry = handler.catalog().entry(ACIDITY_BALANCE).unwrap().clone();

    let result = handler
        .predict(&entry, "Atlantis", &values(&[("Acidity", 7.5), ("Balance", 6.8)]))
        .await;
    assert!(matches!(result, Err(Error::Prediction(_))));
}

#[tokio::test]
async fn test_missing_artifact_is_load_error() {
    let (_dir, handler) = setup();
    let entry = handler.catalog().entry("model_Aroma_Body_2.pkl").unwrap().clone();

    let result = handler
        .predict(&entry, "Brazil", &values(&[("Aroma", 7.0), ("Body", 7.0)]))
        .await;
    assert!(matches!(result, Err(Error::ArtifactLoad(_))));
}

#[tokio::test]
async fn test_corrupt_artifact_is_load_error() {
    let (dir, handler) = setup();
    write_export(dir.path(), "model_Aroma_Body_2.pkl", "\u{80}\u{4}not json");
    let entry = handler.catalog().entry("model_Aroma_Body_2.pkl").unwrap().clone();

    let result = handler
        .predict(&entry, "Brazil", &values(&[("Aroma", 7.0), ("Body", 7.0)]))
        .await;
    assert!(matches!(result, Err(Error::ArtifactLoad(_))));
}

#[tokio::test]
async fn test_mismatched_manifest_is_load_error() {
    let (dir, handler) = setup();
    write_export(
        dir.path(),
        "model_Aroma_Body_2.pkl",
        r#"{"features": ["Aroma", "Balance"], "intercept": 0.0,
            "coefficients": {"Aroma": 1.0, "Balance": 1.0}}"#,
    );
    let entry = handler.catalog().entry("model_Aroma_Body_2.pkl").unwrap().clone();

    let result = handler
        .predict(&entry, "Brazil", &values(&[("Aroma", 7.0), ("Body", 7.0)]))
        .await;
    assert!(matches!(result, Err(Error::ArtifactLoad(_))));
}

#[tokio::test]
async fn test_unknown_identifier_is_not_found() {
    let (_dir, handler) = setup();
    let request = PredictionRequest::new("Brazil", values(&[("Aroma", 7.0)]));

    let result = handler
        .predict_by_identifier("model_Aroma_7.pkl", &request)
        .await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

struct EmptyPredictor;

#[async_trait]
impl Predictor for EmptyPredictor {
    async fn predict(&self, _record: &TabularRecord) -> Result<Vec<f64>> {
        Ok(Vec::new())
    }
}

struct EmptyStore;

#[async_trait]
impl ArtifactStore for EmptyStore {
    fn backend(&self) -> &'static str {
        "empty"
    }

    async fn load(&self, _entry: &ModelEntry) -> Result<Arc<dyn Predictor>> {
        Ok(Arc::new(EmptyPredictor))
    }
}

#[tokio::test]
async fn test_empty_prediction_is_prediction_error() {
    let handler = PredictionHandler::new(built_in_catalog(), Arc::new(EmptyStore));
    let entry = handler.catalog().entry(ACIDITY_BALANCE).unwrap().clone();

    let result = handler
        .predict(&entry, "Brazil", &values(&[("Acidity", 7.5), ("Balance", 6.8)]))
        .await;
    assert!(matches!(result, Err(Error::Prediction(_))));
}

#[tokio::test]
async fn test_cached_store_survives_artifact_removal() {
    let dir = TempDir::new().unwrap();
    write_export(dir.path(), ACIDITY_BALANCE, ACIDITY_BALANCE_EXPORT);
    let store = Arc::new(CachedArtifactStore::new(Arc::new(PortableArtifactStore::new(
        dir.path(),
    ))));
    let handler = PredictionHandler::new(built_in_catalog(), store);
    let entry = handler.catalog().entry(ACIDITY_BALANCE).unwrap().clone();
    let input = values(&[("Acidity", 7.5), ("Balance", 6.8)]);

    let first = handler.predict(&entry, "Colombia", &input).await.unwrap();
    std::fs::remove_file(dir.path().join("model_Acidity_Balance_5.json")).unwrap();
    let second = handler.predict(&entry, "Colombia", &input).await.unwrap();

    assert_eq!(first, second);
}
