//! Portable artifact backend
//!
//! Reads re-exported linear pipelines from JSON files next to where the
//! original serialized models lived: identifier `model_Aroma_Body_2.pkl`
//! resolves to `<dir>/model_Aroma_Body_2.json`.
//!
//! ```json
//! {
//!   "features": ["Aroma", "Body"],
//!   "rmse": 0.37688258052955415,
//!   "intercept": 1.25,
//!   "coefficients": { "Aroma": 0.41, "Body": 0.44 },
//!   "categories": { "Brazil": -0.05, "Ethiopia": 0.12 },
//!   "handle_unknown": "error"
//! }
//! ```
//!
//! The country column is one-hot encoded against `categories`; the
//! prediction is `intercept + Σ coefficient·value + weight(country)`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ArtifactStore, Predictor};
use crate::catalog::ModelEntry;
use crate::features::COUNTRY_COLUMN;
use crate::request::{Cell, TabularRecord};
use crate::{Error, Result};

/// Policy for a country the encoder never saw during training
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleUnknown {
    /// Reject the row
    #[default]
    Error,
    /// Encode as all zeros (no country adjustment)
    Ignore,
}

/// Exported linear regression pipeline with one-hot encoded country
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortableModel {
    /// Optional manifest: feature order the model was trained on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,

    /// Optional manifest: test-set RMSE
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rmse: Option<f64>,

    pub intercept: f64,

    /// Weight per numeric feature column
    pub coefficients: BTreeMap<String, f64>,

    /// Weight per known country (one-hot column)
    #[serde(default)]
    pub categories: BTreeMap<String, f64>,

    #[serde(default)]
    pub handle_unknown: HandleUnknown,
}

impl PortableModel {
    /// Check the export against the catalog entry it is loaded for
    fn check_compatible(&self, entry: &ModelEntry) -> Result<()> {
        let expected = entry.feature_names();

        if let Some(features) = &self.features {
            if features.iter().map(String::as_str).ne(expected.iter().copied()) {
                return Err(Error::ArtifactLoad(format!(
                    "{} declares features [{}] but the catalog expects [{}]",
                    entry.identifier,
                    features.join(", "),
                    expected.join(", ")
                )));
            }
        }

        let mut trained: Vec<&str> = self.coefficients.keys().map(String::as_str).collect();
        let mut wanted = expected.clone();
        trained.sort_unstable();
        wanted.sort_unstable();
        if trained != wanted {
            return Err(Error::ArtifactLoad(format!(
                "{} has coefficients for [{}] but the catalog expects [{}]",
                entry.identifier,
                trained.join(", "),
                expected.join(", ")
            )));
        }

        if let (Some(declared), Some(listed)) = (self.rmse, entry.rmse) {
            if (declared - listed).abs() > 1e-9 {
                warn!(
                    "{} declares RMSE {} but the catalog lists {}",
                    entry.identifier, declared, listed
                );
            }
        }

        let mut weights = std::iter::once(&self.intercept)
            .chain(self.coefficients.values())
            .chain(self.categories.values());
        if weights.any(|w| !w.is_finite()) {
            return Err(Error::ArtifactLoad(format!(
                "{} contains non-finite weights",
                entry.identifier
            )));
        }

        Ok(())
    }

    /// Score a single row
    fn score_row(&self, columns: &[String], row: &[Cell]) -> Result<f64> {
        if columns.len() != row.len() {
            return Err(Error::Prediction(format!(
                "record has {} columns but {} values",
                columns.len(),
                row.len()
            )));
        }

        let expected = self.coefficients.len() + 1;
        if columns.len() != expected {
            return Err(Error::Prediction(format!(
                "X has {} features, but the model is expecting {} features as input",
                columns.len(),
                expected
            )));
        }

        let mut total = self.intercept;
        let mut seen_country = false;

        for (column, cell) in columns.iter().zip(row) {
            if column == COUNTRY_COLUMN {
                let country = cell.as_text().ok_or_else(|| {
                    Error::Prediction(format!("{} must be text", COUNTRY_COLUMN))
                })?;
                match (self.categories.get(country), self.handle_unknown) {
                    (Some(weight), _) => total += weight,
                    (None, HandleUnknown::Ignore) => {}
                    (None, HandleUnknown::Error) => {
                        return Err(Error::Prediction(format!(
                            "Found unknown categories ['{}'] in column {} during transform",
                            country, COUNTRY_COLUMN
                        )));
                    }
                }
                seen_country = true;
                continue;
            }

            let coefficient = self.coefficients.get(column).ok_or_else(|| {
                Error::Prediction(format!("column '{}' was not seen during fit", column))
            })?;
            let value = cell.as_number().ok_or_else(|| {
                Error::Prediction(format!("column '{}' must be numeric", column))
            })?;
            total += coefficient * value;
        }

        if !seen_country {
            return Err(Error::Prediction(format!(
                "columns are missing: {{'{}'}}",
                COUNTRY_COLUMN
            )));
        }

        Ok(total)
    }
}

#[async_trait]
impl Predictor for PortableModel {
    async fn predict(&self, record: &TabularRecord) -> Result<Vec<f64>> {
        Ok(vec![self.score_row(record.columns(), record.row())?])
    }
}

/// Loads [`PortableModel`] exports from a directory
#[derive(Debug, Clone)]
pub struct PortableArtifactStore {
    dir: PathBuf,
}

impl PortableArtifactStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Export path for an artifact identifier
    pub fn artifact_path(&self, identifier: &str) -> PathBuf {
        self.dir.join(identifier).with_extension("json")
    }
}

#[async_trait]
impl ArtifactStore for PortableArtifactStore {
    fn backend(&self) -> &'static str {
        "portable"
    }

    async fn load(&self, entry: &ModelEntry) -> Result<Arc<dyn Predictor>> {
        let path = self.artifact_path(&entry.identifier);
        debug!("Loading portable artifact {}", path.display());

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            Error::ArtifactLoad(format!("cannot read {}: {}", path.display(), e))
        })?;

        let model: PortableModel = serde_json::from_str(&content).map_err(|e| {
            Error::ArtifactLoad(format!("{} is not a valid export: {}", path.display(), e))
        })?;
        model.check_compatible(entry)?;

        Ok(Arc::new(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::Feature;
    use crate::request::PredictionRequest;

    fn entry() -> ModelEntry {
        ModelEntry {
            identifier: "model_Acidity_Balance_5.pkl".to_string(),
            features: vec![Feature::Acidity, Feature::Balance],
            rmse: Some(0.34532259446732716),
        }
    }

    fn model() -> PortableModel {
        PortableModel {
            features: Some(vec!["Acidity".to_string(), "Balance".to_string()]),
            rmse: Some(0.34532259446732716),
            intercept: 1.0,
            coefficients: [("Acidity".to_string(), 0.5), ("Balance".to_string(), 0.25)]
                .into_iter()
                .collect(),
            categories: [("Brazil".to_string(), 0.1)].into_iter().collect(),
            handle_unknown: HandleUnknown::Error,
        }
    }

    fn record(country: &str) -> TabularRecord {
        let request = PredictionRequest::new(
            country,
            [("Acidity".to_string(), 7.5), ("Balance".to_string(), 6.8)]
                .into_iter()
                .collect(),
        );
        TabularRecord::build(&entry(), &request).unwrap()
    }

    #[test]
    fn test_artifact_path_swaps_extension() {
        let store = PortableArtifactStore::new("/srv/models");
        assert_eq!(
            store.artifact_path("model_Aroma_Body_2.pkl"),
            PathBuf::from("/srv/models/model_Aroma_Body_2.json")
        );
    }

    #[tokio::test]
    async fn test_linear_score_with_country_weight() {
        let prediction = model().predict(&record("Brazil")).await.unwrap();
        let expected = 1.0 + 0.5 * 7.5 + 0.25 * 6.8 + 0.1;
        assert_eq!(prediction.len(), 1);
        assert!((prediction[0] - expected).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_unknown_country_rejected_by_default() {
        let result = model().predict(&record("Atlantis")).await;
        assert!(matches!(result, Err(Error::Prediction(_))));
    }

    #[tokio::test]
    async fn test_unknown_country_ignored_when_configured() {
        let mut model = model();
        model.handle_unknown = HandleUnknown::Ignore;
        let prediction = model.predict(&record("Atlantis")).await.unwrap();
        let expected = 1.0 + 0.5 * 7.5 + 0.25 * 6.8;
        assert!((prediction[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_manifest_feature_order_must_match() {
        let mut model = model();
        model.features = Some(vec!["Balance".to_string(), "Acidity".to_string()]);
        assert!(matches!(
            model.check_compatible(&entry()),
            Err(Error::ArtifactLoad(_))
        ));
    }

    #[test]
    fn test_coefficients_must_cover_feature_set() {
        let mut model = model();
        model.features = None;
        model.coefficients.remove("Balance");
        model.coefficients.insert("Body".to_string(), 0.3);
        assert!(matches!(
            model.check_compatible(&entry()),
            Err(Error::ArtifactLoad(_))
        ));
    }

    #[test]
    fn test_handle_unknown_defaults_to_error() {
        let model: PortableModel = serde_json::from_str(
            r#"{"intercept": 0.0, "coefficients": {"Aroma": 1.0, "Body": 1.0}}"#,
        )
        .unwrap();
        assert_eq!(model.handle_unknown, HandleUnknown::Error);
        assert!(model.categories.is_empty());
        assert!(model.features.is_none());
    }
}
