//! Model catalog: which artifacts exist for each feature count
//!
//! Built once at startup from the `[catalog]` table of the configuration
//! and immutable afterwards.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::features::{parse_feature_set, Feature};
use crate::{Error, Result};

/// Number of numeric features a model was trained on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum FeatureCount {
    Two,
    Three,
}

impl FeatureCount {
    pub const ALL: [FeatureCount; 2] = [FeatureCount::Two, FeatureCount::Three];

    pub fn get(self) -> usize {
        match self {
            FeatureCount::Two => 2,
            FeatureCount::Three => 3,
        }
    }
}

impl Default for FeatureCount {
    /// The input form preselects three features
    fn default() -> Self {
        FeatureCount::Three
    }
}

impl TryFrom<u8> for FeatureCount {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            2 => Ok(FeatureCount::Two),
            3 => Ok(FeatureCount::Three),
            other => Err(Error::Validation(format!(
                "feature count must be 2 or 3, got {}",
                other
            ))),
        }
    }
}

impl From<FeatureCount> for u8 {
    fn from(count: FeatureCount) -> u8 {
        count.get() as u8
    }
}

impl fmt::Display for FeatureCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// `[catalog]` section of the configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Index of the model preselected in each list (clamped to the list length)
    #[serde(default = "default_index")]
    pub default_index: usize,

    /// Artifact identifiers for two-feature models, in display order
    #[serde(default)]
    pub two_features: Vec<String>,

    /// Artifact identifiers for three-feature models, in display order
    #[serde(default)]
    pub three_features: Vec<String>,

    /// Precomputed test-set RMSE by artifact identifier
    #[serde(default)]
    pub rmse: BTreeMap<String, f64>,
}

fn default_index() -> usize {
    3
}

/// One selectable model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelEntry {
    /// Artifact identifier, e.g. `model_Acidity_Balance_5.pkl`
    pub identifier: String,
    /// Features in the order the model was trained on
    pub features: Vec<Feature>,
    /// `None` when no RMSE was recorded for this artifact
    pub rmse: Option<f64>,
}

impl ModelEntry {
    pub fn feature_names(&self) -> Vec<&'static str> {
        self.features.iter().map(Feature::name).collect()
    }

    /// RMSE formatted for display
    pub fn rmse_label(&self) -> String {
        match self.rmse {
            Some(rmse) => rmse.to_string(),
            None => "RMSE not available".to_string(),
        }
    }
}

/// Immutable catalog of model entries grouped by feature count
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    two: Vec<ModelEntry>,
    three: Vec<ModelEntry>,
    default_index: usize,
}

impl ModelCatalog {
    /// Build and validate the catalog from configuration
    ///
    /// Every identifier must follow the naming convention, name known and
    /// distinct features, and encode exactly as many features as the list
    /// it appears in. Identifiers must be unique and RMSE values finite and
    /// non-negative.
    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        let mut seen = HashSet::new();

        let mut build = |count: FeatureCount, identifiers: &[String]| -> Result<Vec<ModelEntry>> {
            let mut entries = Vec::with_capacity(identifiers.len());
            for identifier in identifiers {
                if !seen.insert(identifier.clone()) {
                    return Err(Error::Config(format!(
                        "artifact '{}' is listed more than once",
                        identifier
                    )));
                }

                let features = parse_feature_set(identifier)
                    .map_err(|e| Error::Config(format!("invalid catalog entry: {}", e)))?;
                if features.len() != count.get() {
                    return Err(Error::Config(format!(
                        "artifact '{}' encodes {} features but is listed under {}",
                        identifier,
                        features.len(),
                        count
                    )));
                }

                let rmse = match config.rmse.get(identifier) {
                    Some(&rmse) if !rmse.is_finite() || rmse < 0.0 => {
                        return Err(Error::Config(format!(
                            "artifact '{}' has invalid RMSE {}",
                            identifier, rmse
                        )));
                    }
                    other => other.copied(),
                };

                entries.push(ModelEntry {
                    identifier: identifier.clone(),
                    features,
                    rmse,
                });
            }
            if entries.is_empty() {
                warn!("No {}-feature models configured", count);
            }
            Ok(entries)
        };

        let two = build(FeatureCount::Two, &config.two_features)?;
        let three = build(FeatureCount::Three, &config.three_features)?;

        for identifier in config.rmse.keys() {
            if !seen.contains(identifier) {
                warn!("RMSE configured for unknown artifact '{}'", identifier);
            }
        }

        info!(
            "Model catalog loaded: {} two-feature, {} three-feature models",
            two.len(),
            three.len()
        );

        Ok(Self {
            two,
            three,
            default_index: config.default_index,
        })
    }

    /// Entries for a feature count, in configured order
    ///
    /// # Errors
    ///
    /// `Error::Config` if no model is configured for `count`.
    pub fn list_entries(&self, count: FeatureCount) -> Result<&[ModelEntry]> {
        let entries = match count {
            FeatureCount::Two => &self.two,
            FeatureCount::Three => &self.three,
        };
        if entries.is_empty() {
            return Err(Error::Config(format!(
                "no {}-feature models configured",
                count
            )));
        }
        Ok(entries)
    }

    /// Look up an entry by artifact identifier
    pub fn entry(&self, identifier: &str) -> Result<&ModelEntry> {
        self.two
            .iter()
            .chain(self.three.iter())
            .find(|e| e.identifier == identifier)
            .ok_or_else(|| Error::NotFound(format!("model '{}'", identifier)))
    }

    /// Entry preselected for a feature count
    pub fn default_entry(&self, count: FeatureCount) -> Result<&ModelEntry> {
        let entries = self.list_entries(count)?;
        let index = self.default_index.min(entries.len() - 1);
        Ok(&entries[index])
    }

    /// Every entry across both feature counts
    pub fn iter(&self) -> impl Iterator<Item = &ModelEntry> {
        self.two.iter().chain(self.three.iter())
    }
}
