//! Prediction request, one-row tabular record, and result types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::ModelEntry;
use crate::features::{COUNTRY_COLUMN, SCORE_MAX, SCORE_MIN};
use crate::{Error, Result};

/// User input for one prediction attempt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    /// Free text, may be empty
    #[serde(default)]
    pub country_of_origin: String,
    /// Cupping score by feature name
    #[serde(default)]
    pub feature_values: BTreeMap<String, f64>,
}

impl PredictionRequest {
    pub fn new(country: impl Into<String>, values: BTreeMap<String, f64>) -> Self {
        Self {
            country_of_origin: country.into(),
            feature_values: values,
        }
    }

    /// Check the request against the entry it will be sent to
    ///
    /// Keys must equal the entry's feature set exactly and every value must
    /// be finite and within `[SCORE_MIN, SCORE_MAX]`.
    pub fn validate(&self, entry: &ModelEntry) -> Result<()> {
        let expected = entry.feature_names();

        let missing: Vec<&str> = expected
            .iter()
            .copied()
            .filter(|name| !self.feature_values.contains_key(*name))
            .collect();
        if !missing.is_empty() {
            return Err(Error::Validation(format!(
                "missing value for {} (model {} expects {})",
                missing.join(", "),
                entry.identifier,
                expected.join(", ")
            )));
        }

        let unexpected: Vec<&str> = self
            .feature_values
            .keys()
            .map(String::as_str)
            .filter(|name| !expected.contains(name))
            .collect();
        if !unexpected.is_empty() {
            return Err(Error::Validation(format!(
                "unexpected value for {} (model {} expects {})",
                unexpected.join(", "),
                entry.identifier,
                expected.join(", ")
            )));
        }

        for (name, value) in &self.feature_values {
            if !value.is_finite() || *value < SCORE_MIN || *value > SCORE_MAX {
                return Err(Error::Validation(format!(
                    "{} = {} is outside [{}, {}]",
                    name, value, SCORE_MIN, SCORE_MAX
                )));
            }
        }

        Ok(())
    }
}

/// Single cell of a tabular record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            Cell::Number(_) => None,
        }
    }
}

/// One-row table handed to a predictor
///
/// Columns are `[CountryOfOrigin, *features]` in the entry's declared order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabularRecord {
    columns: Vec<String>,
    row: Vec<Cell>,
}

impl TabularRecord {
    /// Assemble the record for a validated request
    ///
    /// The country is passed through exactly as given; the predictor decides
    /// what an unfamiliar spelling means.
    pub fn build(entry: &ModelEntry, request: &PredictionRequest) -> Result<Self> {
        let mut columns = Vec::with_capacity(entry.features.len() + 1);
        let mut row = Vec::with_capacity(entry.features.len() + 1);

        columns.push(COUNTRY_COLUMN.to_string());
        row.push(Cell::Text(request.country_of_origin.clone()));

        for feature in &entry.features {
            let value = request
                .feature_values
                .get(feature.name())
                .copied()
                .ok_or_else(|| Error::Validation(format!("missing value for {}", feature)))?;
            columns.push(feature.name().to_string());
            row.push(Cell::Number(value));
        }

        Ok(Self { columns, row })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row(&self) -> &[Cell] {
        &self.row
    }

    /// Cell value by column name
    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.row[i])
    }
}

/// Outcome of a successful prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    /// Artifact that produced the prediction
    pub model: String,
    /// RMSE of that artifact, if recorded
    pub rmse: Option<f64>,
    /// Predictor output; one value per input row
    pub prediction: Vec<f64>,
}

impl PredictionResult {
    /// First predicted value (the record has exactly one row)
    pub fn score(&self) -> Option<f64> {
        self.prediction.first().copied()
    }
}
