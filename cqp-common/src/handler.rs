//! Prediction request handler
//!
//! The trust boundary between the input surface and the predictors: every
//! request is re-validated here regardless of what the form enforced.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::artifact::ArtifactStore;
use crate::catalog::{ModelCatalog, ModelEntry};
use crate::request::{PredictionRequest, PredictionResult, TabularRecord};
use crate::{Error, Result};

/// Catalog plus artifact store; cheap to clone and share across requests
#[derive(Clone)]
pub struct PredictionHandler {
    catalog: Arc<ModelCatalog>,
    store: Arc<dyn ArtifactStore>,
}

impl PredictionHandler {
    pub fn new(catalog: Arc<ModelCatalog>, store: Arc<dyn ArtifactStore>) -> Self {
        Self { catalog, store }
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &dyn ArtifactStore {
        self.store.as_ref()
    }

    /// Predict with `entry` for one country and set of feature values
    ///
    /// # Errors
    ///
    /// - `Error::Validation` if `values` does not name exactly the entry's
    ///   features or a value is outside the score range
    /// - `Error::ArtifactLoad` if the artifact cannot be loaded
    /// - `Error::Prediction` if the predictor rejects the record or returns
    ///   no value
    pub async fn predict(
        &self,
        entry: &ModelEntry,
        country: &str,
        values: &BTreeMap<String, f64>,
    ) -> Result<PredictionResult> {
        let request = PredictionRequest::new(country, values.clone());
        self.predict_request(entry, &request).await
    }

    /// Same as [`predict`](Self::predict) for an already assembled request
    pub async fn predict_request(
        &self,
        entry: &ModelEntry,
        request: &PredictionRequest,
    ) -> Result<PredictionResult> {
        if let Err(e) = request.validate(entry) {
            warn!("Rejected request for {}: {}", entry.identifier, e);
            return Err(e);
        }

        let record = TabularRecord::build(entry, request)?;
        debug!(
            "Predicting with {} ({} backend) on columns {:?}",
            entry.identifier,
            self.store.backend(),
            record.columns()
        );

        let predictor = self.store.load(entry).await?;
        let prediction = predictor.predict(&record).await?;

        if prediction.is_empty() {
            return Err(Error::Prediction(format!(
                "{} returned no prediction",
                entry.identifier
            )));
        }

        debug!("{} predicted {:?}", entry.identifier, prediction);

        Ok(PredictionResult {
            model: entry.identifier.clone(),
            rmse: entry.rmse,
            prediction,
        })
    }

    /// Resolve an identifier through the catalog and predict
    pub async fn predict_by_identifier(
        &self,
        identifier: &str,
        request: &PredictionRequest,
    ) -> Result<PredictionResult> {
        let entry = self.catalog.entry(identifier)?;
        self.predict_request(entry, request).await
    }
}
