//! Inference service backend
//!
//! Delegates scoring to an external service that holds the original
//! serialized models:
//!
//! `POST {base_url}/predict` with
//! `{"artifact": "...", "columns": [...], "rows": [[...]]}` answered by
//! `{"predictions": [...]}` or, on failure, `{"error": "..."}`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ArtifactStore, Predictor};
use crate::catalog::ModelEntry;
use crate::config::ArtifactConfig;
use crate::request::{Cell, TabularRecord};
use crate::{Error, Result};

/// Body of a predict call
#[derive(Debug, Serialize, Deserialize)]
pub struct RemotePredictRequest {
    pub artifact: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// Successful answer of a predict call
#[derive(Debug, Serialize, Deserialize)]
pub struct RemotePredictResponse {
    pub predictions: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct RemoteErrorBody {
    error: String,
}

/// Store that hands out predictors bound to one inference service
#[derive(Debug, Clone)]
pub struct RemoteArtifactStore {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteArtifactStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("cqp/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ArtifactConfig) -> Result<Self> {
        let url = config.url.as_deref().ok_or_else(|| {
            Error::Config("artifacts.url is required for the remote backend".to_string())
        })?;
        Self::new(url, Duration::from_secs(config.timeout_secs))
    }
}

#[async_trait]
impl ArtifactStore for RemoteArtifactStore {
    fn backend(&self) -> &'static str {
        "remote"
    }

    async fn load(&self, entry: &ModelEntry) -> Result<Arc<dyn Predictor>> {
        Ok(Arc::new(RemotePredictor {
            client: self.client.clone(),
            endpoint: format!("{}/predict", self.base_url),
            artifact: entry.identifier.clone(),
        }))
    }
}

/// Predictor for one artifact served by the inference service
#[derive(Debug)]
pub struct RemotePredictor {
    client: reqwest::Client,
    endpoint: String,
    artifact: String,
}

#[async_trait]
impl Predictor for RemotePredictor {
    async fn predict(&self, record: &TabularRecord) -> Result<Vec<f64>> {
        let body = RemotePredictRequest {
            artifact: self.artifact.clone(),
            columns: record.columns().to_vec(),
            rows: vec![record.row().to_vec()],
        };

        debug!("POST {} for {}", self.endpoint, self.artifact);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Prediction(format!("inference service unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = match response.json::<RemoteErrorBody>().await {
                Ok(body) => body.error,
                Err(_) => status.to_string(),
            };
            return Err(Error::Prediction(format!(
                "inference service rejected {}: {}",
                self.artifact, detail
            )));
        }

        let parsed: RemotePredictResponse = response.json().await.map_err(|e| {
            Error::Prediction(format!("invalid inference service response: {}", e))
        })?;

        Ok(parsed.predictions)
    }
}
