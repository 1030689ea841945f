//! Artifact loading and predictor invocation
//!
//! An artifact is an exported regression pipeline that is opaque to this
//! crate beyond its predict-on-row contract. Stores resolve a catalog entry
//! to a [`Predictor`]; the backend decides whether that means reading a
//! portable export from disk or calling an inference service.

use std::sync::Arc;

use async_trait::async_trait;

use crate::catalog::ModelEntry;
use crate::config::{ArtifactBackend, ArtifactConfig};
use crate::request::TabularRecord;
use crate::Result;

pub mod cache;
pub mod portable;
pub mod remote;

pub use cache::CachedArtifactStore;
pub use portable::{HandleUnknown, PortableArtifactStore, PortableModel};
pub use remote::RemoteArtifactStore;

/// A loaded model that can score tabular records
#[async_trait]
pub trait Predictor: Send + Sync {
    /// Predict one value per row of `record`
    ///
    /// # Errors
    ///
    /// `Error::Prediction` for unseen categories, schema mismatches or
    /// inference service failures.
    async fn predict(&self, record: &TabularRecord) -> Result<Vec<f64>>;
}

/// Source of predictors, keyed by catalog entry
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Backend name for logs ("portable", "remote")
    fn backend(&self) -> &'static str;

    /// Load the predictor for `entry`
    ///
    /// # Errors
    ///
    /// `Error::ArtifactLoad` if the artifact is missing, corrupt or does not
    /// match the entry's feature set.
    async fn load(&self, entry: &ModelEntry) -> Result<Arc<dyn Predictor>>;
}

/// Build the store described by the `[artifacts]` configuration section
pub fn store_from_config(config: &ArtifactConfig) -> Result<Arc<dyn ArtifactStore>> {
    let store: Arc<dyn ArtifactStore> = match config.backend {
        ArtifactBackend::Portable => Arc::new(PortableArtifactStore::new(&config.dir)),
        ArtifactBackend::Remote => Arc::new(RemoteArtifactStore::from_config(config)?),
    };

    if config.cache {
        Ok(Arc::new(CachedArtifactStore::new(store)))
    } else {
        Ok(store)
    }
}
