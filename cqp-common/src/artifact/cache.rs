//! Process-lifetime cache of loaded predictors

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{ArtifactStore, Predictor};
use crate::catalog::ModelEntry;
use crate::Result;

/// Wraps another store and keeps every successfully loaded predictor
///
/// Failed loads are not cached, so a fixed artifact file is picked up on the
/// next request.
pub struct CachedArtifactStore {
    inner: Arc<dyn ArtifactStore>,
    loaded: RwLock<HashMap<String, Arc<dyn Predictor>>>,
}

impl CachedArtifactStore {
    pub fn new(inner: Arc<dyn ArtifactStore>) -> Self {
        Self {
            inner,
            loaded: RwLock::new(HashMap::new()),
        }
    }

    /// Number of cached predictors
    pub async fn len(&self) -> usize {
        self.loaded.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.loaded.read().await.is_empty()
    }
}

#[async_trait]
impl ArtifactStore for CachedArtifactStore {
    fn backend(&self) -> &'static str {
        self.inner.backend()
    }

    async fn load(&self, entry: &ModelEntry) -> Result<Arc<dyn Predictor>> {
        if let Some(predictor) = self.loaded.read().await.get(&entry.identifier) {
            debug!("Artifact cache hit: {}", entry.identifier);
            return Ok(Arc::clone(predictor));
        }

        let predictor = self.inner.load(entry).await?;
        self.loaded
            .write()
            .await
            .entry(entry.identifier.clone())
            .or_insert_with(|| Arc::clone(&predictor));
        Ok(predictor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::Feature;
    use crate::request::TabularRecord;
    use crate::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Constant(f64);

    #[async_trait]
    impl Predictor for Constant {
        async fn predict(&self, _record: &TabularRecord) -> Result<Vec<f64>> {
            Ok(vec![self.0])
        }
    }

    #[derive(Default)]
    struct CountingStore {
        loads: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ArtifactStore for CountingStore {
        fn backend(&self) -> &'static str {
            "counting"
        }

        async fn load(&self, _entry: &ModelEntry) -> Result<Arc<dyn Predictor>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::ArtifactLoad("missing".to_string()));
            }
            Ok(Arc::new(Constant(8.1)))
        }
    }

    fn entry() -> ModelEntry {
        ModelEntry {
            identifier: "model_Aroma_Body_2.pkl".to_string(),
            features: vec![Feature::Aroma, Feature::Body],
            rmse: None,
        }
    }

    #[tokio::test]
    async fn test_second_load_served_from_cache() {
        let inner = Arc::new(CountingStore::default());
        let cache = CachedArtifactStore::new(inner.clone());

        cache.load(&entry()).await.unwrap();
        cache.load(&entry()).await.unwrap();

        assert_eq!(inner.loads.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.backend(), "counting");
    }

    #[tokio::test]
    async fn test_failed_load_not_cached() {
        let inner = Arc::new(CountingStore {
            fail: true,
            ..Default::default()
        });
        let cache = CachedArtifactStore::new(inner.clone());

        assert!(cache.load(&entry()).await.is_err());
        assert!(cache.load(&entry()).await.is_err());

        assert_eq!(inner.loads.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty().await);
    }
}
