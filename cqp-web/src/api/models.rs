//! Model catalog endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use cqp_common::{parse_features, FeatureCount, ModelEntry};
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::AppState;

/// Query parameters for the model listing
#[derive(Debug, Deserialize)]
pub struct ModelsQuery {
    /// 2 or 3; omit to list every model
    pub features: Option<u8>,
}

/// One catalog entry as returned by the API
#[derive(Debug, Serialize)]
pub struct ModelSummary {
    pub identifier: String,
    pub features: Vec<&'static str>,
    pub rmse: Option<f64>,
}

impl From<&ModelEntry> for ModelSummary {
    fn from(entry: &ModelEntry) -> Self {
        Self {
            identifier: entry.identifier.clone(),
            features: entry.feature_names(),
            rmse: entry.rmse,
        }
    }
}

/// Model listing response
#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub feature_count: Option<u8>,
    pub models: Vec<ModelSummary>,
}

/// GET /api/models?features=2
///
/// Lists the models for a feature count in catalog order.
pub async fn list_models(
    State(state): State<AppState>,
    Query(query): Query<ModelsQuery>,
) -> Result<Json<ModelsResponse>, ApiError> {
    let catalog = state.handler.catalog();

    let models = match query.features {
        Some(n) => {
            let count = FeatureCount::try_from(n)?;
            catalog.list_entries(count)?.iter().map(ModelSummary::from).collect()
        }
        None => catalog.iter().map(ModelSummary::from).collect(),
    };

    Ok(Json(ModelsResponse {
        feature_count: query.features,
        models,
    }))
}

/// Feature names parsed from a model identifier
#[derive(Debug, Serialize)]
pub struct FeaturesResponse {
    pub model: String,
    pub features: Vec<String>,
}

/// GET /api/models/:id/features
///
/// Parses the feature names out of a catalog identifier. Malformed names are
/// 400, well-formed names missing from the catalog 404.
pub async fn model_features(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FeaturesResponse>, ApiError> {
    let features = parse_features(&id)?;
    state.handler.catalog().entry(&id)?;

    Ok(Json(FeaturesResponse {
        model: id,
        features,
    }))
}
