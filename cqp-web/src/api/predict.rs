//! JSON prediction endpoint

use std::collections::BTreeMap;

use axum::{extract::State, Json};
use cqp_common::{PredictionRequest, PredictionResult};
use serde::Deserialize;
use tracing::info;

use super::ApiError;
use crate::AppState;

/// Body of POST /api/predict
#[derive(Debug, Deserialize)]
pub struct PredictBody {
    /// Catalog identifier, e.g. `model_Acidity_Balance_5.pkl`
    pub model: String,
    #[serde(default)]
    pub country: String,
    /// Cupping score per feature of the model
    #[serde(default)]
    pub values: BTreeMap<String, f64>,
}

/// POST /api/predict
///
/// `{"model": "...", "country": "Brazil", "values": {"Acidity": 7.5, "Balance": 6.8}}`
pub async fn predict_json(
    State(state): State<AppState>,
    Json(body): Json<PredictBody>,
) -> Result<Json<PredictionResult>, ApiError> {
    let request = PredictionRequest::new(body.country, body.values);
    let result = state
        .handler
        .predict_by_identifier(&body.model, &request)
        .await?;

    info!("{} predicted {:?}", result.model, result.prediction);
    Ok(Json(result))
}
