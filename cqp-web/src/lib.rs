//! cqp-web library - coffee quality prediction web front-end
//!
//! Two HTML pages (intro and main) with per-session navigation state, plus
//! a JSON API over the same catalog and prediction handler.

use axum::Router;
use cqp_common::PredictionHandler;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod pages;
pub mod session;

use session::SessionStore;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Catalog and artifact store
    pub handler: PredictionHandler,
    /// Navigation state per browser session
    pub sessions: SessionStore,
}

impl AppState {
    /// Create new application state
    pub fn new(handler: PredictionHandler) -> Self {
        Self {
            handler,
            sessions: SessionStore::default(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let pages = Router::new()
        .route("/", get(api::serve_page))
        .route("/enter", post(api::enter))
        .route("/back", post(api::go_back))
        .route("/predict", post(api::predict_form));

    let json_api = Router::new()
        .route("/api/models", get(api::list_models))
        .route("/api/models/:id/features", get(api::model_features))
        .route("/api/predict", post(api::predict_json))
        .merge(api::health_routes());

    Router::new()
        .merge(pages)
        .merge(json_api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
