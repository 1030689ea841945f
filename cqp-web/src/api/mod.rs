//! HTTP handlers for cqp-web

pub mod error;
pub mod health;
pub mod models;
pub mod predict;
pub mod ui;

pub use error::ApiError;
pub use health::health_routes;
pub use models::{list_models, model_features};
pub use predict::predict_json;
pub use ui::{enter, go_back, predict_form, serve_page};
