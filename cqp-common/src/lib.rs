//! # Coffee Quality Predictor Common Library
//!
//! Shared code for the coffee quality predictor front-ends:
//! - Model catalog and artifact filename convention
//! - Prediction requests, one-row tabular records and results
//! - Artifact stores (portable exports, inference service, cache)
//! - Prediction handler (validation and predictor invocation)
//! - Two-page navigation state
//! - Configuration loading

pub mod artifact;
pub mod catalog;
pub mod config;
pub mod error;
pub mod features;
pub mod handler;
pub mod navigation;
pub mod request;

pub use catalog::{FeatureCount, ModelCatalog, ModelEntry};
pub use error::{Error, Result};
pub use features::{parse_features, Feature};
pub use handler::PredictionHandler;
pub use navigation::{NavAction, Page};
pub use request::{PredictionRequest, PredictionResult, TabularRecord};
