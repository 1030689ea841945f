//! Mapping of predictor errors onto HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cqp_common::Error;
use serde_json::json;
use tracing::{error, warn};

/// Error returned by JSON API handlers
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

/// HTTP status for an error kind
pub fn status_for(e: &Error) -> StatusCode {
    match e {
        Error::Validation(_) | Error::Format(_) => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Prediction(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Config(_) | Error::ArtifactLoad(_) | Error::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!("{}", self.0);
        } else {
            warn!("{}", self.0);
        }

        let body = Json(json!({
            "error": self.0.to_string(),
            "kind": self.0.kind(),
        }));

        (status, body).into_response()
    }
}
