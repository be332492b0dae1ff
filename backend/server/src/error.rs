use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub const RESOLUTION_FAILED: &str = "Internal server error during URL resolution.";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing \"url\" or \"name\" query parameter.")]
    MissingParams,

    #[error("Address not found for {name}.")]
    AddressNotFound { name: String, resolved_url: String },

    #[error("{0}")]
    Request(#[from] reqwest::Error),

    #[error("Upstream responded with {0}")]
    UpstreamStatus(StatusCode),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::MissingParams => {
                (StatusCode::BAD_REQUEST, json!({ "error": self.to_string() }))
            }
            AppError::AddressNotFound { resolved_url, .. } => (
                StatusCode::NOT_FOUND,
                json!({ "error": self.to_string(), "resolvedUrl": resolved_url }),
            ),
            AppError::Request(_) | AppError::UpstreamStatus(_) => {
                error!("URL resolution failed: {self}");

                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": RESOLUTION_FAILED, "details": self.to_string() }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
