use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::providers::nyct::error::FeedError;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Invalid input is the caller's fault; everything upstream of us surfaces
/// as a bad gateway. Absence (a stop with no arrivals, a route with no
/// stops) never reaches this path.
impl IntoResponse for FeedError {
    fn into_response(self) -> Response {
        let status = match &self {
            FeedError::UnknownGroup(_) => StatusCode::NOT_FOUND,
            FeedError::Network(_) | FeedError::Status(_) | FeedError::Decode(_) => {
                StatusCode::BAD_GATEWAY
            }
            FeedError::Csv(_) | FeedError::Io(_) | FeedError::Parse(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        tracing::warn!(error = %self, status = %status, "Request failed");
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
