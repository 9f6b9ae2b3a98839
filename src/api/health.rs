use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use super::ApiState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Whether the service is running
    pub ok: bool,
    pub service: String,
    /// Current server time (RFC 3339)
    pub time: String,
    /// Number of stops in the loaded static table
    pub stop_count: usize,
    /// Number of routes in the loaded static table
    pub route_count: usize,
    /// When the static tables were loaded (RFC 3339)
    pub tables_loaded_at: String,
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service health status", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<ApiState>) -> Json<HealthResponse> {
    let tables = state.provider.tables();
    Json(HealthResponse {
        ok: true,
        service: env!("CARGO_PKG_NAME").to_string(),
        time: Utc::now().to_rfc3339(),
        stop_count: tables.stops.len(),
        route_count: tables.routes.len(),
        tables_loaded_at: tables.loaded_at.to_rfc3339(),
    })
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(health_check))
        .with_state(state)
}
