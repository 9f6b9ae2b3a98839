use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::providers::nyct::static_data::StopRecord;
use crate::routematch::stop_display_order;

use super::{ApiState, ErrorResponse};

/// Cap on stop-search results to keep responses reasonable.
const MAX_STOP_RESULTS: usize = 2000;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StopSearchQuery {
    /// Substring match against stop name or id, case-insensitive
    pub query: Option<String>,
    /// Route line filter, resolved through the route-matching rules
    pub route: Option<String>,
}

/// Search the static stop table
#[utoipa::path(
    get,
    path = "/api/stops",
    params(StopSearchQuery),
    responses(
        (status = 200, description = "Matching stops, sorted by name", body = Vec<StopRecord>)
    ),
    tag = "stops"
)]
pub async fn list_stops(
    State(state): State<ApiState>,
    Query(params): Query<StopSearchQuery>,
) -> Json<Vec<StopRecord>> {
    let tables = state.provider.tables();
    let route = params
        .route
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());

    let mut items: Vec<&StopRecord> = match route {
        Some(route) => state
            .matcher
            .filter_stops_by_route(tables.stops.values(), route),
        None => {
            let mut all: Vec<&StopRecord> = tables.stops.values().collect();
            all.sort_by(|a, b| stop_display_order(a, b));
            all
        }
    };

    if let Some(needle) = params
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase)
    {
        items.retain(|s| {
            s.name.to_lowercase().contains(&needle) || s.id.to_lowercase().contains(&needle)
        });
    }

    items.truncate(MAX_STOP_RESULTS);
    Json(items.into_iter().cloned().collect())
}

/// One stop by id
#[utoipa::path(
    get,
    path = "/api/stops/{stop_id}",
    params(("stop_id" = String, Path, description = "Stop id")),
    responses(
        (status = 200, description = "The stop record", body = StopRecord),
        (status = 404, description = "Stop not found", body = ErrorResponse)
    ),
    tag = "stops"
)]
pub async fn get_stop(
    State(state): State<ApiState>,
    Path(stop_id): Path<String>,
) -> Result<Json<StopRecord>, (StatusCode, Json<ErrorResponse>)> {
    match state.provider.tables().stops.get(&stop_id) {
        Some(stop) => Ok(Json(stop.clone())),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Stop not found".to_string(),
            }),
        )),
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(list_stops))
        .route("/{stop_id}", get(get_stop))
        .with_state(state)
}
