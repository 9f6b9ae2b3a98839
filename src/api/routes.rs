use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::providers::nyct::static_data::{RouteRecord, StopRecord};

use super::ApiState;

/// The static route summary table
#[utoipa::path(
    get,
    path = "/api/routes",
    responses(
        (status = 200, description = "All route records", body = Vec<RouteRecord>)
    ),
    tag = "routes"
)]
pub async fn list_routes(State(state): State<ApiState>) -> Json<Vec<RouteRecord>> {
    Json(state.provider.tables().routes.clone())
}

/// Stops served by a route line
///
/// Membership is decided by the route-matching rules (free-text tokens,
/// station-code ranges), not by the free-text column alone. An unknown or
/// empty route yields an empty list.
#[utoipa::path(
    get,
    path = "/api/routes/{route_id}/stops",
    params(("route_id" = String, Path, description = "Route line, case-insensitive")),
    responses(
        (status = 200, description = "Stops served by the route, sorted by name", body = Vec<StopRecord>)
    ),
    tag = "routes"
)]
pub async fn get_route_stops(
    State(state): State<ApiState>,
    Path(route_id): Path<String>,
) -> Json<Vec<StopRecord>> {
    let tables = state.provider.tables();
    let matched = state
        .matcher
        .filter_stops_by_route(tables.stops.values(), &route_id);
    Json(matched.into_iter().cloned().collect())
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(list_routes))
        .route("/{route_id}/stops", get(get_route_stops))
        .with_state(state)
}
