use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};

use crate::providers::nyct::board::StopBoard;
use crate::providers::nyct::error::FeedError;
use crate::providers::nyct::FetchOptions;

use super::feed::CacheQuery;
use super::{header_api_key, ApiState};

/// Arrival board for one stop
///
/// "No arrivals for this stop" is a normal empty result, not an error; the
/// countdown labels are computed against the current clock even when the
/// underlying board was cached.
#[utoipa::path(
    get,
    path = "/api/arrivals/{group_id}/{stop_id}",
    params(
        ("group_id" = String, Path, description = "Feed group id, case-insensitive"),
        ("stop_id" = String, Path, description = "Stop id to board at"),
        CacheQuery
    ),
    responses(
        (status = 200, description = "The stop's board row", body = StopBoard),
        (status = 404, description = "Unknown feed group", body = super::ErrorResponse),
        (status = 502, description = "Feed unavailable or undecodable", body = super::ErrorResponse)
    ),
    tag = "arrivals"
)]
pub async fn get_arrival_board(
    State(state): State<ApiState>,
    Path((group_id, stop_id)): Path<(String, String)>,
    Query(query): Query<CacheQuery>,
    headers: HeaderMap,
) -> Result<Json<StopBoard>, FeedError> {
    let opts = FetchOptions {
        use_cache: !query.nocache,
        api_key: header_api_key(&headers),
    };
    let board = state
        .provider
        .arrival_board(&group_id, &stop_id, &opts)
        .await?;
    Ok(Json(board))
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/{group_id}/{stop_id}", get(get_arrival_board))
        .with_state(state)
}
