use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::providers::nyct::error::FeedError;
use crate::providers::nyct::realtime::TripUpdate;
use crate::providers::nyct::{FetchOptions, NyctProvider};

use super::{header_api_key, ApiState};

#[derive(Debug, Serialize, ToSchema)]
pub struct GroupListResponse {
    pub groups: Vec<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CacheQuery {
    /// Set to true to bypass cache reads and writes for this request
    #[serde(default)]
    pub nocache: bool,
}

/// List the valid feed groups
#[utoipa::path(
    get,
    path = "/api/feed",
    responses(
        (status = 200, description = "The fixed feed group enumeration", body = GroupListResponse)
    ),
    tag = "feed"
)]
pub async fn list_feed_groups() -> Json<GroupListResponse> {
    Json(GroupListResponse {
        groups: NyctProvider::list_groups()
            .iter()
            .map(|g| g.to_string())
            .collect(),
    })
}

/// Normalized trip updates for one feed group
#[utoipa::path(
    get,
    path = "/api/feed/{group_id}",
    params(
        ("group_id" = String, Path, description = "Feed group id, case-insensitive"),
        CacheQuery
    ),
    responses(
        (status = 200, description = "Trip updates decoded from the group feed", body = Vec<TripUpdate>),
        (status = 404, description = "Unknown feed group", body = super::ErrorResponse),
        (status = 502, description = "Feed unavailable or undecodable", body = super::ErrorResponse)
    ),
    tag = "feed"
)]
pub async fn get_feed(
    State(state): State<ApiState>,
    Path(group_id): Path<String>,
    Query(query): Query<CacheQuery>,
    headers: HeaderMap,
) -> Result<Json<Vec<TripUpdate>>, FeedError> {
    let opts = FetchOptions {
        use_cache: !query.nocache,
        api_key: header_api_key(&headers),
    };
    let records = state.provider.fetch_feed(&group_id, &opts).await?;
    Ok(Json(records.as_ref().clone()))
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(list_feed_groups))
        .route("/{group_id}", get(get_feed))
        .with_state(state)
}
