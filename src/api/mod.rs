pub mod arrivals;
pub mod error;
pub mod feed;
pub mod health;
pub mod routes;
pub mod stops;

pub use error::ErrorResponse;

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::Router;

use crate::providers::nyct::NyctProvider;
use crate::routematch::RouteMatcher;

/// Shared state for all API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub provider: Arc<NyctProvider>,
    pub matcher: Arc<RouteMatcher>,
}

pub fn router(provider: Arc<NyctProvider>, matcher: Arc<RouteMatcher>) -> Router {
    let state = ApiState { provider, matcher };

    Router::new()
        .nest("/feed", feed::router(state.clone()))
        .nest("/arrivals", arrivals::router(state.clone()))
        .nest("/stops", stops::router(state.clone()))
        .nest("/routes", routes::router(state.clone()))
        .nest("/health", health::router(state))
}

/// Per-request API key override from the `x-api-key` header.
pub(crate) fn header_api_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn header_api_key_reads_the_override() {
        let mut headers = HeaderMap::new();
        assert_eq!(header_api_key(&headers), None);

        headers.insert("x-api-key", HeaderValue::from_static("secret"));
        assert_eq!(header_api_key(&headers).as_deref(), Some("secret"));
    }
}
