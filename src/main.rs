pub mod api;
mod cache;
mod config;
mod providers;
mod routematch;

use std::path::Path;
use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use config::Config;
use providers::nyct::static_data::StaticTables;
use providers::nyct::NyctProvider;
use routematch::RouteMatcher;

#[derive(OpenApi)]
#[openapi(
    info(title = "NYCT Board API", version = "0.1.0"),
    paths(
        api::health::health_check,
        api::feed::list_feed_groups,
        api::feed::get_feed,
        api::arrivals::get_arrival_board,
        api::stops::list_stops,
        api::stops::get_stop,
        api::routes::list_routes,
        api::routes::get_route_stops,
    ),
    components(schemas(
        api::ErrorResponse,
        api::health::HealthResponse,
        api::feed::GroupListResponse,
        providers::nyct::realtime::TripUpdate,
        providers::nyct::realtime::StopUpdate,
        providers::nyct::realtime::StopTimeInfo,
        providers::nyct::board::StopBoard,
        providers::nyct::board::ArrivalItem,
        providers::nyct::board::ArrivalMeta,
        providers::nyct::static_data::StopRecord,
        providers::nyct::static_data::RouteRecord,
    )),
    tags(
        (name = "health", description = "Service health check"),
        (name = "feed", description = "Raw real-time feed access"),
        (name = "arrivals", description = "Per-stop arrival boards"),
        (name = "stops", description = "Static stop table"),
        (name = "routes", description = "Route table and membership")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .init();

    // Load config
    let config = Config::load("config.yaml").expect("Failed to load config");
    tracing::info!(bind = %config.bind_addr, data_dir = %config.data_dir, "Loaded configuration");

    // Build CORS layer based on config
    let cors_layer = if config.cors_permissive {
        tracing::warn!("CORS: Permissive mode explicitly enabled (all origins allowed) - DO NOT USE IN PRODUCTION");
        CorsLayer::permissive()
    } else if !config.cors_origins.is_empty() {
        tracing::info!(origins = ?config.cors_origins, "CORS: Restricting to configured origins");
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([axum::http::Method::GET, axum::http::Method::OPTIONS])
            .allow_headers([axum::http::header::CONTENT_TYPE])
    } else {
        panic!("CORS configuration error: Either set 'cors_origins' with allowed origins, or set 'cors_permissive: true' for development");
    };

    // Load the static reference tables once; they are immutable afterwards.
    let tables = StaticTables::load(Path::new(&config.data_dir))
        .expect("Failed to load static reference tables");
    tracing::info!(
        stops = tables.stops.len(),
        routes = tables.routes.len(),
        "Loaded static reference tables"
    );

    let provider = Arc::new(
        NyctProvider::new(Arc::new(tables), &config).expect("Failed to initialize feed provider"),
    );
    let matcher = Arc::new(RouteMatcher::new());

    // Build the app
    let app = Router::new()
        .route("/", get(root))
        .nest("/api", api::router(provider, matcher))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind listen address");

    tracing::info!("Server running on http://{}", config.bind_addr);
    tracing::info!("Swagger UI: http://{}/swagger-ui", config.bind_addr);

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}

async fn root() -> &'static str {
    "NYCT Board API"
}
