// Server module - assembles the HTTP application around the API router

use axum::Router;
use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api;
use crate::api_docs::ApiDoc;
use crate::infrastructure::AppState;
use crate::infrastructure::config::Config;

/// Build the full application: API, media files, docs, CORS and tracing
pub fn build_router(state: AppState, config: &Config) -> Router {
    let mut origins = Vec::new();
    for origin in &config.cors_allowed_origins {
        match origin.parse::<HeaderValue>() {
            Ok(v) => origins.push(v),
            Err(e) => tracing::error!("Failed to parse CORS origin '{}': {}", origin, e),
        }
    }

    // No configured origins means a permissive dev setup
    let cors = if origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let mut app = Router::new()
        .merge(SwaggerUi::new("/api/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api::api_router(state));

    if config.media_url.starts_with('/') && config.media_url.len() > 1 {
        app = app.nest_service(&config.media_url, ServeDir::new(&config.media_root));
    } else {
        tracing::warn!(
            "MEDIA_URL '{}' is not a path prefix, media files will not be served",
            config.media_url
        );
    }

    app.layer(cors)
        .layer(TraceLayer::new_for_http())
}
