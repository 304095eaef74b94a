pub mod admin;
pub mod error;
pub mod leads;
pub mod session;

use crate::config::AppConfig;
use crate::state::SharedState;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, get_service},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

async fn health() -> &'static str {
    "OK"
}

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/admin", admin::router(state.clone()))
        .merge(leads::router(state))
}

/// Full application: API routes, static front-end fallback and HTTP layers.
pub fn app(state: SharedState, config: &AppConfig) -> Router {
    let index = format!("{}/index.html", config.static_dir.trim_end_matches('/'));
    let static_handler = ServeDir::new(&config.static_dir).not_found_service(ServeFile::new(index));

    let mut app = Router::new()
        .merge(routes(state))
        .fallback_service(get_service(static_handler))
        .layer(TraceLayer::new_for_http());

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();
    if !origins.is_empty() {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                .allow_credentials(true),
        );
    }
    app
}
