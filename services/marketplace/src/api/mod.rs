//! HTTP / WebSocket 接口层

pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod state;
pub mod ws;

use std::time::Duration;

use axum::Router;
use axum::http::HeaderValue;
use handyhub_config::ServerConfig;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

pub use state::AppState;

use handlers::{
    admin, ai, auth, chat, health, material_requests, notifications, partners, service_requests,
    users,
};

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}

/// 组装完整路由
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    let api = Router::new()
        .merge(auth::routes())
        .merge(users::routes())
        .merge(admin::routes())
        .merge(service_requests::routes())
        .merge(material_requests::routes())
        .merge(partners::routes())
        .merge(notifications::routes())
        .merge(chat::routes())
        .merge(ai::routes())
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes));

    Router::new()
        .merge(api)
        .merge(health::routes())
        .merge(ws::routes())
        .layer(axum::middleware::from_fn(middleware::track_http_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config))
        .with_state(state)
}
