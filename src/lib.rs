pub mod config;
pub mod dto;
pub mod handler;
pub mod rate_limit;
pub mod sender;
pub mod service;
pub mod state;

use std::time::Duration;

use axum::{
    Router,
    http::{Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

/// Assembles the full HTTP surface. Only the send routes sit behind the
/// rate limiter; the CORS layer answers OPTIONS preflights before any
/// route logic runs.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
            Method::PUT,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(86400));

    let send_routes = Router::new()
        .route("/send-email", post(handler::send_email))
        .route("/api/v1/email", post(handler::send_email))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::enforce,
        ));

    Router::new()
        .route("/health", get(handler::health_check))
        .route("/stats", get(handler::stats))
        .merge(send_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
