use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{handlers, middleware::metrics_middleware, stream};
use crate::rate_limit::{rate_limit_middleware, ClientRateLimiter};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Client-facing routes, subject to the per-client rate limit
    let mut limited_routes = Router::new()
        .route("/manifest.json", get(handlers::manifest))
        .route("/stream/{type}/{id}", get(stream::get_streams))
        .route("/stream/{type}/{id}/{extra}", get(stream::get_streams_with_extra))
        .route("/api/v1/config", get(handlers::get_config));

    let rate_limit = &state.config().rate_limit;
    if rate_limit.enabled {
        let limiter = Arc::new(ClientRateLimiter::new(rate_limit));
        limited_routes = limited_routes
            .route_layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));
    }

    // Health checks and scraping stay unthrottled
    Router::new()
        .merge(limited_routes)
        .route("/api/v1/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
