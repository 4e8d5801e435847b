//! API module
//!
//! HTTP API endpoints and middleware.

mod extract;
pub mod middleware;
pub mod routes;
mod state;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

pub use routes::create_router;
pub use state::AppState;

/// Build the application router.
///
/// Layers run outermost first: trace, request logging, then bearer
/// authentication on the protected routes only.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", create_router(state.clone()))
        .layer(axum::middleware::from_fn(middleware::logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
