//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST API routes for the master-data lifecycle engine
//! - Request extractors
//! - Response envelopes

pub mod extractors;
pub mod routes;

use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tresor_core::workflow::LifecycleService;
use tresor_shared::AppConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The maker-checker lifecycle engine.
    pub engine: Arc<LifecycleService>,
    /// Loaded application configuration.
    pub config: Arc<AppConfig>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
