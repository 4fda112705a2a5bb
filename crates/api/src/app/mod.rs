//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: backend selection, seeding, service construction
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: JSON view documents
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use epm_infra::AppConfig;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::{AppServices, StartupError};

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> Result<Router, StartupError> {
    let services = Arc::new(services::build_services(config).await?);
    Ok(router(services))
}

/// Router over already-constructed services.
pub fn router(services: Arc<AppServices>) -> Router {
    // Protected routes: anonymous requests are redirected to the login page.
    let protected = routes::protected_router()
        .route_layer(axum::middleware::from_fn(middleware::require_identity));

    Router::new()
        .merge(routes::public_router())
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(axum::middleware::from_fn_with_state(
            services.clone(),
            middleware::resolve_session,
        ))
        .layer(Extension(services))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
