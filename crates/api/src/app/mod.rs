//! HTTP application wiring (axum router + services).
//!
//! - `services.rs`: infrastructure wiring and every operation
//! - `routes/`: thin handlers, one file per area
//! - `dto.rs`: request/response bodies (camelCase JSON)
//! - `errors.rs`: error taxonomy and its JSON rendering
//! - `extract.rs`: body extractor with `ServiceError` rejections

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::config::AppConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod extract;
pub mod routes;
pub mod services;

use errors::ServiceError;
use services::AppServices;

/// Build services from `config`, seed the administrator if configured, and return the router.
pub async fn build_app(config: &AppConfig) -> Result<Router, ServiceError> {
    let services = AppServices::from_config(config)?;
    if let Some(admin) = &config.bootstrap_admin {
        services.bootstrap_admin(admin).await?;
    }
    Ok(router(Arc::new(services)))
}

/// Router over already-built services.
pub fn router(services: Arc<AppServices>) -> Router {
    let auth_state = middleware::AuthState {
        jwt: services.tokens(),
    };

    let protected = routes::protected_router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    let api = routes::public_router().merge(protected);

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api", api)
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
