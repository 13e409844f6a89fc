// src/lib.rs
use anyhow::Result;
use app_state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use domain::MetricsPtr;
use handlers::{health_check, metrics_handler, root_handler};

// Public exports (visible outside this module)
pub mod domain;

// Internal-only exports (sibling access within this module)
mod app_state;
mod config;
mod handlers;
mod infrastructure;
mod orchestrator;

// Hoist up only the public symbol(s)
pub use orchestrator::{CeremonyOrchestrator, CeremonyStores};

pub use config::*;

// Publicly expose the infrastructure creation functions
pub use infrastructure::memory::create_stores as create_memory_stores;
pub use infrastructure::redis::create_stores as create_redis_stores;
pub use infrastructure::{
    create_noop_metrics, // ---
    create_null_metadata,
    create_prom_metrics,
    create_verifier,
    create_webauthn,
};

/// Build the HTTP router with every dependency determined by environment variables.
pub fn create_router() -> Result<Router> {
    // ---
    // Load all configuration from environment
    let config = AppConfig::from_env()?;

    tracing_subscriber::fmt::try_init().ok(); // Ignores if already initialized

    let metrics = match config.metrics {
        MetricsBackend::Prometheus => create_prom_metrics()?,
        MetricsBackend::Noop => create_noop_metrics()?,
    };

    let stores = match &config.store {
        StoreConfig::Memory => create_memory_stores(&config.cache),
        StoreConfig::Redis { url } => create_redis_stores(url, &config.cache)?,
    };

    let verifier = create_verifier(&config.webauthn, stores.credentials.clone())?;
    let orchestrator =
        CeremonyOrchestrator::new(stores, verifier, create_null_metadata(), metrics.clone());

    Ok(build_router(Arc::new(orchestrator), metrics))
}

/// Build the HTTP router around an already assembled orchestrator.
pub fn build_router(orchestrator: Arc<CeremonyOrchestrator>, metrics: MetricsPtr) -> Router {
    // ---
    let app_state = AppState::new(orchestrator, metrics);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .nest(
            "/webauthn",
            Router::new()
                .route("/register/start", post(handlers::register_start))
                .route("/register/finish", post(handlers::register_finish))
                .route("/auth/start", post(handlers::auth_start))
                .route("/auth/finish", post(handlers::auth_finish))
                .route(
                    "/credentials/deregister",
                    post(handlers::deregister_credential),
                )
                .route("/account", delete(handlers::delete_account)),
        )
        .with_state(app_state)
}
