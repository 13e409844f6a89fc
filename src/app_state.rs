//! Application state management.
//!
//! This module defines the shared state passed to all Axum handlers via the
//! `State` extractor. It holds the ceremony orchestrator and the metrics
//! implementation, both behind `Arc`, so cloning per request is cheap.

use crate::domain::MetricsPtr;
use crate::orchestrator::CeremonyOrchestrator;
use std::sync::Arc;

/// Shared application state passed to all Axum handlers.
///
/// This struct serves as the Dependency Injection container for the
/// application. Handlers only translate between HTTP and the orchestrator;
/// every ceremony rule lives behind `orchestrator`.
///
/// # Lifecycle
///
/// 1. Created once in `build_router()` during application startup
/// 2. Attached to the Axum router via `.with_state(app_state)`
/// 3. Cloned automatically by Axum for each incoming HTTP request
/// 4. Handlers extract via `State(state): State<AppState>`
#[derive(Clone)]
pub(crate) struct AppState {
    /// Ceremony orchestrator composing stores, verifier and metadata service.
    orchestrator: Arc<CeremonyOrchestrator>,

    /// Metrics implementation for recording application events.
    ///
    /// Either Prometheus-backed (production) or no-op (testing/development).
    metrics: MetricsPtr,
}

impl AppState {
    // ---

    pub fn new(orchestrator: Arc<CeremonyOrchestrator>, metrics: MetricsPtr) -> Self {
        // ---
        AppState {
            orchestrator,
            metrics,
        }
    }

    /// Get a reference to the ceremony orchestrator.
    pub(crate) fn orchestrator(&self) -> &CeremonyOrchestrator {
        // ---
        &self.orchestrator
    }

    /// Get a reference to the metrics implementation.
    pub(crate) fn metrics(&self) -> &MetricsPtr {
        // ---
        &self.metrics
    }
}
