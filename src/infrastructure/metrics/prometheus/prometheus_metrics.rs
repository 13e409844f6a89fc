//! Prometheus metrics implementation.
//!
//! Concrete implementation of the `Metrics` trait backed by the global
//! `metrics` crate registry. Counters are registered on first use; the
//! handle kept in `recorder.rs` renders them in Prometheus text format.

use crate::domain::{Ceremony, Metrics};

/// Prometheus-based metrics implementation.
///
/// Holds no state of its own; everything lives in the global registry.
pub struct PrometheusMetrics {}

impl PrometheusMetrics {
    pub fn new() -> Self {
        tracing::info!("Creating Prometheus metrics");
        PrometheusMetrics {}
    }
}

impl Metrics for PrometheusMetrics {
    // ---
    fn render(&self) -> String {
        super::render_metrics()
    }

    fn record_ceremony_started(&self, ceremony: Ceremony) {
        tracing::trace!("Recording {} started", ceremony);
        super::increment_ceremony(ceremony, "started");
    }

    fn record_ceremony_finished(&self, ceremony: Ceremony, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        tracing::trace!("Recording {} {}", ceremony, outcome);
        super::increment_ceremony(ceremony, outcome);
    }

    fn record_signature_counter_regression(&self) {
        super::increment_counter_regression();
    }
}
