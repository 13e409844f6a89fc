use super::requests::Ceremony;
use std::sync::Arc;

/// Abstraction for application metrics (counters).
pub trait Metrics: Send + Sync + 'static {
    // ---
    /// Render current metrics in Prometheus text format.
    fn render(&self) -> String;

    /// Record a ceremony start that produced a pending request.
    fn record_ceremony_started(&self, ceremony: Ceremony);

    /// Record the outcome of a finish call.
    fn record_ceremony_finished(&self, ceremony: Ceremony, success: bool);

    /// Record an authentication whose signature counter went backwards.
    fn record_signature_counter_regression(&self);
}

/// Type alias for any backend that implements Metrics.
pub type MetricsPtr = Arc<dyn Metrics>;
