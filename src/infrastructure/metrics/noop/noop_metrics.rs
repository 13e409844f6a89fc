use crate::domain::{Ceremony, Metrics};

/// No-op metrics implementation for testing.
pub struct NoopMetrics;

impl NoopMetrics {
    pub fn new() -> Self {
        NoopMetrics
    }
}

impl Metrics for NoopMetrics {
    // ---
    fn render(&self) -> String {
        String::new()
    }
    fn record_ceremony_started(&self, _: Ceremony) {}
    fn record_ceremony_finished(&self, _: Ceremony, _: bool) {}
    fn record_signature_counter_regression(&self) {}
}
