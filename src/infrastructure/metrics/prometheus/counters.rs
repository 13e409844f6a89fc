use crate::domain::Ceremony;
use metrics::counter;

/// Increment the ceremony counter for a started or finished ceremony.
pub fn increment_ceremony(ceremony: Ceremony, outcome: &'static str) {
    counter!(
        "webauthn_ceremonies_total",
        "ceremony" => ceremony.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Increment the counter of authentications whose signature counter went backwards.
pub fn increment_counter_regression() {
    counter!("webauthn_signature_counter_regressions_total").increment(1);
}
