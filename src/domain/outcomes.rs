use super::ids::{RequestId, SessionToken};
use super::models::CredentialRegistration;
use serde::Serialize;

/// Attestation certificate presented by the authenticator, DER encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttestationCertInfo {
    // ---
    #[serde(with = "crate::domain::ids::base64url")]
    pub der: Vec<u8>,
}

impl AttestationCertInfo {
    // ---
    pub fn new(der: Vec<u8>) -> Self {
        // ---
        Self { der }
    }
}

/// Result of a completed registration ceremony.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationOutcome {
    // ---
    pub success: bool,
    pub request_id: RequestId,
    pub username: String,
    pub registration: CredentialRegistration,
    pub attestation_trusted: bool,
    pub attestation_cert: Option<AttestationCertInfo>,
    pub session_token: SessionToken,
}

/// Result of a completed authentication ceremony.
#[derive(Debug, Clone, Serialize)]
pub struct AuthOutcome {
    // ---
    pub success: bool,
    pub request_id: RequestId,
    pub username: String,
    /// Every credential of the authenticated user, after the counter update.
    pub registrations: Vec<CredentialRegistration>,
    pub session_token: SessionToken,
}

/// Result of removing a single credential.
#[derive(Debug, Clone, Serialize)]
pub struct DeregisterOutcome {
    // ---
    pub success: bool,
    pub dropped_registration: CredentialRegistration,
    /// True when the removal left the user without credentials.
    pub account_deleted: bool,
}
