//! Seams to the cryptographic verification engine and the attestation
//! metadata service. Neither is implemented by the ceremony layer itself.

use super::ids::{CredentialId, UserHandle};
use super::models::{
    AttestationMetadata, AuthenticatorSelection, AuthenticatorTransport, UserIdentity,
};
use super::requests::{AssertionOptions, AssertionResponse, RegistrationOptions, RegistrationResponse};
use std::collections::BTreeSet;
use std::sync::Arc;

/// A verified new credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationResult {
    // ---
    pub credential_id: CredentialId,
    pub public_key: Vec<u8>,
    pub signature_count: u32,
    pub transports: BTreeSet<AuthenticatorTransport>,
    pub attestation_trusted: bool,
    /// First certificate of the attestation chain, DER encoded.
    pub attestation_certificate: Option<Vec<u8>>,
}

/// A verified assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionResult {
    // ---
    pub credential_id: CredentialId,
    pub user_handle: UserHandle,
    pub username: String,
    pub signature_count: u32,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    /// The proof did not verify.
    #[error("{0}")]
    Rejected(String),

    /// The client response does not have the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The engine itself failed.
    #[error("verification engine error: {0}")]
    Engine(String),
}

/// WebAuthn verification engine.
#[async_trait::async_trait]
pub trait Verifier: Send + Sync {
    // ---
    async fn begin_registration(
        &self,
        user: &UserIdentity,
        selection: &AuthenticatorSelection,
    ) -> Result<RegistrationOptions, VerificationError>;

    async fn complete_registration(
        &self,
        options: &RegistrationOptions,
        response: &RegistrationResponse,
    ) -> Result<RegistrationResult, VerificationError>;

    /// `None` asks for a discoverable-credential flow.
    async fn begin_assertion(
        &self,
        username: Option<&str>,
    ) -> Result<AssertionOptions, VerificationError>;

    async fn complete_assertion(
        &self,
        options: &AssertionOptions,
        response: &AssertionResponse,
    ) -> Result<AssertionResult, VerificationError>;
}

/// Type alias for any engine that implements Verifier.
pub type VerifierPtr = Arc<dyn Verifier>;

/// Source of attestation metadata for newly registered authenticators.
pub trait MetadataService: Send + Sync {
    // ---
    fn find_entries(&self, result: &RegistrationResult) -> Vec<AttestationMetadata>;
}

/// Type alias for any backend that implements MetadataService.
pub type MetadataServicePtr = Arc<dyn MetadataService>;
