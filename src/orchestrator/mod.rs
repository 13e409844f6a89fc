//! Ceremony orchestration.
//!
//! [`CeremonyOrchestrator`] composes the challenge stores, the session and
//! credential registries, and the verification engine into the WebAuthn
//! ceremonies. Each ceremony is a two-step transaction: `start_*` produces a
//! pending request and never touches the credential registry; `finish_*`
//! consumes that request exactly once, verifies, and commits.
//!
//! The orchestrator owns no state of its own. Everything it needs is
//! injected at construction, so the in-memory stores can be swapped for
//! shared ones without touching the ceremony logic.

mod authentication;
mod codec;
mod management;
mod registration;

use crate::domain::{
    AssertionRequest, Ceremony, CeremonyError, ChallengeStorePtr, CredentialRegistryPtr,
    MetadataServicePtr, MetricsPtr, RegistrationRequest, SessionRegistryPtr, SessionToken,
    VerificationError, VerifierPtr,
};

/// The stores a ceremony touches.
#[derive(Clone)]
pub struct CeremonyStores {
    // ---
    pub registration_requests: ChallengeStorePtr<RegistrationRequest>,
    pub assertion_requests: ChallengeStorePtr<AssertionRequest>,
    pub sessions: SessionRegistryPtr,
    pub credentials: CredentialRegistryPtr,
}

/// Top-level coordinator of registration, authentication, and credential
/// management.
///
/// Safe to share across tasks; every operation may run concurrently with
/// any other.
pub struct CeremonyOrchestrator {
    // ---
    stores: CeremonyStores,
    verifier: VerifierPtr,
    metadata: MetadataServicePtr,
    metrics: MetricsPtr,
}

impl CeremonyOrchestrator {
    // ---
    pub fn new(
        stores: CeremonyStores,
        verifier: VerifierPtr,
        metadata: MetadataServicePtr,
        metrics: MetricsPtr,
    ) -> Self {
        // ---
        Self {
            stores,
            verifier,
            metadata,
            metrics,
        }
    }

    /// Resolves a session token to the username it currently speaks for.
    ///
    /// # Errors
    /// [`CeremonyError::PermissionDenied`] if the token is unknown or
    /// expired, or its user no longer has any credentials.
    pub async fn username_for_session(&self, token: &SessionToken) -> Result<String, CeremonyError> {
        // ---
        let user_handle = self
            .stores
            .sessions
            .get_session(token)
            .await
            .ok_or_else(|| CeremonyError::PermissionDenied("Invalid session.".to_string()))?;

        self.stores
            .credentials
            .username_for_user_handle(&user_handle)
            .await?
            .ok_or_else(|| {
                CeremonyError::PermissionDenied("User not registered.".to_string())
            })
    }

    /// Logs a failed operation at the severity its kind deserves.
    fn log_failure(&self, operation: &str, err: &CeremonyError) {
        // ---
        if err.is_bug() {
            tracing::error!("{} failed unexpectedly: {}", operation, err);
        } else {
            tracing::debug!("{} rejected: {}", operation, err);
        }
    }

    /// Records and logs the outcome of a finish call.
    fn observe_finish<T>(&self, ceremony: Ceremony, result: &Result<T, CeremonyError>) {
        // ---
        self.metrics
            .record_ceremony_finished(ceremony, result.is_ok());
        if let Err(err) = result {
            self.log_failure(&format!("Finishing {ceremony}"), err);
        }
    }
}

/// Translates a verification engine failure into the ceremony taxonomy.
///
/// Only a failing engine is a bug; everything else is a rejected proof.
fn verification_error(ceremony: Ceremony, err: VerificationError) -> CeremonyError {
    // ---
    match err {
        VerificationError::Engine(reason) => CeremonyError::UnexpectedFailure(reason),
        other => CeremonyError::VerificationFailed {
            ceremony,
            reason: other.to_string(),
        },
    }
}
