use super::{codec, verification_error, CeremonyOrchestrator};
use crate::domain::{
    AssertionRequest, AssertionResponse, AuthOutcome, Ceremony, CeremonyError, RequestId,
    StoreError,
};

impl CeremonyOrchestrator {
    // ---
    /// Starts an authentication.
    ///
    /// With a username, fails fast if it is unknown; this tells callers
    /// which usernames exist, which is accepted here in exchange for a clear
    /// error. Without a username the engine is asked for a
    /// discoverable-credential flow.
    pub async fn start_authentication(
        &self,
        username: Option<&str>,
    ) -> Result<AssertionRequest, CeremonyError> {
        // ---
        tracing::trace!("start_authentication(username: {:?})", username);

        let result = self.begin_authentication(username).await;

        match &result {
            Ok(request) => {
                self.metrics.record_ceremony_started(Ceremony::Authentication);
                tracing::info!(
                    "Generated auth challenge for user: {} (request {:?})",
                    username.unwrap_or("<discoverable>"),
                    request.request_id
                );
            }
            Err(err) => self.log_failure("Starting authentication", err),
        }
        result
    }

    async fn begin_authentication(
        &self,
        username: Option<&str>,
    ) -> Result<AssertionRequest, CeremonyError> {
        // ---
        if let Some(username) = username {
            if !self.stores.credentials.user_exists(username).await? {
                return Err(CeremonyError::UsernameNotRegistered(username.to_string()));
            }
        }

        let options = self
            .verifier
            .begin_assertion(username)
            .await
            .map_err(|e| verification_error(Ceremony::Authentication, e))?;

        let request = AssertionRequest {
            request_id: RequestId::random(),
            username: username.map(str::to_string),
            options,
        };

        self.stores
            .assertion_requests
            .put(request.request_id.clone(), request.clone())
            .await?;

        Ok(request)
    }

    /// Finishes an authentication from the client's JSON payload.
    ///
    /// A signature counter lower than the stored one is logged and counted
    /// but does not fail the ceremony; the stored counter is left as is.
    pub async fn finish_authentication(&self, payload: &[u8]) -> Result<AuthOutcome, CeremonyError> {
        // ---
        tracing::trace!("finish_authentication({} bytes)", payload.len());

        let result = self.complete_authentication(payload).await;
        self.observe_finish(Ceremony::Authentication, &result);
        result
    }

    async fn complete_authentication(&self, payload: &[u8]) -> Result<AuthOutcome, CeremonyError> {
        // ---
        let response: AssertionResponse = codec::decode(Ceremony::Authentication, payload)?;

        let request = self
            .stores
            .assertion_requests
            .take_and_invalidate(&response.request_id)
            .await?
            .ok_or(CeremonyError::NoSuchPendingRequest(Ceremony::Authentication))?;

        let result = self
            .verifier
            .complete_assertion(&request.options, &response)
            .await
            .map_err(|e| verification_error(Ceremony::Authentication, e))?;

        if !result.success {
            return Err(CeremonyError::VerificationFailed {
                ceremony: Ceremony::Authentication,
                reason: "Invalid assertion.".to_string(),
            });
        }

        if let Some(expected) = request.username.as_deref() {
            if expected != result.username {
                tracing::warn!(
                    "Assertion for {} was made with a credential of {}",
                    expected,
                    result.username
                );
                return Err(CeremonyError::VerificationFailed {
                    ceremony: Ceremony::Authentication,
                    reason: "Credential does not belong to the requested user.".to_string(),
                });
            }
        }

        let credential = hex::encode(&result.credential_id);
        match self
            .stores
            .credentials
            .update_signature_count(&result.credential_id, result.signature_count)
            .await
        {
            Ok(()) => {}
            Err(StoreError::CounterRegression { stored, reported }) => {
                self.metrics.record_signature_counter_regression();
                tracing::error!(
                    "Signature counter regression for user '{}' credential {}: stored={}, reported={}",
                    result.username,
                    credential,
                    stored,
                    reported
                );
            }
            Err(err) => {
                tracing::error!(
                    "Failed to update signature count for credential {}: {}",
                    credential,
                    err
                );
            }
        }

        let session_token = self
            .stores
            .sessions
            .create_session(&result.user_handle)
            .await?;
        let registrations = self
            .stores
            .credentials
            .registrations_by_username(&result.username)
            .await?;

        tracing::info!(
            "Authentication completed for user: {} (credential: {})",
            result.username,
            credential
        );

        Ok(AuthOutcome {
            success: true,
            request_id: request.request_id,
            username: result.username,
            registrations,
            session_token,
        })
    }
}
