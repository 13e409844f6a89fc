use super::{codec, verification_error, CeremonyOrchestrator};
use crate::domain::{
    AttestationCertInfo, AuthenticatorSelection, Ceremony, CeremonyError, CredentialRegistration,
    RegisteredCredential, RegistrationOutcome, RegistrationRequest, RegistrationResponse,
    RequestId, ResidentKeyRequirement, SessionToken, StoreError, UserIdentity,
};
use chrono::Utc;

impl CeremonyOrchestrator {
    // ---
    /// Starts registering a credential under `username`.
    ///
    /// A new username is open to anyone. Adding a credential to an existing
    /// username requires `session_token` to be a live session of that
    /// user; the existing identity and user handle are reused.
    ///
    /// The returned request carries a fresh session token for the user
    /// handle, which proves identity once the ceremony finishes.
    pub async fn start_registration(
        &self,
        username: &str,
        display_name: &str,
        nickname: Option<String>,
        resident_key: ResidentKeyRequirement,
        session_token: Option<&SessionToken>,
    ) -> Result<RegistrationRequest, CeremonyError> {
        // ---
        tracing::trace!(
            "start_registration(username: {:?}, resident_key: {})",
            username,
            resident_key
        );

        let result = self
            .begin_registration(username, display_name, nickname, resident_key, session_token)
            .await;

        match &result {
            Ok(request) => {
                self.metrics.record_ceremony_started(Ceremony::Registration);
                tracing::info!(
                    "Registration started for user: {} (request {:?})",
                    username,
                    request.request_id
                );
            }
            Err(err) => self.log_failure("Starting registration", err),
        }
        result
    }

    async fn begin_registration(
        &self,
        username: &str,
        display_name: &str,
        nickname: Option<String>,
        resident_key: ResidentKeyRequirement,
        session_token: Option<&SessionToken>,
    ) -> Result<RegistrationRequest, CeremonyError> {
        // ---
        if username.is_empty() {
            return Err(CeremonyError::InvalidInput("Username must not be empty."));
        }

        let existing = self
            .stores
            .credentials
            .registrations_by_username(username)
            .await?
            .into_iter()
            .next()
            .map(|registration| registration.user);

        let user = match existing {
            Some(user) => {
                if !self.holds_session(&user, session_token).await {
                    return Err(CeremonyError::UsernameAlreadyRegistered(
                        username.to_string(),
                    ));
                }
                user
            }
            None => {
                let display_name = if display_name.is_empty() {
                    username
                } else {
                    display_name
                };
                UserIdentity::new(username, display_name)
            }
        };

        let options = self
            .verifier
            .begin_registration(&user, &AuthenticatorSelection::new(resident_key))
            .await
            .map_err(|e| verification_error(Ceremony::Registration, e))?;

        let session_token = self.stores.sessions.create_session(&user.id).await?;

        let request = RegistrationRequest {
            request_id: RequestId::random(),
            username: username.to_string(),
            nickname,
            options,
            session_token: Some(session_token),
        };

        self.stores
            .registration_requests
            .put(request.request_id.clone(), request.clone())
            .await?;

        Ok(request)
    }

    /// Finishes a registration from the client's JSON payload.
    ///
    /// The pending request is consumed before verification, so a payload can
    /// complete at most once whether or not it verifies.
    pub async fn finish_registration(
        &self,
        payload: &[u8],
    ) -> Result<RegistrationOutcome, CeremonyError> {
        // ---
        tracing::trace!("finish_registration({} bytes)", payload.len());

        let result = self.complete_registration(payload).await;
        self.observe_finish(Ceremony::Registration, &result);
        result
    }

    async fn complete_registration(
        &self,
        payload: &[u8],
    ) -> Result<RegistrationOutcome, CeremonyError> {
        // ---
        let response: RegistrationResponse = codec::decode(Ceremony::Registration, payload)?;

        let request = self
            .stores
            .registration_requests
            .take_and_invalidate(&response.request_id)
            .await?
            .ok_or(CeremonyError::NoSuchPendingRequest(Ceremony::Registration))?;

        let result = self
            .verifier
            .complete_registration(&request.options, &response)
            .await
            .map_err(|e| verification_error(Ceremony::Registration, e))?;

        let user = request.options.user.clone();
        let username = request.username.clone();

        // Ownership of an existing username is re-checked at commit time.
        if self.stores.credentials.user_exists(&username).await?
            && !self
                .holds_session(&user, request.session_token.as_ref())
                .await
        {
            tracing::warn!("Registration for existing user {} lacks a valid session", username);
            return Err(CeremonyError::PermissionDenied(format!(
                "User {username} already exists"
            )));
        }

        let attestation_metadata = self.metadata.find_entries(&result).into_iter().next();
        let attestation_cert = result
            .attestation_certificate
            .clone()
            .map(AttestationCertInfo::new);

        let registration = CredentialRegistration {
            user: user.clone(),
            nickname: request.nickname.clone(),
            transports: result.transports.clone(),
            registered_at: Utc::now(),
            credential: RegisteredCredential {
                credential_id: result.credential_id.clone(),
                user_handle: user.id.clone(),
                public_key: result.public_key.clone(),
                signature_count: result.signature_count,
            },
            attestation_metadata,
        };

        self.stores
            .credentials
            .add_registration(&username, registration.clone())
            .await
            .map_err(|err| match err {
                // A concurrent first registration claimed the username.
                StoreError::UserHandleMismatch(name) => {
                    CeremonyError::UsernameAlreadyRegistered(name)
                }
                StoreError::DuplicateCredential(id) => CeremonyError::VerificationFailed {
                    ceremony: Ceremony::Registration,
                    reason: format!("Credential {id} is already registered."),
                },
                other => other.into(),
            })?;

        let session_token = self.stores.sessions.create_session(&user.id).await?;

        tracing::info!(
            "Registration completed for user: {} (credential: {})",
            username,
            hex::encode(&result.credential_id)
        );

        Ok(RegistrationOutcome {
            success: true,
            request_id: request.request_id,
            username,
            registration,
            attestation_trusted: result.attestation_trusted,
            attestation_cert,
            session_token,
        })
    }

    /// True iff `token` is a live session of `user`.
    async fn holds_session(&self, user: &UserIdentity, token: Option<&SessionToken>) -> bool {
        // ---
        match token {
            Some(token) => self.stores.sessions.is_session_for_user(&user.id, token).await,
            None => false,
        }
    }
}
