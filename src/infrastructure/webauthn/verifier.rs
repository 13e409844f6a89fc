//! Verification engine backed by `webauthn-rs` passkey ceremonies.
//!
//! Ceremony state produced by `webauthn-rs` is serialized into the pending
//! request, so the engine itself keeps nothing between start and finish.
//! The serialized [`Passkey`] is what gets stored as the credential's
//! public key.
//!
//! Without a username the discoverable flow is used: the authenticator
//! names the user handle, and the credential id it presents selects the
//! stored registration.

use crate::domain::{
    AssertionOptions, AssertionResponse, AssertionResult, AuthenticatorSelection,
    AuthenticatorTransport, CredentialId, CredentialRegistration, CredentialRegistryPtr,
    RegistrationOptions,
    RegistrationResponse, RegistrationResult, ResidentKeyRequirement, UserIdentity,
    VerificationError, Verifier,
};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use webauthn_rs::prelude::{
    AuthenticationResult, DiscoverableAuthentication, DiscoverableKey, Passkey,
    PasskeyAuthentication, PasskeyRegistration, PublicKeyCredential, RegisterPublicKeyCredential,
    Uuid,
};
use webauthn_rs::Webauthn;

pub struct WebauthnVerifier {
    // ---
    webauthn: Arc<Webauthn>,
    credentials: CredentialRegistryPtr,
}

impl WebauthnVerifier {
    // ---
    pub fn new(webauthn: Arc<Webauthn>, credentials: CredentialRegistryPtr) -> Self {
        Self {
            webauthn,
            credentials,
        }
    }

    /// Loads the stored passkeys of a user.
    ///
    /// Credentials that no longer deserialize are skipped and logged.
    async fn passkeys_for(&self, username: &str) -> Result<Vec<Passkey>, VerificationError> {
        // ---
        let registrations = self
            .credentials
            .registrations_by_username(username)
            .await
            .map_err(|e| VerificationError::Engine(e.to_string()))?;

        Ok(registrations
            .iter()
            .filter_map(|reg| {
                serde_json::from_slice::<Passkey>(&reg.credential.public_key)
                    .map_err(|e| {
                        tracing::error!(
                            "Failed to deserialize passkey for credential {}: {:?}",
                            hex::encode(reg.credential_id()),
                            e
                        );
                    })
                    .ok()
            })
            .collect())
    }

    /// Resolves the registration an assertion was made with.
    ///
    /// `username` pins the owner; without it the credential id alone decides.
    async fn registration_for(
        &self,
        username: Option<&str>,
        credential_id: &CredentialId,
    ) -> Result<CredentialRegistration, VerificationError> {
        // ---
        let found = match username {
            Some(username) => {
                self.credentials
                    .registration_by_username_and_credential_id(username, credential_id)
                    .await
            }
            None => self.credentials.registration_by_credential_id(credential_id).await,
        };

        found.map_err(engine_error)?.ok_or_else(|| {
            VerificationError::Rejected(format!(
                "credential {} is not registered{}",
                hex::encode(credential_id),
                username.map(|name| format!(" to {name}")).unwrap_or_default()
            ))
        })
    }

    fn finish_named(
        &self,
        username: &str,
        credential: &PublicKeyCredential,
        state: &Value,
    ) -> Result<AuthenticationResult, VerificationError> {
        // ---
        let auth_state: PasskeyAuthentication =
            serde_json::from_value(state.clone()).map_err(engine_error)?;

        self.webauthn
            .finish_passkey_authentication(credential, &auth_state)
            .map_err(|e| {
                tracing::warn!("Authentication verification failed for '{}': {:?}", username, e);
                VerificationError::Rejected(e.to_string())
            })
    }

    async fn finish_discoverable(
        &self,
        credential: &PublicKeyCredential,
        state: &Value,
    ) -> Result<AuthenticationResult, VerificationError> {
        // ---
        let auth_state: DiscoverableAuthentication =
            serde_json::from_value(state.clone()).map_err(engine_error)?;

        let (user_id, raw_id) = self
            .webauthn
            .identify_discoverable_authentication(credential)
            .map_err(|e| VerificationError::Rejected(e.to_string()))?;

        let registration = self
            .registration_for(None, &CredentialId::new(raw_id.to_vec()))
            .await?;
        if user_uuid(&registration.user)? != user_id {
            return Err(VerificationError::Rejected(
                "user handle does not own the presented credential".to_string(),
            ));
        }

        let keys: Vec<DiscoverableKey> = self
            .passkeys_for(&registration.user.name)
            .await?
            .iter()
            .map(DiscoverableKey::from)
            .collect();

        self.webauthn
            .finish_discoverable_authentication(credential, auth_state, &keys)
            .map_err(|e| {
                tracing::warn!(
                    "Discoverable authentication failed for '{}': {:?}",
                    registration.user.name,
                    e
                );
                VerificationError::Rejected(e.to_string())
            })
    }
}

/// Derives the `webauthn-rs` user id from the first 16 bytes of a user handle.
fn user_uuid(user: &UserIdentity) -> Result<Uuid, VerificationError> {
    // ---
    user.id
        .as_bytes()
        .get(..16)
        .and_then(|bytes| Uuid::from_slice(bytes).ok())
        .ok_or_else(|| engine_error("user handle shorter than 16 bytes"))
}

/// Writes the resident-key requirement into client creation options.
fn apply_resident_key(public_key: &mut Value, requirement: ResidentKeyRequirement) {
    // ---
    let Some(options) = public_key
        .get_mut("publicKey")
        .and_then(Value::as_object_mut)
    else {
        return;
    };

    let selection = options
        .entry("authenticatorSelection")
        .or_insert_with(|| Value::Object(Default::default()));

    if let Some(selection) = selection.as_object_mut() {
        selection.insert(
            "residentKey".to_string(),
            Value::String(requirement.as_str().to_string()),
        );
        selection.insert(
            "requireResidentKey".to_string(),
            Value::Bool(requirement == ResidentKeyRequirement::Required),
        );
    }
}

/// Reads transport hints from a client attestation response.
fn transports_of(credential: &Value) -> BTreeSet<AuthenticatorTransport> {
    // ---
    credential
        .pointer("/response/transports")
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .filter_map(AuthenticatorTransport::from_wire)
                .collect()
        })
        .unwrap_or_default()
}

fn engine_error(e: impl std::fmt::Display) -> VerificationError {
    VerificationError::Engine(e.to_string())
}

#[async_trait::async_trait]
impl Verifier for WebauthnVerifier {
    // ---
    async fn begin_registration(
        &self,
        user: &UserIdentity,
        selection: &AuthenticatorSelection,
    ) -> Result<RegistrationOptions, VerificationError> {
        // ---
        let exclude: Vec<_> = self
            .passkeys_for(&user.name)
            .await?
            .iter()
            .map(|passkey| passkey.cred_id().clone())
            .collect();
        let exclude = (!exclude.is_empty()).then_some(exclude);

        let (challenge, registration_state) = self
            .webauthn
            .start_passkey_registration(user_uuid(user)?, &user.name, &user.display_name, exclude)
            .map_err(|e| {
                tracing::error!("Failed to start registration: {}", e);
                engine_error(e)
            })?;

        let mut public_key = serde_json::to_value(&challenge).map_err(engine_error)?;
        apply_resident_key(&mut public_key, selection.resident_key);

        Ok(RegistrationOptions {
            user: user.clone(),
            selection: *selection,
            public_key,
            state: serde_json::to_value(&registration_state).map_err(engine_error)?,
        })
    }

    async fn complete_registration(
        &self,
        options: &RegistrationOptions,
        response: &RegistrationResponse,
    ) -> Result<RegistrationResult, VerificationError> {
        // ---
        let credential: RegisterPublicKeyCredential =
            serde_json::from_value(response.credential.clone())
                .map_err(|e| VerificationError::Malformed(e.to_string()))?;
        let registration_state: PasskeyRegistration =
            serde_json::from_value(options.state.clone()).map_err(engine_error)?;

        let passkey = self
            .webauthn
            .finish_passkey_registration(&credential, &registration_state)
            .map_err(|e| {
                tracing::warn!("Credential verification failed: {}", e);
                VerificationError::Rejected(e.to_string())
            })?;

        Ok(RegistrationResult {
            credential_id: CredentialId::new(passkey.cred_id().to_vec()),
            public_key: serde_json::to_vec(&passkey).map_err(engine_error)?,
            signature_count: 0,
            transports: transports_of(&response.credential),
            attestation_trusted: false,
            attestation_certificate: None,
        })
    }

    async fn begin_assertion(
        &self,
        username: Option<&str>,
    ) -> Result<AssertionOptions, VerificationError> {
        // ---
        let Some(username) = username else {
            let (challenge, auth_state) =
                self.webauthn.start_discoverable_authentication().map_err(|e| {
                    tracing::error!("Failed to generate discoverable challenge: {:?}", e);
                    engine_error(e)
                })?;

            return Ok(AssertionOptions {
                username: None,
                public_key: serde_json::to_value(&challenge).map_err(engine_error)?,
                state: serde_json::to_value(&auth_state).map_err(engine_error)?,
            });
        };

        let passkeys = self.passkeys_for(username).await?;
        if passkeys.is_empty() {
            return Err(VerificationError::Rejected(format!(
                "no usable credentials for {username}"
            )));
        }

        let (challenge, auth_state) = self
            .webauthn
            .start_passkey_authentication(&passkeys)
            .map_err(|e| {
                tracing::error!("Failed to generate auth challenge: {:?}", e);
                engine_error(e)
            })?;

        Ok(AssertionOptions {
            username: Some(username.to_string()),
            public_key: serde_json::to_value(&challenge).map_err(engine_error)?,
            state: serde_json::to_value(&auth_state).map_err(engine_error)?,
        })
    }

    async fn complete_assertion(
        &self,
        options: &AssertionOptions,
        response: &AssertionResponse,
    ) -> Result<AssertionResult, VerificationError> {
        // ---
        let credential: PublicKeyCredential = serde_json::from_value(response.credential.clone())
            .map_err(|e| VerificationError::Malformed(e.to_string()))?;

        let username = options.username.as_deref();
        let result = match username {
            Some(username) => self.finish_named(username, &credential, &options.state)?,
            None => self.finish_discoverable(&credential, &options.state).await?,
        };

        let credential_id = CredentialId::new(result.cred_id().to_vec());
        let registration = self.registration_for(username, &credential_id).await?;

        Ok(AssertionResult {
            credential_id,
            user_handle: registration.user.id.clone(),
            username: registration.user.name.clone(),
            signature_count: result.counter(),
            success: result.user_verified(),
        })
    }
}
