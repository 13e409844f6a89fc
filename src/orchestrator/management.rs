use super::CeremonyOrchestrator;
use crate::domain::{CeremonyError, CredentialId, DeregisterOutcome, Removal, SessionToken};

impl CeremonyOrchestrator {
    // ---
    /// Removes one credential of the session's user.
    ///
    /// The credential must belong to the user the session speaks for.
    /// Removing the last credential forgets the user entirely, which the
    /// outcome reports as `account_deleted`.
    pub async fn deregister_credential(
        &self,
        session_token: &SessionToken,
        credential_id: &CredentialId,
    ) -> Result<DeregisterOutcome, CeremonyError> {
        // ---
        tracing::trace!("deregister_credential({:?})", credential_id);

        let result = self.remove_credential(session_token, credential_id).await;
        if let Err(err) = &result {
            self.log_failure("Deregistering credential", err);
        }
        result
    }

    async fn remove_credential(
        &self,
        session_token: &SessionToken,
        credential_id: &CredentialId,
    ) -> Result<DeregisterOutcome, CeremonyError> {
        // ---
        if credential_id.is_empty() {
            return Err(CeremonyError::InvalidInput("Credential ID must not be empty."));
        }

        let username = self.username_for_session(session_token).await?;
        let credentials = &self.stores.credentials;
        let not_registered = || CeremonyError::CredentialNotRegistered(hex::encode(credential_id));

        let registration = credentials
            .registration_by_username_and_credential_id(&username, credential_id)
            .await?
            .ok_or_else(not_registered)?;

        // A concurrent removal of the same credential may win the race.
        let account_deleted = match credentials.remove_registration(&username, &registration).await? {
            Removal::Removed { now_empty } => now_empty,
            Removal::NotFound => return Err(not_registered()),
        };

        tracing::info!(
            "Deregistered credential {} of user {}{}",
            hex::encode(credential_id),
            username,
            if account_deleted { "; account deleted" } else { "" }
        );

        Ok(DeregisterOutcome {
            success: true,
            dropped_registration: registration,
            account_deleted,
        })
    }

    /// Removes every credential of `username`, then runs `on_success`.
    ///
    /// What a successful deletion produces is up to the caller, e.g. tearing
    /// down its own session state.
    pub async fn delete_account<T, F>(&self, username: &str, on_success: F) -> Result<T, CeremonyError>
    where
        F: FnOnce() -> T + Send,
        T: Send,
    {
        // ---
        tracing::trace!("delete_account(username: {:?})", username);

        if username.is_empty() {
            let err = CeremonyError::InvalidInput("Username must not be empty.");
            self.log_failure("Deleting account", &err);
            return Err(err);
        }

        match self.stores.credentials.remove_all_registrations(username).await {
            Ok(true) => {
                tracing::info!("Deleted account {}", username);
                Ok(on_success())
            }
            Ok(false) => {
                let err = CeremonyError::UsernameNotRegistered(username.to_string());
                self.log_failure("Deleting account", &err);
                Err(err)
            }
            Err(err) => {
                let err: CeremonyError = err.into();
                self.log_failure("Deleting account", &err);
                Err(err)
            }
        }
    }
}
