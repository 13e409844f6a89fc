//! Process-local credential registry.
//!
//! `users` is the source of truth; `handles` and `credentials` are indexes
//! into it. Writers lock the user's entry first and update the indexes while
//! holding it, so mutations for one username are serialized while other
//! usernames proceed independently. Readers never hold an index guard while
//! touching `users`.

use crate::domain::{
    CredentialId, CredentialRegistration, CredentialRegistry, Removal, StoreError, UserHandle,
    UserIdentity,
};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

struct UserRecord {
    user: UserIdentity,
    registrations: Vec<CredentialRegistration>,
}

#[derive(Default)]
pub struct MemoryCredentialRegistry {
    // ---
    users: DashMap<String, UserRecord>,
    handles: DashMap<UserHandle, String>,
    credentials: DashMap<CredentialId, String>,
}

impl MemoryCredentialRegistry {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a credential id for `username`; ids are unique across users.
    fn claim_credential(&self, credential_id: &CredentialId, username: &str) -> Result<(), StoreError> {
        // ---
        match self.credentials.entry(credential_id.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateCredential(hex::encode(credential_id))),
            Entry::Vacant(vacant) => {
                vacant.insert(username.to_string());
                Ok(())
            }
        }
    }

    fn owner_of(&self, credential_id: &CredentialId) -> Option<String> {
        self.credentials.get(credential_id).map(|entry| entry.value().clone())
    }
}

#[async_trait::async_trait]
impl CredentialRegistry for MemoryCredentialRegistry {
    // ---
    async fn registrations_by_username(
        &self,
        username: &str,
    ) -> Result<Vec<CredentialRegistration>, StoreError> {
        // ---
        Ok(self
            .users
            .get(username)
            .map(|record| record.registrations.clone())
            .unwrap_or_default())
    }

    async fn user_exists(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self.users.contains_key(username))
    }

    async fn username_for_user_handle(
        &self,
        user_handle: &UserHandle,
    ) -> Result<Option<String>, StoreError> {
        // ---
        Ok(self.handles.get(user_handle).map(|entry| entry.value().clone()))
    }

    async fn user_handle_for_username(
        &self,
        username: &str,
    ) -> Result<Option<UserHandle>, StoreError> {
        // ---
        Ok(self.users.get(username).map(|record| record.user.id.clone()))
    }

    async fn registration_by_username_and_credential_id(
        &self,
        username: &str,
        credential_id: &CredentialId,
    ) -> Result<Option<CredentialRegistration>, StoreError> {
        // ---
        Ok(self.users.get(username).and_then(|record| {
            record
                .registrations
                .iter()
                .find(|reg| reg.credential_id() == credential_id)
                .cloned()
        }))
    }

    async fn registration_by_credential_id(
        &self,
        credential_id: &CredentialId,
    ) -> Result<Option<CredentialRegistration>, StoreError> {
        // ---
        match self.owner_of(credential_id) {
            Some(username) => {
                self.registration_by_username_and_credential_id(&username, credential_id)
                    .await
            }
            None => Ok(None),
        }
    }

    async fn add_registration(
        &self,
        username: &str,
        registration: CredentialRegistration,
    ) -> Result<(), StoreError> {
        // ---
        let credential_id = registration.credential_id().clone();

        match self.users.entry(username.to_string()) {
            Entry::Occupied(mut occupied) => {
                let record = occupied.get_mut();
                if record.user.id != registration.user.id {
                    return Err(StoreError::UserHandleMismatch(username.to_string()));
                }
                self.claim_credential(&credential_id, username)?;
                record.registrations.push(registration);
            }
            Entry::Vacant(vacant) => {
                self.claim_credential(&credential_id, username)?;
                self.handles
                    .insert(registration.user.id.clone(), username.to_string());
                vacant.insert(UserRecord {
                    user: registration.user.clone(),
                    registrations: vec![registration],
                });
            }
        }

        tracing::debug!(
            "Added credential {} for user {}",
            hex::encode(&credential_id),
            username
        );
        Ok(())
    }

    async fn remove_registration(
        &self,
        username: &str,
        registration: &CredentialRegistration,
    ) -> Result<Removal, StoreError> {
        // ---
        let Entry::Occupied(mut occupied) = self.users.entry(username.to_string()) else {
            return Ok(Removal::NotFound);
        };

        let credential_id = registration.credential_id();
        let record = occupied.get_mut();
        let before = record.registrations.len();
        record
            .registrations
            .retain(|reg| reg.credential_id() != credential_id);

        if record.registrations.len() == before {
            return Ok(Removal::NotFound);
        }
        self.credentials.remove(credential_id);

        let now_empty = record.registrations.is_empty();
        if now_empty {
            self.handles.remove(&record.user.id);
            occupied.remove();
            tracing::debug!("Last credential removed; user {} forgotten", username);
        }

        Ok(Removal::Removed { now_empty })
    }

    async fn remove_all_registrations(&self, username: &str) -> Result<bool, StoreError> {
        // ---
        let Entry::Occupied(occupied) = self.users.entry(username.to_string()) else {
            return Ok(false);
        };

        let record = occupied.get();
        for reg in &record.registrations {
            self.credentials.remove(reg.credential_id());
        }
        self.handles.remove(&record.user.id);
        occupied.remove();

        tracing::debug!("Removed all credentials for user {}", username);
        Ok(true)
    }

    async fn update_signature_count(
        &self,
        credential_id: &CredentialId,
        signature_count: u32,
    ) -> Result<(), StoreError> {
        // ---
        let unknown = || StoreError::UnknownCredential(hex::encode(credential_id));

        let username = self.owner_of(credential_id).ok_or_else(unknown)?;
        let mut record = self.users.get_mut(&username).ok_or_else(unknown)?;
        let credential = record
            .registrations
            .iter_mut()
            .find(|reg| reg.credential_id() == credential_id)
            .map(|reg| &mut reg.credential)
            .ok_or_else(unknown)?;

        if signature_count < credential.signature_count {
            return Err(StoreError::CounterRegression {
                stored: credential.signature_count,
                reported: signature_count,
            });
        }

        credential.signature_count = signature_count;
        Ok(())
    }
}
