use super::errors::StoreError;
use super::ids::{CredentialId, RequestId, SessionToken, UserHandle};
use super::models::CredentialRegistration;
use super::requests::PendingRequest;
use std::sync::Arc;

/// Bounded, expiring storage for in-flight ceremony requests.
#[async_trait::async_trait]
pub trait ChallengeStore<V: PendingRequest>: Send + Sync {
    // ---
    /// Stores a request under a freshly generated id.
    ///
    /// Ids never collide in practice; an existing live entry is reported as
    /// [`StoreError::Collision`] and left untouched.
    async fn put(&self, id: RequestId, request: V) -> Result<(), StoreError>;

    /// Retrieves and removes the request in one atomic step.
    ///
    /// Of any number of concurrent callers for the same id, at most one
    /// observes the value; all others get `None`.
    async fn take_and_invalidate(&self, id: &RequestId) -> Result<Option<V>, StoreError>;
}

/// Type alias for any backend that implements ChallengeStore.
pub type ChallengeStorePtr<V> = Arc<dyn ChallengeStore<V>>;

/// Opaque session tokens bound to user handles.
#[async_trait::async_trait]
pub trait SessionRegistry: Send + Sync {
    // ---
    /// Mints a new token for the user. A user may hold many live tokens.
    async fn create_session(&self, user_handle: &UserHandle) -> Result<SessionToken, StoreError>;

    /// True iff `token` is live and bound to exactly `user_handle`.
    async fn is_session_for_user(&self, user_handle: &UserHandle, token: &SessionToken) -> bool;

    /// Resolves a live token to its user handle.
    async fn get_session(&self, token: &SessionToken) -> Option<UserHandle>;
}

/// Type alias for any backend that implements SessionRegistry.
pub type SessionRegistryPtr = Arc<dyn SessionRegistry>;

/// What a single-credential removal did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The credential was not registered to that username.
    NotFound,

    /// The credential was removed; `now_empty` if it was the user's last.
    Removed { now_empty: bool },
}

/// Username ↔ user handle ↔ credentials mapping.
///
/// Mutations for the same username are serialized by the implementation.
#[async_trait::async_trait]
pub trait CredentialRegistry: Send + Sync {
    // ---
    /// All registrations of the user; empty for an unknown username.
    async fn registrations_by_username(
        &self,
        username: &str,
    ) -> Result<Vec<CredentialRegistration>, StoreError>;

    async fn user_exists(&self, username: &str) -> Result<bool, StoreError>;

    async fn username_for_user_handle(
        &self,
        user_handle: &UserHandle,
    ) -> Result<Option<String>, StoreError>;

    async fn user_handle_for_username(&self, username: &str)
        -> Result<Option<UserHandle>, StoreError>;

    async fn registration_by_username_and_credential_id(
        &self,
        username: &str,
        credential_id: &CredentialId,
    ) -> Result<Option<CredentialRegistration>, StoreError>;

    async fn registration_by_credential_id(
        &self,
        credential_id: &CredentialId,
    ) -> Result<Option<CredentialRegistration>, StoreError>;

    /// Appends a credential. The first credential of a new username binds
    /// the username to the registration's user handle; later credentials
    /// must carry the same handle.
    async fn add_registration(
        &self,
        username: &str,
        registration: CredentialRegistration,
    ) -> Result<(), StoreError>;

    /// Removes exactly that credential. Removing the last one forgets the
    /// username.
    ///
    /// Emptiness is observed in the same critical section as the removal, so
    /// of several concurrent removals only the one that emptied the set
    /// reports `now_empty`.
    async fn remove_registration(
        &self,
        username: &str,
        registration: &CredentialRegistration,
    ) -> Result<Removal, StoreError>;

    /// Removes every credential of the username; false if it was unknown.
    async fn remove_all_registrations(&self, username: &str) -> Result<bool, StoreError>;

    /// Raises the stored counter. A lower value is rejected with
    /// [`StoreError::CounterRegression`] and leaves the stored value as is.
    async fn update_signature_count(
        &self,
        credential_id: &CredentialId,
        signature_count: u32,
    ) -> Result<(), StoreError>;
}

/// Type alias for any backend that implements CredentialRegistry.
pub type CredentialRegistryPtr = Arc<dyn CredentialRegistry>;
