use super::cache::ExpiringCache;
use crate::domain::{SessionRegistry, SessionToken, StoreError, UserHandle};
use std::time::Duration;

/// Process-local session registry.
///
/// Tokens share the challenge cache's retention model: they stay valid while
/// they keep being used within `ttl`, and the oldest fall out once more than
/// `capacity` are live.
pub struct MemorySessionRegistry {
    // ---
    sessions: ExpiringCache<SessionToken, UserHandle>,
}

impl MemorySessionRegistry {
    // ---
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        // ---
        Self {
            sessions: ExpiringCache::new(capacity, ttl),
        }
    }
}

#[async_trait::async_trait]
impl SessionRegistry for MemorySessionRegistry {
    // ---
    async fn create_session(&self, user_handle: &UserHandle) -> Result<SessionToken, StoreError> {
        // ---
        let token = SessionToken::random();
        if !self.sessions.insert_new(token.clone(), user_handle.clone()) {
            tracing::error!("Session token collision");
            return Err(StoreError::Collision("session token".to_string()));
        }

        tracing::debug!("Created session for user handle {:?}", user_handle);
        Ok(token)
    }

    async fn is_session_for_user(&self, user_handle: &UserHandle, token: &SessionToken) -> bool {
        // ---
        self.sessions
            .get(token)
            .is_some_and(|owner| &owner == user_handle)
    }

    async fn get_session(&self, token: &SessionToken) -> Option<UserHandle> {
        // ---
        self.sessions.get(token)
    }
}
