use crate::domain::{SessionRegistry, SessionToken, StoreError, UserHandle};
use redis::Client;
use std::time::Duration;

/// Session registry backed by Redis.
///
/// Tokens live under `session:<token>` and hold the base64url user handle.
/// Every successful lookup pushes the expiry out by `ttl`, matching the
/// in-memory registry's expire-after-access behaviour.
pub struct RedisSessionRegistry {
    // ---
    client: Client,
    ttl: Duration,
}

impl RedisSessionRegistry {
    // ---
    pub fn new(client: Client, ttl: Duration) -> Self {
        Self { client, ttl }
    }

    fn key(token: &SessionToken) -> String {
        format!("session:{token}")
    }

    async fn lookup(&self, token: &SessionToken) -> Result<Option<UserHandle>, StoreError> {
        // ---
        let mut conn = super::connect(&self.client).await?;

        let stored: Option<String> = redis::cmd("GETEX")
            .arg(Self::key(token))
            .arg("EX")
            .arg(self.ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await
            .map_err(super::backend_error)?;

        stored
            .map(|text| {
                UserHandle::from_base64(&text).map_err(|e| StoreError::Serialization(e.to_string()))
            })
            .transpose()
    }
}

#[async_trait::async_trait]
impl SessionRegistry for RedisSessionRegistry {
    // ---
    async fn create_session(&self, user_handle: &UserHandle) -> Result<SessionToken, StoreError> {
        // ---
        let token = SessionToken::random();
        let mut conn = super::connect(&self.client).await?;

        let reply: Option<String> = redis::cmd("SET")
            .arg(Self::key(&token))
            .arg(user_handle.to_base64())
            .arg("NX")
            .arg("EX")
            .arg(self.ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await
            .map_err(super::backend_error)?;

        if reply.is_none() {
            tracing::error!("Session token collision");
            return Err(StoreError::Collision("session token".to_string()));
        }

        tracing::debug!("Created session for user handle {:?}", user_handle);
        Ok(token)
    }

    async fn is_session_for_user(&self, user_handle: &UserHandle, token: &SessionToken) -> bool {
        // ---
        self.get_session(token)
            .await
            .is_some_and(|owner| &owner == user_handle)
    }

    async fn get_session(&self, token: &SessionToken) -> Option<UserHandle> {
        // ---
        match self.lookup(token).await {
            Ok(owner) => owner,
            Err(e) => {
                // Lookups never fail outward; an unreachable store authorizes nobody.
                tracing::error!("Session lookup failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn registry() -> RedisSessionRegistry {
        // ---
        let url = std::env::var("PASSKEY_REDIS_URL")
            .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        RedisSessionRegistry::new(Client::open(url).unwrap(), Duration::from_secs(60))
    }

    #[tokio::test]
    async fn unreachable_server_authorizes_nobody() {
        // ---
        let client = Client::open("redis://invalid-host:6379").unwrap();
        let sessions = RedisSessionRegistry::new(client, Duration::from_secs(60));
        let handle = UserHandle::random();

        assert!(!sessions.is_session_for_user(&handle, &SessionToken::random()).await);
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn token_is_bound_to_its_user() {
        // ---
        let sessions = registry();
        let oin = UserHandle::random();
        let gloin = UserHandle::random();

        let token = sessions.create_session(&oin).await.unwrap();

        assert!(sessions.is_session_for_user(&oin, &token).await);
        assert!(!sessions.is_session_for_user(&gloin, &token).await);
        assert_eq!(sessions.get_session(&token).await, Some(oin));
    }
}
