use crate::domain::{ChallengeStore, PendingRequest, RequestId, StoreError};
use redis::{AsyncCommands, Client};
use std::marker::PhantomData;
use std::time::Duration;

/// Challenge store backed by Redis.
///
/// Requests are stored as JSON under `webauthn:<ceremony>:<request id>` with
/// a TTL. Consumption uses `GETDEL`, so concurrent finishes for the same id
/// see the value at most once even across processes. Unlike the in-memory
/// store, the TTL runs from creation and size is bounded only by the
/// server's eviction policy.
pub struct RedisChallengeStore<V> {
    // ---
    client: Client,
    ttl: Duration,
    _request: PhantomData<fn() -> V>,
}

impl<V: PendingRequest> RedisChallengeStore<V> {
    // ---
    pub fn new(client: Client, ttl: Duration) -> Self {
        // ---
        Self {
            client,
            ttl,
            _request: PhantomData,
        }
    }

    fn key(id: &RequestId) -> String {
        format!("webauthn:{}:{}", V::CEREMONY.key_prefix(), id)
    }
}

#[async_trait::async_trait]
impl<V: PendingRequest> ChallengeStore<V> for RedisChallengeStore<V> {
    // ---
    async fn put(&self, id: RequestId, request: V) -> Result<(), StoreError> {
        // ---
        let payload = serde_json::to_vec(&request).map_err(|e| {
            tracing::error!("Failed to serialize {} request: {}", V::CEREMONY, e);
            StoreError::Serialization(e.to_string())
        })?;

        let mut conn = super::connect(&self.client).await?;

        // SET NX replies nil when the key is already present.
        let reply: Option<String> = redis::cmd("SET")
            .arg(Self::key(&id))
            .arg(payload)
            .arg("NX")
            .arg("EX")
            .arg(self.ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await
            .map_err(super::backend_error)?;

        match reply {
            Some(_) => Ok(()),
            None => {
                tracing::error!("Request id collision in {} store: {:?}", V::CEREMONY, id);
                Err(StoreError::Collision(id.to_string()))
            }
        }
    }

    async fn take_and_invalidate(&self, id: &RequestId) -> Result<Option<V>, StoreError> {
        // ---
        let mut conn = super::connect(&self.client).await?;

        let bytes: Option<Vec<u8>> = conn
            .get_del(Self::key(id))
            .await
            .map_err(super::backend_error)?;

        bytes
            .map(|bytes| {
                serde_json::from_slice(&bytes).map_err(|e| {
                    tracing::error!("Failed to deserialize {} request: {}", V::CEREMONY, e);
                    StoreError::Serialization(e.to_string())
                })
            })
            .transpose()
    }
}
