use super::cache::ExpiringCache;
use crate::domain::{ChallengeStore, PendingRequest, RequestId, StoreError};
use std::time::Duration;

/// Process-local challenge store with bounded size and access-based expiry.
pub struct MemoryChallengeStore<V> {
    // ---
    cache: ExpiringCache<RequestId, V>,
}

impl<V: PendingRequest> MemoryChallengeStore<V> {
    // ---
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        // ---
        tracing::debug!(
            "Creating in-memory {} store (capacity {}, ttl {:?})",
            V::CEREMONY,
            capacity,
            ttl
        );
        Self {
            cache: ExpiringCache::new(capacity, ttl),
        }
    }
}

#[async_trait::async_trait]
impl<V: PendingRequest> ChallengeStore<V> for MemoryChallengeStore<V> {
    // ---
    async fn put(&self, id: RequestId, request: V) -> Result<(), StoreError> {
        // ---
        if self.cache.insert_new(id.clone(), request) {
            Ok(())
        } else {
            tracing::error!("Request id collision in {} store: {:?}", V::CEREMONY, id);
            Err(StoreError::Collision(id.to_string()))
        }
    }

    async fn take_and_invalidate(&self, id: &RequestId) -> Result<Option<V>, StoreError> {
        // ---
        Ok(self.cache.take(id))
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::domain::{AssertionOptions, AssertionRequest};
    use serde_json::json;

    fn request() -> AssertionRequest {
        // ---
        AssertionRequest {
            request_id: RequestId::random(),
            username: Some("dwalin".to_string()),
            options: AssertionOptions {
                username: Some("dwalin".to_string()),
                public_key: json!({ "challenge": "abc" }),
                state: json!({}),
            },
        }
    }

    #[tokio::test]
    async fn take_invalidates_request() {
        // ---
        let store = MemoryChallengeStore::new(10, Duration::from_secs(60));
        let req = request();

        store.put(req.request_id.clone(), req.clone()).await.unwrap();

        let taken = store.take_and_invalidate(&req.request_id).await.unwrap();
        assert_eq!(taken, Some(req.clone()));
        assert_eq!(store.take_and_invalidate(&req.request_id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_id_is_a_collision() {
        // ---
        let store = MemoryChallengeStore::new(10, Duration::from_secs(60));
        let req = request();

        store.put(req.request_id.clone(), req.clone()).await.unwrap();
        let err = store.put(req.request_id.clone(), req).await.unwrap_err();

        assert!(matches!(err, StoreError::Collision(_)));
    }

    #[tokio::test]
    async fn unknown_id_is_absent_not_an_error() {
        // ---
        let store: MemoryChallengeStore<AssertionRequest> =
            MemoryChallengeStore::new(10, Duration::from_secs(60));

        let taken = store.take_and_invalidate(&RequestId::random()).await.unwrap();
        assert!(taken.is_none());
    }
}
