// src/infrastructure/redis/mod.rs
mod challenges;
mod sessions;

pub use challenges::RedisChallengeStore;
pub use sessions::RedisSessionRegistry;

use crate::config::CacheConfig;
use crate::domain::StoreError;
use crate::orchestrator::CeremonyStores;
use redis::aio::MultiplexedConnection;
use redis::Client;
use std::sync::Arc;

/// Opens a multiplexed connection, mapping failures into the store taxonomy.
async fn connect(client: &Client) -> Result<MultiplexedConnection, StoreError> {
    // ---
    client
        .get_multiplexed_async_connection()
        .await
        .map_err(|err| {
            tracing::error!("Failed to connect to Redis: {:?}", err);
            backend_error(err)
        })
}

fn backend_error(err: redis::RedisError) -> StoreError {
    StoreError::Backend(err.to_string())
}

/// Creates ceremony stores with challenges and sessions held in Redis.
///
/// Credentials stay in process memory; only the short-lived state is shared.
///
/// # Errors
/// Returns an error if the Redis URL cannot be parsed. No connection is
/// attempted until the first store operation.
pub fn create_stores(url: &str, config: &CacheConfig) -> anyhow::Result<CeremonyStores> {
    // ---
    tracing::info!("Initializing Redis-backed challenge and session stores");

    let client = Client::open(url)?;

    Ok(CeremonyStores {
        registration_requests: Arc::new(RedisChallengeStore::new(
            client.clone(),
            config.challenge_ttl,
        )),
        assertion_requests: Arc::new(RedisChallengeStore::new(
            client.clone(),
            config.challenge_ttl,
        )),
        sessions: Arc::new(RedisSessionRegistry::new(client, config.session_ttl)),
        credentials: super::memory::create_credential_registry(),
    })
}
