// src/infrastructure/memory/mod.rs
mod cache;
mod challenges;
mod credentials;
mod sessions;

pub use challenges::MemoryChallengeStore;
pub use credentials::MemoryCredentialRegistry;
pub use sessions::MemorySessionRegistry;

use crate::config::CacheConfig;
use crate::domain::{ChallengeStorePtr, CredentialRegistryPtr, PendingRequest, SessionRegistryPtr};
use crate::orchestrator::CeremonyStores;
use std::sync::Arc;

/// Creates an in-memory challenge store for one ceremony kind.
pub fn create_challenge_store<V: PendingRequest>(config: &CacheConfig) -> ChallengeStorePtr<V> {
    // ---
    Arc::new(MemoryChallengeStore::new(
        config.challenge_capacity,
        config.challenge_ttl,
    ))
}

/// Creates an in-memory session registry.
pub fn create_session_registry(config: &CacheConfig) -> SessionRegistryPtr {
    // ---
    Arc::new(MemorySessionRegistry::new(
        config.session_capacity,
        config.session_ttl,
    ))
}

/// Creates an empty in-memory credential registry.
pub fn create_credential_registry() -> CredentialRegistryPtr {
    // ---
    Arc::new(MemoryCredentialRegistry::new())
}

/// Creates the full set of process-local stores the orchestrator needs.
///
/// All state lives for the lifetime of the process and is lost on restart.
pub fn create_stores(config: &CacheConfig) -> CeremonyStores {
    // ---
    tracing::info!("Initializing in-memory ceremony stores");

    CeremonyStores {
        registration_requests: create_challenge_store(config),
        assertion_requests: create_challenge_store(config),
        sessions: create_session_registry(config),
        credentials: create_credential_registry(),
    }
}
