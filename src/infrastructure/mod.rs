pub mod memory;
mod metadata;
pub mod metrics;
pub mod redis;
mod webauthn;

// Re-export the factory functions for easy access
pub use self::metadata::create_null_metadata;
pub use self::metrics::{create_noop_metrics, create_prom_metrics};
pub use self::webauthn::{create_verifier, create_webauthn};
