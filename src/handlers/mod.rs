// Gateway module - controls public API for handlers
// Modules are private, only exported symbols are public

mod authenticate;
mod credentials;
mod error;
mod health;
mod metrics;
mod register;
mod root;

// Core handlers
pub use health::health_check;
pub use metrics::metrics_handler;
pub use root::root_handler;

// WebAuthn registration handlers
pub use register::{register_finish, register_start};

// WebAuthn authentication handlers
pub use authenticate::{auth_finish, auth_start};

// WebAuthn credential management handlers
pub use credentials::{delete_account, deregister_credential};
