//! Error taxonomy of the ceremony layer.
//!
//! Every orchestrator operation returns [`CeremonyError`]. Store and engine
//! failures are translated into it at the orchestrator boundary.

use super::requests::Ceremony;

/// Errors returned by the public ceremony operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CeremonyError {
    /// The client payload could not be decoded.
    #[error("failed to decode {ceremony} response: {reason}")]
    Decode { ceremony: Ceremony, reason: String },

    /// Unknown, expired, evicted, or already consumed request id.
    #[error("no such {0} in progress")]
    NoSuchPendingRequest(Ceremony),

    /// The username exists and the caller did not prove ownership of it.
    #[error("the username \"{0}\" is already registered")]
    UsernameAlreadyRegistered(String),

    /// Session proof missing or invalid for a privileged operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("the username \"{0}\" is not registered")]
    UsernameNotRegistered(String),

    #[error("credential ID not registered: {0}")]
    CredentialNotRegistered(String),

    #[error("{0}")]
    InvalidInput(&'static str),

    /// The verification engine rejected the cryptographic proof.
    #[error("{ceremony} verification failed: {reason}")]
    VerificationFailed { ceremony: Ceremony, reason: String },

    /// Uncategorized internal fault.
    #[error("unexpected failure: {0}")]
    UnexpectedFailure(String),
}

impl CeremonyError {
    // ---
    /// Whether this error points at a defect rather than a rejected request.
    pub fn is_bug(&self) -> bool {
        // ---
        matches!(self, CeremonyError::UnexpectedFailure(_))
    }

    /// Human-readable message list: a headline followed by details.
    pub fn messages(&self) -> Vec<String> {
        // ---
        match self {
            CeremonyError::Decode { ceremony, reason } => vec![
                headline(*ceremony).to_string(),
                "Failed to decode response object.".to_string(),
                reason.clone(),
            ],
            CeremonyError::NoSuchPendingRequest(ceremony) => vec![
                headline(*ceremony).to_string(),
                match ceremony {
                    Ceremony::Registration => "No such registration in progress.".to_string(),
                    Ceremony::Authentication => "No such assertion in progress.".to_string(),
                },
            ],
            CeremonyError::VerificationFailed { ceremony, reason } => {
                vec![headline(*ceremony).to_string(), reason.clone()]
            }
            CeremonyError::UnexpectedFailure(reason) => vec![
                "Request failed unexpectedly; this is likely a bug.".to_string(),
                reason.clone(),
            ],
            other => vec![other.to_string()],
        }
    }
}

fn headline(ceremony: Ceremony) -> &'static str {
    // ---
    match ceremony {
        Ceremony::Registration => "Registration failed!",
        Ceremony::Authentication => "Assertion failed!",
    }
}

/// Errors returned by challenge, session, and credential stores.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A freshly generated key was already present.
    #[error("key collision on {0}")]
    Collision(String),

    /// The username is bound to a different user handle.
    #[error("username \"{0}\" belongs to a different user handle")]
    UserHandleMismatch(String),

    #[error("credential {0} is already registered")]
    DuplicateCredential(String),

    /// A reported signature counter is lower than the stored one.
    #[error("signature counter regression: stored {stored}, reported {reported}")]
    CounterRegression { stored: u32, reported: u32 },

    #[error("unknown credential {0}")]
    UnknownCredential(String),

    #[error("store backend error: {0}")]
    Backend(String),

    #[error("store serialization error: {0}")]
    Serialization(String),
}

impl From<StoreError> for CeremonyError {
    fn from(err: StoreError) -> Self {
        CeremonyError::UnexpectedFailure(err.to_string())
    }
}
