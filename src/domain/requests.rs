//! In-flight ceremony requests and the client responses that complete them.

use super::ids::{RequestId, SessionToken};
use super::models::{AuthenticatorSelection, UserIdentity};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two challenge/response rounds a relying party runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ceremony {
    Registration,
    Authentication,
}

impl Ceremony {
    // ---
    pub fn as_str(&self) -> &'static str {
        // ---
        match self {
            Ceremony::Registration => "registration",
            Ceremony::Authentication => "authentication",
        }
    }

    /// Short name used to namespace stored requests.
    pub fn key_prefix(&self) -> &'static str {
        // ---
        match self {
            Ceremony::Registration => "reg",
            Ceremony::Authentication => "auth",
        }
    }
}

impl fmt::Display for Ceremony {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options produced by the verification engine when a registration starts.
///
/// `public_key` is handed to the client authenticator as-is. `state` is the
/// engine's private bookkeeping and only travels back into the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationOptions {
    // ---
    pub user: UserIdentity,
    pub selection: AuthenticatorSelection,
    pub public_key: serde_json::Value,
    pub state: serde_json::Value,
}

/// Options produced by the verification engine when an assertion starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssertionOptions {
    // ---
    /// Absent for discoverable-credential (username-less) flows.
    pub username: Option<String>,
    pub public_key: serde_json::Value,
    pub state: serde_json::Value,
}

/// Anything held by a challenge store between the start and finish of a
/// ceremony.
pub trait PendingRequest: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    // ---
    const CEREMONY: Ceremony;
}

/// A registration waiting for the authenticator's response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    // ---
    pub request_id: RequestId,
    pub username: String,
    pub nickname: Option<String>,
    pub options: RegistrationOptions,

    /// Minted when the request is created; becomes usable as proof of
    /// identity once the ceremony finishes.
    pub session_token: Option<SessionToken>,
}

impl PendingRequest for RegistrationRequest {
    const CEREMONY: Ceremony = Ceremony::Registration;
}

/// An authentication waiting for the authenticator's assertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssertionRequest {
    // ---
    pub request_id: RequestId,
    pub username: Option<String>,
    pub options: AssertionOptions,
}

impl PendingRequest for AssertionRequest {
    const CEREMONY: Ceremony = Ceremony::Authentication;
}

/// Decoded client payload finishing a registration.
///
/// `credential` is the authenticator output, interpreted only by the
/// verification engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationResponse {
    // ---
    pub request_id: RequestId,
    pub credential: serde_json::Value,
}

/// Decoded client payload finishing an authentication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssertionResponse {
    // ---
    pub request_id: RequestId,
    pub credential: serde_json::Value,
}
