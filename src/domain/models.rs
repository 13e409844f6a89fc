use super::ids::{CredentialId, UserHandle};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Opaque attestation metadata entry returned by the metadata service.
pub type AttestationMetadata = serde_json::Value;

/// The account a set of credentials belongs to.
///
/// Exactly one identity exists per username; the handle is generated once
/// at first registration and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    // ---
    pub name: String,
    pub display_name: String,
    pub id: UserHandle,
}

impl UserIdentity {
    // ---
    /// Creates an identity with a freshly generated user handle.
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        // ---
        Self {
            name: name.into(),
            display_name: display_name.into(),
            id: UserHandle::random(),
        }
    }
}

/// Transport hint reported by the client for a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthenticatorTransport {
    Usb,
    Nfc,
    Ble,
    Internal,
    Hybrid,
    SmartCard,
}

impl AuthenticatorTransport {
    // ---
    /// Parses the WebAuthn wire name; unknown hints are ignored by callers.
    pub fn from_wire(name: &str) -> Option<Self> {
        // ---
        match name {
            "usb" => Some(Self::Usb),
            "nfc" => Some(Self::Nfc),
            "ble" => Some(Self::Ble),
            "internal" => Some(Self::Internal),
            "hybrid" => Some(Self::Hybrid),
            "smart-card" => Some(Self::SmartCard),
            _ => None,
        }
    }
}

/// Whether the authenticator should create a discoverable credential.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResidentKeyRequirement {
    #[default]
    Discouraged,
    Preferred,
    Required,
}

impl ResidentKeyRequirement {
    // ---
    pub fn as_str(&self) -> &'static str {
        // ---
        match self {
            Self::Discouraged => "discouraged",
            Self::Preferred => "preferred",
            Self::Required => "required",
        }
    }
}

impl fmt::Display for ResidentKeyRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticator selection criteria handed to the verification engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatorSelection {
    // ---
    pub resident_key: ResidentKeyRequirement,
}

impl AuthenticatorSelection {
    // ---
    pub fn new(resident_key: ResidentKeyRequirement) -> Self {
        // ---
        Self { resident_key }
    }
}

/// Key material and counter of a credential as the verifier needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredCredential {
    // ---
    /// Unique credential ID (from authenticator)
    pub credential_id: CredentialId,

    /// User this credential belongs to
    pub user_handle: UserHandle,

    /// Public key for signature verification, in the engine's own encoding
    #[serde(with = "crate::domain::ids::base64url")]
    pub public_key: Vec<u8>,

    /// Signature counter (for cloned-authenticator detection)
    pub signature_count: u32,
}

/// One registered credential together with the identity that owns it.
///
/// A user with several credentials has several registrations sharing the
/// same [`UserIdentity`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialRegistration {
    // ---
    pub user: UserIdentity,
    pub nickname: Option<String>,
    pub transports: BTreeSet<AuthenticatorTransport>,
    pub registered_at: DateTime<Utc>,
    pub credential: RegisteredCredential,
    pub attestation_metadata: Option<AttestationMetadata>,
}

impl CredentialRegistration {
    // ---
    pub fn credential_id(&self) -> &CredentialId {
        // ---
        &self.credential.credential_id
    }
}
