//! Opaque byte identifiers.
//!
//! Request ids, session tokens, user handles and credential ids are raw
//! bytes. They travel as unpadded base64url text on the wire and are logged
//! as hex.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

/// Length in bytes of every identifier this service generates.
pub const RANDOM_ID_LEN: usize = 32;

/// Serde adapter encoding byte buffers as unpadded base64url strings.
pub(crate) mod base64url {
    // ---
    use super::*;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S, T>(bytes: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: AsRef<[u8]>,
    {
        serializer.serialize_str(&URL_SAFE_NO_PAD.encode(bytes.as_ref()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        URL_SAFE_NO_PAD
            .decode(text.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

/// Fills a fresh buffer from the operating system RNG.
pub(crate) fn random_bytes(len: usize) -> Vec<u8> {
    // ---
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

macro_rules! opaque_bytes {
    // ---
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(#[serde(with = "crate::domain::ids::base64url")] Vec<u8>);

        impl $name {
            // ---
            pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
                Self(bytes.into())
            }

            /// Generates a fresh, unguessable identifier.
            pub fn random() -> Self {
                Self(random_bytes(RANDOM_ID_LEN))
            }

            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            pub fn to_base64(&self) -> String {
                URL_SAFE_NO_PAD.encode(&self.0)
            }

            pub fn from_base64(text: &str) -> Result<Self, base64::DecodeError> {
                URL_SAFE_NO_PAD.decode(text.as_bytes()).map(Self)
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), hex::encode(&self.0))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.to_base64())
            }
        }

        impl From<Vec<u8>> for $name {
            fn from(bytes: Vec<u8>) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }
    };
}

opaque_bytes!(
    /// Key of an in-flight ceremony in the challenge store.
    RequestId
);

opaque_bytes!(
    /// Bearer token proving a previously completed ceremony.
    SessionToken
);

opaque_bytes!(
    /// Stable identifier of a user, distinct from the username.
    UserHandle
);

opaque_bytes!(
    /// Authenticator-assigned credential identifier.
    CredentialId
);
