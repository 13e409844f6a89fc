//! Ceremony payload decoding.

use crate::domain::{Ceremony, CeremonyError};
use serde::de::DeserializeOwned;

/// Decodes a client payload into the typed response of `ceremony`.
///
/// Malformed input becomes [`CeremonyError::Decode`]; it never panics.
pub(crate) fn decode<T: DeserializeOwned>(
    ceremony: Ceremony,
    payload: &[u8],
) -> Result<T, CeremonyError> {
    // ---
    serde_json::from_slice(payload).map_err(|e| CeremonyError::Decode {
        ceremony,
        reason: e.to_string(),
    })
}
