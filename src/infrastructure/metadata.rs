//! Attestation metadata lookup.

use crate::domain::{AttestationMetadata, MetadataService, MetadataServicePtr, RegistrationResult};
use std::sync::Arc;

/// Metadata service that knows no authenticators.
///
/// Used when no attestation trust store is configured; registrations simply
/// carry no metadata entry.
pub struct NoMetadata;

impl MetadataService for NoMetadata {
    // ---
    fn find_entries(&self, _result: &RegistrationResult) -> Vec<AttestationMetadata> {
        Vec::new()
    }
}

/// Creates the empty metadata service.
pub fn create_null_metadata() -> MetadataServicePtr {
    Arc::new(NoMetadata)
}
