mod errors;
pub(crate) mod ids;
mod metrics;
mod models;
mod outcomes;
mod requests;
mod stores;
mod verifier;

// Publicly expose the Metrics abstraction
pub use metrics::{Metrics, MetricsPtr};

// Identifiers and data model
pub use ids::{CredentialId, RequestId, SessionToken, UserHandle, RANDOM_ID_LEN};
pub use models::{
    AttestationMetadata, AuthenticatorSelection, AuthenticatorTransport, CredentialRegistration,
    RegisteredCredential, ResidentKeyRequirement, UserIdentity,
};
pub use outcomes::{AttestationCertInfo, AuthOutcome, DeregisterOutcome, RegistrationOutcome};
pub use requests::{
    AssertionOptions, AssertionRequest, AssertionResponse, Ceremony, PendingRequest,
    RegistrationOptions, RegistrationRequest, RegistrationResponse,
};

// Error taxonomy
pub use errors::{CeremonyError, StoreError};

// Store and collaborator abstractions
pub use stores::{
    ChallengeStore, ChallengeStorePtr, CredentialRegistry, CredentialRegistryPtr, Removal,
    SessionRegistry, SessionRegistryPtr,
};
pub use verifier::{
    AssertionResult, MetadataService, MetadataServicePtr, RegistrationResult, VerificationError,
    Verifier, VerifierPtr,
};
