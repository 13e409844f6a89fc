// Test helpers are intentionally partially used
#![allow(dead_code)]

use passkey_server::domain::{
    AssertionOptions, AssertionRequest, AssertionResponse, AssertionResult, AttestationMetadata,
    AuthOutcome, AuthenticatorSelection, AuthenticatorTransport, Ceremony, CredentialId,
    CredentialRegistryPtr, MetadataService, MetadataServicePtr, Metrics, RegistrationOptions,
    RegistrationOutcome, RegistrationRequest, RegistrationResponse, RegistrationResult,
    ResidentKeyRequirement, UserIdentity, VerificationError, Verifier,
};
use passkey_server::{
    create_memory_stores, create_null_metadata, CacheConfig, CeremonyOrchestrator, CeremonyStores,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ============================================================================
// Test Setup
// ============================================================================

/// Installs a test-writer subscriber once per test binary.
pub fn init_tracing() {
    // ---
    tracing_subscriber::fmt()
        .with_test_writer()
        .try_init()
        .ok();
}

fn random_challenge() -> String {
    CredentialId::random().to_base64()
}

// ============================================================================
// Fake verification engine
// ============================================================================

/// Verification engine that checks only the echoed challenge.
///
/// The client credential is a JSON object:
/// - `challenge`: must match the one issued at start
/// - `id`: base64url credential id
/// - `counter`: signature counter reported by the authenticator
/// - `transports`: transport hint names
/// - `forged`: proof does not verify
/// - `invalid`: assertion verifies but reports `success = false`
/// - `broken`: the engine itself fails
/// - `trusted`, `certificate`: attestation trust and DER certificate
pub struct FakeVerifier {
    credentials: CredentialRegistryPtr,
}

impl FakeVerifier {
    pub fn new(credentials: CredentialRegistryPtr) -> Self {
        Self { credentials }
    }
}

fn check_proof(state: &Value, credential: &Value) -> Result<(), VerificationError> {
    // ---
    if credential["broken"] == true {
        return Err(VerificationError::Engine("engine exploded".into()));
    }
    if credential["forged"] == true {
        return Err(VerificationError::Rejected("bad signature".into()));
    }
    if credential["challenge"] != state["challenge"] {
        return Err(VerificationError::Rejected("challenge mismatch".into()));
    }
    Ok(())
}

fn credential_id_of(credential: &Value) -> Result<CredentialId, VerificationError> {
    // ---
    credential["id"]
        .as_str()
        .and_then(|id| CredentialId::from_base64(id).ok())
        .ok_or_else(|| VerificationError::Malformed("missing credential id".into()))
}

#[async_trait::async_trait]
impl Verifier for FakeVerifier {
    async fn begin_registration(
        &self,
        user: &UserIdentity,
        selection: &AuthenticatorSelection,
    ) -> Result<RegistrationOptions, VerificationError> {
        // ---
        let challenge = random_challenge();
        Ok(RegistrationOptions {
            user: user.clone(),
            selection: *selection,
            public_key: json!({
                "challenge": challenge,
                "user": { "name": user.name, "id": user.id.to_base64() },
                "residentKey": selection.resident_key.as_str(),
            }),
            state: json!({ "challenge": challenge }),
        })
    }

    async fn complete_registration(
        &self,
        options: &RegistrationOptions,
        response: &RegistrationResponse,
    ) -> Result<RegistrationResult, VerificationError> {
        // ---
        let credential = &response.credential;
        check_proof(&options.state, credential)?;

        let transports = credential["transports"]
            .as_array()
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .filter_map(AuthenticatorTransport::from_wire)
                    .collect()
            })
            .unwrap_or_default();

        Ok(RegistrationResult {
            credential_id: credential_id_of(credential)?,
            public_key: b"fake-public-key".to_vec(),
            signature_count: credential["counter"].as_u64().unwrap_or(0) as u32,
            transports,
            attestation_trusted: credential["trusted"] == true,
            attestation_certificate: credential["certificate"]
                .as_str()
                .and_then(|der| CredentialId::from_base64(der).ok())
                .map(|der| der.as_bytes().to_vec()),
        })
    }

    async fn begin_assertion(
        &self,
        username: Option<&str>,
    ) -> Result<AssertionOptions, VerificationError> {
        // ---
        let challenge = random_challenge();
        Ok(AssertionOptions {
            username: username.map(str::to_string),
            public_key: json!({ "challenge": challenge }),
            state: json!({ "challenge": challenge }),
        })
    }

    async fn complete_assertion(
        &self,
        options: &AssertionOptions,
        response: &AssertionResponse,
    ) -> Result<AssertionResult, VerificationError> {
        // ---
        let credential = &response.credential;
        check_proof(&options.state, credential)?;

        let credential_id = credential_id_of(credential)?;
        let registration = self
            .credentials
            .registration_by_credential_id(&credential_id)
            .await
            .map_err(|e| VerificationError::Engine(e.to_string()))?
            .ok_or_else(|| VerificationError::Rejected("unknown credential".into()))?;

        Ok(AssertionResult {
            credential_id,
            user_handle: registration.user.id.clone(),
            username: registration.user.name.clone(),
            signature_count: credential["counter"].as_u64().unwrap_or(0) as u32,
            success: credential["invalid"] != true,
        })
    }
}

// ============================================================================
// Metadata and metrics doubles
// ============================================================================

/// Metadata service that knows every authenticator as the same vendor.
pub struct StaticMetadata;

impl MetadataService for StaticMetadata {
    fn find_entries(&self, _result: &RegistrationResult) -> Vec<AttestationMetadata> {
        vec![
            json!({ "vendor": "Acme Keys", "model": "Acme One" }),
            json!({ "vendor": "ignored" }),
        ]
    }
}

#[derive(Default)]
pub struct RecordingMetrics {
    pub registrations_started: AtomicUsize,
    pub authentications_started: AtomicUsize,
    pub finished_ok: AtomicUsize,
    pub finished_failed: AtomicUsize,
    pub counter_regressions: AtomicUsize,
}

impl RecordingMetrics {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

impl Metrics for RecordingMetrics {
    fn render(&self) -> String {
        format!(
            "finished_ok {}\nfinished_failed {}\n",
            Self::get(&self.finished_ok),
            Self::get(&self.finished_failed)
        )
    }

    fn record_ceremony_started(&self, ceremony: Ceremony) {
        let counter = match ceremony {
            Ceremony::Registration => &self.registrations_started,
            Ceremony::Authentication => &self.authentications_started,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    fn record_ceremony_finished(&self, _ceremony: Ceremony, success: bool) {
        let counter = if success {
            &self.finished_ok
        } else {
            &self.finished_failed
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    fn record_signature_counter_regression(&self) {
        self.counter_regressions.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub orchestrator: Arc<CeremonyOrchestrator>,
    pub stores: CeremonyStores,
    pub metrics: Arc<RecordingMetrics>,
}

impl Harness {
    // ---
    pub fn new() -> Self {
        Self::build(&CacheConfig::default(), create_null_metadata())
    }

    pub fn with_config(config: &CacheConfig) -> Self {
        Self::build(config, create_null_metadata())
    }

    pub fn with_metadata(metadata: MetadataServicePtr) -> Self {
        Self::build(&CacheConfig::default(), metadata)
    }

    fn build(config: &CacheConfig, metadata: MetadataServicePtr) -> Self {
        // ---
        init_tracing();

        let stores = create_memory_stores(config);
        let verifier = Arc::new(FakeVerifier::new(stores.credentials.clone()));
        let metrics = Arc::new(RecordingMetrics::default());
        let orchestrator = Arc::new(CeremonyOrchestrator::new(
            stores.clone(),
            verifier,
            metadata,
            metrics.clone(),
        ));

        Self {
            orchestrator,
            stores,
            metrics,
        }
    }

    /// Starts a registration for a new user with default options.
    pub async fn start_registration(&self, username: &str) -> RegistrationRequest {
        // ---
        self.orchestrator
            .start_registration(
                username,
                "",
                None,
                ResidentKeyRequirement::Discouraged,
                None,
            )
            .await
            .expect("start registration")
    }

    /// Registers a first credential for a new user.
    pub async fn register(&self, username: &str) -> RegistrationOutcome {
        // ---
        let request = self.start_registration(username).await;
        let response = registration_response(&request, &CredentialId::random());
        self.orchestrator
            .finish_registration(&payload(&response))
            .await
            .expect("finish registration")
    }

    /// Authenticates with `credential_id`, reporting `counter`.
    pub async fn authenticate(
        &self,
        username: &str,
        credential_id: &CredentialId,
        counter: u32,
    ) -> AuthOutcome {
        // ---
        let request = self
            .orchestrator
            .start_authentication(Some(username))
            .await
            .expect("start authentication");
        let response = assertion_response(&request, credential_id, counter);
        self.orchestrator
            .finish_authentication(&payload(&response))
            .await
            .expect("finish authentication")
    }
}

// ============================================================================
// Payload builders
// ============================================================================

/// Client response completing `request` with a fresh credential.
pub fn registration_response(request: &RegistrationRequest, credential_id: &CredentialId) -> Value {
    // ---
    json!({
        "request_id": request.request_id,
        "credential": {
            "challenge": request.options.state["challenge"],
            "id": credential_id.to_base64(),
            "transports": ["usb", "nfc"],
        }
    })
}

/// Client response asserting `credential_id` against `request`.
pub fn assertion_response(
    request: &AssertionRequest,
    credential_id: &CredentialId,
    counter: u32,
) -> Value {
    // ---
    json!({
        "request_id": request.request_id,
        "credential": {
            "challenge": request.options.state["challenge"],
            "id": credential_id.to_base64(),
            "counter": counter,
        }
    })
}

pub fn payload(response: &Value) -> Vec<u8> {
    serde_json::to_vec(response).expect("serialize payload")
}
