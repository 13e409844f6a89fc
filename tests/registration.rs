//! Registration ceremony tests driven through a fake verification engine.

use futures::future::join_all;
use passkey_server::domain::{
    AuthenticatorTransport, Ceremony, CeremonyError, CredentialId, ResidentKeyRequirement,
    RANDOM_ID_LEN,
};
use passkey_server::CacheConfig;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

mod common;

use common::{payload, registration_response, Harness, RecordingMetrics, StaticMetadata};

// ============================================================================
// Happy path and anti-replay
// ============================================================================

#[tokio::test]
async fn bob_registers_once_and_replay_is_rejected() {
    // ---
    let h = Harness::new();

    let request = h
        .orchestrator
        .start_registration("bob", "Bob", None, ResidentKeyRequirement::Discouraged, None)
        .await
        .unwrap();

    assert_eq!(request.request_id.as_bytes().len(), RANDOM_ID_LEN);
    assert_eq!(request.username, "bob");
    assert!(request.session_token.is_some());
    assert!(!h.stores.credentials.user_exists("bob").await.unwrap());

    let response = registration_response(&request, &CredentialId::random());
    let outcome = h
        .orchestrator
        .finish_registration(&payload(&response))
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.username, "bob");
    assert_eq!(outcome.request_id, request.request_id);
    assert_eq!(outcome.registration.user.display_name, "Bob");
    assert_eq!(
        h.stores.credentials.registrations_by_username("bob").await.unwrap(),
        vec![outcome.registration.clone()]
    );
    assert!(
        h.stores
            .sessions
            .is_session_for_user(&outcome.registration.user.id, &outcome.session_token)
            .await
    );
    assert_ne!(Some(&outcome.session_token), request.session_token.as_ref());

    let err = h
        .orchestrator
        .finish_registration(&payload(&response))
        .await
        .unwrap_err();
    assert_eq!(err, CeremonyError::NoSuchPendingRequest(Ceremony::Registration));
    assert_eq!(
        h.stores.credentials.registrations_by_username("bob").await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn registration_records_transports_and_nickname() {
    // ---
    let h = Harness::new();

    let request = h
        .orchestrator
        .start_registration(
            "carol",
            "",
            Some("laptop".to_string()),
            ResidentKeyRequirement::Required,
            None,
        )
        .await
        .unwrap();
    assert_eq!(request.options.public_key["residentKey"], "required");

    let outcome = h
        .orchestrator
        .finish_registration(&payload(&registration_response(
            &request,
            &CredentialId::random(),
        )))
        .await
        .unwrap();

    let registration = &outcome.registration;
    assert_eq!(registration.nickname.as_deref(), Some("laptop"));
    assert_eq!(registration.user.display_name, "carol");
    assert!(registration.transports.contains(&AuthenticatorTransport::Usb));
    assert!(registration.transports.contains(&AuthenticatorTransport::Nfc));
    assert!(!outcome.attestation_trusted);
    assert!(outcome.attestation_cert.is_none());
    assert!(registration.attestation_metadata.is_none());
}

#[tokio::test]
async fn empty_username_is_rejected() {
    // ---
    let h = Harness::new();

    let err = h
        .orchestrator
        .start_registration("", "", None, ResidentKeyRequirement::Discouraged, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CeremonyError::InvalidInput(_)));
}

// ============================================================================
// Re-registration authorization
// ============================================================================

#[tokio::test]
async fn existing_username_requires_session() {
    // ---
    let h = Harness::new();
    let first = h.register("dave").await;

    let err = h
        .orchestrator
        .start_registration("dave", "", None, ResidentKeyRequirement::Discouraged, None)
        .await
        .unwrap_err();
    assert_eq!(err, CeremonyError::UsernameAlreadyRegistered("dave".into()));

    // Someone else's session does not help.
    let erin = h.register("erin").await;
    let err = h
        .orchestrator
        .start_registration(
            "dave",
            "",
            None,
            ResidentKeyRequirement::Discouraged,
            Some(&erin.session_token),
        )
        .await
        .unwrap_err();
    assert_eq!(err, CeremonyError::UsernameAlreadyRegistered("dave".into()));

    assert_eq!(
        h.stores.credentials.registrations_by_username("dave").await.unwrap(),
        vec![first.registration]
    );
}

#[tokio::test]
async fn second_credential_shares_user_handle() {
    // ---
    let h = Harness::new();
    let first = h.register("frank").await;

    let request = h
        .orchestrator
        .start_registration(
            "frank",
            "Someone Else",
            Some("phone".into()),
            ResidentKeyRequirement::Preferred,
            Some(&first.session_token),
        )
        .await
        .unwrap();
    assert_eq!(request.options.user, first.registration.user);

    let second = h
        .orchestrator
        .finish_registration(&payload(&registration_response(
            &request,
            &CredentialId::random(),
        )))
        .await
        .unwrap();

    assert_eq!(second.registration.user.id, first.registration.user.id);
    assert_eq!(second.registration.user.display_name, first.registration.user.display_name);

    let registrations = h
        .stores
        .credentials
        .registrations_by_username("frank")
        .await
        .unwrap();
    assert_eq!(registrations.len(), 2);
    assert!(registrations
        .iter()
        .all(|reg| reg.user.id == first.registration.user.id));
}

#[tokio::test]
async fn concurrent_first_registrations_create_one_identity() {
    // ---
    let h = Harness::new();

    let a = h.start_registration("grace").await;
    let b = h.start_registration("grace").await;
    assert_ne!(a.options.user.id, b.options.user.id);

    h.orchestrator
        .finish_registration(&payload(&registration_response(&a, &CredentialId::random())))
        .await
        .unwrap();

    let err = h
        .orchestrator
        .finish_registration(&payload(&registration_response(&b, &CredentialId::random())))
        .await
        .unwrap_err();
    assert_eq!(err, CeremonyError::UsernameAlreadyRegistered("grace".into()));

    let registrations = h
        .stores
        .credentials
        .registrations_by_username("grace")
        .await
        .unwrap();
    assert_eq!(registrations.len(), 1);
    assert_eq!(registrations[0].user.id, a.options.user.id);
}

#[tokio::test]
async fn duplicate_credential_id_is_rejected() {
    // ---
    let h = Harness::new();
    let heidi = h.register("heidi").await;
    let taken = heidi.registration.credential_id().clone();

    let request = h.start_registration("ivan").await;
    let err = h
        .orchestrator
        .finish_registration(&payload(&registration_response(&request, &taken)))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CeremonyError::VerificationFailed {
            ceremony: Ceremony::Registration,
            ..
        }
    ));
    assert!(!h.stores.credentials.user_exists("ivan").await.unwrap());
}

// ============================================================================
// Failures consume the request and leave the registry untouched
// ============================================================================

#[tokio::test]
async fn failed_verification_consumes_request() {
    // ---
    let h = Harness::new();
    let request = h.start_registration("judy").await;

    let mut response = registration_response(&request, &CredentialId::random());
    response["credential"]["forged"] = json!(true);

    let err = h
        .orchestrator
        .finish_registration(&payload(&response))
        .await
        .unwrap_err();
    assert!(matches!(err, CeremonyError::VerificationFailed { .. }));
    assert!(!h.stores.credentials.user_exists("judy").await.unwrap());

    // A corrected retry cannot reuse the request.
    response["credential"]["forged"] = json!(false);
    let err = h
        .orchestrator
        .finish_registration(&payload(&response))
        .await
        .unwrap_err();
    assert_eq!(err, CeremonyError::NoSuchPendingRequest(Ceremony::Registration));

    assert_eq!(RecordingMetrics::get(&h.metrics.finished_failed), 2);
    assert_eq!(RecordingMetrics::get(&h.metrics.finished_ok), 0);
}

#[tokio::test]
async fn engine_failure_is_unexpected() {
    // ---
    let h = Harness::new();
    let request = h.start_registration("kim").await;

    let mut response = registration_response(&request, &CredentialId::random());
    response["credential"]["broken"] = json!(true);

    let err = h
        .orchestrator
        .finish_registration(&payload(&response))
        .await
        .unwrap_err();
    assert!(err.is_bug());
}

#[tokio::test]
async fn malformed_payload_is_a_decode_error() {
    // ---
    let h = Harness::new();
    let request = h.start_registration("leo").await;

    let err = h
        .orchestrator
        .finish_registration(b"{\"request_id\": 17}")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CeremonyError::Decode {
            ceremony: Ceremony::Registration,
            ..
        }
    ));

    // Nothing was consumed; the real response still completes.
    h.orchestrator
        .finish_registration(&payload(&registration_response(
            &request,
            &CredentialId::random(),
        )))
        .await
        .unwrap();
}

#[tokio::test]
async fn registration_response_cannot_finish_authentication() {
    // ---
    let h = Harness::new();
    let request = h.start_registration("mallory").await;
    let response = registration_response(&request, &CredentialId::random());

    let err = h
        .orchestrator
        .finish_authentication(&payload(&response))
        .await
        .unwrap_err();
    assert_eq!(err, CeremonyError::NoSuchPendingRequest(Ceremony::Authentication));
}

// ============================================================================
// Attestation
// ============================================================================

#[tokio::test]
async fn attestation_metadata_and_certificate_are_reported() {
    // ---
    let h = Harness::with_metadata(Arc::new(StaticMetadata));
    let request = h.start_registration("nina").await;

    let mut response = registration_response(&request, &CredentialId::random());
    response["credential"]["trusted"] = json!(true);
    response["credential"]["certificate"] = json!("MIIB");

    let outcome = h
        .orchestrator
        .finish_registration(&payload(&response))
        .await
        .unwrap();

    assert!(outcome.attestation_trusted);
    assert_eq!(
        outcome.registration.attestation_metadata,
        Some(json!({ "vendor": "Acme Keys", "model": "Acme One" }))
    );
    let cert = outcome.attestation_cert.expect("certificate");
    assert_eq!(cert.der, CredentialId::from_base64("MIIB").unwrap().as_bytes());
}

// ============================================================================
// Capacity and expiry
// ============================================================================

#[tokio::test]
async fn evicted_request_cannot_be_finished() {
    // ---
    let config = CacheConfig {
        challenge_capacity: 2,
        ..CacheConfig::default()
    };
    let h = Harness::with_config(&config);

    let oldest = h.start_registration("oscar").await;
    let middle = h.start_registration("peggy").await;
    let newest = h.start_registration("quinn").await;

    let err = h
        .orchestrator
        .finish_registration(&payload(&registration_response(
            &oldest,
            &CredentialId::random(),
        )))
        .await
        .unwrap_err();
    assert_eq!(err, CeremonyError::NoSuchPendingRequest(Ceremony::Registration));

    for request in [middle, newest] {
        h.orchestrator
            .finish_registration(&payload(&registration_response(
                &request,
                &CredentialId::random(),
            )))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn expired_request_cannot_be_finished() {
    // ---
    let config = CacheConfig {
        challenge_ttl: Duration::from_millis(30),
        ..CacheConfig::default()
    };
    let h = Harness::with_config(&config);
    let request = h.start_registration("rupert").await;

    tokio::time::sleep(Duration::from_millis(60)).await;

    let err = h
        .orchestrator
        .finish_registration(&payload(&registration_response(
            &request,
            &CredentialId::random(),
        )))
        .await
        .unwrap_err();
    assert_eq!(err, CeremonyError::NoSuchPendingRequest(Ceremony::Registration));
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_finish_succeeds_exactly_once() {
    // ---
    for _ in 0..10 {
        let h = Harness::new();
        let request = h.start_registration("sybil").await;
        let body = payload(&registration_response(&request, &CredentialId::random()));

        let attempts = (0..8).map(|_| {
            let orchestrator = Arc::clone(&h.orchestrator);
            let body = body.clone();
            tokio::spawn(async move { orchestrator.finish_registration(&body).await })
        });

        let results: Vec<_> = join_all(attempts)
            .await
            .into_iter()
            .map(|joined| joined.unwrap())
            .collect();

        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        assert!(results.iter().filter_map(|r| r.as_ref().err()).all(|err| {
            *err == CeremonyError::NoSuchPendingRequest(Ceremony::Registration)
        }));
        assert_eq!(
            h.stores.credentials.registrations_by_username("sybil").await.unwrap().len(),
            1
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_second_credentials_are_all_kept() {
    // ---
    let h = Harness::new();
    let first = h.register("trent").await;

    let mut requests = Vec::new();
    for _ in 0..16 {
        let request = h
            .orchestrator
            .start_registration(
                "trent",
                "",
                None,
                ResidentKeyRequirement::Discouraged,
                Some(&first.session_token),
            )
            .await
            .unwrap();
        requests.push(request);
    }

    let finishes = requests.iter().map(|request| {
        let orchestrator = Arc::clone(&h.orchestrator);
        let body = payload(&registration_response(request, &CredentialId::random()));
        tokio::spawn(async move { orchestrator.finish_registration(&body).await })
    });

    for joined in join_all(finishes).await {
        joined.unwrap().unwrap();
    }

    assert_eq!(
        h.stores.credentials.registrations_by_username("trent").await.unwrap().len(),
        17
    );
}
