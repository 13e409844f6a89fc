//! WebAuthn configuration and verification engine.
//!
//! This module builds the `webauthn-rs` instance for the configured relying
//! party and wraps it as the ceremony layer's verification engine.

mod verifier;

use verifier::WebauthnVerifier;

use std::str::FromStr;
use std::sync::Arc;

use crate::config::WebAuthnConfig;
use crate::domain::{CredentialRegistryPtr, VerifierPtr};
use anyhow::Result;
use reqwest::Url;
use webauthn_rs::{Webauthn, WebauthnBuilder};

/// Creates a configured WebAuthn instance from application config.
///
/// # Errors
/// Returns an error if the WebAuthn builder fails to construct a valid instance.
/// This typically happens if the origin URL or RP ID are malformed.
pub fn create_webauthn(config: &WebAuthnConfig) -> Result<Webauthn> {
    // ---
    tracing::debug!("Creating with config:{:?}", config);

    let url = Url::from_str(config.origin.as_str())?;
    let builder = WebauthnBuilder::new(&config.rp_id, &url)?;
    let webauthn = builder.rp_name(&config.rp_name).build()?;

    Ok(webauthn)
}

/// Creates the `webauthn-rs` backed verification engine.
///
/// The engine reads stored passkeys from `credentials` when building
/// assertion options and when resolving an asserted credential.
pub fn create_verifier(
    config: &WebAuthnConfig,
    credentials: CredentialRegistryPtr,
) -> Result<VerifierPtr> {
    // ---
    let webauthn = Arc::new(create_webauthn(config)?);
    Ok(Arc::new(WebauthnVerifier::new(webauthn, credentials)))
}
