//! WebAuthn credential management handlers.
//!
//! 1. `deregister_credential` - Remove one passkey of the session's user
//! 2. `delete_account` - Remove every passkey of the session's user

use super::error::{decode_body, ApiError};
use crate::app_state::AppState;
use crate::domain::{CeremonyError, CredentialId, DeregisterOutcome, SessionToken};
use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct DeregisterRequest {
    // ---
    pub session_token: SessionToken,
    pub credential_id: CredentialId,
}

// ---

/// Response for a successful account deletion.
#[derive(Debug, Serialize)]
pub struct DeleteAccountResponse {
    // ---
    pub success: bool,
    pub username: String,
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Extracts the session token from the Authorization header.
///
/// Expects header format: "Authorization: Bearer <base64url token>"
fn bearer_token(headers: &HeaderMap) -> Result<SessionToken, ApiError> {
    // ---
    let denied = |reason: &str| {
        tracing::debug!("{}", reason);
        ApiError(CeremonyError::PermissionDenied(reason.to_string()))
    };

    let header = headers
        .get("authorization")
        .ok_or_else(|| denied("Missing Authorization header"))?
        .to_str()
        .map_err(|_| denied("Invalid Authorization header"))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| denied("Invalid Authorization header format"))?;

    SessionToken::from_base64(token.trim()).map_err(|_| denied("Invalid session token"))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /webauthn/credentials/deregister
///
/// # Request Body
/// ```json
/// { "session_token": "<base64url>", "credential_id": "<base64url>" }
/// ```
pub async fn deregister_credential(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<DeregisterOutcome>, ApiError> {
    // ---
    let req: DeregisterRequest = decode_body(&body)?;
    let outcome = state
        .orchestrator()
        .deregister_credential(&req.session_token, &req.credential_id)
        .await?;
    Ok(Json(outcome))
}

/// DELETE /webauthn/account
///
/// Deletes the account the bearer session speaks for.
pub async fn delete_account(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DeleteAccountResponse>, ApiError> {
    // ---
    let token = bearer_token(&headers)?;
    let orchestrator = state.orchestrator();
    let username = orchestrator.username_for_session(&token).await?;

    let response = orchestrator
        .delete_account(&username, || DeleteAccountResponse {
            success: true,
            username: username.clone(),
        })
        .await?;

    Ok(Json(response))
}
