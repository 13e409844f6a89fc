//! WebAuthn registration handlers.
//!
//! Implements the two-phase passkey registration flow:
//! 1. `register_start` - Ask the orchestrator for a pending registration
//! 2. `register_finish` - Hand the authenticator's response back to it

use super::error::{decode_body, ApiError};
use crate::app_state::AppState;
use crate::domain::{RegistrationOutcome, RequestId, ResidentKeyRequirement, SessionToken};
use axum::{body::Bytes, extract::State, Json};
use serde::{Deserialize, Serialize};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegistrationStartRequest {
    // ---
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub resident_key: Option<ResidentKeyRequirement>,

    /// Required when adding a credential to an existing username.
    #[serde(default)]
    pub session_token: Option<SessionToken>,
}

/// Client-facing view of a pending registration.
///
/// The engine's private ceremony state stays on the server.
#[derive(Debug, Serialize)]
pub struct RegistrationStartResponse {
    // ---
    pub request_id: RequestId,
    pub username: String,
    pub public_key: serde_json::Value,
    pub session_token: Option<SessionToken>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /webauthn/register/start
///
/// # Request Body
/// ```json
/// { "username": "alice", "display_name": "Alice", "resident_key": "preferred" }
/// ```
///
/// # Response
/// The request id to echo back on finish, plus the options the client
/// passes to `navigator.credentials.create()`.
pub async fn register_start(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<RegistrationStartResponse>, ApiError> {
    // ---
    let req: RegistrationStartRequest = decode_body(&body)?;
    let request = state
        .orchestrator()
        .start_registration(
            &req.username,
            req.display_name.as_deref().unwrap_or_default(),
            req.nickname,
            req.resident_key.unwrap_or_default(),
            req.session_token.as_ref(),
        )
        .await?;

    Ok(Json(RegistrationStartResponse {
        request_id: request.request_id,
        username: request.username,
        public_key: request.options.public_key,
        session_token: request.session_token,
    }))
}

/// POST /webauthn/register/finish
///
/// # Request Body
/// ```json
/// { "request_id": "<base64url>", "credential": { ... } }
/// ```
///
/// The body is decoded by the orchestrator, so malformed JSON is reported
/// in the same error shape as every other ceremony failure.
pub async fn register_finish(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<RegistrationOutcome>, ApiError> {
    // ---
    let outcome = state.orchestrator().finish_registration(&body).await?;
    Ok(Json(outcome))
}
