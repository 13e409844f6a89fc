//! WebAuthn authentication handlers.
//!
//! Implements the two-phase passkey authentication flow:
//! 1. `auth_start` - Ask the orchestrator for a pending assertion
//! 2. `auth_finish` - Verify the assertion and receive a session token

use super::error::{decode_body, ApiError};
use crate::app_state::AppState;
use crate::domain::{AuthOutcome, RequestId};
use axum::{body::Bytes, extract::State, Json};
use serde::{Deserialize, Serialize};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct AuthStartRequest {
    //
    /// Omit for a discoverable-credential flow.
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthStartResponse {
    //
    pub request_id: RequestId,
    pub username: Option<String>,
    pub public_key: serde_json::Value,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /webauthn/auth/start
///
/// # Request Body
/// ```json
/// { "username": "alice" }
/// ```
///
/// An unknown username is reported as 404; see `start_authentication`.
/// An empty body starts a discoverable-credential flow.
pub async fn auth_start(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AuthStartResponse>, ApiError> {
    //
    let req = if body.is_empty() {
        AuthStartRequest::default()
    } else {
        decode_body::<AuthStartRequest>(&body)?
    };
    let request = state
        .orchestrator()
        .start_authentication(req.username.as_deref())
        .await?;

    Ok(Json(AuthStartResponse {
        request_id: request.request_id,
        username: request.username,
        public_key: request.options.public_key,
    }))
}

/// POST /webauthn/auth/finish
///
/// # Request Body
/// ```json
/// { "request_id": "<base64url>", "credential": { ... } }
/// ```
pub async fn auth_finish(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AuthOutcome>, ApiError> {
    //
    let outcome = state.orchestrator().finish_authentication(&body).await?;
    Ok(Json(outcome))
}
