//! HTTP mapping of ceremony errors.

use crate::domain::CeremonyError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};

/// Error body returned by every WebAuthn endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    // ---
    pub error: String,
    pub messages: Vec<String>,
}

/// A ceremony error on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub CeremonyError);

impl From<CeremonyError> for ApiError {
    fn from(err: CeremonyError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    // ---
    pub fn status(&self) -> StatusCode {
        // ---
        match &self.0 {
            CeremonyError::Decode { .. } | CeremonyError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            CeremonyError::NoSuchPendingRequest(_)
            | CeremonyError::UsernameNotRegistered(_)
            | CeremonyError::CredentialNotRegistered(_) => StatusCode::NOT_FOUND,
            CeremonyError::UsernameAlreadyRegistered(_) => StatusCode::CONFLICT,
            CeremonyError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            CeremonyError::VerificationFailed { .. } => StatusCode::UNAUTHORIZED,
            CeremonyError::UnexpectedFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Decodes a JSON request body, reporting failures in the common error shape.
///
/// Used instead of the `Json` extractor, whose rejections are plain text.
pub(super) fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    // ---
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!("Rejected request body: {}", e);
        ApiError(CeremonyError::InvalidInput("Malformed request body."))
    })
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // ---
        let status = self.status();
        let body = ErrorResponse {
            error: self.0.to_string(),
            messages: self.0.messages(),
        };
        (status, Json(body)).into_response()
    }
}
