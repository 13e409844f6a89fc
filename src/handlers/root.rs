use axum::response::IntoResponse;

pub async fn root_handler() -> impl IntoResponse {
    let version = env!("CARGO_PKG_VERSION");
    format!(
        r#"Passkey Server
Version: {version}

Available endpoints:
  - POST   /webauthn/register/start          - Start a passkey registration
  - POST   /webauthn/register/finish         - Finish a passkey registration
  - POST   /webauthn/auth/start              - Start an authentication
  - POST   /webauthn/auth/finish             - Finish an authentication
  - POST   /webauthn/credentials/deregister  - Remove one passkey (session required)
  - DELETE /webauthn/account                 - Delete the account (Bearer session)
  - GET    /health                           - Light health check
  - GET    /metrics                          - Prometheus metrics
"#
    )
}
