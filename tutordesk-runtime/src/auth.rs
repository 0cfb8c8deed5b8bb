use thiserror::Error;
use tutordesk_providers::auth::{
    RegisterPayload, build_google_exchange_request, build_login_request, build_register_request,
};
use tutordesk_providers::parse::{AuthOutcome, RegisterOutcome, parse_auth_outcome, parse_register_outcome};

use crate::session_store::AuthSession;

pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please try again.";

#[derive(Debug, Error)]
pub enum AuthError {
    /// The backend refused the attempt; the message is user-facing.
    #[error("{0}")]
    Rejected(String),

    #[error("{}", NETWORK_ERROR_MESSAGE)]
    Network(#[source] anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct AuthClient {
    api_base_url: String,
}

impl AuthClient {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self { api_base_url: api_base_url.into() }
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
        remember: bool,
    ) -> Result<AuthSession, AuthError> {
        let req = build_login_request(&self.api_base_url, email, password);
        let resp = tutordesk_providers::runtime::execute(&req)
            .await
            .map_err(AuthError::Network)?;

        match parse_auth_outcome(resp.status, &resp.body) {
            AuthOutcome::Authenticated { token, user } => Ok(AuthSession { token, user, remember }),
            AuthOutcome::Rejected { message } => Err(AuthError::Rejected(
                message.unwrap_or_else(|| "Login failed".into()),
            )),
        }
    }

    /// Create an account. On success returns the backend's confirmation
    /// message; signing in afterwards is the caller's call.
    pub async fn register(&self, payload: &RegisterPayload) -> Result<String, AuthError> {
        let req = build_register_request(&self.api_base_url, payload);
        let resp = tutordesk_providers::runtime::execute(&req)
            .await
            .map_err(AuthError::Network)?;

        match parse_register_outcome(resp.status, &resp.body) {
            RegisterOutcome::Accepted { message } => {
                Ok(message.unwrap_or_else(|| "Account created".into()))
            }
            RegisterOutcome::Rejected { message } => Err(AuthError::Rejected(
                message.unwrap_or_else(|| "Registration failed".into()),
            )),
        }
    }

    pub async fn login_with_google(
        &self,
        id_token: &str,
        remember: bool,
    ) -> Result<AuthSession, AuthError> {
        if id_token.trim().is_empty() {
            return Err(AuthError::Rejected("Missing Google ID token".into()));
        }

        let req = build_google_exchange_request(&self.api_base_url, id_token);
        let resp = tutordesk_providers::runtime::execute(&req)
            .await
            .map_err(AuthError::Network)?;

        match parse_auth_outcome(resp.status, &resp.body) {
            AuthOutcome::Authenticated { token, user } => Ok(AuthSession { token, user, remember }),
            AuthOutcome::Rejected { message } => Err(AuthError::Rejected(
                message.unwrap_or_else(|| "Google login failed".into()),
            )),
        }
    }
}
