//! Authentication error types.

use leadhub_core::error::LeadHubError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is deactivated")]
    AccountInactive,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("invalid or expired reset token")]
    ResetTokenInvalid,

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for LeadHubError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::AccountInactive
            | AuthError::TokenExpired
            | AuthError::TokenInvalid(_) => LeadHubError::AuthenticationFailed {
                reason: err.to_string(),
            },
            AuthError::ResetTokenInvalid => LeadHubError::Validation {
                message: "Invalid or expired reset token".into(),
            },
            AuthError::Crypto(msg) => LeadHubError::Crypto(msg),
        }
    }
}
