//! Authentication configuration.

/// Configuration for the authentication service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Shared secret for HS256 JWT signing.
    pub jwt_secret: String,
    /// Access token lifetime in seconds (default: 604_800 = 7 days).
    pub token_lifetime_secs: u64,
    /// JWT issuer (`iss` claim).
    pub jwt_issuer: String,
    /// Password-reset token lifetime in seconds (default: 600 = 10 minutes).
    pub reset_token_lifetime_secs: u64,
    /// Optional pepper prepended to passwords before Argon2id verification.
    pub pepper: Option<String>,
    /// Minimum password length for policy enforcement.
    pub min_password_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_lifetime_secs: 604_800,
            jwt_issuer: "leadhub".into(),
            reset_token_lifetime_secs: 600,
            pepper: None,
            min_password_length: 8,
        }
    }
}
