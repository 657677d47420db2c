//! Authentication service — registration, login and the password-reset
//! flow.

use chrono::{Duration, Utc};
use leadhub_core::error::{LeadHubError, LeadHubResult};
use leadhub_core::models::user::{CreateUser, Role, User};
use leadhub_core::repository::UserRepository;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::reset;
use crate::token;

/// Input for the registration flow.
#[derive(Debug)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Requested role. Ignored for the first-ever user, which is always
    /// promoted to superadmin.
    pub role: Option<Role>,
}

/// Input for the login flow.
#[derive(Debug)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Result of the forgot-password flow.
///
/// The HTTP layer must answer `UnknownEmail` and `TokenIssued`
/// identically (anti-enumeration); the distinction exists only so the
/// caller knows whether an email has to be sent.
#[derive(Debug)]
pub enum ForgotPasswordOutcome {
    /// No account with that email — respond with the generic message.
    UnknownEmail,
    /// Account exists but is deactivated.
    Inactive,
    /// A reset token was stored; `raw_token` must be delivered to the
    /// user and never persisted.
    TokenIssued { user: User, raw_token: String },
}

/// Authentication service.
///
/// Generic over the user repository so that the auth layer has no
/// dependency on the database crate.
#[derive(Clone)]
pub struct AuthService<U: UserRepository> {
    user_repo: U,
    config: AuthConfig,
}

impl<U: UserRepository> AuthService<U> {
    pub fn new(user_repo: U, config: AuthConfig) -> Self {
        Self { user_repo, config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Issue a bearer token for an authenticated user.
    pub fn issue_token(&self, user: &User) -> LeadHubResult<String> {
        Ok(token::issue_access_token(user.id, &self.config)?)
    }

    /// Register a new account.
    ///
    /// The first-ever user is self-seeded as superadmin regardless of
    /// the requested role; later registrations default to agent.
    pub async fn register(&self, input: RegisterInput) -> LeadHubResult<User> {
        let email = input.email.trim().to_lowercase();
        if input.name.trim().is_empty() || email.is_empty() || input.password.is_empty() {
            return Err(LeadHubError::Validation {
                message: "Please provide name, email and password".into(),
            });
        }
        if input.password.len() < self.config.min_password_length {
            return Err(LeadHubError::Validation {
                message: format!(
                    "Password must be at least {} characters",
                    self.config.min_password_length
                ),
            });
        }

        // 1. Reject duplicate emails before any mutation.
        match self.user_repo.get_by_email(&email).await {
            Ok(_) => {
                return Err(LeadHubError::AlreadyExists {
                    entity: "user".into(),
                });
            }
            Err(LeadHubError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        // 2. First user becomes superadmin.
        let role = if self.user_repo.count().await? == 0 {
            Role::Superadmin
        } else {
            input.role.unwrap_or(Role::Agent)
        };

        self.user_repo
            .create(CreateUser {
                name: input.name.trim().to_string(),
                email,
                password: input.password,
                role,
                created_by: None,
            })
            .await
    }

    /// Authenticate with email + password.
    pub async fn login(&self, input: LoginInput) -> LeadHubResult<User> {
        if input.email.trim().is_empty() || input.password.is_empty() {
            return Err(LeadHubError::Validation {
                message: "Please provide email and password".into(),
            });
        }

        // 1. Look up the account; an unknown email reads the same as a
        //    bad password.
        let user = match self.user_repo.get_by_email(input.email.trim()).await {
            Ok(u) => u,
            Err(LeadHubError::NotFound { .. }) => {
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e),
        };

        // 2. Deactivated accounts cannot log in.
        if !user.is_active {
            return Err(AuthError::AccountInactive.into());
        }

        // 3. Verify password.
        let valid = password::verify_password(
            &input.password,
            &user.password_hash,
            self.config.pepper.as_deref(),
        )?;
        if !valid {
            return Err(AuthError::InvalidCredentials.into());
        }

        Ok(user)
    }

    /// Start the password-reset flow for the given email.
    pub async fn forgot_password(&self, email: &str) -> LeadHubResult<ForgotPasswordOutcome> {
        let user = match self.user_repo.get_by_email(email.trim()).await {
            Ok(u) => u,
            Err(LeadHubError::NotFound { .. }) => {
                return Ok(ForgotPasswordOutcome::UnknownEmail);
            }
            Err(e) => return Err(e),
        };

        if !user.is_active {
            return Ok(ForgotPasswordOutcome::Inactive);
        }

        let raw_token = reset::generate_reset_token();
        let token_hash = reset::hash_reset_token(&raw_token);
        let expires_at =
            Utc::now() + Duration::seconds(self.config.reset_token_lifetime_secs as i64);

        self.user_repo
            .set_reset_token(user.id, &token_hash, expires_at)
            .await?;

        Ok(ForgotPasswordOutcome::TokenIssued { user, raw_token })
    }

    /// Clear a previously issued reset token (email delivery failed).
    pub async fn abort_password_reset(&self, user: &User) -> LeadHubResult<()> {
        self.user_repo.clear_reset_token(user.id).await
    }

    /// Complete the password-reset flow: match the raw token against the
    /// stored hash (unexpired), set the new password and clear the token.
    pub async fn reset_password(&self, raw_token: &str, new_password: &str) -> LeadHubResult<User> {
        if new_password.len() < self.config.min_password_length {
            return Err(LeadHubError::Validation {
                message: format!(
                    "Password must be at least {} characters",
                    self.config.min_password_length
                ),
            });
        }

        let token_hash = reset::hash_reset_token(raw_token);
        let user = match self
            .user_repo
            .get_by_valid_reset_token(&token_hash, Utc::now())
            .await
        {
            Ok(u) => u,
            Err(LeadHubError::NotFound { .. }) => {
                return Err(AuthError::ResetTokenInvalid.into());
            }
            Err(e) => return Err(e),
        };

        self.user_repo.set_password(user.id, new_password).await?;
        self.user_repo.clear_reset_token(user.id).await?;

        self.user_repo.get_by_id(user.id).await
    }
}
