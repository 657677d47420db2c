//! Authentication endpoints.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use leadhub_auth::{ForgotPasswordOutcome, LoginInput, RegisterInput};
use leadhub_core::error::LeadHubError;
use leadhub_core::models::activity::CreateActivityLogEntry;
use leadhub_core::models::user::{Role, User};

use crate::error::{ApiError, ApiResult};
use crate::extract::{CurrentUser, client_ip};
use crate::response;
use crate::state::AppState;

/// Generic forgot-password reply — identical whether or not the email
/// exists, so account existence is never leaked.
const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account with that email exists, a password reset link has been sent";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/logout", post(logout))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password/{token}", post(reset_password))
}

/// Identity + bearer token returned by register/login/reset.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthUserBody {
    id: Uuid,
    name: String,
    email: String,
    role: Role,
    token: String,
}

impl AuthUserBody {
    fn new(user: &User, token: String) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            token,
        }
    }
}

fn record(state: &AppState, user: Uuid, action: &str, details: &str, headers: &HeaderMap) {
    state.recorder.record(CreateActivityLogEntry {
        user,
        action: action.to_string(),
        resource: "user".to_string(),
        resource_id: Some(user),
        details: Some(details.to_string()),
        ip_address: client_ip(headers),
    });
}

#[derive(Debug, Deserialize)]
struct RegisterBody {
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    role: Option<String>,
}

async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RegisterBody>,
) -> ApiResult<impl IntoResponse> {
    let role = body
        .role
        .as_deref()
        .map(|r| Role::parse(r).ok_or_else(|| ApiError::validation("Invalid role")))
        .transpose()?;

    let user = state
        .auth
        .register(RegisterInput {
            name: body.name.unwrap_or_default(),
            email: body.email.unwrap_or_default(),
            password: body.password.unwrap_or_default(),
            role,
        })
        .await
        .map_err(|e| match e {
            LeadHubError::AlreadyExists { .. } => ApiError::validation("User already exists"),
            other => other.into(),
        })?;

    record(&state, user.id, "REGISTER", "Account registered", &headers);

    let token = state.auth.issue_token(&user)?;
    Ok((
        StatusCode::CREATED,
        response::data(AuthUserBody::new(&user, token)),
    ))
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    email: Option<String>,
    password: Option<String>,
}

async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LoginBody>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .auth
        .login(LoginInput {
            email: body.email.unwrap_or_default(),
            password: body.password.unwrap_or_default(),
        })
        .await
        .map_err(|e| match e {
            // Unknown email and wrong password read identically.
            LeadHubError::AuthenticationFailed { reason } => {
                if reason.contains("deactivated") {
                    ApiError::unauthorized("Account is deactivated. Contact administrator.")
                } else {
                    ApiError::unauthorized("Invalid credentials")
                }
            }
            other => other.into(),
        })?;

    record(&state, user.id, "LOGIN", "User logged in", &headers);

    let token = state.auth.issue_token(&user)?;
    Ok(response::data(AuthUserBody::new(&user, token)))
}

async fn me(CurrentUser(user): CurrentUser) -> ApiResult<impl IntoResponse> {
    Ok(response::data(user.to_public()))
}

async fn logout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    record(&state, user.id, "LOGOUT", "User logged out", &headers);
    Ok(response::message("Logged out successfully"))
}

#[derive(Debug, Deserialize)]
struct ForgotPasswordBody {
    email: Option<String>,
}

async fn forgot_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ForgotPasswordBody>,
) -> ApiResult<impl IntoResponse> {
    let Some(email) = body.email.filter(|e| !e.trim().is_empty()) else {
        return Err(ApiError::validation("Email is required"));
    };

    match state.auth.forgot_password(&email).await? {
        ForgotPasswordOutcome::UnknownEmail => Ok(response::message(FORGOT_PASSWORD_MESSAGE)),
        ForgotPasswordOutcome::Inactive => Err(ApiError::forbidden(
            "Account is deactivated. Please contact administrator.",
        )),
        ForgotPasswordOutcome::TokenIssued { user, raw_token } => {
            let sent = match &state.mailer {
                Some(mailer) => mailer.send_password_reset(&user.email, &raw_token).await,
                None => {
                    // No SMTP transport configured: surface the link in
                    // the logs so development flows still work.
                    info!(
                        email = %user.email,
                        url = %format!("{}/reset-password/{raw_token}", state.frontend_url),
                        "SMTP not configured; password reset link logged"
                    );
                    Ok(())
                }
            };

            match sent {
                Ok(()) => {
                    record(
                        &state,
                        user.id,
                        "FORGOT_PASSWORD",
                        "Password reset email sent",
                        &headers,
                    );
                    Ok(response::message(FORGOT_PASSWORD_MESSAGE))
                }
                Err(err) => {
                    // The issued token must not stay valid when the
                    // email never went out.
                    if let Err(clear_err) = state.auth.abort_password_reset(&user).await {
                        warn!(error = %clear_err, "Failed to clear reset token");
                    }
                    warn!(error = %err, "Password reset email failed");
                    Err(ApiError::internal(
                        "Failed to send password reset email. Please try again later.",
                    ))
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResetPasswordBody {
    password: Option<String>,
}

async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    headers: HeaderMap,
    Json(body): Json<ResetPasswordBody>,
) -> ApiResult<impl IntoResponse> {
    let Some(password) = body.password.filter(|p| !p.is_empty()) else {
        return Err(ApiError::validation("Password is required"));
    };

    let user = state.auth.reset_password(&token, &password).await?;

    record(
        &state,
        user.id,
        "RESET_PASSWORD",
        "Password reset successfully",
        &headers,
    );

    let bearer = state.auth.issue_token(&user)?;
    Ok(response::data_with_message(
        AuthUserBody::new(&user, bearer),
        "Password reset successful",
    ))
}
