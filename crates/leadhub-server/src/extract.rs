//! Request authentication and role guards.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use leadhub_auth::token;
use leadhub_core::error::LeadHubError;
use leadhub_core::models::user::{Role, User};
use leadhub_core::repository::UserRepository;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated caller, loaded from the store on every request so
/// deactivation and role changes take effect immediately.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| ApiError::unauthorized("Not authorized to access this route"))?;

        let claims = token::validate_access_token(token, state.auth.config())
            .map_err(|e| ApiError::unauthorized(e.to_string()))?;

        let user_id = Uuid::parse_str(&claims.0.sub)
            .map_err(|_| ApiError::unauthorized("invalid token subject"))?;

        let user = match state.users.get_by_id(user_id).await {
            Ok(user) => user,
            Err(LeadHubError::NotFound { .. }) => {
                return Err(ApiError::unauthorized("Not authorized to access this route"));
            }
            Err(e) => return Err(e.into()),
        };

        if !user.is_active {
            return Err(ApiError::unauthorized(
                "Account is deactivated. Contact administrator.",
            ));
        }

        Ok(CurrentUser(user))
    }
}

/// Requester IP as reported by the reverse proxy, if any.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Admin roles only (superadmin or subadmin).
pub fn require_admin(user: &User) -> Result<(), ApiError> {
    match user.role {
        Role::Superadmin | Role::Subadmin => Ok(()),
        Role::Agent => Err(ApiError::forbidden(
            "Access denied. Admin privileges required.",
        )),
    }
}

/// Superadmin only.
pub fn require_superadmin(user: &User) -> Result<(), ApiError> {
    match user.role {
        Role::Superadmin => Ok(()),
        Role::Subadmin | Role::Agent => Err(ApiError::forbidden(
            "Access denied. Super Admin privileges required.",
        )),
    }
}
