//! HTTP error mapping: the core error taxonomy onto status codes and
//! the `{success: false, message}` envelope.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use leadhub_core::error::LeadHubError;
use serde_json::json;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

impl From<LeadHubError> for ApiError {
    fn from(err: LeadHubError) -> Self {
        match err {
            LeadHubError::NotFound { entity, .. } => {
                Self::not_found(format!("{} not found", capitalize(&entity)))
            }
            LeadHubError::AlreadyExists { entity } => {
                Self::validation(format!("{} already exists", capitalize(&entity)))
            }
            LeadHubError::AuthenticationFailed { reason } => Self::unauthorized(reason),
            LeadHubError::AuthorizationDenied { reason } => Self::forbidden(reason),
            LeadHubError::Validation { message } => Self::validation(message),
            LeadHubError::Email(_) => {
                Self::internal("Failed to send password reset email. Please try again later.")
            }
            LeadHubError::Database(msg)
            | LeadHubError::Crypto(msg)
            | LeadHubError::Internal(msg) => Self::internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "success": false,
            "message": self.message,
        }));
        (self.status, body).into_response()
    }
}
