//! User management — superadmin only.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use leadhub_core::error::LeadHubError;
use leadhub_core::models::activity::{ActivityLogFilter, CreateActivityLogEntry};
use leadhub_core::models::user::{CreateUser, Role, UpdateUser, UserFilter, UserPublic};
use leadhub_core::repository::{ActivityLogRepository, Pagination, UserRepository};

use crate::error::{ApiError, ApiResult};
use crate::extract::{CurrentUser, client_ip, require_superadmin};
use crate::response;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
        .route("/{id}/activity", get(user_activity))
}

fn record(
    state: &AppState,
    actor: Uuid,
    action: &str,
    resource_id: Uuid,
    details: String,
    headers: &HeaderMap,
) {
    state.recorder.record(CreateActivityLogEntry {
        user: actor,
        action: action.to_string(),
        resource: "user".to_string(),
        resource_id: Some(resource_id),
        details: Some(details),
        ip_address: client_ip(headers),
    });
}

/// Only subadmin and agent accounts can be provisioned; superadmins are
/// self-seeded at registration.
fn parse_managed_role(raw: &str) -> Result<Role, ApiError> {
    match Role::parse(raw) {
        Some(Role::Subadmin) => Ok(Role::Subadmin),
        Some(Role::Agent) => Ok(Role::Agent),
        _ => Err(ApiError::validation(
            "Invalid role. Can only create subadmin or agent.",
        )),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserListQuery {
    role: Option<String>,
    is_active: Option<String>,
    search: Option<String>,
}

async fn list_users(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<UserListQuery>,
) -> ApiResult<impl IntoResponse> {
    require_superadmin(&user)?;

    let filter = UserFilter {
        role: query
            .role
            .as_deref()
            .map(|r| Role::parse(r).ok_or_else(|| ApiError::validation("Invalid role")))
            .transpose()?,
        is_active: query.is_active.as_deref().map(|v| v == "true"),
        search: query.search,
    };

    let users = state.users.list(filter).await?;
    let users: Vec<UserPublic> = users.iter().map(|u| u.to_public()).collect();
    Ok(response::counted(users))
}

async fn get_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    require_superadmin(&user)?;
    let target = state.users.get_by_id(id).await?;
    Ok(response::data(target.to_public()))
}

#[derive(Debug, Deserialize)]
struct CreateUserBody {
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    role: Option<String>,
}

async fn create_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
    Json(body): Json<CreateUserBody>,
) -> ApiResult<impl IntoResponse> {
    require_superadmin(&user)?;

    let role = parse_managed_role(body.role.as_deref().unwrap_or_default())?;

    let (Some(name), Some(email), Some(password)) = (
        body.name.filter(|v| !v.trim().is_empty()),
        body.email.filter(|v| !v.trim().is_empty()),
        body.password.filter(|v| !v.is_empty()),
    ) else {
        return Err(ApiError::validation(
            "Please provide name, email and password",
        ));
    };

    let min_len = state.auth.config().min_password_length;
    if password.len() < min_len {
        return Err(ApiError::validation(format!(
            "Password must be at least {min_len} characters"
        )));
    }

    // Duplicate email check before any mutation.
    match state.users.get_by_email(&email).await {
        Ok(_) => {
            return Err(ApiError::validation("User with this email already exists"));
        }
        Err(LeadHubError::NotFound { .. }) => {}
        Err(e) => return Err(e.into()),
    }

    let created = state
        .users
        .create(CreateUser {
            name: name.clone(),
            email,
            password,
            role,
            created_by: Some(user.id),
        })
        .await?;

    record(
        &state,
        user.id,
        "CREATE_USER",
        created.id,
        format!("Created {}: {}", role.as_str(), name),
        &headers,
    );

    Ok((StatusCode::CREATED, response::data(created.to_public())))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateUserBody {
    name: Option<String>,
    email: Option<String>,
    role: Option<String>,
    is_active: Option<bool>,
}

async fn update_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<UpdateUserBody>,
) -> ApiResult<impl IntoResponse> {
    require_superadmin(&user)?;

    let target = state.users.get_by_id(id).await?;

    // A superadmin account can only be edited by itself — another
    // superadmin still gets the authorization error.
    if target.role == Role::Superadmin && target.id != user.id {
        return Err(ApiError::forbidden("Cannot update super admin account"));
    }

    // Role changes are limited to managed roles; anything else is
    // ignored rather than applied.
    let role = body.role.as_deref().and_then(|r| match Role::parse(r) {
        Some(Role::Subadmin) => Some(Role::Subadmin),
        Some(Role::Agent) => Some(Role::Agent),
        _ => None,
    });

    let updated = state
        .users
        .update(
            id,
            UpdateUser {
                name: body.name,
                email: body.email,
                role,
                is_active: body.is_active,
            },
        )
        .await?;

    record(
        &state,
        user.id,
        "UPDATE_USER",
        updated.id,
        format!("Updated user: {}", updated.name),
        &headers,
    );

    Ok(response::data(updated.to_public()))
}

async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    require_superadmin(&user)?;

    let target = state.users.get_by_id(id).await?;

    // Superadmin accounts can never be deleted.
    if target.role == Role::Superadmin {
        return Err(ApiError::forbidden("Cannot delete super admin account"));
    }

    state.users.delete(id).await?;

    record(
        &state,
        user.id,
        "DELETE_USER",
        target.id,
        format!("Deleted user: {}", target.name),
        &headers,
    );

    Ok(response::message("User deleted successfully"))
}

#[derive(Debug, Default, Deserialize)]
struct ActivityQuery {
    limit: Option<u64>,
    page: Option<u64>,
}

async fn user_activity(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Query(query): Query<ActivityQuery>,
) -> ApiResult<impl IntoResponse> {
    require_superadmin(&user)?;

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(50).clamp(1, 200);

    let result = state
        .activity
        .list(
            ActivityLogFilter {
                user: Some(id),
                ..Default::default()
            },
            Pagination {
                offset: (page - 1) * limit,
                limit,
            },
        )
        .await?;

    Ok(response::paginated(result.items, result.total, page, limit))
}
