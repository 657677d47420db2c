//! Lead CRUD, embedded notes, tags, and spreadsheet import/export.

use std::collections::HashMap;

use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use leadhub_core::error::LeadHubError;
use leadhub_core::models::activity::CreateActivityLogEntry;
use leadhub_core::models::lead::{
    CreateLead, Lead, LeadFilter, LeadSort, LeadSortField, LeadStatus, UpdateLead,
};
use leadhub_core::models::user::{Role, User};
use leadhub_core::repository::{LeadRepository, Pagination, UserRepository};
use leadhub_core::scope::LeadScope;
use leadhub_sheets::export::ExportUserRef;
use leadhub_sheets::{ImportReport, build_export_workbook, export_filename, import_rows, read_rows};

use crate::error::{ApiError, ApiResult};
use crate::extract::{CurrentUser, client_ip, require_admin};
use crate::response;
use crate::state::AppState;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Upload cap for spreadsheet imports.
const IMPORT_BODY_LIMIT: usize = 10 * 1024 * 1024;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_leads).post(create_lead))
        .route("/tags/all", get(all_tags))
        .route(
            "/import",
            post(import_leads).layer(DefaultBodyLimit::max(IMPORT_BODY_LIMIT)),
        )
        .route("/export", get(export_leads))
        .route("/{id}", get(get_lead).put(update_lead).delete(delete_lead))
        .route("/{id}/notes", post(add_note))
        .route("/{id}/notes/{note_id}", put(update_note).delete(delete_note))
}

fn record(
    state: &AppState,
    user: Uuid,
    action: &str,
    resource_id: Option<Uuid>,
    details: String,
    headers: &HeaderMap,
) {
    state.recorder.record(CreateActivityLogEntry {
        user,
        action: action.to_string(),
        resource: "lead".to_string(),
        resource_id,
        details: Some(details),
        ip_address: client_ip(headers),
    });
}

fn parse_date(raw: &str, field: &str) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
        .ok_or_else(|| ApiError::validation(format!("Invalid {field} date")))
}

fn parse_status(raw: &str) -> Result<LeadStatus, ApiError> {
    LeadStatus::parse(raw).ok_or_else(|| ApiError::validation("Invalid lead status"))
}

fn parse_uuid(raw: &str, field: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::validation(format!("Invalid {field}")))
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Ensure an agent only acts on a lead assigned to them. The refusal is
/// an authorization error, not a not-found.
fn check_scope(user: &User, lead: &Lead, denial: &str) -> Result<(), ApiError> {
    let scope = LeadScope::for_role(user.role, user.id);
    if scope.permits(lead) {
        Ok(())
    } else {
        Err(ApiError::forbidden(denial))
    }
}

// ---------------------------------------------------------------------------
// Listing & CRUD
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeadListQuery {
    status: Option<String>,
    tags: Option<String>,
    assigned_to: Option<String>,
    source: Option<String>,
    date_from: Option<String>,
    date_to: Option<String>,
    search: Option<String>,
    page: Option<u64>,
    limit: Option<u64>,
    sort_by: Option<String>,
    sort_order: Option<String>,
}

impl LeadListQuery {
    /// Build the effective store filter: the caller's role scope first,
    /// then the request-supplied filters. Agents cannot filter by an
    /// arbitrary assignee.
    fn to_filter(&self, user: &User) -> Result<LeadFilter, ApiError> {
        let scope = LeadScope::for_role(user.role, user.id);
        let assigned_to = match scope.assigned_filter() {
            Some(own) => Some(own),
            None => self
                .assigned_to
                .as_deref()
                .map(|v| parse_uuid(v, "assignedTo"))
                .transpose()?,
        };

        Ok(LeadFilter {
            assigned_to,
            status: self.status.as_deref().map(parse_status).transpose()?,
            tags: self.tags.as_deref().map(split_csv),
            source: self.source.clone(),
            date_from: self
                .date_from
                .as_deref()
                .map(|v| parse_date(v, "dateFrom"))
                .transpose()?,
            date_to: self
                .date_to
                .as_deref()
                .map(|v| parse_date(v, "dateTo"))
                .transpose()?,
            search: self.search.clone(),
        })
    }

    fn to_sort(&self) -> LeadSort {
        LeadSort {
            field: self
                .sort_by
                .as_deref()
                .and_then(LeadSortField::parse)
                .unwrap_or(LeadSortField::CreatedAt),
            descending: self.sort_order.as_deref() != Some("asc"),
        }
    }

    fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    fn limit(&self) -> u64 {
        self.limit.unwrap_or(10).clamp(1, 100)
    }
}

async fn list_leads(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<LeadListQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter = query.to_filter(&user)?;
    let (page, limit) = (query.page(), query.limit());

    let result = state
        .leads
        .list(
            filter,
            query.to_sort(),
            Pagination {
                offset: (page - 1) * limit,
                limit,
            },
        )
        .await?;

    Ok(response::paginated(result.items, result.total, page, limit))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateLeadBody {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    source: Option<String>,
    status: Option<String>,
    tags: Option<Vec<String>>,
    assigned_to: Option<String>,
}

async fn create_lead(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
    Json(body): Json<CreateLeadBody>,
) -> ApiResult<impl IntoResponse> {
    require_admin(&user)?;

    let (Some(name), Some(email), Some(phone), Some(source)) = (
        body.name.filter(|v| !v.trim().is_empty()),
        body.email.filter(|v| !v.trim().is_empty()),
        body.phone.filter(|v| !v.trim().is_empty()),
        body.source.filter(|v| !v.trim().is_empty()),
    ) else {
        return Err(ApiError::validation(
            "Please provide name, email, phone and source",
        ));
    };

    let lead = state
        .leads
        .create(CreateLead {
            name: name.clone(),
            email,
            phone,
            source,
            status: body
                .status
                .as_deref()
                .map(parse_status)
                .transpose()?
                .unwrap_or_default(),
            tags: body.tags.unwrap_or_default(),
            assigned_to: body
                .assigned_to
                .as_deref()
                .map(|v| parse_uuid(v, "assignedTo"))
                .transpose()?,
            created_by: user.id,
        })
        .await?;

    record(
        &state,
        user.id,
        "CREATE_LEAD",
        Some(lead.id),
        format!("Created lead: {name}"),
        &headers,
    );

    Ok((StatusCode::CREATED, response::data(lead)))
}

async fn get_lead(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let lead = state.leads.get_by_id(id).await?;
    check_scope(&user, &lead, "Not authorized to view this lead")?;
    Ok(response::data(lead))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateLeadBody {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    source: Option<String>,
    status: Option<String>,
    tags: Option<Vec<String>>,
    assigned_to: Option<String>,
}

async fn update_lead(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<UpdateLeadBody>,
) -> ApiResult<impl IntoResponse> {
    let lead = state.leads.get_by_id(id).await?;
    check_scope(&user, &lead, "Not authorized to update this lead")?;

    // Only admins can reassign leads.
    let assigned_to = match user.role {
        Role::Superadmin | Role::Subadmin => body
            .assigned_to
            .as_deref()
            .map(|v| parse_uuid(v, "assignedTo"))
            .transpose()?,
        Role::Agent => None,
    };

    let updated = state
        .leads
        .update(
            id,
            UpdateLead {
                name: body.name,
                email: body.email,
                phone: body.phone,
                source: body.source,
                status: body.status.as_deref().map(parse_status).transpose()?,
                tags: body.tags,
                assigned_to,
            },
        )
        .await?;

    record(
        &state,
        user.id,
        "UPDATE_LEAD",
        Some(updated.id),
        format!("Updated lead: {}", updated.name),
        &headers,
    );

    Ok(response::data(updated))
}

async fn delete_lead(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    require_admin(&user)?;

    let lead = state.leads.get_by_id(id).await?;
    state.leads.delete(id).await?;

    record(
        &state,
        user.id,
        "DELETE_LEAD",
        Some(lead.id),
        format!("Deleted lead: {}", lead.name),
        &headers,
    );

    Ok(response::message("Lead deleted successfully"))
}

async fn all_tags(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> ApiResult<impl IntoResponse> {
    let tags = state.leads.distinct_tags().await?;
    Ok(response::counted(tags))
}

// ---------------------------------------------------------------------------
// Notes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct NoteBody {
    content: Option<String>,
}

async fn add_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<NoteBody>,
) -> ApiResult<impl IntoResponse> {
    let Some(content) = body.content.filter(|c| !c.trim().is_empty()) else {
        return Err(ApiError::validation("Note content is required"));
    };

    let lead = state.leads.get_by_id(id).await?;
    check_scope(&user, &lead, "Not authorized to add notes to this lead")?;

    let updated = state.leads.add_note(id, content, user.id).await?;

    record(
        &state,
        user.id,
        "ADD_NOTE",
        Some(updated.id),
        format!("Added note to lead: {}", updated.name),
        &headers,
    );

    Ok(response::data(updated))
}

async fn update_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, note_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<NoteBody>,
) -> ApiResult<impl IntoResponse> {
    let Some(content) = body.content.filter(|c| !c.trim().is_empty()) else {
        return Err(ApiError::validation("Note content is required"));
    };

    let lead = state.leads.get_by_id(id).await?;
    let note = lead
        .notes
        .iter()
        .find(|n| n.id == note_id)
        .ok_or_else(|| ApiError::not_found("Note not found"))?;

    // Only the creator can update the note.
    if note.created_by != user.id {
        return Err(ApiError::forbidden("Not authorized to update this note"));
    }

    let updated = state.leads.update_note(id, note_id, content).await?;
    Ok(response::data(updated))
}

async fn delete_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, note_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<impl IntoResponse> {
    let lead = state.leads.get_by_id(id).await?;
    let note = lead
        .notes
        .iter()
        .find(|n| n.id == note_id)
        .ok_or_else(|| ApiError::not_found("Note not found"))?;

    // Deletable by the creator or any non-agent role.
    let allowed = note.created_by == user.id
        || match user.role {
            Role::Superadmin | Role::Subadmin => true,
            Role::Agent => false,
        };
    if !allowed {
        return Err(ApiError::forbidden("Not authorized to delete this note"));
    }

    state.leads.delete_note(id, note_id).await?;
    Ok(response::message("Note deleted successfully"))
}

// ---------------------------------------------------------------------------
// Import / export
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportResponseBody {
    success: bool,
    message: String,
    #[serde(flatten)]
    report: ImportReport,
}

async fn import_leads(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    require_admin(&user)?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Invalid upload: {e}")))?
    {
        if field.name() == Some("file") {
            upload = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation(format!("Invalid upload: {e}")))?,
            );
            break;
        }
    }
    let Some(bytes) = upload else {
        return Err(ApiError::validation("No file uploaded"));
    };

    // The uploaded artifact lives in a scoped temp file: removed when
    // this handler returns, on success and failure alike.
    let tmp = tempfile::NamedTempFile::with_suffix(".xlsx")
        .map_err(|e| ApiError::internal(format!("temp file: {e}")))?;
    std::fs::write(tmp.path(), &bytes)
        .map_err(|e| ApiError::internal(format!("temp file: {e}")))?;

    let rows = read_rows(tmp.path()).map_err(LeadHubError::from)?;

    let report = import_rows(&state.users, &state.leads, rows, user.id).await?;

    // One audit entry for the whole batch, not one per row.
    record(
        &state,
        user.id,
        "IMPORT_LEADS",
        None,
        format!(
            "Imported {} leads successfully, {} failed",
            report.success_count, report.error_count
        ),
        &headers,
    );

    let message = format!(
        "Import completed. {} leads imported successfully, {} failed.",
        report.success_count, report.error_count
    );
    Ok(Json(ImportResponseBody {
        success: true,
        message,
        report,
    }))
}

async fn export_leads(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<LeadListQuery>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let filter = query.to_filter(&user)?;
    let leads = state.leads.list_all(filter).await?;

    // Resolve assignee/creator references to display fields.
    let mut user_refs: HashMap<Uuid, ExportUserRef> = HashMap::new();
    for lead in &leads {
        for id in [lead.assigned_to, Some(lead.created_by)].into_iter().flatten() {
            if user_refs.contains_key(&id) {
                continue;
            }
            match state.users.get_by_id(id).await {
                Ok(u) => {
                    user_refs.insert(
                        id,
                        ExportUserRef {
                            name: u.name,
                            email: u.email,
                        },
                    );
                }
                Err(LeadHubError::NotFound { .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    let bytes = build_export_workbook(&leads, &user_refs).map_err(LeadHubError::from)?;

    record(
        &state,
        user.id,
        "EXPORT_LEADS",
        None,
        format!("Exported {} leads", leads.len()),
        &headers,
    );

    let filename = export_filename(Utc::now());
    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={filename}"),
            ),
        ],
        bytes,
    ))
}
