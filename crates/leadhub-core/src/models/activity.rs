//! Activity log domain model.
//!
//! The activity log is the system audit trail: append-only, never
//! updated or deleted by the application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogEntry {
    pub id: Uuid,
    /// The acting user.
    pub user: Uuid,
    /// Action tag, e.g. `CREATE_LEAD`, `IMPORT_LEADS`.
    pub action: String,
    /// Resource kind, e.g. `lead`, `user`.
    pub resource: String,
    pub resource_id: Option<Uuid>,
    pub details: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateActivityLogEntry {
    pub user: Uuid,
    pub action: String,
    pub resource: String,
    pub resource_id: Option<Uuid>,
    pub details: Option<String>,
    pub ip_address: Option<String>,
}

/// Query filters for activity log entries.
#[derive(Debug, Clone, Default)]
pub struct ActivityLogFilter {
    pub user: Option<Uuid>,
    pub resource: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}
