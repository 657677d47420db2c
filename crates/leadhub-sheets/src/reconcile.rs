//! The batch reconciler: row-by-row validation, duplicate detection and
//! insertion with partial-success reporting.
//!
//! Rows are processed sequentially — each duplicate check must observe
//! the inserts of earlier rows in the same batch, otherwise two
//! occurrences of one lead in a single upload would both be created.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use uuid::Uuid;

use leadhub_core::error::{LeadHubError, LeadHubResult};
use leadhub_core::models::lead::{CreateLead, Lead, LeadStatus};
use leadhub_core::repository::{LeadRepository, UserRepository};

use crate::error::SheetError;
use crate::parse::SheetRow;

/// Spreadsheet rows are reported 1-indexed with the header on row 1,
/// so the first data row is row 2.
const HEADER_ROW_OFFSET: usize = 2;

/// Default source for imported rows that carry none.
const IMPORT_SOURCE: &str = "Import";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowErrorKind {
    MissingFields,
    DuplicateLead,
    /// Unexpected per-row failure (e.g. a store write error).
    Store(String),
}

impl std::fmt::Display for RowErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowErrorKind::MissingFields => {
                write!(f, "Missing required fields (name, email, phone)")
            }
            RowErrorKind::DuplicateLead => {
                write!(f, "Lead already exists with this email or phone")
            }
            RowErrorKind::Store(msg) => write!(f, "{msg}"),
        }
    }
}

impl Serialize for RowErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One failed row: its 1-indexed spreadsheet row number, the error, and
/// the offending data echoed back.
#[derive(Debug, Clone, Serialize)]
pub struct RowError {
    pub row: usize,
    pub error: RowErrorKind,
    pub data: BTreeMap<String, String>,
}

/// The partial-success report of a batch import.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub success_count: usize,
    pub error_count: usize,
    pub leads: Vec<Lead>,
    pub errors: Vec<RowError>,
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Reconcile parsed rows against the store.
///
/// Never fails atomically for partial bad data: each bad row becomes an
/// error entry and processing continues. A completely empty table is
/// rejected wholesale before any row work.
pub async fn import_rows<U, L>(
    users: &U,
    leads: &L,
    rows: Vec<SheetRow>,
    created_by: Uuid,
) -> LeadHubResult<ImportReport>
where
    U: UserRepository,
    L: LeadRepository,
{
    if rows.is_empty() {
        return Err(SheetError::EmptyBatch.into());
    }

    let mut created = Vec::new();
    let mut errors = Vec::new();

    for (index, row) in rows.into_iter().enumerate() {
        let row_number = index + HEADER_ROW_OFFSET;

        match reconcile_row(users, leads, &row, created_by).await {
            Ok(lead) => created.push(lead),
            Err(error) => errors.push(RowError {
                row: row_number,
                error,
                data: row.fields().clone(),
            }),
        }
    }

    Ok(ImportReport {
        success_count: created.len(),
        error_count: errors.len(),
        leads: created,
        errors,
    })
}

/// Validate, deduplicate, normalize and insert a single row.
async fn reconcile_row<U, L>(
    users: &U,
    leads: &L,
    row: &SheetRow,
    created_by: Uuid,
) -> Result<Lead, RowErrorKind>
where
    U: UserRepository,
    L: LeadRepository,
{
    // 1. Required fields.
    let (Some(name), Some(email), Some(phone)) =
        (row.get("name"), row.get("email"), row.get("phone"))
    else {
        return Err(RowErrorKind::MissingFields);
    };

    let email = email.trim().to_lowercase();
    let phone = phone.trim().to_string();

    // 2. Duplicate check against the store (which has already seen the
    //    earlier rows of this batch).
    match leads.find_duplicate(&email, &phone).await {
        Ok(Some(_)) => return Err(RowErrorKind::DuplicateLead),
        Ok(None) => {}
        Err(e) => return Err(RowErrorKind::Store(e.to_string())),
    }

    // 3. Normalization and defaults.
    let source = row.get("source").unwrap_or(IMPORT_SOURCE).to_string();
    let status = row
        .get("status")
        .and_then(LeadStatus::parse)
        .unwrap_or_default();
    let tags = row.get("tags").map(split_tags).unwrap_or_default();

    // 4. Optional assignment: resolves only to an active agent's email,
    //    otherwise the lead stays unassigned.
    let assigned_to = match row.get("assignedto") {
        Some(agent_email) => match users.find_active_agent_by_email(agent_email).await {
            Ok(agent) => agent.map(|a| a.id),
            Err(e) => return Err(RowErrorKind::Store(e.to_string())),
        },
        None => None,
    };

    leads
        .create(CreateLead {
            name: name.to_string(),
            email,
            phone,
            source,
            status,
            tags,
            assigned_to,
            created_by,
        })
        .await
        .map_err(|e: LeadHubError| RowErrorKind::Store(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_split_and_trim() {
        assert_eq!(
            split_tags("hot, priority ,  q3"),
            vec!["hot".to_string(), "priority".into(), "q3".into()]
        );
        assert_eq!(split_tags(" , "), Vec::<String>::new());
    }

    #[test]
    fn row_error_serializes_as_message() {
        let json = serde_json::to_value(RowErrorKind::DuplicateLead).unwrap();
        assert_eq!(json, "Lead already exists with this email or phone");
    }
}
