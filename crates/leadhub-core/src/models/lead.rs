//! Lead domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pipeline status of a lead.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Lost,
    Won,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 5] = [
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::Qualified,
        LeadStatus::Lost,
        LeadStatus::Won,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "New",
            LeadStatus::Contacted => "Contacted",
            LeadStatus::Qualified => "Qualified",
            LeadStatus::Lost => "Lost",
            LeadStatus::Won => "Won",
        }
    }

    pub fn parse(s: &str) -> Option<LeadStatus> {
        match s {
            "New" => Some(LeadStatus::New),
            "Contacted" => Some(LeadStatus::Contacted),
            "Qualified" => Some(LeadStatus::Qualified),
            "Lost" => Some(LeadStatus::Lost),
            "Won" => Some(LeadStatus::Won),
            _ => None,
        }
    }
}

impl Default for LeadStatus {
    fn default() -> Self {
        LeadStatus::New
    }
}

/// A note embedded in a lead's history. Mutable only by its creator;
/// deletable by the creator or any non-agent role.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub content: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    /// Stored lowercased and trimmed.
    pub email: String,
    pub phone: String,
    pub source: String,
    pub status: LeadStatus,
    pub tags: Vec<String>,
    pub notes: Vec<Note>,
    pub assigned_to: Option<Uuid>,
    /// Immutable after creation.
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateLead {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub source: String,
    pub status: LeadStatus,
    pub tags: Vec<String>,
    pub assigned_to: Option<Uuid>,
    pub created_by: Uuid,
}

/// `None` fields are left unchanged. Assignment can only be set, never
/// cleared; reassignment is restricted to admin roles at the call site.
#[derive(Debug, Clone, Default)]
pub struct UpdateLead {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub source: Option<String>,
    pub status: Option<LeadStatus>,
    pub tags: Option<Vec<String>>,
    pub assigned_to: Option<Uuid>,
}

/// Filters for listing and exporting leads. The role scope is applied
/// through `assigned_to` before the request-supplied filters.
#[derive(Debug, Clone, Default)]
pub struct LeadFilter {
    pub assigned_to: Option<Uuid>,
    pub status: Option<LeadStatus>,
    /// Matches leads carrying any of the given tags.
    pub tags: Option<Vec<String>>,
    pub source: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    /// Case-insensitive substring match over name, email and phone.
    pub search: Option<String>,
}

/// Whitelisted sort fields for lead listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadSortField {
    CreatedAt,
    UpdatedAt,
    Name,
    Status,
}

impl LeadSortField {
    pub fn parse(s: &str) -> Option<LeadSortField> {
        match s {
            "createdAt" => Some(LeadSortField::CreatedAt),
            "updatedAt" => Some(LeadSortField::UpdatedAt),
            "name" => Some(LeadSortField::Name),
            "status" => Some(LeadSortField::Status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LeadSort {
    pub field: LeadSortField,
    pub descending: bool,
}

impl Default for LeadSort {
    fn default() -> Self {
        Self {
            field: LeadSortField::CreatedAt,
            descending: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_roundtrip() {
        for status in LeadStatus::ALL {
            assert_eq!(LeadStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(LeadStatus::parse("won"), None);
        assert_eq!(LeadStatus::default(), LeadStatus::New);
    }

    #[test]
    fn status_serializes_capitalized() {
        assert_eq!(
            serde_json::to_value(LeadStatus::Contacted).unwrap(),
            "Contacted"
        );
    }

    #[test]
    fn lead_wire_form_is_camel_case() {
        let lead = Lead {
            id: Uuid::new_v4(),
            name: "Jane Roe".into(),
            email: "jane@example.com".into(),
            phone: "555-0100".into(),
            source: "Website".into(),
            status: LeadStatus::New,
            tags: vec!["hot".into()],
            notes: vec![],
            assigned_to: None,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&lead).unwrap();
        assert!(json.get("assignedTo").is_some());
        assert!(json.get("createdBy").is_some());
        assert!(json.get("created_by").is_none());
    }
}
