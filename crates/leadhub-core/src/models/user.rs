//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closed set of roles. Every authorization decision matches on this
/// enum exhaustively — no string comparison.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Superadmin,
    Subadmin,
    Agent,
}

impl Role {
    /// Admins are superadmins and subadmins.
    pub fn is_admin(&self) -> bool {
        match self {
            Role::Superadmin | Role::Subadmin => true,
            Role::Agent => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Superadmin => "superadmin",
            Role::Subadmin => "subadmin",
            Role::Agent => "agent",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "superadmin" => Some(Role::Superadmin),
            "subadmin" => Some(Role::Subadmin),
            "agent" => Some(Role::Agent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Unique, stored lowercased and trimmed.
    pub email: String,
    /// Argon2id PHC string. Never serialized to clients — use
    /// [`User::to_public`] for wire responses.
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    /// Absent for the self-seeded first superadmin.
    pub created_by: Option<Uuid>,
    /// SHA-256 hex of the raw reset token; set only during the reset flow.
    pub reset_token_hash: Option<String>,
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn to_public(&self) -> UserPublic {
        UserPublic {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            is_active: self.is_active,
            created_by: self.created_by,
            created_at: self.created_at,
        }
    }
}

/// Client-facing view of a user. Credential and reset fields are
/// deliberately absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPublic {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    /// Raw password (hashed with Argon2id before storage).
    pub password: String,
    pub role: Role,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

/// Filters for listing users.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    /// Case-insensitive substring match over name and email.
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_roundtrip() {
        for role in [Role::Superadmin, Role::Subadmin, Role::Agent] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("admin"), None);
    }

    #[test]
    fn admin_roles() {
        assert!(Role::Superadmin.is_admin());
        assert!(Role::Subadmin.is_admin());
        assert!(!Role::Agent.is_admin());
    }

    #[test]
    fn public_view_has_no_credentials() {
        let json = serde_json::to_value(
            User {
                id: Uuid::new_v4(),
                name: "Alice".into(),
                email: "alice@example.com".into(),
                password_hash: "$argon2id$...".into(),
                role: Role::Agent,
                is_active: true,
                created_by: None,
                reset_token_hash: None,
                reset_token_expires_at: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }
            .to_public(),
        )
        .unwrap();

        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert!(json.get("resetTokenHash").is_none());
        assert_eq!(json["role"], "agent");
        assert_eq!(json["isActive"], true);
    }
}
