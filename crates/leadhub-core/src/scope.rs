//! The role filter: derives the query scope restricting which leads a
//! caller can see or mutate.
//!
//! Pure predicate construction — no side effects. The store layer
//! consumes the scope when building filters, and handlers use
//! [`LeadScope::permits`] for point authorization checks.

use uuid::Uuid;

use crate::models::lead::Lead;
use crate::models::user::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadScope {
    /// Unrestricted visibility (admin roles).
    All,
    /// Restricted to leads assigned to the given user (agents).
    AssignedTo(Uuid),
}

impl LeadScope {
    pub fn for_role(role: Role, caller_id: Uuid) -> LeadScope {
        match role {
            Role::Superadmin | Role::Subadmin => LeadScope::All,
            Role::Agent => LeadScope::AssignedTo(caller_id),
        }
    }

    /// Whether the caller may act on this lead.
    ///
    /// An unassigned lead is visible to admins only: the equality check
    /// never matches for agents.
    pub fn permits(&self, lead: &Lead) -> bool {
        match self {
            LeadScope::All => true,
            LeadScope::AssignedTo(caller) => lead.assigned_to == Some(*caller),
        }
    }

    /// The assignee restriction to fold into a store filter, if any.
    pub fn assigned_filter(&self) -> Option<Uuid> {
        match self {
            LeadScope::All => None,
            LeadScope::AssignedTo(caller) => Some(*caller),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::lead::LeadStatus;
    use chrono::Utc;

    fn lead_assigned_to(assigned_to: Option<Uuid>) -> Lead {
        Lead {
            id: Uuid::new_v4(),
            name: "Test".into(),
            email: "test@example.com".into(),
            phone: "555-0100".into(),
            source: "Website".into(),
            status: LeadStatus::New,
            tags: vec![],
            notes: vec![],
            assigned_to,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn admins_are_unrestricted() {
        let caller = Uuid::new_v4();
        for role in [Role::Superadmin, Role::Subadmin] {
            let scope = LeadScope::for_role(role, caller);
            assert_eq!(scope, LeadScope::All);
            assert!(scope.permits(&lead_assigned_to(None)));
            assert!(scope.permits(&lead_assigned_to(Some(Uuid::new_v4()))));
            assert_eq!(scope.assigned_filter(), None);
        }
    }

    #[test]
    fn agent_sees_only_own_leads() {
        let caller = Uuid::new_v4();
        let scope = LeadScope::for_role(Role::Agent, caller);
        assert_eq!(scope.assigned_filter(), Some(caller));

        assert!(scope.permits(&lead_assigned_to(Some(caller))));
        assert!(!scope.permits(&lead_assigned_to(Some(Uuid::new_v4()))));
    }

    #[test]
    fn agent_never_sees_unassigned_leads() {
        let scope = LeadScope::for_role(Role::Agent, Uuid::new_v4());
        assert!(!scope.permits(&lead_assigned_to(None)));
    }
}
