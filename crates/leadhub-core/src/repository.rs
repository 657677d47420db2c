//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. The store itself is treated as
//! a black box supporting filtered find, sort, pagination and grouping;
//! role scoping is expressed through [`LeadScope`] and
//! [`LeadFilter`] before any query runs.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::analytics::{DateCount, MonthCount, SourceCount, StatusCounts, TagCount};
use crate::error::LeadHubResult;
use crate::models::{
    activity::{ActivityLogEntry, ActivityLogFilter, CreateActivityLogEntry},
    lead::{CreateLead, Lead, LeadFilter, LeadSort, UpdateLead},
    user::{CreateUser, Role, UpdateUser, User, UserFilter},
};
use crate::scope::LeadScope;

/// Pagination parameters for list queries.
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 10,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    /// Create a user. The raw password is hashed before storage and the
    /// email is lowercased and trimmed.
    fn create(&self, input: CreateUser) -> impl Future<Output = LeadHubResult<User>> + Send;

    /// Total number of user records (used to self-seed the first
    /// superadmin).
    fn count(&self) -> impl Future<Output = LeadHubResult<u64>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = LeadHubResult<User>> + Send;

    /// Lookup by email (case-insensitive).
    fn get_by_email(&self, email: &str) -> impl Future<Output = LeadHubResult<User>> + Send;

    /// Lookup an active user with role `agent` by email. Returns `None`
    /// when no such agent exists — used by the import assignment
    /// resolution, which falls back silently.
    fn find_active_agent_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = LeadHubResult<Option<User>>> + Send;

    fn update(
        &self,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = LeadHubResult<User>> + Send;

    /// Replace the password (re-hashed) and bump `updated_at`.
    fn set_password(
        &self,
        id: Uuid,
        password: &str,
    ) -> impl Future<Output = LeadHubResult<()>> + Send;

    fn set_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> impl Future<Output = LeadHubResult<()>> + Send;

    fn clear_reset_token(&self, id: Uuid) -> impl Future<Output = LeadHubResult<()>> + Send;

    /// Lookup by stored reset-token hash, requiring the expiry to be
    /// after `now`.
    fn get_by_valid_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> impl Future<Output = LeadHubResult<User>> + Send;

    /// Hard delete. Leads referencing the user keep their dangling
    /// references.
    fn delete(&self, id: Uuid) -> impl Future<Output = LeadHubResult<()>> + Send;

    fn list(&self, filter: UserFilter) -> impl Future<Output = LeadHubResult<Vec<User>>> + Send;

    fn count_active(&self) -> impl Future<Output = LeadHubResult<u64>> + Send;

    fn counts_by_role(&self) -> impl Future<Output = LeadHubResult<Vec<(Role, u64)>>> + Send;
}

// ---------------------------------------------------------------------------
// Leads
// ---------------------------------------------------------------------------

pub trait LeadRepository: Send + Sync {
    fn create(&self, input: CreateLead) -> impl Future<Output = LeadHubResult<Lead>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = LeadHubResult<Lead>> + Send;

    fn update(
        &self,
        id: Uuid,
        input: UpdateLead,
    ) -> impl Future<Output = LeadHubResult<Lead>> + Send;

    /// Hard delete.
    fn delete(&self, id: Uuid) -> impl Future<Output = LeadHubResult<()>> + Send;

    fn list(
        &self,
        filter: LeadFilter,
        sort: LeadSort,
        pagination: Pagination,
    ) -> impl Future<Output = LeadHubResult<PaginatedResult<Lead>>> + Send;

    /// Unpaginated filtered listing, newest first (export path).
    fn list_all(&self, filter: LeadFilter) -> impl Future<Output = LeadHubResult<Vec<Lead>>> + Send;

    /// Find an existing lead whose email (case-insensitive) or phone
    /// matches — the duplicate probe of the batch reconciler.
    fn find_duplicate(
        &self,
        email: &str,
        phone: &str,
    ) -> impl Future<Output = LeadHubResult<Option<Lead>>> + Send;

    /// Distinct tag values across all leads.
    fn distinct_tags(&self) -> impl Future<Output = LeadHubResult<Vec<String>>> + Send;

    fn add_note(
        &self,
        lead_id: Uuid,
        content: String,
        created_by: Uuid,
    ) -> impl Future<Output = LeadHubResult<Lead>> + Send;

    fn update_note(
        &self,
        lead_id: Uuid,
        note_id: Uuid,
        content: String,
    ) -> impl Future<Output = LeadHubResult<Lead>> + Send;

    fn delete_note(
        &self,
        lead_id: Uuid,
        note_id: Uuid,
    ) -> impl Future<Output = LeadHubResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Audit (append-only)
// ---------------------------------------------------------------------------

pub trait ActivityLogRepository: Send + Sync {
    /// Append a new entry. No update or delete operations exist.
    fn append(
        &self,
        input: CreateActivityLogEntry,
    ) -> impl Future<Output = LeadHubResult<ActivityLogEntry>> + Send;

    fn list(
        &self,
        filter: ActivityLogFilter,
        pagination: Pagination,
    ) -> impl Future<Output = LeadHubResult<PaginatedResult<ActivityLogEntry>>> + Send;
}

// ---------------------------------------------------------------------------
// Analytics (read-only aggregations, always role-scoped)
// ---------------------------------------------------------------------------

pub trait AnalyticsRepository: Send + Sync {
    fn count_leads(&self, scope: LeadScope) -> impl Future<Output = LeadHubResult<u64>> + Send;

    fn status_counts(
        &self,
        scope: LeadScope,
    ) -> impl Future<Output = LeadHubResult<StatusCounts>> + Send;

    fn count_created_since(
        &self,
        scope: LeadScope,
        since: DateTime<Utc>,
    ) -> impl Future<Output = LeadHubResult<u64>> + Send;

    /// Lead counts per source, most frequent first.
    fn source_counts(
        &self,
        scope: LeadScope,
        limit: usize,
    ) -> impl Future<Output = LeadHubResult<Vec<SourceCount>>> + Send;

    /// Daily creation counts since the given instant, ascending by day.
    fn daily_counts(
        &self,
        scope: LeadScope,
        since: DateTime<Utc>,
    ) -> impl Future<Output = LeadHubResult<Vec<DateCount>>> + Send;

    /// Monthly creation counts (with Won counts) since the given
    /// instant, ascending by month.
    fn monthly_counts(
        &self,
        scope: LeadScope,
        since: DateTime<Utc>,
    ) -> impl Future<Output = LeadHubResult<Vec<MonthCount>>> + Send;

    /// Most frequent tags, descending by count.
    fn top_tags(
        &self,
        scope: LeadScope,
        limit: usize,
    ) -> impl Future<Output = LeadHubResult<Vec<TagCount>>> + Send;
}
