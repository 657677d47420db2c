//! SurrealDB implementation of [`ActivityLogRepository`].
//!
//! Append-only by construction: no update or delete methods exist, and
//! the schema denies UPDATE/DELETE on the table.

use chrono::{DateTime, Utc};
use leadhub_core::error::LeadHubResult;
use leadhub_core::models::activity::{
    ActivityLogEntry, ActivityLogFilter, CreateActivityLogEntry,
};
use leadhub_core::repository::{ActivityLogRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ActivityRow {
    user: String,
    action: String,
    resource: String,
    resource_id: Option<String>,
    details: Option<String>,
    ip_address: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ActivityRowWithId {
    record_id: String,
    user: String,
    action: String,
    resource: String,
    resource_id: Option<String>,
    details: Option<String>,
    ip_address: Option<String>,
    created_at: DateTime<Utc>,
}

fn parse_uuid(s: &str, field: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(s).map_err(|e| DbError::Query(format!("invalid {field} UUID: {e}")))
}

impl ActivityRow {
    fn into_entry(self, id: Uuid) -> Result<ActivityLogEntry, DbError> {
        Ok(ActivityLogEntry {
            id,
            user: parse_uuid(&self.user, "user")?,
            action: self.action,
            resource: self.resource,
            resource_id: self
                .resource_id
                .map(|v| parse_uuid(&v, "resource_id"))
                .transpose()?,
            details: self.details,
            ip_address: self.ip_address,
            created_at: self.created_at,
        })
    }
}

impl ActivityRowWithId {
    fn try_into_entry(self) -> Result<ActivityLogEntry, DbError> {
        let id = parse_uuid(&self.record_id, "record")?;
        ActivityRow {
            user: self.user,
            action: self.action,
            resource: self.resource,
            resource_id: self.resource_id,
            details: self.details,
            ip_address: self.ip_address,
            created_at: self.created_at,
        }
        .into_entry(id)
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the activity log repository.
#[derive(Clone)]
pub struct SurrealActivityLogRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealActivityLogRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ActivityLogRepository for SurrealActivityLogRepository<C> {
    async fn append(&self, input: CreateActivityLogEntry) -> LeadHubResult<ActivityLogEntry> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('activity_log', $id) SET \
                 user = $user, action = $action, resource = $resource, \
                 resource_id = $resource_id, details = $details, \
                 ip_address = $ip_address",
            )
            .bind(("id", id_str.clone()))
            .bind(("user", input.user.to_string()))
            .bind(("action", input.action))
            .bind(("resource", input.resource))
            .bind(("resource_id", input.resource_id.map(|u| u.to_string())))
            .bind(("details", input.details))
            .bind(("ip_address", input.ip_address))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<ActivityRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "activity_log".into(),
            id: id_str,
        })?;

        Ok(row.into_entry(id)?)
    }

    async fn list(
        &self,
        filter: ActivityLogFilter,
        pagination: Pagination,
    ) -> LeadHubResult<PaginatedResult<ActivityLogEntry>> {
        let mut conditions = Vec::new();
        if filter.user.is_some() {
            conditions.push("user = $user");
        }
        if filter.resource.is_some() {
            conditions.push("resource = $resource");
        }
        if filter.from.is_some() {
            conditions.push("created_at >= $from");
        }
        if filter.to.is_some() {
            conditions.push("created_at <= $to");
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let count_query =
            format!("SELECT count() AS total FROM activity_log{where_clause} GROUP ALL");
        let mut count_builder = self.db.query(&count_query);
        if let Some(user) = filter.user {
            count_builder = count_builder.bind(("user", user.to_string()));
        }
        if let Some(resource) = filter.resource.clone() {
            count_builder = count_builder.bind(("resource", resource));
        }
        if let Some(from) = filter.from {
            count_builder = count_builder.bind(("from", from));
        }
        if let Some(to) = filter.to {
            count_builder = count_builder.bind(("to", to));
        }
        let mut count_result = count_builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM activity_log{where_clause} \
             ORDER BY created_at DESC LIMIT $limit START $offset"
        );
        let mut builder = self.db.query(&query);
        if let Some(user) = filter.user {
            builder = builder.bind(("user", user.to_string()));
        }
        if let Some(resource) = filter.resource {
            builder = builder.bind(("resource", resource));
        }
        if let Some(from) = filter.from {
            builder = builder.bind(("from", from));
        }
        if let Some(to) = filter.to {
            builder = builder.bind(("to", to));
        }
        let mut result = builder
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ActivityRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_entry())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
