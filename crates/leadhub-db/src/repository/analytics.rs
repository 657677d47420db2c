//! SurrealDB implementation of [`AnalyticsRepository`].
//!
//! Read-only grouping and rollup queries over leads. Every query takes
//! the caller's [`LeadScope`] so agents only ever aggregate their own
//! assigned leads.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use leadhub_core::analytics::{DateCount, MonthCount, SourceCount, StatusCounts, TagCount};
use leadhub_core::error::LeadHubResult;
use leadhub_core::models::lead::LeadStatus;
use leadhub_core::repository::AnalyticsRepository;
use leadhub_core::scope::LeadScope;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

#[derive(Debug, SurrealValue)]
struct StatusCountRow {
    status: String,
    count: u64,
}

#[derive(Debug, SurrealValue)]
struct SourceCountRow {
    source: String,
    count: u64,
}

#[derive(Debug, SurrealValue)]
struct DateCountRow {
    date: String,
    count: u64,
}

#[derive(Debug, SurrealValue)]
struct MonthCountRow {
    month: String,
    count: u64,
}

#[derive(Debug, SurrealValue)]
struct TagsRow {
    tags: Vec<String>,
}

/// The scope's WHERE fragment and bind value, prefixed onto each query.
fn scope_condition(scope: LeadScope) -> (Option<&'static str>, Option<String>) {
    match scope.assigned_filter() {
        Some(agent) => (Some("assigned_to = $scope_agent"), Some(agent.to_string())),
        None => (None, None),
    }
}

fn compose_where(parts: &[Option<&str>]) -> String {
    let active: Vec<&str> = parts.iter().flatten().copied().collect();
    if active.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", active.join(" AND "))
    }
}

/// SurrealDB implementation of the analytics repository.
#[derive(Clone)]
pub struct SurrealAnalyticsRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAnalyticsRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Monthly creation counts for one status-restricted slice.
    async fn monthly_status_counts(
        &self,
        scope: LeadScope,
        since: DateTime<Utc>,
        status: LeadStatus,
    ) -> Result<HashMap<String, u64>, DbError> {
        let (scope_cond, scope_bind) = scope_condition(scope);
        let where_clause = compose_where(&[
            scope_cond,
            Some("created_at >= $since"),
            Some("status = $status"),
        ]);

        let query = format!(
            "SELECT time::format(created_at, '%Y-%m') AS month, \
             count() AS count FROM lead{where_clause} GROUP BY month"
        );

        let mut builder = self.db.query(&query).bind(("since", since)).bind((
            "status",
            status.as_str().to_string(),
        ));
        if let Some(agent) = scope_bind {
            builder = builder.bind(("scope_agent", agent));
        }

        let mut result = builder.await?;
        let rows: Vec<MonthCountRow> = result.take(0)?;
        Ok(rows.into_iter().map(|r| (r.month, r.count)).collect())
    }
}

impl<C: Connection> AnalyticsRepository for SurrealAnalyticsRepository<C> {
    async fn count_leads(&self, scope: LeadScope) -> LeadHubResult<u64> {
        let (scope_cond, scope_bind) = scope_condition(scope);
        let where_clause = compose_where(&[scope_cond]);

        let query = format!("SELECT count() AS total FROM lead{where_clause} GROUP ALL");
        let mut builder = self.db.query(&query);
        if let Some(agent) = scope_bind {
            builder = builder.bind(("scope_agent", agent));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn status_counts(&self, scope: LeadScope) -> LeadHubResult<StatusCounts> {
        let (scope_cond, scope_bind) = scope_condition(scope);
        let where_clause = compose_where(&[scope_cond]);

        let query =
            format!("SELECT status, count() AS count FROM lead{where_clause} GROUP BY status");
        let mut builder = self.db.query(&query);
        if let Some(agent) = scope_bind {
            builder = builder.bind(("scope_agent", agent));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<StatusCountRow> = result.take(0).map_err(DbError::from)?;

        // All five buckets stay present; unseen statuses keep zero.
        let mut counts = StatusCounts::default();
        for row in rows {
            let status = LeadStatus::parse(&row.status)
                .ok_or_else(|| DbError::Query(format!("unknown lead status: {}", row.status)))?;
            counts.set(status, row.count);
        }
        Ok(counts)
    }

    async fn count_created_since(
        &self,
        scope: LeadScope,
        since: DateTime<Utc>,
    ) -> LeadHubResult<u64> {
        let (scope_cond, scope_bind) = scope_condition(scope);
        let where_clause = compose_where(&[scope_cond, Some("created_at >= $since")]);

        let query = format!("SELECT count() AS total FROM lead{where_clause} GROUP ALL");
        let mut builder = self.db.query(&query).bind(("since", since));
        if let Some(agent) = scope_bind {
            builder = builder.bind(("scope_agent", agent));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn source_counts(
        &self,
        scope: LeadScope,
        limit: usize,
    ) -> LeadHubResult<Vec<SourceCount>> {
        let (scope_cond, scope_bind) = scope_condition(scope);
        let where_clause = compose_where(&[scope_cond]);

        let query =
            format!("SELECT source, count() AS count FROM lead{where_clause} GROUP BY source");
        let mut builder = self.db.query(&query);
        if let Some(agent) = scope_bind {
            builder = builder.bind(("scope_agent", agent));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<SourceCountRow> = result.take(0).map_err(DbError::from)?;

        let mut counts: Vec<SourceCount> = rows
            .into_iter()
            .map(|r| SourceCount {
                source: r.source,
                count: r.count,
            })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then(a.source.cmp(&b.source)));
        counts.truncate(limit);
        Ok(counts)
    }

    async fn daily_counts(
        &self,
        scope: LeadScope,
        since: DateTime<Utc>,
    ) -> LeadHubResult<Vec<DateCount>> {
        let (scope_cond, scope_bind) = scope_condition(scope);
        let where_clause = compose_where(&[scope_cond, Some("created_at >= $since")]);

        let query = format!(
            "SELECT time::format(created_at, '%Y-%m-%d') AS date, \
             count() AS count FROM lead{where_clause} GROUP BY date"
        );
        let mut builder = self.db.query(&query).bind(("since", since));
        if let Some(agent) = scope_bind {
            builder = builder.bind(("scope_agent", agent));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<DateCountRow> = result.take(0).map_err(DbError::from)?;

        let mut counts: Vec<DateCount> = rows
            .into_iter()
            .map(|r| DateCount {
                date: r.date,
                count: r.count,
            })
            .collect();
        counts.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(counts)
    }

    async fn monthly_counts(
        &self,
        scope: LeadScope,
        since: DateTime<Utc>,
    ) -> LeadHubResult<Vec<MonthCount>> {
        let (scope_cond, scope_bind) = scope_condition(scope);
        let where_clause = compose_where(&[scope_cond, Some("created_at >= $since")]);

        let query = format!(
            "SELECT time::format(created_at, '%Y-%m') AS month, \
             count() AS count FROM lead{where_clause} GROUP BY month"
        );
        let mut builder = self.db.query(&query).bind(("since", since));
        if let Some(agent) = scope_bind {
            builder = builder.bind(("scope_agent", agent));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<MonthCountRow> = result.take(0).map_err(DbError::from)?;

        let won = self
            .monthly_status_counts(scope, since, LeadStatus::Won)
            .await?;

        let mut counts: Vec<MonthCount> = rows
            .into_iter()
            .map(|r| MonthCount {
                won: won.get(&r.month).copied().unwrap_or(0),
                month: r.month,
                count: r.count,
            })
            .collect();
        counts.sort_by(|a, b| a.month.cmp(&b.month));
        Ok(counts)
    }

    async fn top_tags(&self, scope: LeadScope, limit: usize) -> LeadHubResult<Vec<TagCount>> {
        let (scope_cond, scope_bind) = scope_condition(scope);
        let where_clause = compose_where(&[scope_cond]);

        let query = format!("SELECT tags FROM lead{where_clause}");
        let mut builder = self.db.query(&query);
        if let Some(agent) = scope_bind {
            builder = builder.bind(("scope_agent", agent));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<TagsRow> = result.take(0).map_err(DbError::from)?;

        let mut frequencies: HashMap<String, u64> = HashMap::new();
        for row in rows {
            for tag in row.tags {
                *frequencies.entry(tag).or_insert(0) += 1;
            }
        }

        let mut counts: Vec<TagCount> = frequencies
            .into_iter()
            .map(|(tag, count)| TagCount { tag, count })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then(a.tag.cmp(&b.tag)));
        counts.truncate(limit);
        Ok(counts)
    }
}
