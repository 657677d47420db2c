//! Read-only aggregation endpoints.
//!
//! Every computation is scoped through the role filter before it runs:
//! agents aggregate only their own assigned leads.

use std::collections::BTreeMap;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use leadhub_core::analytics::{AgentPerformance, AgentRef, StatusCounts, conversion_rate};
use leadhub_core::models::activity::ActivityLogFilter;
use leadhub_core::models::lead::LeadStatus;
use leadhub_core::models::user::{Role, User, UserFilter};
use leadhub_core::repository::{
    ActivityLogRepository, AnalyticsRepository, Pagination, UserRepository,
};
use leadhub_core::scope::LeadScope;

use crate::error::ApiResult;
use crate::extract::{CurrentUser, require_admin};
use crate::response;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard_stats))
        .route("/lead-status-distribution", get(status_distribution))
        .route("/agent-performance", get(agent_performance))
        .route("/recent-activity", get(recent_activity))
        .route("/leads-over-time", get(leads_over_time))
        .route("/top-tags", get(top_tags))
}

/// Per-agent rollups for every active agent, sorted descending by
/// conversion rate.
pub(crate) async fn collect_agent_performance(
    state: &AppState,
) -> ApiResult<Vec<AgentPerformance>> {
    let agents = state
        .users
        .list(UserFilter {
            role: Some(Role::Agent),
            is_active: Some(true),
            search: None,
        })
        .await?;

    let mut performance = Vec::with_capacity(agents.len());
    for agent in agents {
        let counts = state
            .analytics
            .status_counts(LeadScope::AssignedTo(agent.id))
            .await?;
        let total = counts.total();
        performance.push(AgentPerformance {
            agent: AgentRef {
                id: agent.id,
                name: agent.name,
                email: agent.email,
            },
            total_leads: total,
            status_counts: counts,
            conversion_rate: conversion_rate(counts.won, total),
        });
    }

    performance.sort_by(|a, b| {
        b.conversion_rate
            .partial_cmp(&a.conversion_rate)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(b.total_leads.cmp(&a.total_leads))
    });
    Ok(performance)
}

fn scope_of(user: &User) -> LeadScope {
    LeadScope::for_role(user.role, user.id)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DashboardStats {
    total_leads: u64,
    leads_by_status: StatusCounts,
    recent_leads: u64,
    conversion_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_users: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    active_users: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    users_by_role: Option<BTreeMap<String, u64>>,
}

async fn dashboard_stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<impl IntoResponse> {
    let scope = scope_of(&user);

    let total_leads = state.analytics.count_leads(scope).await?;
    let leads_by_status = state.analytics.status_counts(scope).await?;
    let recent_leads = state
        .analytics
        .count_created_since(scope, Utc::now() - Duration::days(30))
        .await?;

    let mut stats = DashboardStats {
        total_leads,
        leads_by_status,
        recent_leads,
        conversion_rate: conversion_rate(leads_by_status.won, total_leads),
        total_users: None,
        active_users: None,
        users_by_role: None,
    };

    // Admin-only user statistics.
    if user.role.is_admin() {
        stats.total_users = Some(state.users.count().await?);
        stats.active_users = Some(state.users.count_active().await?);
        stats.users_by_role = Some(
            state
                .users
                .counts_by_role()
                .await?
                .into_iter()
                .map(|(role, count)| (role.as_str().to_string(), count))
                .collect(),
        );
    }

    Ok(response::data(stats))
}

#[derive(Debug, Serialize)]
struct StatusBucket {
    status: LeadStatus,
    count: u64,
}

async fn status_distribution(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<impl IntoResponse> {
    let counts = state.analytics.status_counts(scope_of(&user)).await?;
    let distribution: Vec<StatusBucket> = LeadStatus::ALL
        .into_iter()
        .map(|status| StatusBucket {
            status,
            count: counts.get(status),
        })
        .collect();
    Ok(response::data(distribution))
}

async fn agent_performance(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<impl IntoResponse> {
    require_admin(&user)?;
    let performance = collect_agent_performance(&state).await?;
    Ok(response::data(performance))
}

#[derive(Debug, Default, Deserialize)]
struct LimitQuery {
    limit: Option<u64>,
}

async fn recent_activity(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<LimitQuery>,
) -> ApiResult<impl IntoResponse> {
    let limit = query.limit.unwrap_or(20).clamp(1, 200);

    // Agents only see their own trail.
    let filter = ActivityLogFilter {
        user: match user.role {
            Role::Agent => Some(user.id),
            Role::Superadmin | Role::Subadmin => None,
        },
        ..Default::default()
    };

    let result = state
        .activity
        .list(filter, Pagination { offset: 0, limit })
        .await?;
    Ok(response::counted(result.items))
}

#[derive(Debug, Default, Deserialize)]
struct PeriodQuery {
    /// Trailing window in days.
    period: Option<u64>,
}

async fn leads_over_time(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<impl IntoResponse> {
    let days = query.period.unwrap_or(30).clamp(1, 365) as i64;
    let series = state
        .analytics
        .daily_counts(scope_of(&user), Utc::now() - Duration::days(days))
        .await?;
    Ok(response::data(series))
}

async fn top_tags(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<LimitQuery>,
) -> ApiResult<impl IntoResponse> {
    let limit = query.limit.unwrap_or(10).clamp(1, 100) as usize;
    let tags = state.analytics.top_tags(scope_of(&user), limit).await?;
    Ok(response::data(tags))
}
