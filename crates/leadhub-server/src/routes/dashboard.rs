//! Composite dashboard endpoints.

use axum::Router;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use chrono::{Duration, Months, Utc};
use serde::Serialize;

use leadhub_core::analytics::{
    AgentPerformance, MonthCount, SourceCount, StatusCounts, UserStats, conversion_rate,
};
use leadhub_core::models::activity::{ActivityLogEntry, ActivityLogFilter};
use leadhub_core::models::lead::{Lead, LeadFilter, LeadSort};
use leadhub_core::models::user::Role;
use leadhub_core::repository::{
    ActivityLogRepository, AnalyticsRepository, LeadRepository, Pagination, UserRepository,
};
use leadhub_core::scope::LeadScope;

use super::analytics::collect_agent_performance;
use crate::error::ApiResult;
use crate::extract::CurrentUser;
use crate::response;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(dashboard_stats))
        .route("/lead-stats", get(lead_stats))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Overview {
    total_leads: u64,
    recent_leads_count: u64,
    status_distribution: StatusCounts,
    conversion_rate: f64,
    leads_by_source: Vec<SourceCount>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DashboardPayload {
    overview: Overview,
    recent_leads: Vec<Lead>,
    #[serde(skip_serializing_if = "Option::is_none")]
    agent_performance: Option<Vec<AgentPerformance>>,
    recent_activities: Vec<ActivityLogEntry>,
    monthly_trend: Vec<MonthCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_stats: Option<UserStats>,
}

async fn dashboard_stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<impl IntoResponse> {
    let scope = LeadScope::for_role(user.role, user.id);
    let now = Utc::now();

    let total_leads = state.analytics.count_leads(scope).await?;
    let status_distribution = state.analytics.status_counts(scope).await?;
    let leads_by_source = state.analytics.source_counts(scope, 10).await?;
    let recent_leads_count = state
        .analytics
        .count_created_since(scope, now - Duration::days(30))
        .await?;

    let recent_leads = state
        .leads
        .list(
            LeadFilter {
                assigned_to: scope.assigned_filter(),
                ..Default::default()
            },
            LeadSort::default(),
            Pagination {
                offset: 0,
                limit: 10,
            },
        )
        .await?
        .items;

    let recent_activities = state
        .activity
        .list(
            ActivityLogFilter {
                user: match user.role {
                    Role::Agent => Some(user.id),
                    Role::Superadmin | Role::Subadmin => None,
                },
                ..Default::default()
            },
            Pagination {
                offset: 0,
                limit: 20,
            },
        )
        .await?
        .items;

    let six_months_ago = now.checked_sub_months(Months::new(6)).unwrap_or(now);
    let monthly_trend = state.analytics.monthly_counts(scope, six_months_ago).await?;

    // Admin-only sections.
    let (agent_performance, user_stats) = if user.role.is_admin() {
        let mut performance = collect_agent_performance(&state).await?;
        performance.retain(|p| p.total_leads > 0);
        performance.sort_by(|a, b| b.total_leads.cmp(&a.total_leads));

        let total = state.users.count().await?;
        let active = state.users.count_active().await?;
        let by_role = state
            .users
            .counts_by_role()
            .await?
            .into_iter()
            .map(|(role, count)| (role.as_str().to_string(), count))
            .collect();

        (
            Some(performance),
            Some(UserStats {
                total,
                active,
                inactive: total - active,
                by_role,
            }),
        )
    } else {
        (None, None)
    };

    Ok(response::data(DashboardPayload {
        overview: Overview {
            total_leads,
            recent_leads_count,
            conversion_rate: conversion_rate(status_distribution.won, total_leads),
            status_distribution,
            leads_by_source,
        },
        recent_leads,
        agent_performance,
        recent_activities,
        monthly_trend,
        user_stats,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LeadStatsPayload {
    by_status: StatusCounts,
    by_source: Vec<SourceCount>,
    by_month: Vec<MonthCount>,
}

async fn lead_stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<impl IntoResponse> {
    let scope = LeadScope::for_role(user.role, user.id);
    let now = Utc::now();

    let by_status = state.analytics.status_counts(scope).await?;
    let by_source = state.analytics.source_counts(scope, 10).await?;

    // Last 12 months, newest first.
    let twelve_months_ago = now.checked_sub_months(Months::new(12)).unwrap_or(now);
    let mut by_month = state.analytics.monthly_counts(scope, twelve_months_ago).await?;
    by_month.reverse();
    by_month.truncate(12);

    Ok(response::data(LeadStatsPayload {
        by_status,
        by_source,
        by_month,
    }))
}
