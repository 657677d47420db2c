//! Route composition.

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

use crate::state::AppState;

mod analytics;
mod auth;
mod dashboard;
mod leads;
mod users;

pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api/auth", auth::routes())
        .nest("/api/leads", leads::routes())
        .nest("/api/users", users::routes())
        .nest("/api/analytics", analytics::routes())
        .nest("/api/dashboard", dashboard::routes())
        .route("/api/health", get(health))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "message": "Server is running" }))
}
