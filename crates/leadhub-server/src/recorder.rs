//! Best-effort audit recording.
//!
//! Every mutating endpoint appends one activity entry. The append runs
//! on a detached task off the critical path: a recorder failure is
//! logged and never surfaces to the caller.

use leadhub_core::models::activity::CreateActivityLogEntry;
use leadhub_core::repository::ActivityLogRepository;
use leadhub_db::repository::SurrealActivityLogRepository;
use surrealdb::engine::any::Any;
use tracing::warn;

#[derive(Clone)]
pub struct ActivityRecorder {
    repo: SurrealActivityLogRepository<Any>,
}

impl ActivityRecorder {
    pub fn new(repo: SurrealActivityLogRepository<Any>) -> Self {
        Self { repo }
    }

    /// Fire-and-forget append.
    pub fn record(&self, entry: CreateActivityLogEntry) {
        let repo = self.repo.clone();
        tokio::spawn(async move {
            if let Err(err) = repo.append(entry).await {
                warn!(error = %err, "Failed to append activity log entry");
            }
        });
    }
}
