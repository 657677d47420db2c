//! SurrealDB repository implementations.

mod activity;
mod analytics;
mod lead;
mod user;

pub use activity::SurrealActivityLogRepository;
pub use analytics::SurrealAnalyticsRepository;
pub use lead::SurrealLeadRepository;
pub use user::SurrealUserRepository;
