//! Application state: the dependency-injected service handle passed to
//! every request handler.
//!
//! The SurrealDB handle is opened once at process start and cloned
//! here; there is no module-level mutable state.

use surrealdb::Surreal;
use surrealdb::engine::any::Any;

use leadhub_auth::{AuthConfig, AuthService};
use leadhub_db::repository::{
    SurrealActivityLogRepository, SurrealAnalyticsRepository, SurrealLeadRepository,
    SurrealUserRepository,
};

use crate::mailer::Mailer;
use crate::recorder::ActivityRecorder;

pub type Db = Surreal<Any>;

#[derive(Clone)]
pub struct AppState {
    pub users: SurrealUserRepository<Any>,
    pub leads: SurrealLeadRepository<Any>,
    pub activity: SurrealActivityLogRepository<Any>,
    pub analytics: SurrealAnalyticsRepository<Any>,
    pub auth: AuthService<SurrealUserRepository<Any>>,
    pub recorder: ActivityRecorder,
    pub mailer: Option<Mailer>,
    pub frontend_url: String,
}

impl AppState {
    pub fn new(
        db: Db,
        auth_config: AuthConfig,
        mailer: Option<Mailer>,
        frontend_url: String,
    ) -> Self {
        let users = match &auth_config.pepper {
            Some(pepper) => SurrealUserRepository::with_pepper(db.clone(), pepper.clone()),
            None => SurrealUserRepository::new(db.clone()),
        };
        let activity = SurrealActivityLogRepository::new(db.clone());

        Self {
            auth: AuthService::new(users.clone(), auth_config),
            leads: SurrealLeadRepository::new(db.clone()),
            analytics: SurrealAnalyticsRepository::new(db.clone()),
            recorder: ActivityRecorder::new(activity.clone()),
            activity,
            users,
            mailer,
            frontend_url,
        }
    }
}
