//! Server configuration, loaded from the environment at startup.

use leadhub_auth::AuthConfig;
use leadhub_db::DbConfig;

use crate::mailer::SmtpConfig;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address, e.g. `0.0.0.0:5000`.
    pub bind_addr: String,
    pub db: DbConfig,
    pub auth: AuthConfig,
    /// SMTP transport settings; `None` disables outbound email and
    /// logs reset links instead.
    pub smtp: Option<SmtpConfig>,
    /// Base URL used in password-reset links.
    pub frontend_url: String,
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn var_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let auth_defaults = AuthConfig::default();
        let frontend_url = var_or("LEADHUB_FRONTEND_URL", "http://localhost:3000");

        let smtp = std::env::var("LEADHUB_SMTP_HOST").ok().map(|host| SmtpConfig {
            host,
            port: var_parsed("LEADHUB_SMTP_PORT", 587),
            username: var_or("LEADHUB_SMTP_USER", ""),
            password: var_or("LEADHUB_SMTP_PASSWORD", ""),
            from: var_or("LEADHUB_SMTP_FROM", "LeadHub <no-reply@leadhub.local>"),
        });

        Self {
            bind_addr: var_or("LEADHUB_BIND", "0.0.0.0:5000"),
            db: DbConfig {
                url: var_or("LEADHUB_DB_URL", "ws://127.0.0.1:8000"),
                namespace: var_or("LEADHUB_DB_NS", "leadhub"),
                database: var_or("LEADHUB_DB_NAME", "main"),
                username: var_or("LEADHUB_DB_USER", "root"),
                password: var_or("LEADHUB_DB_PASSWORD", "root"),
            },
            auth: AuthConfig {
                jwt_secret: var_or("LEADHUB_JWT_SECRET", "insecure-dev-secret"),
                token_lifetime_secs: var_parsed(
                    "LEADHUB_TOKEN_LIFETIME_SECS",
                    auth_defaults.token_lifetime_secs,
                ),
                pepper: std::env::var("LEADHUB_PASSWORD_PEPPER").ok(),
                ..auth_defaults
            },
            smtp,
            frontend_url,
        }
    }
}
