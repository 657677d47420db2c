//! LeadHub Server — application entry point.

use tracing_subscriber::EnvFilter;

use leadhub_server::{AppState, ServerConfig, app};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("leadhub=info".parse().unwrap()),
        )
        .json()
        .init();

    let config = ServerConfig::from_env();

    tracing::info!("Starting LeadHub server...");

    let manager = match leadhub_db::DbManager::connect(&config.db).await {
        Ok(manager) => manager,
        Err(err) => {
            tracing::error!(error = %err, "Database connection failed");
            std::process::exit(1);
        }
    };

    if let Err(err) = leadhub_db::run_migrations(manager.client()).await {
        tracing::error!(error = %err, "Migrations failed");
        std::process::exit(1);
    }

    let mailer = match &config.smtp {
        Some(smtp) => match leadhub_server::mailer::Mailer::new(smtp, config.frontend_url.clone())
        {
            Ok(mailer) => Some(mailer),
            Err(err) => {
                tracing::error!(error = %err, "Mailer configuration invalid");
                std::process::exit(1);
            }
        },
        None => {
            tracing::warn!("SMTP not configured; password reset links will be logged");
            None
        }
    };

    let state = AppState::new(
        manager.client().clone(),
        config.auth.clone(),
        mailer,
        config.frontend_url.clone(),
    );

    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, addr = %config.bind_addr, "Bind failed");
            std::process::exit(1);
        }
    };

    tracing::info!(addr = %config.bind_addr, "LeadHub server listening");

    if let Err(err) = axum::serve(listener, app(state)).await {
        tracing::error!(error = %err, "Server error");
        std::process::exit(1);
    }
}
