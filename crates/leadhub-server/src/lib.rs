//! LeadHub Server — the HTTP surface of the lead-management API.
//!
//! Request handling is a straight-line sequence: credential check →
//! role scope → store operation → (for mutations) best-effort activity
//! append → JSON envelope response.

pub mod config;
pub mod error;
pub mod extract;
pub mod mailer;
pub mod recorder;
pub mod response;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use routes::app;
pub use state::AppState;
