//! LeadHub Core — domain models, error taxonomy, repository traits, and
//! the role-based query scoping shared across all crates.

pub mod analytics;
pub mod error;
pub mod models;
pub mod repository;
pub mod scope;

pub use error::{LeadHubError, LeadHubResult};
pub use scope::LeadScope;
