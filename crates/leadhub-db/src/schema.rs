//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Users
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD name ON TABLE user TYPE string;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD password_hash ON TABLE user TYPE string;
DEFINE FIELD role ON TABLE user TYPE string \
    ASSERT $value IN ['superadmin', 'subadmin', 'agent'];
DEFINE FIELD is_active ON TABLE user TYPE bool DEFAULT true;
DEFINE FIELD created_by ON TABLE user TYPE option<string>;
DEFINE FIELD reset_token_hash ON TABLE user TYPE option<string>;
DEFINE FIELD reset_token_expires_at ON TABLE user TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;
DEFINE INDEX idx_user_role ON TABLE user COLUMNS role;

-- =======================================================================
-- Leads (notes embedded as an ordered array of objects)
-- =======================================================================
DEFINE TABLE lead SCHEMAFULL;
DEFINE FIELD name ON TABLE lead TYPE string;
DEFINE FIELD email ON TABLE lead TYPE string;
DEFINE FIELD phone ON TABLE lead TYPE string;
DEFINE FIELD source ON TABLE lead TYPE string;
DEFINE FIELD status ON TABLE lead TYPE string \
    ASSERT $value IN ['New', 'Contacted', 'Qualified', 'Lost', 'Won'];
DEFINE FIELD tags ON TABLE lead TYPE array DEFAULT [];
DEFINE FIELD tags.* ON TABLE lead TYPE string;
DEFINE FIELD notes ON TABLE lead TYPE array DEFAULT [];
DEFINE FIELD notes.* ON TABLE lead FLEXIBLE TYPE object;
DEFINE FIELD assigned_to ON TABLE lead TYPE option<string>;
DEFINE FIELD created_by ON TABLE lead TYPE string;
DEFINE FIELD created_at ON TABLE lead TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE lead TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_lead_email ON TABLE lead COLUMNS email;
DEFINE INDEX idx_lead_phone ON TABLE lead COLUMNS phone;
DEFINE INDEX idx_lead_assigned ON TABLE lead COLUMNS assigned_to;
DEFINE INDEX idx_lead_status_created ON TABLE lead \
    COLUMNS status, created_at;

-- =======================================================================
-- Activity Log (append-only)
-- =======================================================================
DEFINE TABLE activity_log SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD user ON TABLE activity_log TYPE string;
DEFINE FIELD action ON TABLE activity_log TYPE string;
DEFINE FIELD resource ON TABLE activity_log TYPE string;
DEFINE FIELD resource_id ON TABLE activity_log TYPE option<string>;
DEFINE FIELD details ON TABLE activity_log TYPE option<string>;
DEFINE FIELD ip_address ON TABLE activity_log TYPE option<string>;
DEFINE FIELD created_at ON TABLE activity_log TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_activity_user_time ON TABLE activity_log \
    COLUMNS user, created_at;
DEFINE INDEX idx_activity_resource_time ON TABLE activity_log \
    COLUMNS resource, created_at;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_is_nonempty() {
        assert!(!SCHEMA_V1.is_empty());
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }
}
