//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode. UUIDs and calendar dates
//! are stored as strings (`YYYY-MM-DD` compares correctly as text).
//! Enums are stored as strings with ASSERT constraints.

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
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Travel plans
-- =======================================================================
DEFINE TABLE travel_plan SCHEMAFULL;
DEFINE FIELD owner_id ON TABLE travel_plan TYPE string;
DEFINE FIELD destination ON TABLE travel_plan TYPE string;
DEFINE FIELD start_date ON TABLE travel_plan TYPE string;
DEFINE FIELD end_date ON TABLE travel_plan TYPE string;
DEFINE FIELD budget ON TABLE travel_plan TYPE float ASSERT $value > 0;
DEFINE FIELD travel_type ON TABLE travel_plan TYPE string \
    ASSERT $value IN ['SOLO', 'FRIENDS', 'GROUP', 'FAMILY', 'COUPLE'];
DEFINE FIELD description ON TABLE travel_plan TYPE string DEFAULT '';
DEFINE FIELD interests ON TABLE travel_plan TYPE array<string> DEFAULT [];
DEFINE FIELD images ON TABLE travel_plan TYPE array<string> DEFAULT [] \
    ASSERT array::len($value) <= 5;
DEFINE FIELD status ON TABLE travel_plan TYPE string \
    ASSERT $value IN ['ACTIVE', 'COMPLETED', 'CANCELLED'];
DEFINE FIELD created_at ON TABLE travel_plan TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE travel_plan TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_travel_plan_owner ON TABLE travel_plan COLUMNS owner_id;
DEFINE INDEX idx_travel_plan_status ON TABLE travel_plan COLUMNS status;

-- =======================================================================
-- Join requests
--
-- `slot` is 'live' while the request is PENDING or APPROVED and the
-- request's own id once REJECTED, so the unique index admits at most
-- one live request per (requester, plan).
-- =======================================================================
DEFINE TABLE join_request SCHEMAFULL;
DEFINE FIELD requester_id ON TABLE join_request TYPE string;
DEFINE FIELD plan_id ON TABLE join_request TYPE string;
DEFINE FIELD message ON TABLE join_request TYPE string;
DEFINE FIELD status ON TABLE join_request TYPE string \
    ASSERT $value IN ['PENDING', 'APPROVED', 'REJECTED'];
DEFINE FIELD slot ON TABLE join_request TYPE string;
DEFINE FIELD responded_at ON TABLE join_request TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE join_request TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE join_request TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_join_request_live_slot ON TABLE join_request \
    COLUMNS requester_id, plan_id, slot UNIQUE;
DEFINE INDEX idx_join_request_plan ON TABLE join_request COLUMNS plan_id;
DEFINE INDEX idx_join_request_requester ON TABLE join_request \
    COLUMNS requester_id;

-- =======================================================================
-- Reviews
--
-- `plan_key` is the plan id, or 'none' for reviews without a plan
-- reference, so uniqueness covers both.
-- =======================================================================
DEFINE TABLE review SCHEMAFULL;
DEFINE FIELD reviewer_id ON TABLE review TYPE string;
DEFINE FIELD reviewee_id ON TABLE review TYPE string;
DEFINE FIELD plan_id ON TABLE review TYPE option<string>;
DEFINE FIELD plan_key ON TABLE review TYPE string;
DEFINE FIELD rating ON TABLE review TYPE int \
    ASSERT $value >= 1 AND $value <= 5;
DEFINE FIELD comment ON TABLE review TYPE string DEFAULT '';
DEFINE FIELD created_at ON TABLE review TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE review TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_review_unique ON TABLE review \
    COLUMNS reviewer_id, reviewee_id, plan_key UNIQUE;
DEFINE INDEX idx_review_reviewee ON TABLE review COLUMNS reviewee_id;

-- =======================================================================
-- Premium checkout sessions
-- =======================================================================
DEFINE TABLE checkout_session SCHEMAFULL;
DEFINE FIELD user_id ON TABLE checkout_session TYPE string;
DEFINE FIELD tier ON TABLE checkout_session TYPE string \
    ASSERT $value IN ['MONTHLY', 'YEARLY'];
DEFINE FIELD provider_session_id ON TABLE checkout_session TYPE string;
DEFINE FIELD checkout_url ON TABLE checkout_session TYPE option<string>;
DEFINE FIELD amount_cents ON TABLE checkout_session TYPE int;
DEFINE FIELD currency ON TABLE checkout_session TYPE string;
DEFINE FIELD status ON TABLE checkout_session TYPE string \
    ASSERT $value IN ['PENDING', 'PAID'];
DEFINE FIELD premium_until ON TABLE checkout_session \
    TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE checkout_session TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE checkout_session TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_checkout_provider_session ON TABLE checkout_session \
    COLUMNS provider_session_id UNIQUE;
DEFINE INDEX idx_checkout_user ON TABLE checkout_session COLUMNS user_id;
";

/// Run all pending migrations against the given database.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

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
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
