//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation. The unique indexes double as the
//! storage-level race-breakers the consistency engine relies on:
//! one daily close per (tenant, date), one room number per tenant.

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
-- Tenants (global scope)
-- =======================================================================
DEFINE TABLE tenant SCHEMAFULL;
DEFINE FIELD name ON TABLE tenant TYPE string;
DEFINE FIELD slug ON TABLE tenant TYPE string;
DEFINE FIELD reporting_offset_minutes ON TABLE tenant TYPE option<int>;
DEFINE FIELD metadata ON TABLE tenant TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD created_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_tenant_slug ON TABLE tenant COLUMNS slug UNIQUE;

-- =======================================================================
-- Room types (tenant scope)
-- =======================================================================
DEFINE TABLE room_type SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE room_type TYPE string;
DEFINE FIELD name ON TABLE room_type TYPE string;
DEFINE FIELD base_rate ON TABLE room_type TYPE int;
DEFINE FIELD capacity ON TABLE room_type TYPE int;
DEFINE FIELD created_at ON TABLE room_type TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE room_type TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_room_type_tenant_name ON TABLE room_type \
    COLUMNS tenant_id, name UNIQUE;

-- =======================================================================
-- Rooms (tenant scope)
-- =======================================================================
DEFINE TABLE room SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE room TYPE string;
DEFINE FIELD room_type_id ON TABLE room TYPE string;
DEFINE FIELD number ON TABLE room TYPE string;
DEFINE FIELD floor ON TABLE room TYPE option<int>;
DEFINE FIELD status ON TABLE room TYPE string \
    ASSERT $value IN ['Available', 'Occupied', 'Maintenance'];
DEFINE FIELD notes ON TABLE room TYPE option<string>;
DEFINE FIELD created_at ON TABLE room TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE room TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_room_tenant_number ON TABLE room \
    COLUMNS tenant_id, number UNIQUE;

-- =======================================================================
-- Guests (tenant scope)
-- =======================================================================
DEFINE TABLE guest SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE guest TYPE string;
DEFINE FIELD full_name ON TABLE guest TYPE string;
DEFINE FIELD email ON TABLE guest TYPE option<string>;
DEFINE FIELD phone ON TABLE guest TYPE option<string>;
DEFINE FIELD document_id ON TABLE guest TYPE option<string>;
DEFINE FIELD created_at ON TABLE guest TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE guest TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_guest_tenant_name ON TABLE guest \
    COLUMNS tenant_id, full_name;

-- =======================================================================
-- Reservations (tenant scope)
-- =======================================================================
DEFINE TABLE reservation SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE reservation TYPE string;
DEFINE FIELD room_id ON TABLE reservation TYPE string;
DEFINE FIELD guest_id ON TABLE reservation TYPE option<string>;
DEFINE FIELD created_by ON TABLE reservation TYPE option<string>;
DEFINE FIELD check_in ON TABLE reservation TYPE datetime;
DEFINE FIELD check_out ON TABLE reservation TYPE datetime;
DEFINE FIELD status ON TABLE reservation TYPE string \
    ASSERT $value IN ['Pending', 'Confirmed', 'CheckedIn', \
    'CheckedOut', 'Cancelled'];
DEFINE FIELD total_price ON TABLE reservation TYPE int;
DEFINE FIELD checked_in_at ON TABLE reservation TYPE option<datetime>;
DEFINE FIELD checked_out_at ON TABLE reservation TYPE option<datetime>;
DEFINE FIELD notes ON TABLE reservation TYPE option<string>;
DEFINE FIELD created_at ON TABLE reservation TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE reservation TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_reservation_tenant_room ON TABLE reservation \
    COLUMNS tenant_id, room_id;
DEFINE INDEX idx_reservation_tenant_status ON TABLE reservation \
    COLUMNS tenant_id, status;

-- =======================================================================
-- Payments (scoped through the owning reservation)
-- =======================================================================
DEFINE TABLE payment SCHEMAFULL;
DEFINE FIELD reservation_id ON TABLE payment TYPE string;
DEFINE FIELD amount ON TABLE payment TYPE int;
DEFINE FIELD method ON TABLE payment TYPE string \
    ASSERT $value IN ['Cash', 'Card', 'Transfer', 'Other'];
DEFINE FIELD status ON TABLE payment TYPE string \
    ASSERT $value IN ['Pending', 'Completed', 'Failed'];
DEFINE FIELD reference ON TABLE payment TYPE option<string>;
DEFINE FIELD created_at ON TABLE payment TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE payment TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_payment_reservation ON TABLE payment \
    COLUMNS reservation_id;
DEFINE INDEX idx_payment_status_created ON TABLE payment \
    COLUMNS status, created_at;

-- =======================================================================
-- Charges (tenant scope)
-- =======================================================================
DEFINE TABLE charge SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE charge TYPE string;
DEFINE FIELD reservation_id ON TABLE charge TYPE string;
DEFINE FIELD room_id ON TABLE charge TYPE string;
DEFINE FIELD kind ON TABLE charge TYPE string \
    ASSERT $value IN ['Minibar', 'Service', 'Laundry', 'Other'];
DEFINE FIELD description ON TABLE charge TYPE string;
DEFINE FIELD quantity ON TABLE charge TYPE int ASSERT $value > 0;
DEFINE FIELD unit_price ON TABLE charge TYPE int ASSERT $value > 0;
DEFINE FIELD total ON TABLE charge TYPE int;
DEFINE FIELD created_at ON TABLE charge TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE charge TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_charge_tenant_reservation ON TABLE charge \
    COLUMNS tenant_id, reservation_id;

-- =======================================================================
-- Daily closes (tenant scope, write-once)
-- =======================================================================
DEFINE TABLE daily_close SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD tenant_id ON TABLE daily_close TYPE string;
DEFINE FIELD date_key ON TABLE daily_close TYPE string;
DEFINE FIELD total_amount ON TABLE daily_close TYPE int;
DEFINE FIELD payment_count ON TABLE daily_close TYPE int;
DEFINE FIELD by_method ON TABLE daily_close TYPE array<object> FLEXIBLE \
    DEFAULT [];
DEFINE FIELD notes ON TABLE daily_close TYPE option<string>;
DEFINE FIELD closed_by ON TABLE daily_close TYPE option<string>;
DEFINE FIELD created_at ON TABLE daily_close TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_daily_close_tenant_date ON TABLE daily_close \
    COLUMNS tenant_id, date_key UNIQUE;

-- =======================================================================
-- Audit Log (tenant scope, append-only)
-- =======================================================================
DEFINE TABLE audit_log SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD tenant_id ON TABLE audit_log TYPE string;
DEFINE FIELD actor_id ON TABLE audit_log TYPE option<string>;
DEFINE FIELD action ON TABLE audit_log TYPE string;
DEFINE FIELD entity ON TABLE audit_log TYPE string;
DEFINE FIELD entity_id ON TABLE audit_log TYPE option<string>;
DEFINE FIELD outcome ON TABLE audit_log TYPE string \
    ASSERT $value IN ['Success', 'Failure'];
DEFINE FIELD detail ON TABLE audit_log TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD timestamp ON TABLE audit_log TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_audit_tenant_time ON TABLE audit_log \
    COLUMNS tenant_id, timestamp;
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

            db.query(migration.sql)
                .await?
                .check()
                .map_err(|e| DbError::Migration(e.to_string()))?;

            db.query("CREATE _migration SET version = $version, name = $name")
                .bind(("version", migration.version))
                .bind(("name", migration.name.to_string()))
                .await?
                .check()
                .map_err(|e| DbError::Migration(e.to_string()))?;
        }
    }

    Ok(())
}
