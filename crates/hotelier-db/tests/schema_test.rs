//! Tests for schema migrations using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use surrealdb_types::SurrealValue;

#[derive(Debug, SurrealValue)]
struct MigrationRow {
    version: u32,
    name: String,
}

async fn fresh_db() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    db
}

#[tokio::test]
async fn migrations_apply_on_a_fresh_database() {
    let db = fresh_db().await;
    hotelier_db::run_migrations(&db).await.unwrap();

    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version ASC")
        .await
        .unwrap();
    let rows: Vec<MigrationRow> = result.take(0).unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].version, 1);
    assert_eq!(rows[0].name, "initial_schema");
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let db = fresh_db().await;
    hotelier_db::run_migrations(&db).await.unwrap();
    hotelier_db::run_migrations(&db).await.unwrap();

    let mut result = db.query("SELECT * FROM _migration").await.unwrap();
    let rows: Vec<MigrationRow> = result.take(0).unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn status_constraints_reject_unknown_values() {
    let db = fresh_db().await;
    hotelier_db::run_migrations(&db).await.unwrap();

    // The reservation status field is a closed enum at the storage
    // layer too — case drift like 'completed' vs 'Completed' cannot
    // creep back in.
    let result = db
        .query(
            "CREATE reservation:test_bad_status SET \
             tenant_id = 't', room_id = 'r', guest_id = NONE, \
             created_by = NONE, check_in = time::now(), \
             check_out = time::now(), status = 'confirmed', \
             total_price = 100, checked_in_at = NONE, \
             checked_out_at = NONE, notes = NONE",
        )
        .await
        .unwrap()
        .check();

    assert!(result.is_err());
}

#[tokio::test]
async fn daily_close_is_unique_per_tenant_and_date() {
    let db = fresh_db().await;
    hotelier_db::run_migrations(&db).await.unwrap();

    db.query(
        "CREATE daily_close:first SET tenant_id = 't1', \
         date_key = '2025-01-01', total_amount = 100, \
         payment_count = 1, by_method = [], notes = NONE, \
         closed_by = NONE",
    )
    .await
    .unwrap()
    .check()
    .unwrap();

    // Same tenant and date violates the unique index.
    let duplicate = db
        .query(
            "CREATE daily_close:second SET tenant_id = 't1', \
             date_key = '2025-01-01', total_amount = 200, \
             payment_count = 2, by_method = [], notes = NONE, \
             closed_by = NONE",
        )
        .await
        .unwrap()
        .check();
    assert!(duplicate.is_err());

    // Another tenant may close the same date.
    db.query(
        "CREATE daily_close:third SET tenant_id = 't2', \
         date_key = '2025-01-01', total_amount = 300, \
         payment_count = 3, by_method = [], notes = NONE, \
         closed_by = NONE",
    )
    .await
    .unwrap()
    .check()
    .unwrap();
}
