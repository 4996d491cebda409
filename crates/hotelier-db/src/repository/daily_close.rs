//! SurrealDB implementation of [`DailyCloseRepository`].
//!
//! The close aggregates completed payments and inserts the snapshot in
//! one transaction. The existence check inside the transaction handles
//! the common duplicate case; the unique index on (tenant, date_key)
//! is the final race-breaker when two staff members close the same day
//! at the same instant. Published snapshots are write-once — the table
//! permissions deny UPDATE and DELETE.

use chrono::{DateTime, NaiveDate, Utc};
use hotelier_core::error::{HotelierError, HotelierResult};
use hotelier_core::models::daily_close::{CreateDailyClose, DailyClose};
use hotelier_core::repository::{DailyCloseRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{guard, guard_args, index_violation, DbError};
use crate::repository::payment::{method_rows_into_totals, MethodRow};

#[derive(Debug, SurrealValue)]
struct DailyCloseRow {
    tenant_id: String,
    date_key: String,
    total_amount: i64,
    payment_count: i64,
    by_method: Vec<MethodRow>,
    notes: Option<String>,
    closed_by: Option<String>,
    created_at: DateTime<Utc>,
}

impl DailyCloseRow {
    fn into_daily_close(self, id: Uuid) -> Result<DailyClose, DbError> {
        let tenant_id = Uuid::parse_str(&self.tenant_id)
            .map_err(|e| DbError::Migration(format!("invalid tenant UUID: {e}")))?;
        let closed_by = self
            .closed_by
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|e| DbError::Migration(format!("invalid user UUID: {e}")))?;
        let date_key = NaiveDate::parse_from_str(&self.date_key, "%Y-%m-%d")
            .map_err(|e| DbError::Migration(format!("invalid date key: {e}")))?;
        Ok(DailyClose {
            id,
            tenant_id,
            date_key,
            total_amount: self.total_amount,
            payment_count: self.payment_count,
            by_method: method_rows_into_totals(self.by_method)?,
            notes: self.notes,
            closed_by,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct DailyCloseRowWithId {
    record_id: String,
    tenant_id: String,
    date_key: String,
    total_amount: i64,
    payment_count: i64,
    by_method: Vec<MethodRow>,
    notes: Option<String>,
    closed_by: Option<String>,
    created_at: DateTime<Utc>,
}

impl DailyCloseRowWithId {
    fn try_into_daily_close(self) -> Result<DailyClose, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        DailyCloseRow {
            tenant_id: self.tenant_id,
            date_key: self.date_key,
            total_amount: self.total_amount,
            payment_count: self.payment_count,
            by_method: self.by_method,
            notes: self.notes,
            closed_by: self.closed_by,
            created_at: self.created_at,
        }
        .into_daily_close(id)
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the DailyClose repository.
#[derive(Clone)]
pub struct SurrealDailyCloseRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealDailyCloseRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> DailyCloseRepository for SurrealDailyCloseRepository<C> {
    async fn create(
        &self,
        input: CreateDailyClose,
        window: (DateTime<Utc>, DateTime<Utc>),
    ) -> HotelierResult<DailyClose> {
        let id = Uuid::new_v4();
        let tenant_id = input.tenant_id;
        let date_key = input.date_key;
        let (from, to) = window;

        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $existing = (SELECT meta::id(id) AS record_id FROM daily_close \
                     WHERE tenant_id = $tenant_id AND date_key = $date_key); \
                 IF array::len($existing) > 0 { THROW 'guard:close_exists'; }; \
                 LET $rids = (SELECT VALUE meta::id(id) FROM reservation \
                     WHERE tenant_id = $tenant_id); \
                 LET $pays = (SELECT amount, method FROM payment \
                     WHERE status = 'Completed' \
                     AND created_at >= $from AND created_at < $to \
                     AND reservation_id IN $rids); \
                 LET $breakdown = (SELECT method, math::sum(amount) AS amount, \
                     count() AS count FROM payment \
                     WHERE status = 'Completed' \
                     AND created_at >= $from AND created_at < $to \
                     AND reservation_id IN $rids \
                     GROUP BY method); \
                 CREATE type::record('daily_close', $id) SET \
                     tenant_id = $tenant_id, date_key = $date_key, \
                     total_amount = math::sum($pays.amount), \
                     payment_count = array::len($pays), \
                     by_method = $breakdown, \
                     notes = $notes, closed_by = $closed_by; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("date_key", date_key.to_string()))
            .bind(("from", from))
            .bind(("to", to))
            .bind(("notes", input.notes))
            .bind(("closed_by", input.closed_by.map(|u| u.to_string())))
            .await
            .map_err(DbError::from)?;

        result.check().map_err(|e| {
            let msg = e.to_string();
            if guard_args(&msg, guard::CLOSE_EXISTS).is_some()
                || index_violation(&msg, "idx_daily_close_tenant_date")
            {
                HotelierError::DailyCloseExists { date_key }
            } else {
                HotelierError::from(DbError::from(e))
            }
        })?;

        self.get_by_date(tenant_id, date_key).await
    }

    async fn get_by_date(&self, tenant_id: Uuid, date_key: NaiveDate) -> HotelierResult<DailyClose> {
        let date_key_str = date_key.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM daily_close \
                 WHERE tenant_id = $tenant_id AND date_key = $date_key",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("date_key", date_key_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DailyCloseRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "daily_close".into(),
            id: date_key_str,
        })?;

        Ok(row.try_into_daily_close()?)
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> HotelierResult<PaginatedResult<DailyClose>> {
        let tenant_id_str = tenant_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM daily_close \
                 WHERE tenant_id = $tenant_id GROUP ALL",
            )
            .bind(("tenant_id", tenant_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM daily_close \
                 WHERE tenant_id = $tenant_id \
                 ORDER BY date_key DESC \
                 LIMIT $limit START $offset",
            )
            .bind(("tenant_id", tenant_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DailyCloseRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_daily_close())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
