//! SurrealDB implementation of [`PaymentRepository`].
//!
//! Payment rows carry no tenant id — the tenant is derived through the
//! owning reservation, so every query here scopes through the
//! reservation table. The overpayment cap on `Completed` payments is
//! enforced inside the write transaction.

use chrono::{DateTime, Utc};
use hotelier_core::error::{HotelierError, HotelierResult};
use hotelier_core::models::daily_close::{CloseTotals, MethodTotal};
use hotelier_core::models::payment::{
    CreatePayment, Payment, PaymentMethod, PaymentStatus, UpdatePayment,
};
use hotelier_core::repository::PaymentRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{guard, guard_args, DbError};

#[derive(Debug, SurrealValue)]
struct PaymentRow {
    reservation_id: String,
    amount: i64,
    method: String,
    status: String,
    reference: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PaymentRow {
    fn into_payment(self, id: Uuid) -> Result<Payment, DbError> {
        let reservation_id = Uuid::parse_str(&self.reservation_id)
            .map_err(|e| DbError::Migration(format!("invalid reservation UUID: {e}")))?;
        Ok(Payment {
            id,
            reservation_id,
            amount: self.amount,
            method: parse_method(&self.method)?,
            status: parse_status(&self.status)?,
            reference: self.reference,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct PaymentRowWithId {
    record_id: String,
    reservation_id: String,
    amount: i64,
    method: String,
    status: String,
    reference: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PaymentRowWithId {
    fn try_into_payment(self) -> Result<Payment, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        PaymentRow {
            reservation_id: self.reservation_id,
            amount: self.amount,
            method: self.method,
            status: self.status,
            reference: self.reference,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_payment(id)
    }
}

/// Row struct for the GROUP ALL totals query.
#[derive(Debug, SurrealValue)]
struct TotalsRow {
    amount_total: i64,
    payment_count: i64,
}

/// Row struct for ownership checks that only need the record id.
#[derive(Debug, SurrealValue)]
struct OwnerRow {
    #[allow(dead_code)]
    record_id: String,
}

/// Row struct for the per-method breakdown query. Shared with the
/// daily-close repository, which persists the same aggregation.
#[derive(Debug, SurrealValue)]
pub(crate) struct MethodRow {
    pub(crate) method: String,
    pub(crate) amount: i64,
    pub(crate) count: i64,
}

pub(crate) fn parse_method(s: &str) -> Result<PaymentMethod, DbError> {
    match s {
        "Cash" => Ok(PaymentMethod::Cash),
        "Card" => Ok(PaymentMethod::Card),
        "Transfer" => Ok(PaymentMethod::Transfer),
        "Other" => Ok(PaymentMethod::Other),
        other => Err(DbError::Migration(format!(
            "unknown payment method: {other}"
        ))),
    }
}

pub(crate) fn method_to_string(m: &PaymentMethod) -> &'static str {
    match m {
        PaymentMethod::Cash => "Cash",
        PaymentMethod::Card => "Card",
        PaymentMethod::Transfer => "Transfer",
        PaymentMethod::Other => "Other",
    }
}

fn parse_status(s: &str) -> Result<PaymentStatus, DbError> {
    match s {
        "Pending" => Ok(PaymentStatus::Pending),
        "Completed" => Ok(PaymentStatus::Completed),
        "Failed" => Ok(PaymentStatus::Failed),
        other => Err(DbError::Migration(format!(
            "unknown payment status: {other}"
        ))),
    }
}

fn status_to_string(s: &PaymentStatus) -> &'static str {
    match s {
        PaymentStatus::Pending => "Pending",
        PaymentStatus::Completed => "Completed",
        PaymentStatus::Failed => "Failed",
    }
}

pub(crate) fn method_rows_into_totals(
    rows: Vec<MethodRow>,
) -> Result<Vec<MethodTotal>, DbError> {
    rows.into_iter()
        .map(|row| {
            Ok(MethodTotal {
                method: parse_method(&row.method)?,
                amount: row.amount,
                count: row.count,
            })
        })
        .collect()
}

/// Map a guard failure from a payment write into a domain error.
/// `attempted` is the completed amount the write tried to add.
fn map_payment_guard(e: surrealdb::Error, id: Uuid, attempted: Option<i64>) -> HotelierError {
    let msg = e.to_string();
    if let Some(args) = guard_args(&msg, guard::OVERPAYMENT) {
        let grand_total = args.first().and_then(|s| s.parse::<i64>().ok());
        let completed = args.get(1).and_then(|s| s.parse::<i64>().ok());
        let thrown_attempt = args.get(2).and_then(|s| s.parse::<i64>().ok());
        match (grand_total, completed) {
            (Some(grand_total), Some(completed)) => HotelierError::Overpayment {
                grand_total,
                completed,
                attempted: attempted.or(thrown_attempt).unwrap_or(0),
            },
            _ => HotelierError::Database(msg),
        }
    } else if guard_args(&msg, guard::NOT_FOUND).is_some() {
        HotelierError::NotFound {
            entity: "payment".into(),
            id: id.to_string(),
        }
    } else {
        HotelierError::from(DbError::from(e))
    }
}

/// SurrealDB implementation of the Payment repository.
#[derive(Clone)]
pub struct SurrealPaymentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPaymentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PaymentRepository for SurrealPaymentRepository<C> {
    async fn create(&self, tenant_id: Uuid, input: CreatePayment) -> HotelierResult<Payment> {
        let id = Uuid::new_v4();
        let reservation_id = input.reservation_id;

        // The cap applies only to payments arriving as Completed.
        let cap_check = if input.status == PaymentStatus::Completed {
            "LET $charges_total = math::sum((SELECT VALUE total FROM charge \
                 WHERE tenant_id = $tenant_id AND reservation_id = $rid)); \
             LET $grand = $res[0].total_price + $charges_total; \
             LET $paid = math::sum((SELECT VALUE amount FROM payment \
                 WHERE reservation_id = $rid AND status = 'Completed')); \
             IF $paid + $amount > $grand \
                 { THROW 'guard:overpayment:' + <string>$grand + ':' \
                   + <string>$paid + ':' + <string>$amount; }; "
        } else {
            ""
        };

        let query = format!(
            "BEGIN TRANSACTION; \
             LET $res = (SELECT meta::id(id) AS record_id, total_price FROM \
                 type::record('reservation', $rid) WHERE tenant_id = $tenant_id); \
             IF array::len($res) == 0 {{ THROW 'guard:not_found'; }}; \
             {cap_check}\
             CREATE type::record('payment', $id) SET \
                 reservation_id = $rid, amount = $amount, \
                 method = $method, status = $status, \
                 reference = $reference; \
             COMMIT TRANSACTION;"
        );

        let attempted = input.amount;
        let result = self
            .db
            .query(&query)
            .bind(("id", id.to_string()))
            .bind(("rid", reservation_id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("amount", input.amount))
            .bind(("method", method_to_string(&input.method).to_string()))
            .bind(("status", status_to_string(&input.status).to_string()))
            .bind(("reference", input.reference))
            .await
            .map_err(DbError::from)?;

        result.check().map_err(|e| {
            let msg = e.to_string();
            if guard_args(&msg, guard::NOT_FOUND).is_some() {
                HotelierError::NotFound {
                    entity: "reservation".into(),
                    id: reservation_id.to_string(),
                }
            } else {
                map_payment_guard(e, id, Some(attempted))
            }
        })?;

        self.get_by_id(tenant_id, id).await
    }

    async fn get_by_id(&self, tenant_id: Uuid, id: Uuid) -> HotelierResult<Payment> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('payment', $id) \
                 WHERE reservation_id IN \
                 (SELECT VALUE meta::id(id) FROM reservation \
                  WHERE tenant_id = $tenant_id)",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PaymentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "payment".into(),
            id: id_str,
        })?;

        Ok(row.into_payment(id)?)
    }

    async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdatePayment,
    ) -> HotelierResult<Payment> {
        let mut sets = Vec::new();
        if input.amount.is_some() {
            sets.push("amount = $amount");
        }
        if input.method.is_some() {
            sets.push("method = $method");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        match input.reference {
            Some(Some(_)) => sets.push("reference = $reference"),
            Some(None) => sets.push("reference = NONE"),
            None => {}
        }
        sets.push("updated_at = time::now()");

        // The prospective status/amount fall back to the stored values;
        // the cap is recomputed with this payment excluded from the
        // existing-completed total.
        let query = format!(
            "BEGIN TRANSACTION; \
             LET $pay_rows = (SELECT meta::id(id) AS record_id, reservation_id, \
                 amount, status FROM type::record('payment', $id)); \
             IF array::len($pay_rows) == 0 {{ THROW 'guard:not_found'; }}; \
             LET $pay = $pay_rows[0]; \
             LET $res = (SELECT meta::id(id) AS record_id, total_price FROM \
                 type::record('reservation', $pay.reservation_id) \
                 WHERE tenant_id = $tenant_id); \
             IF array::len($res) == 0 {{ THROW 'guard:not_found'; }}; \
             LET $new_amount = $amount ?? $pay.amount; \
             LET $new_status = $status ?? $pay.status; \
             IF $new_status == 'Completed' {{ \
                 LET $charges_total = math::sum((SELECT VALUE total FROM charge \
                     WHERE tenant_id = $tenant_id \
                     AND reservation_id = $pay.reservation_id)); \
                 LET $grand = $res[0].total_price + $charges_total; \
                 LET $paid = math::sum((SELECT VALUE amount FROM payment \
                     WHERE reservation_id = $pay.reservation_id \
                     AND status = 'Completed' AND meta::id(id) != $id)); \
                 IF $paid + $new_amount > $grand \
                     {{ THROW 'guard:overpayment:' + <string>$grand + ':' \
                        + <string>$paid + ':' + <string>$new_amount; }}; \
             }}; \
             UPDATE type::record('payment', $id) SET {}; \
             COMMIT TRANSACTION;",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("amount", input.amount))
            .bind((
                "status",
                input.status.as_ref().map(|s| status_to_string(s).to_string()),
            ));
        if let Some(method) = input.method {
            builder = builder.bind(("method", method_to_string(&method).to_string()));
        }
        if let Some(Some(reference)) = input.reference {
            builder = builder.bind(("reference", reference));
        }

        let result = builder.await.map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| map_payment_guard(e, id, input.amount))?;

        self.get_by_id(tenant_id, id).await
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> HotelierResult<()> {
        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $pay_rows = (SELECT meta::id(id) AS record_id, \
                     reservation_id FROM type::record('payment', $id)); \
                 IF array::len($pay_rows) == 0 { THROW 'guard:not_found'; }; \
                 LET $res = (SELECT meta::id(id) AS record_id FROM \
                     type::record('reservation', $pay_rows[0].reservation_id) \
                     WHERE tenant_id = $tenant_id); \
                 IF array::len($res) == 0 { THROW 'guard:not_found'; }; \
                 DELETE type::record('payment', $id); \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        result.check().map_err(|e| {
            let msg = e.to_string();
            if guard_args(&msg, guard::NOT_FOUND).is_some() {
                HotelierError::NotFound {
                    entity: "payment".into(),
                    id: id.to_string(),
                }
            } else {
                HotelierError::from(DbError::from(e))
            }
        })?;

        Ok(())
    }

    async fn list_for_reservation(
        &self,
        tenant_id: Uuid,
        reservation_id: Uuid,
    ) -> HotelierResult<Vec<Payment>> {
        let reservation_id_str = reservation_id.to_string();

        // Statement 0 verifies the reservation belongs to the tenant.
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id FROM \
                 type::record('reservation', $rid) WHERE tenant_id = $tenant_id",
            )
            .query(
                "SELECT meta::id(id) AS record_id, * FROM payment \
                 WHERE reservation_id = $rid \
                 ORDER BY created_at ASC",
            )
            .bind(("rid", reservation_id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let owner: Vec<OwnerRow> = result.take(0).map_err(DbError::from)?;
        if owner.is_empty() {
            return Err(DbError::NotFound {
                entity: "reservation".into(),
                id: reservation_id_str,
            }
            .into());
        }

        let rows: Vec<PaymentRowWithId> = result.take(1).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|row| row.try_into_payment())
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn aggregate_window(
        &self,
        tenant_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> HotelierResult<CloseTotals> {
        let mut result = self
            .db
            .query(
                "LET $rids = (SELECT VALUE meta::id(id) FROM reservation \
                     WHERE tenant_id = $tenant_id); \
                 SELECT math::sum(amount) AS amount_total, \
                     count() AS payment_count FROM payment \
                     WHERE status = 'Completed' \
                     AND created_at >= $from AND created_at < $to \
                     AND reservation_id IN $rids \
                     GROUP ALL; \
                 SELECT method, math::sum(amount) AS amount, \
                     count() AS count FROM payment \
                     WHERE status = 'Completed' \
                     AND created_at >= $from AND created_at < $to \
                     AND reservation_id IN $rids \
                     GROUP BY method;",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("from", from))
            .bind(("to", to))
            .await
            .map_err(DbError::from)?;

        let totals: Vec<TotalsRow> = result.take(1).map_err(DbError::from)?;
        let method_rows: Vec<MethodRow> = result.take(2).map_err(DbError::from)?;

        let (total_amount, payment_count) = totals
            .first()
            .map(|t| (t.amount_total, t.payment_count))
            .unwrap_or((0, 0));

        Ok(CloseTotals {
            total_amount,
            payment_count,
            by_method: method_rows_into_totals(method_rows)?,
        })
    }
}
