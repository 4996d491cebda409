//! SurrealDB implementation of [`ChargeRepository`].
//!
//! Every write re-checks the owning reservation's status inside the
//! transaction: no charge can be added to, edited on, or removed from a
//! cancelled or checked-out reservation. Edits and deletions that would
//! shrink the grand total below the already-completed payment total are
//! refused, so the no-overpayment invariant cannot break retroactively.

use chrono::{DateTime, Utc};
use hotelier_core::error::{HotelierError, HotelierResult};
use hotelier_core::models::charge::{Charge, ChargeKind, CreateCharge, UpdateCharge};
use hotelier_core::repository::ChargeRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{guard, guard_args, DbError};
use crate::repository::reservation::parse_status as parse_reservation_status;

#[derive(Debug, SurrealValue)]
struct ChargeRow {
    tenant_id: String,
    reservation_id: String,
    room_id: String,
    kind: String,
    description: String,
    quantity: i64,
    unit_price: i64,
    total: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ChargeRow {
    fn into_charge(self, id: Uuid) -> Result<Charge, DbError> {
        Ok(Charge {
            id,
            tenant_id: parse_uuid(&self.tenant_id, "tenant")?,
            reservation_id: parse_uuid(&self.reservation_id, "reservation")?,
            room_id: parse_uuid(&self.room_id, "room")?,
            kind: parse_kind(&self.kind)?,
            description: self.description,
            quantity: self.quantity,
            unit_price: self.unit_price,
            total: self.total,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct ChargeRowWithId {
    record_id: String,
    tenant_id: String,
    reservation_id: String,
    room_id: String,
    kind: String,
    description: String,
    quantity: i64,
    unit_price: i64,
    total: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ChargeRowWithId {
    fn try_into_charge(self) -> Result<Charge, DbError> {
        let id = parse_uuid(&self.record_id, "charge")?;
        ChargeRow {
            tenant_id: self.tenant_id,
            reservation_id: self.reservation_id,
            room_id: self.room_id,
            kind: self.kind,
            description: self.description,
            quantity: self.quantity,
            unit_price: self.unit_price,
            total: self.total,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_charge(id)
    }
}

fn parse_uuid(raw: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::Migration(format!("invalid {what} UUID: {e}")))
}

fn parse_kind(s: &str) -> Result<ChargeKind, DbError> {
    match s {
        "Minibar" => Ok(ChargeKind::Minibar),
        "Service" => Ok(ChargeKind::Service),
        "Laundry" => Ok(ChargeKind::Laundry),
        "Other" => Ok(ChargeKind::Other),
        other => Err(DbError::Migration(format!("unknown charge kind: {other}"))),
    }
}

fn kind_to_string(k: &ChargeKind) -> &'static str {
    match k {
        ChargeKind::Minibar => "Minibar",
        ChargeKind::Service => "Service",
        ChargeKind::Laundry => "Laundry",
        ChargeKind::Other => "Other",
    }
}

/// Map guard markers thrown by the charge transactions.
fn map_charge_guard(e: surrealdb::Error, entity: &str, id: Uuid) -> HotelierError {
    let msg = e.to_string();
    if let Some(args) = guard_args(&msg, guard::BOOKING_LOCKED) {
        match args.first().map(|s| parse_reservation_status(s)) {
            Some(Ok(status)) => HotelierError::BookingLocked { status },
            _ => HotelierError::Database(msg),
        }
    } else if let Some(args) = guard_args(&msg, guard::OVERPAYMENT) {
        let grand_total = args.first().and_then(|s| s.parse::<i64>().ok());
        let completed = args.get(1).and_then(|s| s.parse::<i64>().ok());
        match (grand_total, completed) {
            (Some(grand_total), Some(completed)) => HotelierError::Overpayment {
                grand_total,
                completed,
                attempted: 0,
            },
            _ => HotelierError::Database(msg),
        }
    } else if guard_args(&msg, guard::NOT_FOUND).is_some() {
        HotelierError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    } else {
        HotelierError::from(DbError::from(e))
    }
}

/// SurrealDB implementation of the Charge repository.
#[derive(Clone)]
pub struct SurrealChargeRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealChargeRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ChargeRepository for SurrealChargeRepository<C> {
    async fn create(&self, input: CreateCharge) -> HotelierResult<Charge> {
        let id = Uuid::new_v4();
        let tenant_id = input.tenant_id;
        let reservation_id = input.reservation_id;

        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $res = (SELECT meta::id(id) AS record_id, status FROM \
                     type::record('reservation', $rid) WHERE tenant_id = $tenant_id); \
                 IF array::len($res) == 0 { THROW 'guard:not_found'; }; \
                 IF $res[0].status IN ['Cancelled', 'CheckedOut'] \
                     { THROW 'guard:booking_locked:' + $res[0].status; }; \
                 CREATE type::record('charge', $id) SET \
                     tenant_id = $tenant_id, reservation_id = $rid, \
                     room_id = $room_id, kind = $kind, \
                     description = $description, quantity = $quantity, \
                     unit_price = $unit_price, \
                     total = $quantity * $unit_price; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("rid", reservation_id.to_string()))
            .bind(("room_id", input.room_id.to_string()))
            .bind(("kind", kind_to_string(&input.kind).to_string()))
            .bind(("description", input.description))
            .bind(("quantity", input.quantity))
            .bind(("unit_price", input.unit_price))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| map_charge_guard(e, "reservation", reservation_id))?;

        self.get_by_id(tenant_id, id).await
    }

    async fn get_by_id(&self, tenant_id: Uuid, id: Uuid) -> HotelierResult<Charge> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('charge', $id) \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ChargeRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "charge".into(),
            id: id_str,
        })?;

        Ok(row.into_charge(id)?)
    }

    async fn update(&self, tenant_id: Uuid, id: Uuid, input: UpdateCharge) -> HotelierResult<Charge> {
        let mut sets = vec![
            "quantity = $new_quantity",
            "unit_price = $new_unit_price",
            "total = $new_total",
        ];
        if input.kind.is_some() {
            sets.push("kind = $kind");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        sets.push("updated_at = time::now()");

        // The new total is recomputed server-side from the effective
        // quantity and unit price, and the shrink guard keeps the grand
        // total at or above the completed payment total.
        let query = format!(
            "BEGIN TRANSACTION; \
             LET $rows = (SELECT meta::id(id) AS record_id, reservation_id, \
                 quantity, unit_price FROM type::record('charge', $id) \
                 WHERE tenant_id = $tenant_id); \
             IF array::len($rows) == 0 {{ THROW 'guard:not_found'; }}; \
             LET $charge = $rows[0]; \
             LET $res = (SELECT meta::id(id) AS record_id, status, total_price \
                 FROM type::record('reservation', $charge.reservation_id) \
                 WHERE tenant_id = $tenant_id); \
             IF array::len($res) == 0 {{ THROW 'guard:not_found'; }}; \
             IF $res[0].status IN ['Cancelled', 'CheckedOut'] \
                 {{ THROW 'guard:booking_locked:' + $res[0].status; }}; \
             LET $new_quantity = $quantity ?? $charge.quantity; \
             LET $new_unit_price = $unit_price ?? $charge.unit_price; \
             LET $new_total = $new_quantity * $new_unit_price; \
             LET $others = math::sum((SELECT VALUE total FROM charge \
                 WHERE tenant_id = $tenant_id \
                 AND reservation_id = $charge.reservation_id \
                 AND meta::id(id) != $id)); \
             LET $grand = $res[0].total_price + $others + $new_total; \
             LET $paid = math::sum((SELECT VALUE amount FROM payment \
                 WHERE reservation_id = $charge.reservation_id \
                 AND status = 'Completed')); \
             IF $paid > $grand \
                 {{ THROW 'guard:overpayment:' + <string>$grand + ':' \
                    + <string>$paid; }}; \
             UPDATE type::record('charge', $id) SET {} \
                 WHERE tenant_id = $tenant_id; \
             COMMIT TRANSACTION;",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("quantity", input.quantity))
            .bind(("unit_price", input.unit_price));
        if let Some(kind) = input.kind {
            builder = builder.bind(("kind", kind_to_string(&kind).to_string()));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }

        let result = builder.await.map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| map_charge_guard(e, "charge", id))?;

        self.get_by_id(tenant_id, id).await
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> HotelierResult<()> {
        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $rows = (SELECT meta::id(id) AS record_id, reservation_id, \
                     total FROM type::record('charge', $id) \
                     WHERE tenant_id = $tenant_id); \
                 IF array::len($rows) == 0 { THROW 'guard:not_found'; }; \
                 LET $charge = $rows[0]; \
                 LET $res = (SELECT meta::id(id) AS record_id, status, \
                     total_price FROM \
                     type::record('reservation', $charge.reservation_id) \
                     WHERE tenant_id = $tenant_id); \
                 IF array::len($res) == 0 { THROW 'guard:not_found'; }; \
                 IF $res[0].status IN ['Cancelled', 'CheckedOut'] \
                     { THROW 'guard:booking_locked:' + $res[0].status; }; \
                 LET $others = math::sum((SELECT VALUE total FROM charge \
                     WHERE tenant_id = $tenant_id \
                     AND reservation_id = $charge.reservation_id \
                     AND meta::id(id) != $id)); \
                 LET $grand = $res[0].total_price + $others; \
                 LET $paid = math::sum((SELECT VALUE amount FROM payment \
                     WHERE reservation_id = $charge.reservation_id \
                     AND status = 'Completed')); \
                 IF $paid > $grand \
                     { THROW 'guard:overpayment:' + <string>$grand + ':' \
                       + <string>$paid; }; \
                 DELETE type::record('charge', $id) WHERE tenant_id = $tenant_id; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| map_charge_guard(e, "charge", id))?;

        Ok(())
    }

    async fn list_for_reservation(
        &self,
        tenant_id: Uuid,
        reservation_id: Uuid,
    ) -> HotelierResult<Vec<Charge>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM charge \
                 WHERE tenant_id = $tenant_id AND reservation_id = $rid \
                 ORDER BY created_at ASC",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("rid", reservation_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ChargeRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|row| row.try_into_charge())
            .collect::<Result<Vec<_>, DbError>>()?)
    }
}
