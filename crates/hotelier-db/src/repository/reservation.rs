//! SurrealDB implementation of [`ReservationRepository`].
//!
//! The create, update, and transition paths run as single
//! multi-statement transactions: the availability re-check, the
//! stale-status check, and the checkout balance gate execute in the
//! same atomic unit as the write, closing the check-then-act race
//! between concurrent requests.

use chrono::{DateTime, Utc};
use hotelier_core::error::{HotelierError, HotelierResult};
use hotelier_core::models::reservation::{
    CreateReservation, Reservation, ReservationStatus, UpdateReservation,
};
use hotelier_core::repository::{PaginatedResult, Pagination, ReservationRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{check_tx, guard, guard_args, DbError};

#[derive(Debug, SurrealValue)]
struct ReservationRow {
    tenant_id: String,
    room_id: String,
    guest_id: Option<String>,
    created_by: Option<String>,
    check_in: DateTime<Utc>,
    check_out: DateTime<Utc>,
    status: String,
    total_price: i64,
    checked_in_at: Option<DateTime<Utc>>,
    checked_out_at: Option<DateTime<Utc>>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ReservationRow {
    fn into_reservation(self, id: Uuid) -> Result<Reservation, DbError> {
        let tenant_id = parse_uuid(&self.tenant_id, "tenant")?;
        let room_id = parse_uuid(&self.room_id, "room")?;
        let guest_id = self
            .guest_id
            .as_deref()
            .map(|g| parse_uuid(g, "guest"))
            .transpose()?;
        let created_by = self
            .created_by
            .as_deref()
            .map(|u| parse_uuid(u, "user"))
            .transpose()?;
        Ok(Reservation {
            id,
            tenant_id,
            room_id,
            guest_id,
            created_by,
            check_in: self.check_in,
            check_out: self.check_out,
            status: parse_status(&self.status)?,
            total_price: self.total_price,
            checked_in_at: self.checked_in_at,
            checked_out_at: self.checked_out_at,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct ReservationRowWithId {
    record_id: String,
    tenant_id: String,
    room_id: String,
    guest_id: Option<String>,
    created_by: Option<String>,
    check_in: DateTime<Utc>,
    check_out: DateTime<Utc>,
    status: String,
    total_price: i64,
    checked_in_at: Option<DateTime<Utc>>,
    checked_out_at: Option<DateTime<Utc>>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ReservationRowWithId {
    fn try_into_reservation(self) -> Result<Reservation, DbError> {
        let id = parse_uuid(&self.record_id, "reservation")?;
        ReservationRow {
            tenant_id: self.tenant_id,
            room_id: self.room_id,
            guest_id: self.guest_id,
            created_by: self.created_by,
            check_in: self.check_in,
            check_out: self.check_out,
            status: self.status,
            total_price: self.total_price,
            checked_in_at: self.checked_in_at,
            checked_out_at: self.checked_out_at,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_reservation(id)
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn parse_uuid(raw: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::Migration(format!("invalid {what} UUID: {e}")))
}

pub(crate) fn parse_status(s: &str) -> Result<ReservationStatus, DbError> {
    match s {
        "Pending" => Ok(ReservationStatus::Pending),
        "Confirmed" => Ok(ReservationStatus::Confirmed),
        "CheckedIn" => Ok(ReservationStatus::CheckedIn),
        "CheckedOut" => Ok(ReservationStatus::CheckedOut),
        "Cancelled" => Ok(ReservationStatus::Cancelled),
        other => Err(DbError::Migration(format!(
            "unknown reservation status: {other}"
        ))),
    }
}

pub(crate) fn status_to_string(s: &ReservationStatus) -> &'static str {
    match s {
        ReservationStatus::Pending => "Pending",
        ReservationStatus::Confirmed => "Confirmed",
        ReservationStatus::CheckedIn => "CheckedIn",
        ReservationStatus::CheckedOut => "CheckedOut",
        ReservationStatus::Cancelled => "Cancelled",
    }
}

/// SurrealDB implementation of the Reservation repository.
#[derive(Clone)]
pub struct SurrealReservationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealReservationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ReservationRepository for SurrealReservationRepository<C> {
    async fn create(
        &self,
        input: CreateReservation,
        total_price: i64,
    ) -> HotelierResult<Reservation> {
        let id = Uuid::new_v4();
        let tenant_id = input.tenant_id;
        let room_id = input.room_id;
        let check_in = input.check_in;
        let check_out = input.check_out;

        let mut result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $conflicts = (SELECT meta::id(id) AS record_id FROM reservation \
                     WHERE tenant_id = $tenant_id AND room_id = $room_id \
                     AND status != 'Cancelled' \
                     AND check_in < $check_out AND check_out > $check_in); \
                 IF array::len($conflicts) > 0 { THROW 'guard:room_not_available'; }; \
                 CREATE type::record('reservation', $id) SET \
                     tenant_id = $tenant_id, room_id = $room_id, \
                     guest_id = $guest_id, created_by = $created_by, \
                     check_in = $check_in, check_out = $check_out, \
                     status = 'Pending', total_price = $total_price, \
                     checked_in_at = NONE, checked_out_at = NONE, \
                     notes = $notes; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("room_id", room_id.to_string()))
            .bind(("guest_id", input.guest_id.map(|g| g.to_string())))
            .bind(("created_by", input.created_by.map(|u| u.to_string())))
            .bind(("check_in", check_in))
            .bind(("check_out", check_out))
            .bind(("total_price", total_price))
            .bind(("notes", input.notes))
            .await
            .map_err(DbError::from)?;

        check_tx(&mut result).map_err(|msg| {
            if guard_args(&msg, guard::ROOM_NOT_AVAILABLE).is_some() {
                HotelierError::RoomNotAvailable {
                    room_id,
                    check_in,
                    check_out,
                }
            } else {
                HotelierError::Database(msg)
            }
        })?;

        self.get_by_id(tenant_id, id).await
    }

    async fn get_by_id(&self, tenant_id: Uuid, id: Uuid) -> HotelierResult<Reservation> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('reservation', $id) \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ReservationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "reservation".into(),
            id: id_str,
        })?;

        Ok(row.into_reservation(id)?)
    }

    async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateReservation,
        total_price: Option<i64>,
    ) -> HotelierResult<Reservation> {
        // Pre-read to resolve the effective room/dates for fields the
        // caller left unchanged. The written state is exactly the state
        // the in-transaction overlap check validates, since all three
        // fields are set explicitly below.
        let existing = self.get_by_id(tenant_id, id).await?;
        let room_id = input.room_id.unwrap_or(existing.room_id);
        let check_in = input.check_in.unwrap_or(existing.check_in);
        let check_out = input.check_out.unwrap_or(existing.check_out);

        let mut sets = vec![
            "room_id = $room_id",
            "check_in = $check_in",
            "check_out = $check_out",
        ];
        match input.guest_id {
            Some(Some(_)) => sets.push("guest_id = $guest_id"),
            Some(None) => sets.push("guest_id = NONE"),
            None => {}
        }
        if input.notes.is_some() {
            sets.push("notes = $notes");
        }
        if total_price.is_some() {
            sets.push("total_price = $total_price");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "BEGIN TRANSACTION; \
             LET $rows = (SELECT meta::id(id) AS record_id, status FROM \
                 type::record('reservation', $id) WHERE tenant_id = $tenant_id); \
             IF array::len($rows) == 0 {{ THROW 'guard:not_found'; }}; \
             IF $rows[0].status NOT IN ['Pending', 'Confirmed'] \
                 {{ THROW 'guard:booking_locked:' + $rows[0].status; }}; \
             LET $conflicts = (SELECT meta::id(id) AS record_id FROM reservation \
                 WHERE tenant_id = $tenant_id AND room_id = $room_id \
                 AND meta::id(id) != $id AND status != 'Cancelled' \
                 AND check_in < $check_out AND check_out > $check_in); \
             IF array::len($conflicts) > 0 {{ THROW 'guard:room_not_available'; }}; \
             UPDATE type::record('reservation', $id) SET {} \
                 WHERE tenant_id = $tenant_id; \
             COMMIT TRANSACTION;",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("room_id", room_id.to_string()))
            .bind(("check_in", check_in))
            .bind(("check_out", check_out));
        if let Some(Some(guest_id)) = input.guest_id {
            builder = builder.bind(("guest_id", guest_id.to_string()));
        }
        if let Some(notes) = input.notes {
            builder = builder.bind(("notes", notes));
        }
        if let Some(total_price) = total_price {
            builder = builder.bind(("total_price", total_price));
        }

        let mut result = builder.await.map_err(DbError::from)?;

        check_tx(&mut result).map_err(|msg| {
            if guard_args(&msg, guard::ROOM_NOT_AVAILABLE).is_some() {
                HotelierError::RoomNotAvailable {
                    room_id,
                    check_in,
                    check_out,
                }
            } else if let Some(args) = guard_args(&msg, guard::BOOKING_LOCKED) {
                match args.first().map(|s| parse_status(s)) {
                    Some(Ok(status)) => HotelierError::BookingLocked { status },
                    _ => HotelierError::Database(msg),
                }
            } else if guard_args(&msg, guard::NOT_FOUND).is_some() {
                HotelierError::NotFound {
                    entity: "reservation".into(),
                    id: id.to_string(),
                }
            } else {
                HotelierError::Database(msg)
            }
        })?;

        self.get_by_id(tenant_id, id).await
    }

    async fn transition(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> HotelierResult<Reservation> {
        // The stale-status re-check and (for checkout) the balance gate
        // run inside the same transaction as the status write and the
        // room-status side effect.
        let prelude = "BEGIN TRANSACTION; \
             LET $rows = (SELECT meta::id(id) AS record_id, status, room_id, \
                 total_price FROM type::record('reservation', $id) \
                 WHERE tenant_id = $tenant_id); \
             IF array::len($rows) == 0 { THROW 'guard:not_found'; }; \
             IF $rows[0].status != $from \
                 { THROW 'guard:stale_status:' + $rows[0].status; }; ";

        let body = match to {
            ReservationStatus::CheckedIn => {
                // First entry stamps checked_in_at; re-entry is already
                // impossible via the lifecycle table, and `??` keeps the
                // stamp idempotent regardless.
                "UPDATE type::record('reservation', $id) SET \
                     status = $to, \
                     checked_in_at = checked_in_at ?? time::now(), \
                     updated_at = time::now() \
                     WHERE tenant_id = $tenant_id; \
                 UPDATE room SET status = 'Occupied', updated_at = time::now() \
                     WHERE tenant_id = $tenant_id \
                     AND meta::id(id) = $rows[0].room_id; "
            }
            ReservationStatus::CheckedOut => {
                // Checkout is gated on a zero balance, and the automatic
                // availability update never overrides a maintenance flag.
                "LET $charges_total = math::sum((SELECT VALUE total FROM charge \
                     WHERE tenant_id = $tenant_id AND reservation_id = $id)); \
                 LET $paid = math::sum((SELECT VALUE amount FROM payment \
                     WHERE reservation_id = $id AND status = 'Completed')); \
                 LET $due = math::max([0, \
                     $rows[0].total_price + $charges_total - $paid]); \
                 IF $due > 0 \
                     { THROW 'guard:outstanding_balance:' + <string>$due; }; \
                 UPDATE type::record('reservation', $id) SET \
                     status = $to, \
                     checked_out_at = checked_out_at ?? time::now(), \
                     updated_at = time::now() \
                     WHERE tenant_id = $tenant_id; \
                 UPDATE room SET status = 'Available', updated_at = time::now() \
                     WHERE tenant_id = $tenant_id \
                     AND meta::id(id) = $rows[0].room_id \
                     AND status != 'Maintenance'; "
            }
            _ => {
                "UPDATE type::record('reservation', $id) SET \
                     status = $to, updated_at = time::now() \
                     WHERE tenant_id = $tenant_id; "
            }
        };

        let query = format!("{prelude}{body}COMMIT TRANSACTION;");

        let mut result = self
            .db
            .query(&query)
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("from", status_to_string(&from).to_string()))
            .bind(("to", status_to_string(&to).to_string()))
            .await
            .map_err(DbError::from)?;

        check_tx(&mut result).map_err(|msg| {
            if let Some(args) = guard_args(&msg, guard::STALE_STATUS) {
                // The row moved under us; report the transition from the
                // status it actually has now.
                match args.first().map(|s| parse_status(s)) {
                    Some(Ok(current)) => HotelierError::InvalidTransition {
                        from: current,
                        to: to.clone(),
                    },
                    _ => HotelierError::Database(msg),
                }
            } else if let Some(args) = guard_args(&msg, guard::OUTSTANDING_BALANCE) {
                match args.first().and_then(|s| s.parse::<i64>().ok()) {
                    Some(due) => HotelierError::OutstandingBalance { due },
                    None => HotelierError::Database(msg),
                }
            } else if guard_args(&msg, guard::NOT_FOUND).is_some() {
                HotelierError::NotFound {
                    entity: "reservation".into(),
                    id: id.to_string(),
                }
            } else {
                HotelierError::Database(msg)
            }
        })?;

        self.get_by_id(tenant_id, id).await
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> HotelierResult<PaginatedResult<Reservation>> {
        let tenant_id_str = tenant_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM reservation \
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
                "SELECT meta::id(id) AS record_id, * FROM reservation \
                 WHERE tenant_id = $tenant_id \
                 ORDER BY check_in DESC \
                 LIMIT $limit START $offset",
            )
            .bind(("tenant_id", tenant_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ReservationRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_reservation())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn list_for_room(
        &self,
        tenant_id: Uuid,
        room_id: Uuid,
    ) -> HotelierResult<Vec<Reservation>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM reservation \
                 WHERE tenant_id = $tenant_id AND room_id = $room_id \
                 ORDER BY check_in ASC",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("room_id", room_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ReservationRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|row| row.try_into_reservation())
            .collect::<Result<Vec<_>, DbError>>()?)
    }
}
