//! SurrealDB implementation of [`RoomRepository`].
//!
//! Manual status changes and deletion run as guarded transactions: the
//! check for an active check-in happens in the same atomic unit as the
//! write, so a concurrent check-in cannot slip past the guard.

use chrono::{DateTime, Utc};
use hotelier_core::error::{HotelierError, HotelierResult};
use hotelier_core::models::room::{CreateRoom, Room, RoomStatus, UpdateRoom};
use hotelier_core::repository::{PaginatedResult, Pagination, RoomRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{guard, guard_args, index_violation, DbError};

#[derive(Debug, SurrealValue)]
struct RoomRow {
    tenant_id: String,
    room_type_id: String,
    number: String,
    floor: Option<i32>,
    status: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoomRow {
    fn into_room(self, id: Uuid) -> Result<Room, DbError> {
        let tenant_id = parse_uuid(&self.tenant_id, "tenant")?;
        let room_type_id = parse_uuid(&self.room_type_id, "room_type")?;
        Ok(Room {
            id,
            tenant_id,
            room_type_id,
            number: self.number,
            floor: self.floor,
            status: parse_status(&self.status)?,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct RoomRowWithId {
    record_id: String,
    tenant_id: String,
    room_type_id: String,
    number: String,
    floor: Option<i32>,
    status: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoomRowWithId {
    fn try_into_room(self) -> Result<Room, DbError> {
        let id = parse_uuid(&self.record_id, "room")?;
        let tenant_id = parse_uuid(&self.tenant_id, "tenant")?;
        let room_type_id = parse_uuid(&self.room_type_id, "room_type")?;
        Ok(Room {
            id,
            tenant_id,
            room_type_id,
            number: self.number,
            floor: self.floor,
            status: parse_status(&self.status)?,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn parse_uuid(raw: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::Migration(format!("invalid {what} UUID: {e}")))
}

fn parse_status(s: &str) -> Result<RoomStatus, DbError> {
    match s {
        "Available" => Ok(RoomStatus::Available),
        "Occupied" => Ok(RoomStatus::Occupied),
        "Maintenance" => Ok(RoomStatus::Maintenance),
        other => Err(DbError::Migration(format!("unknown room status: {other}"))),
    }
}

fn status_to_string(s: &RoomStatus) -> &'static str {
    match s {
        RoomStatus::Available => "Available",
        RoomStatus::Occupied => "Occupied",
        RoomStatus::Maintenance => "Maintenance",
    }
}

fn number_conflict(e: surrealdb::Error) -> HotelierError {
    let msg = e.to_string();
    if index_violation(&msg, "idx_room_tenant_number") {
        HotelierError::Validation {
            field: "number".into(),
            message: "room number is already in use".into(),
        }
    } else {
        HotelierError::from(DbError::from(e))
    }
}

/// SurrealDB implementation of the Room repository.
#[derive(Clone)]
pub struct SurrealRoomRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRoomRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Map guard markers thrown by the occupancy transactions.
    fn map_guard_error(&self, e: surrealdb::Error, id: Uuid) -> HotelierError {
        let msg = e.to_string();
        if guard_args(&msg, guard::ROOM_OCCUPIED).is_some() {
            HotelierError::OccupiedRoom { room_id: id }
        } else if guard_args(&msg, guard::NOT_FOUND).is_some() {
            HotelierError::NotFound {
                entity: "room".into(),
                id: id.to_string(),
            }
        } else {
            HotelierError::from(DbError::from(e))
        }
    }
}

impl<C: Connection> RoomRepository for SurrealRoomRepository<C> {
    async fn create(&self, input: CreateRoom) -> HotelierResult<Room> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('room', $id) SET \
                 tenant_id = $tenant_id, room_type_id = $room_type_id, \
                 number = $number, floor = $floor, \
                 status = 'Available', notes = $notes",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("room_type_id", input.room_type_id.to_string()))
            .bind(("number", input.number))
            .bind(("floor", input.floor))
            .bind(("notes", input.notes))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(number_conflict)?;

        let rows: Vec<RoomRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "room".into(),
            id: id_str,
        })?;

        Ok(row.into_room(id)?)
    }

    async fn get_by_id(&self, tenant_id: Uuid, id: Uuid) -> HotelierResult<Room> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('room', $id) \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoomRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "room".into(),
            id: id_str,
        })?;

        Ok(row.into_room(id)?)
    }

    async fn get_by_number(&self, tenant_id: Uuid, number: &str) -> HotelierResult<Room> {
        let number_owned = number.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM room \
                 WHERE tenant_id = $tenant_id AND number = $number",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("number", number_owned.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoomRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "room".into(),
            id: number_owned,
        })?;

        Ok(row.try_into_room()?)
    }

    async fn update(&self, tenant_id: Uuid, id: Uuid, input: UpdateRoom) -> HotelierResult<Room> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.room_type_id.is_some() {
            sets.push("room_type_id = $room_type_id");
        }
        if input.number.is_some() {
            sets.push("number = $number");
        }
        if input.floor.is_some() {
            sets.push("floor = $floor");
        }
        if input.notes.is_some() {
            sets.push("notes = $notes");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('room', $id) SET {} \
             WHERE tenant_id = $tenant_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()));
        if let Some(room_type_id) = input.room_type_id {
            builder = builder.bind(("room_type_id", room_type_id.to_string()));
        }
        if let Some(number) = input.number {
            builder = builder.bind(("number", number));
        }
        if let Some(floor) = input.floor {
            builder = builder.bind(("floor", floor));
        }
        if let Some(notes) = input.notes {
            builder = builder.bind(("notes", notes));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(number_conflict)?;

        let rows: Vec<RoomRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "room".into(),
            id: id_str,
        })?;

        Ok(row.into_room(id)?)
    }

    async fn set_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        status: RoomStatus,
    ) -> HotelierResult<Room> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $rows = (SELECT meta::id(id) AS record_id FROM \
                     type::record('room', $id) WHERE tenant_id = $tenant_id); \
                 IF array::len($rows) == 0 { THROW 'guard:not_found'; }; \
                 LET $active = (SELECT meta::id(id) AS record_id FROM reservation \
                     WHERE tenant_id = $tenant_id AND room_id = $id \
                     AND status = 'CheckedIn'); \
                 IF array::len($active) > 0 { THROW 'guard:room_occupied'; }; \
                 UPDATE type::record('room', $id) SET \
                     status = $status, updated_at = time::now() \
                     WHERE tenant_id = $tenant_id; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("status", status_to_string(&status).to_string()))
            .await
            .map_err(DbError::from)?;

        result.check().map_err(|e| self.map_guard_error(e, id))?;

        self.get_by_id(tenant_id, id).await
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> HotelierResult<()> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $rows = (SELECT meta::id(id) AS record_id, status FROM \
                     type::record('room', $id) WHERE tenant_id = $tenant_id); \
                 IF array::len($rows) == 0 { THROW 'guard:not_found'; }; \
                 LET $active = (SELECT meta::id(id) AS record_id FROM reservation \
                     WHERE tenant_id = $tenant_id AND room_id = $id \
                     AND status = 'CheckedIn'); \
                 IF $rows[0].status == 'Occupied' OR array::len($active) > 0 \
                     { THROW 'guard:room_occupied'; }; \
                 DELETE type::record('room', $id) WHERE tenant_id = $tenant_id; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id_str))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        result.check().map_err(|e| self.map_guard_error(e, id))?;

        Ok(())
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> HotelierResult<PaginatedResult<Room>> {
        let tenant_id_str = tenant_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM room \
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
                "SELECT meta::id(id) AS record_id, * FROM room \
                 WHERE tenant_id = $tenant_id \
                 ORDER BY number ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("tenant_id", tenant_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoomRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_room())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
