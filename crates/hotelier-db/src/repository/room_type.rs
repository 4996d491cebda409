//! SurrealDB implementation of [`RoomTypeRepository`].

use chrono::{DateTime, Utc};
use hotelier_core::error::{HotelierError, HotelierResult};
use hotelier_core::models::room_type::{CreateRoomType, RoomType, UpdateRoomType};
use hotelier_core::repository::{PaginatedResult, Pagination, RoomTypeRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{index_violation, DbError};

#[derive(Debug, SurrealValue)]
struct RoomTypeRow {
    tenant_id: String,
    name: String,
    base_rate: i64,
    capacity: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoomTypeRow {
    fn into_room_type(self, id: Uuid) -> Result<RoomType, DbError> {
        let tenant_id = parse_uuid(&self.tenant_id, "tenant")?;
        Ok(RoomType {
            id,
            tenant_id,
            name: self.name,
            base_rate: self.base_rate,
            capacity: self.capacity,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct RoomTypeRowWithId {
    record_id: String,
    tenant_id: String,
    name: String,
    base_rate: i64,
    capacity: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoomTypeRowWithId {
    fn try_into_room_type(self) -> Result<RoomType, DbError> {
        let id = parse_uuid(&self.record_id, "room_type")?;
        let tenant_id = parse_uuid(&self.tenant_id, "tenant")?;
        Ok(RoomType {
            id,
            tenant_id,
            name: self.name,
            base_rate: self.base_rate,
            capacity: self.capacity,
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

fn name_conflict(e: surrealdb::Error) -> HotelierError {
    let msg = e.to_string();
    if index_violation(&msg, "idx_room_type_tenant_name") {
        HotelierError::Validation {
            field: "name".into(),
            message: "room type name is already in use".into(),
        }
    } else {
        HotelierError::from(DbError::from(e))
    }
}

/// SurrealDB implementation of the RoomType repository.
#[derive(Clone)]
pub struct SurrealRoomTypeRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRoomTypeRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> RoomTypeRepository for SurrealRoomTypeRepository<C> {
    async fn create(&self, input: CreateRoomType) -> HotelierResult<RoomType> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('room_type', $id) SET \
                 tenant_id = $tenant_id, name = $name, \
                 base_rate = $base_rate, capacity = $capacity",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("name", input.name))
            .bind(("base_rate", input.base_rate))
            .bind(("capacity", input.capacity))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(name_conflict)?;

        let rows: Vec<RoomTypeRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "room_type".into(),
            id: id_str,
        })?;

        Ok(row.into_room_type(id)?)
    }

    async fn get_by_id(&self, tenant_id: Uuid, id: Uuid) -> HotelierResult<RoomType> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('room_type', $id) \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoomTypeRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "room_type".into(),
            id: id_str,
        })?;

        Ok(row.into_room_type(id)?)
    }

    async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateRoomType,
    ) -> HotelierResult<RoomType> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.base_rate.is_some() {
            sets.push("base_rate = $base_rate");
        }
        if input.capacity.is_some() {
            sets.push("capacity = $capacity");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('room_type', $id) SET {} \
             WHERE tenant_id = $tenant_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()));
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(base_rate) = input.base_rate {
            builder = builder.bind(("base_rate", base_rate));
        }
        if let Some(capacity) = input.capacity {
            builder = builder.bind(("capacity", capacity));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(name_conflict)?;

        let rows: Vec<RoomTypeRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "room_type".into(),
            id: id_str,
        })?;

        Ok(row.into_room_type(id)?)
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> HotelierResult<()> {
        self.db
            .query(
                "DELETE type::record('room_type', $id) \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> HotelierResult<PaginatedResult<RoomType>> {
        let tenant_id_str = tenant_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM room_type \
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
                "SELECT meta::id(id) AS record_id, * FROM room_type \
                 WHERE tenant_id = $tenant_id \
                 ORDER BY name ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("tenant_id", tenant_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoomTypeRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_room_type())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
