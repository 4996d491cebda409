//! SurrealDB implementation of [`GuestRepository`].

use chrono::{DateTime, Utc};
use hotelier_core::error::HotelierResult;
use hotelier_core::models::guest::{CreateGuest, Guest, UpdateGuest};
use hotelier_core::repository::{GuestRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct GuestRow {
    tenant_id: String,
    full_name: String,
    email: Option<String>,
    phone: Option<String>,
    document_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl GuestRow {
    fn into_guest(self, id: Uuid) -> Result<Guest, DbError> {
        let tenant_id = Uuid::parse_str(&self.tenant_id)
            .map_err(|e| DbError::Migration(format!("invalid tenant UUID: {e}")))?;
        Ok(Guest {
            id,
            tenant_id,
            full_name: self.full_name,
            email: self.email,
            phone: self.phone,
            document_id: self.document_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct GuestRowWithId {
    record_id: String,
    tenant_id: String,
    full_name: String,
    email: Option<String>,
    phone: Option<String>,
    document_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl GuestRowWithId {
    fn try_into_guest(self) -> Result<Guest, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        let tenant_id = Uuid::parse_str(&self.tenant_id)
            .map_err(|e| DbError::Migration(format!("invalid tenant UUID: {e}")))?;
        Ok(Guest {
            id,
            tenant_id,
            full_name: self.full_name,
            email: self.email,
            phone: self.phone,
            document_id: self.document_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Guest repository.
#[derive(Clone)]
pub struct SurrealGuestRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealGuestRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> GuestRepository for SurrealGuestRepository<C> {
    async fn create(&self, input: CreateGuest) -> HotelierResult<Guest> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "CREATE type::record('guest', $id) SET \
                 tenant_id = $tenant_id, full_name = $full_name, \
                 email = $email, phone = $phone, \
                 document_id = $document_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("full_name", input.full_name))
            .bind(("email", input.email))
            .bind(("phone", input.phone))
            .bind(("document_id", input.document_id))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GuestRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "guest".into(),
            id: id_str,
        })?;

        Ok(row.into_guest(id)?)
    }

    async fn get_by_id(&self, tenant_id: Uuid, id: Uuid) -> HotelierResult<Guest> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('guest', $id) \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GuestRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "guest".into(),
            id: id_str,
        })?;

        Ok(row.into_guest(id)?)
    }

    async fn update(&self, tenant_id: Uuid, id: Uuid, input: UpdateGuest) -> HotelierResult<Guest> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.full_name.is_some() {
            sets.push("full_name = $full_name");
        }
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.phone.is_some() {
            sets.push("phone = $phone");
        }
        if input.document_id.is_some() {
            sets.push("document_id = $document_id");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('guest', $id) SET {} \
             WHERE tenant_id = $tenant_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()));
        if let Some(full_name) = input.full_name {
            builder = builder.bind(("full_name", full_name));
        }
        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }
        if let Some(phone) = input.phone {
            builder = builder.bind(("phone", phone));
        }
        if let Some(document_id) = input.document_id {
            builder = builder.bind(("document_id", document_id));
        }

        let mut result = builder.await.map_err(DbError::from)?;

        let rows: Vec<GuestRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "guest".into(),
            id: id_str,
        })?;

        Ok(row.into_guest(id)?)
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> HotelierResult<()> {
        self.db
            .query(
                "DELETE type::record('guest', $id) \
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
    ) -> HotelierResult<PaginatedResult<Guest>> {
        let tenant_id_str = tenant_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM guest \
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
                "SELECT meta::id(id) AS record_id, * FROM guest \
                 WHERE tenant_id = $tenant_id \
                 ORDER BY full_name ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("tenant_id", tenant_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GuestRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_guest())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
