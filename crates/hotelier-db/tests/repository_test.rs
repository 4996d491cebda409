//! Integration tests for the Tenant, RoomType, Room, and Guest
//! repository implementations using in-memory SurrealDB.

use hotelier_core::error::HotelierError;
use hotelier_core::models::guest::{CreateGuest, UpdateGuest};
use hotelier_core::models::room::{CreateRoom, RoomStatus, UpdateRoom};
use hotelier_core::models::room_type::{CreateRoomType, UpdateRoomType};
use hotelier_core::models::tenant::{CreateTenant, UpdateTenant};
use hotelier_core::repository::{
    GuestRepository, Pagination, RoomRepository, RoomTypeRepository, TenantRepository,
};
use hotelier_db::repository::{
    SurrealGuestRepository, SurrealRoomRepository, SurrealRoomTypeRepository,
    SurrealTenantRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

type Db = surrealdb::engine::local::Db;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    hotelier_db::run_migrations(&db).await.unwrap();
    db
}

fn hotel(slug: &str) -> CreateTenant {
    CreateTenant {
        name: format!("Hotel {slug}"),
        slug: slug.into(),
        reporting_offset_minutes: Some(60),
        metadata: None,
    }
}

// -----------------------------------------------------------------------
// Tenants
// -----------------------------------------------------------------------

#[tokio::test]
async fn create_and_get_tenant() {
    let db = setup().await;
    let repo = SurrealTenantRepository::new(db);

    let tenant = repo.create(hotel("grand-plaza")).await.unwrap();
    assert_eq!(tenant.name, "Hotel grand-plaza");
    assert_eq!(tenant.reporting_offset_minutes, Some(60));

    let fetched = repo.get_by_id(tenant.id).await.unwrap();
    assert_eq!(fetched.id, tenant.id);
    assert_eq!(fetched.slug, "grand-plaza");

    let by_slug = repo.get_by_slug("grand-plaza").await.unwrap();
    assert_eq!(by_slug.id, tenant.id);
}

#[tokio::test]
async fn tenant_slug_is_unique() {
    let db = setup().await;
    let repo = SurrealTenantRepository::new(db);

    repo.create(hotel("grand-plaza")).await.unwrap();
    let err = repo.create(hotel("grand-plaza")).await.unwrap_err();
    assert!(matches!(err, HotelierError::Validation { field, .. } if field == "slug"));
}

#[tokio::test]
async fn update_tenant_offset() {
    let db = setup().await;
    let repo = SurrealTenantRepository::new(db);

    let tenant = repo.create(hotel("grand-plaza")).await.unwrap();
    let updated = repo
        .update(
            tenant.id,
            UpdateTenant {
                reporting_offset_minutes: Some(-300),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.reporting_offset_minutes, Some(-300));
    assert_eq!(updated.name, tenant.name);
}

#[tokio::test]
async fn missing_tenant_reports_not_found() {
    let db = setup().await;
    let repo = SurrealTenantRepository::new(db);

    let err = repo.get_by_id(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, HotelierError::NotFound { .. }));
}

// -----------------------------------------------------------------------
// Room types
// -----------------------------------------------------------------------

#[tokio::test]
async fn room_type_crud_and_uniqueness() {
    let db = setup().await;
    let tenants = SurrealTenantRepository::new(db.clone());
    let repo = SurrealRoomTypeRepository::new(db);

    let tenant = tenants.create(hotel("grand-plaza")).await.unwrap();

    let suite = repo
        .create(CreateRoomType {
            tenant_id: tenant.id,
            name: "Suite".into(),
            base_rate: 25_000,
            capacity: 4,
        })
        .await
        .unwrap();
    assert_eq!(suite.base_rate, 25_000);

    let err = repo
        .create(CreateRoomType {
            tenant_id: tenant.id,
            name: "Suite".into(),
            base_rate: 30_000,
            capacity: 4,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, HotelierError::Validation { field, .. } if field == "name"));

    let updated = repo
        .update(
            tenant.id,
            suite.id,
            UpdateRoomType {
                base_rate: Some(27_500),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.base_rate, 27_500);

    repo.delete(tenant.id, suite.id).await.unwrap();
    let err = repo.get_by_id(tenant.id, suite.id).await.unwrap_err();
    assert!(matches!(err, HotelierError::NotFound { .. }));
}

#[tokio::test]
async fn same_room_type_name_allowed_across_tenants() {
    let db = setup().await;
    let tenants = SurrealTenantRepository::new(db.clone());
    let repo = SurrealRoomTypeRepository::new(db);

    let a = tenants.create(hotel("hotel-a")).await.unwrap();
    let b = tenants.create(hotel("hotel-b")).await.unwrap();

    for tenant_id in [a.id, b.id] {
        repo.create(CreateRoomType {
            tenant_id,
            name: "Standard".into(),
            base_rate: 8_000,
            capacity: 2,
        })
        .await
        .unwrap();
    }
}

// -----------------------------------------------------------------------
// Rooms
// -----------------------------------------------------------------------

#[tokio::test]
async fn room_crud_and_tenant_scoping() {
    let db = setup().await;
    let tenants = SurrealTenantRepository::new(db.clone());
    let room_types = SurrealRoomTypeRepository::new(db.clone());
    let repo = SurrealRoomRepository::new(db);

    let tenant = tenants.create(hotel("grand-plaza")).await.unwrap();
    let other = tenants.create(hotel("rival-inn")).await.unwrap();
    let room_type = room_types
        .create(CreateRoomType {
            tenant_id: tenant.id,
            name: "Standard".into(),
            base_rate: 8_000,
            capacity: 2,
        })
        .await
        .unwrap();

    let room = repo
        .create(CreateRoom {
            tenant_id: tenant.id,
            room_type_id: room_type.id,
            number: "101".into(),
            floor: Some(1),
            notes: None,
        })
        .await
        .unwrap();
    assert_eq!(room.status, RoomStatus::Available);

    // Same number within the tenant is refused; the neighbor hotel may
    // reuse it.
    let err = repo
        .create(CreateRoom {
            tenant_id: tenant.id,
            room_type_id: room_type.id,
            number: "101".into(),
            floor: Some(1),
            notes: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, HotelierError::Validation { field, .. } if field == "number"));

    repo.create(CreateRoom {
        tenant_id: other.id,
        room_type_id: room_type.id,
        number: "101".into(),
        floor: None,
        notes: None,
    })
    .await
    .unwrap();

    let by_number = repo.get_by_number(tenant.id, "101").await.unwrap();
    assert_eq!(by_number.id, room.id);

    // Cross-tenant lookups report absence, not denial.
    let err = repo.get_by_id(other.id, room.id).await.unwrap_err();
    assert!(matches!(err, HotelierError::NotFound { .. }));

    let renamed = repo
        .update(
            tenant.id,
            room.id,
            UpdateRoom {
                number: Some("102".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.number, "102");
}

// -----------------------------------------------------------------------
// Guests
// -----------------------------------------------------------------------

#[tokio::test]
async fn guest_crud_and_listing() {
    let db = setup().await;
    let tenants = SurrealTenantRepository::new(db.clone());
    let repo = SurrealGuestRepository::new(db);

    let tenant = tenants.create(hotel("grand-plaza")).await.unwrap();

    let guest = repo
        .create(CreateGuest {
            tenant_id: tenant.id,
            full_name: "Ada Lovelace".into(),
            email: Some("ada@example.com".into()),
            phone: None,
            document_id: None,
        })
        .await
        .unwrap();

    let updated = repo
        .update(
            tenant.id,
            guest.id,
            UpdateGuest {
                phone: Some("+34 600 000 000".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.phone.as_deref(), Some("+34 600 000 000"));
    assert_eq!(updated.email.as_deref(), Some("ada@example.com"));

    let page = repo.list(tenant.id, Pagination::default()).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items.len(), 1);

    repo.delete(tenant.id, guest.id).await.unwrap();
    let page = repo.list(tenant.id, Pagination::default()).await.unwrap();
    assert_eq!(page.total, 0);
}
