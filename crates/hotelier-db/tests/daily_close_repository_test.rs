//! Integration tests for the daily close repository: write-once
//! snapshots keyed by (tenant, date).

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use hotelier_core::error::HotelierError;
use hotelier_core::models::daily_close::CreateDailyClose;
use hotelier_core::models::payment::{CreatePayment, PaymentMethod, PaymentStatus};
use hotelier_core::models::reservation::CreateReservation;
use hotelier_core::models::room::CreateRoom;
use hotelier_core::models::room_type::CreateRoomType;
use hotelier_core::models::tenant::CreateTenant;
use hotelier_core::repository::{
    DailyCloseRepository, Pagination, PaymentRepository, ReservationRepository,
    RoomRepository, RoomTypeRepository, TenantRepository,
};
use hotelier_db::repository::{
    SurrealDailyCloseRepository, SurrealPaymentRepository, SurrealReservationRepository,
    SurrealRoomRepository, SurrealRoomTypeRepository, SurrealTenantRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

type Db = surrealdb::engine::local::Db;

async fn setup() -> (Surreal<Db>, Uuid, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    hotelier_db::run_migrations(&db).await.unwrap();

    let tenant = SurrealTenantRepository::new(db.clone())
        .create(CreateTenant {
            name: "Grand Plaza".into(),
            slug: "grand-plaza".into(),
            reporting_offset_minutes: None,
            metadata: None,
        })
        .await
        .unwrap();

    let room_type = SurrealRoomTypeRepository::new(db.clone())
        .create(CreateRoomType {
            tenant_id: tenant.id,
            name: "Standard".into(),
            base_rate: 10_000,
            capacity: 2,
        })
        .await
        .unwrap();

    let room = SurrealRoomRepository::new(db.clone())
        .create(CreateRoom {
            tenant_id: tenant.id,
            room_type_id: room_type.id,
            number: "101".into(),
            floor: None,
            notes: None,
        })
        .await
        .unwrap();

    let reservation = SurrealReservationRepository::new(db.clone())
        .create(
            CreateReservation {
                tenant_id: tenant.id,
                room_id: room.id,
                guest_id: None,
                created_by: None,
                check_in: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
                check_out: Utc.with_ymd_and_hms(2025, 6, 8, 0, 0, 0).unwrap(),
                notes: None,
            },
            70_000,
        )
        .await
        .unwrap();

    (db, tenant.id, reservation.id)
}

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
}

fn window(d: u32) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc.with_ymd_and_hms(2025, 6, d, 0, 0, 0).unwrap();
    (start, start + chrono::Duration::days(1))
}

async fn completed_payment_at(
    db: &Surreal<Db>,
    tenant_id: Uuid,
    reservation_id: Uuid,
    amount: i64,
    method: PaymentMethod,
    ts: DateTime<Utc>,
) {
    let payment = SurrealPaymentRepository::new(db.clone())
        .create(
            tenant_id,
            CreatePayment {
                reservation_id,
                amount,
                method,
                status: PaymentStatus::Completed,
                reference: None,
            },
        )
        .await
        .unwrap();

    db.query("UPDATE type::record('payment', $id) SET created_at = $ts")
        .bind(("id", payment.id.to_string()))
        .bind(("ts", ts))
        .await
        .unwrap()
        .check()
        .unwrap();
}

#[tokio::test]
async fn close_aggregates_the_window() {
    let (db, tenant_id, reservation_id) = setup().await;
    let repo = SurrealDailyCloseRepository::new(db.clone());

    let noon = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
    completed_payment_at(&db, tenant_id, reservation_id, 30_000, PaymentMethod::Cash, noon).await;
    completed_payment_at(&db, tenant_id, reservation_id, 10_000, PaymentMethod::Card, noon).await;

    let close = repo
        .create(
            CreateDailyClose {
                tenant_id,
                date_key: date(1),
                notes: None,
                closed_by: None,
            },
            window(1),
        )
        .await
        .unwrap();

    assert_eq!(close.total_amount, 40_000);
    assert_eq!(close.payment_count, 2);
    assert_eq!(close.by_method.len(), 2);

    let fetched = repo.get_by_date(tenant_id, date(1)).await.unwrap();
    assert_eq!(fetched.id, close.id);
    assert_eq!(fetched.total_amount, 40_000);
}

#[tokio::test]
async fn an_empty_day_closes_at_zero() {
    let (db, tenant_id, _reservation_id) = setup().await;
    let repo = SurrealDailyCloseRepository::new(db);

    let close = repo
        .create(
            CreateDailyClose {
                tenant_id,
                date_key: date(2),
                notes: Some("no business".into()),
                closed_by: None,
            },
            window(2),
        )
        .await
        .unwrap();

    assert_eq!(close.total_amount, 0);
    assert_eq!(close.payment_count, 0);
    assert!(close.by_method.is_empty());
}

#[tokio::test]
async fn duplicate_close_is_rejected() {
    let (db, tenant_id, _reservation_id) = setup().await;
    let repo = SurrealDailyCloseRepository::new(db);

    let input = CreateDailyClose {
        tenant_id,
        date_key: date(3),
        notes: None,
        closed_by: None,
    };
    repo.create(input.clone(), window(3)).await.unwrap();

    let err = repo.create(input, window(3)).await.unwrap_err();
    assert!(matches!(
        err,
        HotelierError::DailyCloseExists { date_key } if date_key == date(3)
    ));
}

#[tokio::test]
async fn closes_list_per_tenant_only() {
    let (db, tenant_id, _reservation_id) = setup().await;
    let repo = SurrealDailyCloseRepository::new(db.clone());

    repo.create(
        CreateDailyClose {
            tenant_id,
            date_key: date(4),
            notes: None,
            closed_by: None,
        },
        window(4),
    )
    .await
    .unwrap();

    let other = SurrealTenantRepository::new(db)
        .create(CreateTenant {
            name: "Rival Inn".into(),
            slug: "rival-inn".into(),
            reporting_offset_minutes: None,
            metadata: None,
        })
        .await
        .unwrap();

    let page = repo.list(tenant_id, Pagination::default()).await.unwrap();
    assert_eq!(page.total, 1);

    let rival_page = repo.list(other.id, Pagination::default()).await.unwrap();
    assert_eq!(rival_page.total, 0);

    let err = repo.get_by_date(other.id, date(4)).await.unwrap_err();
    assert!(matches!(err, HotelierError::NotFound { .. }));
}
