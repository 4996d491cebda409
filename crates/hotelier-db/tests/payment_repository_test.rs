//! Integration tests for the payment repository: the transactional
//! overpayment cap, tenant scoping through the owning reservation, and
//! window aggregation.

use chrono::{DateTime, TimeZone, Utc};
use hotelier_core::error::HotelierError;
use hotelier_core::models::payment::{
    CreatePayment, PaymentMethod, PaymentStatus, UpdatePayment,
};
use hotelier_core::models::reservation::CreateReservation;
use hotelier_core::models::room::CreateRoom;
use hotelier_core::models::room_type::CreateRoomType;
use hotelier_core::models::tenant::CreateTenant;
use hotelier_core::repository::{
    PaymentRepository, ReservationRepository, RoomRepository, RoomTypeRepository,
    TenantRepository,
};
use hotelier_db::repository::{
    SurrealPaymentRepository, SurrealReservationRepository, SurrealRoomRepository,
    SurrealRoomTypeRepository, SurrealTenantRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

type Db = surrealdb::engine::local::Db;

/// One tenant, one room, one reservation with room total 200.00.
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
                check_in: Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap(),
                check_out: Utc.with_ymd_and_hms(2025, 5, 3, 0, 0, 0).unwrap(),
                notes: None,
            },
            20_000,
        )
        .await
        .unwrap();

    (db, tenant.id, reservation.id)
}

fn cash(reservation_id: Uuid, amount: i64, status: PaymentStatus) -> CreatePayment {
    CreatePayment {
        reservation_id,
        amount,
        method: PaymentMethod::Cash,
        status,
        reference: None,
    }
}

#[tokio::test]
async fn create_and_list_payments() {
    let (db, tenant_id, reservation_id) = setup().await;
    let repo = SurrealPaymentRepository::new(db);

    let payment = repo
        .create(tenant_id, cash(reservation_id, 5_000, PaymentStatus::Completed))
        .await
        .unwrap();
    assert_eq!(payment.amount, 5_000);
    assert_eq!(payment.status, PaymentStatus::Completed);

    let listed = repo
        .list_for_reservation(tenant_id, reservation_id)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, payment.id);
}

#[tokio::test]
async fn cap_is_enforced_in_the_insert_transaction() {
    let (db, tenant_id, reservation_id) = setup().await;
    let repo = SurrealPaymentRepository::new(db);

    repo.create(tenant_id, cash(reservation_id, 20_000, PaymentStatus::Completed))
        .await
        .unwrap();

    let err = repo
        .create(tenant_id, cash(reservation_id, 100, PaymentStatus::Completed))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        HotelierError::Overpayment {
            grand_total: 20_000,
            completed: 20_000,
            attempted: 100,
        }
    ));

    // Pending is exempt from the cap.
    repo.create(tenant_id, cash(reservation_id, 100, PaymentStatus::Pending))
        .await
        .unwrap();
}

#[tokio::test]
async fn update_recomputes_with_the_edited_payment_excluded() {
    let (db, tenant_id, reservation_id) = setup().await;
    let repo = SurrealPaymentRepository::new(db);

    let payment = repo
        .create(tenant_id, cash(reservation_id, 20_000, PaymentStatus::Completed))
        .await
        .unwrap();

    // Growing the settled payment past the total is refused.
    let err = repo
        .update(
            tenant_id,
            payment.id,
            UpdatePayment {
                amount: Some(20_001),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, HotelierError::Overpayment { .. }));

    // Re-settling at the same amount is not an overpayment of itself.
    let updated = repo
        .update(
            tenant_id,
            payment.id,
            UpdatePayment {
                amount: Some(20_000),
                method: Some(PaymentMethod::Transfer),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.amount, 20_000);
    assert_eq!(updated.method, PaymentMethod::Transfer);
}

#[tokio::test]
async fn payments_resolve_tenant_through_the_reservation() {
    let (db, tenant_id, reservation_id) = setup().await;
    let repo = SurrealPaymentRepository::new(db.clone());

    let payment = repo
        .create(tenant_id, cash(reservation_id, 5_000, PaymentStatus::Completed))
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

    let err = repo.get_by_id(other.id, payment.id).await.unwrap_err();
    assert!(matches!(err, HotelierError::NotFound { .. }));

    let err = repo.update(other.id, payment.id, UpdatePayment::default()).await.unwrap_err();
    assert!(matches!(err, HotelierError::NotFound { .. }));

    let err = repo.delete(other.id, payment.id).await.unwrap_err();
    assert!(matches!(err, HotelierError::NotFound { .. }));

    // Still there for the rightful tenant.
    repo.get_by_id(tenant_id, payment.id).await.unwrap();
}

#[tokio::test]
async fn delete_removes_the_payment() {
    let (db, tenant_id, reservation_id) = setup().await;
    let repo = SurrealPaymentRepository::new(db);

    let payment = repo
        .create(tenant_id, cash(reservation_id, 5_000, PaymentStatus::Completed))
        .await
        .unwrap();
    repo.delete(tenant_id, payment.id).await.unwrap();

    let err = repo.get_by_id(tenant_id, payment.id).await.unwrap_err();
    assert!(matches!(err, HotelierError::NotFound { .. }));
}

#[tokio::test]
async fn aggregate_window_is_half_open_and_status_filtered() {
    let (db, tenant_id, reservation_id) = setup().await;
    let repo = SurrealPaymentRepository::new(db.clone());

    let window_start = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
    let window_end = Utc.with_ymd_and_hms(2025, 5, 2, 0, 0, 0).unwrap();

    let pin = |payment_id: Uuid, ts: DateTime<Utc>| {
        let db = db.clone();
        async move {
            db.query("UPDATE type::record('payment', $id) SET created_at = $ts")
                .bind(("id", payment_id.to_string()))
                .bind(("ts", ts))
                .await
                .unwrap()
                .check()
                .unwrap();
        }
    };

    let inside = repo
        .create(tenant_id, cash(reservation_id, 5_000, PaymentStatus::Completed))
        .await
        .unwrap();
    pin(inside.id, window_start).await;

    let card = repo
        .create(
            tenant_id,
            CreatePayment {
                reservation_id,
                amount: 2_000,
                method: PaymentMethod::Card,
                status: PaymentStatus::Completed,
                reference: None,
            },
        )
        .await
        .unwrap();
    pin(card.id, Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap()).await;

    // On the end boundary: excluded (half-open window).
    let boundary = repo
        .create(tenant_id, cash(reservation_id, 9_000, PaymentStatus::Completed))
        .await
        .unwrap();
    pin(boundary.id, window_end).await;

    // Pending inside the window: excluded by status.
    let pending = repo
        .create(tenant_id, cash(reservation_id, 1_000, PaymentStatus::Pending))
        .await
        .unwrap();
    pin(pending.id, window_start).await;

    let totals = repo
        .aggregate_window(tenant_id, window_start, window_end)
        .await
        .unwrap();
    assert_eq!(totals.total_amount, 7_000);
    assert_eq!(totals.payment_count, 2);

    let cash_row = totals
        .by_method
        .iter()
        .find(|m| m.method == PaymentMethod::Cash)
        .unwrap();
    assert_eq!(cash_row.amount, 5_000);
    assert_eq!(cash_row.count, 1);
    let card_row = totals
        .by_method
        .iter()
        .find(|m| m.method == PaymentMethod::Card)
        .unwrap();
    assert_eq!(card_row.amount, 2_000);
    assert_eq!(card_row.count, 1);
}

#[tokio::test]
async fn payment_for_a_missing_reservation_is_refused() {
    let (db, tenant_id, _reservation_id) = setup().await;
    let repo = SurrealPaymentRepository::new(db);

    let err = repo
        .create(tenant_id, cash(Uuid::new_v4(), 5_000, PaymentStatus::Completed))
        .await
        .unwrap_err();
    assert!(matches!(err, HotelierError::NotFound { .. }));
}
