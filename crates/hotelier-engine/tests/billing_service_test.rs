//! Integration tests for the billing service: payment caps, charge
//! gating, and the due amount, over in-memory SurrealDB.

use chrono::{DateTime, TimeZone, Utc};
use hotelier_core::error::HotelierError;
use hotelier_core::models::charge::{ChargeKind, CreateCharge, UpdateCharge};
use hotelier_core::models::payment::{
    CreatePayment, PaymentMethod, PaymentStatus, UpdatePayment,
};
use hotelier_core::models::reservation::{CreateReservation, ReservationStatus};
use hotelier_core::models::room::CreateRoom;
use hotelier_core::models::room_type::CreateRoomType;
use hotelier_core::models::tenant::CreateTenant;
use hotelier_core::repository::{RoomRepository, RoomTypeRepository, TenantRepository};
use hotelier_db::repository::{
    SurrealAuditLogRepository, SurrealChargeRepository, SurrealPaymentRepository,
    SurrealReservationRepository, SurrealRoomRepository, SurrealRoomTypeRepository,
    SurrealTenantRepository,
};
use hotelier_engine::config::EngineConfig;
use hotelier_engine::payments::BillingService;
use hotelier_engine::reservations::BookingService;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

type Db = surrealdb::engine::local::Db;

struct Fixture {
    db: Surreal<Db>,
    tenant_id: Uuid,
    room_id: Uuid,
    reservation_id: Uuid,
}

/// In-memory DB with one tenant, room 101 at 100.00/night, and a
/// two-night pending reservation (room total 200.00).
async fn setup() -> Fixture {
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
            floor: Some(1),
            notes: None,
        })
        .await
        .unwrap();

    let reservation = booking(&db)
        .create_reservation(
            None,
            CreateReservation {
                tenant_id: tenant.id,
                room_id: room.id,
                guest_id: None,
                created_by: None,
                check_in: at(1, 0),
                check_out: at(3, 0),
                notes: None,
            },
        )
        .await
        .unwrap();

    Fixture {
        db,
        tenant_id: tenant.id,
        room_id: room.id,
        reservation_id: reservation.id,
    }
}

fn booking(
    db: &Surreal<Db>,
) -> BookingService<
    SurrealReservationRepository<Db>,
    SurrealRoomRepository<Db>,
    SurrealRoomTypeRepository<Db>,
    SurrealAuditLogRepository<Db>,
> {
    BookingService::new(
        SurrealReservationRepository::new(db.clone()),
        SurrealRoomRepository::new(db.clone()),
        SurrealRoomTypeRepository::new(db.clone()),
        SurrealAuditLogRepository::new(db.clone()),
        EngineConfig::default(),
    )
}

fn billing(
    db: &Surreal<Db>,
) -> BillingService<
    SurrealPaymentRepository<Db>,
    SurrealChargeRepository<Db>,
    SurrealReservationRepository<Db>,
    SurrealAuditLogRepository<Db>,
> {
    BillingService::new(
        SurrealPaymentRepository::new(db.clone()),
        SurrealChargeRepository::new(db.clone()),
        SurrealReservationRepository::new(db.clone()),
        SurrealAuditLogRepository::new(db.clone()),
    )
}

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 2, day, hour, 0, 0).unwrap()
}

fn payment_of(reservation_id: Uuid, amount: i64, status: PaymentStatus) -> CreatePayment {
    CreatePayment {
        reservation_id,
        amount,
        method: PaymentMethod::Card,
        status,
        reference: None,
    }
}

fn minibar_charge(fx: &Fixture, quantity: i64, unit_price: i64) -> CreateCharge {
    CreateCharge {
        tenant_id: fx.tenant_id,
        reservation_id: fx.reservation_id,
        room_id: fx.room_id,
        kind: ChargeKind::Minibar,
        description: "minibar".into(),
        quantity,
        unit_price,
    }
}

// -----------------------------------------------------------------------
// Payments
// -----------------------------------------------------------------------

#[tokio::test]
async fn full_payment_settles_the_statement() {
    let fx = setup().await;
    let service = billing(&fx.db);

    service
        .add_charge(None, minibar_charge(&fx, 1, 5_000))
        .await
        .unwrap();
    service
        .record_payment(
            None,
            fx.tenant_id,
            payment_of(fx.reservation_id, 25_000, PaymentStatus::Completed),
        )
        .await
        .unwrap();

    let statement = service
        .statement(fx.tenant_id, fx.reservation_id)
        .await
        .unwrap();
    assert_eq!(statement.room_total, 20_000);
    assert_eq!(statement.charges_total, 5_000);
    assert_eq!(statement.grand_total, 25_000);
    assert_eq!(statement.completed_total, 25_000);
    assert_eq!(statement.due, 0);
}

#[tokio::test]
async fn completed_payments_cannot_exceed_the_grand_total() {
    let fx = setup().await;
    let service = billing(&fx.db);

    service
        .add_charge(None, minibar_charge(&fx, 1, 5_000))
        .await
        .unwrap();
    service
        .record_payment(
            None,
            fx.tenant_id,
            payment_of(fx.reservation_id, 25_000, PaymentStatus::Completed),
        )
        .await
        .unwrap();

    // One cent over the settled total.
    let err = service
        .record_payment(
            None,
            fx.tenant_id,
            payment_of(fx.reservation_id, 1, PaymentStatus::Completed),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        HotelierError::Overpayment {
            grand_total: 25_000,
            completed: 25_000,
            attempted: 1,
        }
    ));
}

#[tokio::test]
async fn pending_and_failed_payments_are_never_capped() {
    let fx = setup().await;
    let service = billing(&fx.db);

    service
        .record_payment(
            None,
            fx.tenant_id,
            payment_of(fx.reservation_id, 999_999, PaymentStatus::Pending),
        )
        .await
        .unwrap();
    service
        .record_payment(
            None,
            fx.tenant_id,
            payment_of(fx.reservation_id, 999_999, PaymentStatus::Failed),
        )
        .await
        .unwrap();

    // Neither counts toward money received.
    let statement = service
        .statement(fx.tenant_id, fx.reservation_id)
        .await
        .unwrap();
    assert_eq!(statement.completed_total, 0);
    assert_eq!(statement.due, 20_000);
}

#[tokio::test]
async fn updating_a_payment_excludes_it_from_the_cap() {
    let fx = setup().await;
    let service = billing(&fx.db);

    let payment = service
        .record_payment(
            None,
            fx.tenant_id,
            payment_of(fx.reservation_id, 20_000, PaymentStatus::Completed),
        )
        .await
        .unwrap();

    // Shrinking the same payment must not trip over its own old amount.
    let updated = service
        .update_payment(
            None,
            fx.tenant_id,
            payment.id,
            UpdatePayment {
                amount: Some(15_000),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.amount, 15_000);

    let statement = service
        .statement(fx.tenant_id, fx.reservation_id)
        .await
        .unwrap();
    assert_eq!(statement.due, 5_000);
}

#[tokio::test]
async fn completing_a_pending_payment_checks_the_cap() {
    let fx = setup().await;
    let service = billing(&fx.db);

    let payment = service
        .record_payment(
            None,
            fx.tenant_id,
            payment_of(fx.reservation_id, 30_000, PaymentStatus::Pending),
        )
        .await
        .unwrap();

    let err = service
        .update_payment(
            None,
            fx.tenant_id,
            payment.id,
            UpdatePayment {
                status: Some(PaymentStatus::Completed),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        HotelierError::Overpayment {
            grand_total: 20_000,
            completed: 0,
            attempted: 30_000,
        }
    ));
}

#[tokio::test]
async fn deleting_a_payment_is_always_allowed() {
    let fx = setup().await;
    let service = billing(&fx.db);

    let payment = service
        .record_payment(
            None,
            fx.tenant_id,
            payment_of(fx.reservation_id, 20_000, PaymentStatus::Completed),
        )
        .await
        .unwrap();
    service
        .delete_payment(None, fx.tenant_id, payment.id)
        .await
        .unwrap();

    let statement = service
        .statement(fx.tenant_id, fx.reservation_id)
        .await
        .unwrap();
    assert_eq!(statement.completed_total, 0);
    assert_eq!(statement.due, 20_000);
}

#[tokio::test]
async fn non_positive_amounts_are_rejected() {
    let fx = setup().await;
    let service = billing(&fx.db);

    let err = service
        .record_payment(
            None,
            fx.tenant_id,
            payment_of(fx.reservation_id, 0, PaymentStatus::Completed),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, HotelierError::Validation { field, .. } if field == "amount"));

    let err = service
        .add_charge(None, minibar_charge(&fx, 0, 500))
        .await
        .unwrap_err();
    assert!(matches!(err, HotelierError::Validation { field, .. } if field == "quantity"));
}

// -----------------------------------------------------------------------
// Charges
// -----------------------------------------------------------------------

#[tokio::test]
async fn charge_total_is_computed_server_side() {
    let fx = setup().await;
    let service = billing(&fx.db);

    let charge = service
        .add_charge(None, minibar_charge(&fx, 3, 1_500))
        .await
        .unwrap();
    assert_eq!(charge.total, 4_500);

    let updated = service
        .update_charge(
            None,
            fx.tenant_id,
            charge.id,
            UpdateCharge {
                quantity: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.total, 3_000);
}

#[tokio::test]
async fn charges_are_refused_on_cancelled_bookings() {
    let fx = setup().await;
    let service = billing(&fx.db);

    booking(&fx.db)
        .transition(
            None,
            fx.tenant_id,
            fx.reservation_id,
            ReservationStatus::Cancelled,
        )
        .await
        .unwrap();

    let err = service
        .add_charge(None, minibar_charge(&fx, 1, 500))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        HotelierError::BookingLocked {
            status: ReservationStatus::Cancelled
        }
    ));
}

#[tokio::test]
async fn charges_are_refused_after_checkout() {
    let fx = setup().await;
    let billing_service = billing(&fx.db);
    let booking_service = booking(&fx.db);

    booking_service
        .transition(
            None,
            fx.tenant_id,
            fx.reservation_id,
            ReservationStatus::Confirmed,
        )
        .await
        .unwrap();
    booking_service
        .transition(
            None,
            fx.tenant_id,
            fx.reservation_id,
            ReservationStatus::CheckedIn,
        )
        .await
        .unwrap();
    billing_service
        .record_payment(
            None,
            fx.tenant_id,
            payment_of(fx.reservation_id, 20_000, PaymentStatus::Completed),
        )
        .await
        .unwrap();
    booking_service
        .transition(
            None,
            fx.tenant_id,
            fx.reservation_id,
            ReservationStatus::CheckedOut,
        )
        .await
        .unwrap();

    let err = billing_service
        .add_charge(None, minibar_charge(&fx, 1, 500))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        HotelierError::BookingLocked {
            status: ReservationStatus::CheckedOut
        }
    ));
}

#[tokio::test]
async fn charge_room_must_match_the_reservation() {
    let fx = setup().await;
    let service = billing(&fx.db);

    let mut input = minibar_charge(&fx, 1, 500);
    input.room_id = Uuid::new_v4();
    let err = service.add_charge(None, input).await.unwrap_err();
    assert!(matches!(err, HotelierError::Validation { field, .. } if field == "room_id"));
}

#[tokio::test]
async fn shrinking_a_charge_below_completed_payments_is_refused() {
    let fx = setup().await;
    let service = billing(&fx.db);

    let charge = service
        .add_charge(None, minibar_charge(&fx, 2, 2_500))
        .await
        .unwrap();
    // Settle the full 25_000.
    service
        .record_payment(
            None,
            fx.tenant_id,
            payment_of(fx.reservation_id, 25_000, PaymentStatus::Completed),
        )
        .await
        .unwrap();

    // Shrinking or removing the charge would leave completed payments
    // above the grand total.
    let err = service
        .update_charge(
            None,
            fx.tenant_id,
            charge.id,
            UpdateCharge {
                quantity: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, HotelierError::Overpayment { .. }));

    let err = service
        .delete_charge(None, fx.tenant_id, charge.id)
        .await
        .unwrap_err();
    assert!(matches!(err, HotelierError::Overpayment { .. }));
}

#[tokio::test]
async fn payments_are_tenant_scoped() {
    let fx = setup().await;
    let service = billing(&fx.db);

    let payment = service
        .record_payment(
            None,
            fx.tenant_id,
            payment_of(fx.reservation_id, 5_000, PaymentStatus::Completed),
        )
        .await
        .unwrap();

    let other = SurrealTenantRepository::new(fx.db.clone())
        .create(CreateTenant {
            name: "Rival Inn".into(),
            slug: "rival-inn".into(),
            reporting_offset_minutes: None,
            metadata: None,
        })
        .await
        .unwrap();

    let err = service
        .delete_payment(None, other.id, payment.id)
        .await
        .unwrap_err();
    assert!(matches!(err, HotelierError::NotFound { .. }));

    let err = service
        .statement(other.id, fx.reservation_id)
        .await
        .unwrap_err();
    assert!(matches!(err, HotelierError::NotFound { .. }));
}
