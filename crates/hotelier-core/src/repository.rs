//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Tenant-scoped repositories take
//! a `tenant_id` parameter to enforce data isolation; an entity that
//! exists under another tenant is reported as `NotFound`.
//!
//! The consistency-critical methods (`ReservationRepository::create`/
//! `update`/`transition`, the `Completed`-payment writes, the charge
//! writes, and `DailyCloseRepository::create`) are contracts over a
//! single storage transaction: the implementation must re-run the
//! relevant invariant check inside the same atomic unit as the write,
//! so a check-then-act race between concurrent callers cannot violate
//! the invariant.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::HotelierResult;
use crate::models::{
    audit::{AuditLogEntry, CreateAuditLogEntry},
    charge::{Charge, CreateCharge, UpdateCharge},
    daily_close::{CloseTotals, CreateDailyClose, DailyClose},
    guest::{CreateGuest, Guest, UpdateGuest},
    payment::{CreatePayment, Payment, UpdatePayment},
    reservation::{CreateReservation, Reservation, ReservationStatus, UpdateReservation},
    room::{CreateRoom, Room, RoomStatus, UpdateRoom},
    room_type::{CreateRoomType, RoomType, UpdateRoomType},
    tenant::{CreateTenant, Tenant, UpdateTenant},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Tenant (global scope)
// ---------------------------------------------------------------------------

pub trait TenantRepository: Send + Sync {
    fn create(&self, input: CreateTenant) -> impl Future<Output = HotelierResult<Tenant>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = HotelierResult<Tenant>> + Send;
    fn get_by_slug(&self, slug: &str) -> impl Future<Output = HotelierResult<Tenant>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateTenant,
    ) -> impl Future<Output = HotelierResult<Tenant>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = HotelierResult<PaginatedResult<Tenant>>> + Send;
}

// ---------------------------------------------------------------------------
// Tenant-scoped repositories
// ---------------------------------------------------------------------------

pub trait RoomTypeRepository: Send + Sync {
    fn create(
        &self,
        input: CreateRoomType,
    ) -> impl Future<Output = HotelierResult<RoomType>> + Send;
    fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = HotelierResult<RoomType>> + Send;
    fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateRoomType,
    ) -> impl Future<Output = HotelierResult<RoomType>> + Send;
    fn delete(&self, tenant_id: Uuid, id: Uuid) -> impl Future<Output = HotelierResult<()>> + Send;
    fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = HotelierResult<PaginatedResult<RoomType>>> + Send;
}

pub trait RoomRepository: Send + Sync {
    fn create(&self, input: CreateRoom) -> impl Future<Output = HotelierResult<Room>> + Send;
    fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = HotelierResult<Room>> + Send;
    fn get_by_number(
        &self,
        tenant_id: Uuid,
        number: &str,
    ) -> impl Future<Output = HotelierResult<Room>> + Send;
    fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateRoom,
    ) -> impl Future<Output = HotelierResult<Room>> + Send;
    /// Manual status change. Must refuse with `OccupiedRoom`, inside the
    /// same transaction as the write, while the room has any reservation
    /// currently `CheckedIn`.
    fn set_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        status: RoomStatus,
    ) -> impl Future<Output = HotelierResult<Room>> + Send;
    /// Guarded like [`RoomRepository::set_status`]: an occupied room
    /// cannot be deleted.
    fn delete(&self, tenant_id: Uuid, id: Uuid) -> impl Future<Output = HotelierResult<()>> + Send;
    fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = HotelierResult<PaginatedResult<Room>>> + Send;
}

pub trait GuestRepository: Send + Sync {
    fn create(&self, input: CreateGuest) -> impl Future<Output = HotelierResult<Guest>> + Send;
    fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = HotelierResult<Guest>> + Send;
    fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateGuest,
    ) -> impl Future<Output = HotelierResult<Guest>> + Send;
    fn delete(&self, tenant_id: Uuid, id: Uuid) -> impl Future<Output = HotelierResult<()>> + Send;
    fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = HotelierResult<PaginatedResult<Guest>>> + Send;
}

pub trait ReservationRepository: Send + Sync {
    /// Insert a new reservation with the given server-computed total.
    /// The overlap check against non-cancelled reservations of the same
    /// room runs inside the insert transaction; the loser of a
    /// concurrent race receives `RoomNotAvailable`.
    fn create(
        &self,
        input: CreateReservation,
        total_price: i64,
    ) -> impl Future<Output = HotelierResult<Reservation>> + Send;
    fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = HotelierResult<Reservation>> + Send;
    /// Edit room/guest/dates/notes. Re-runs the overlap check inside the
    /// write transaction with this reservation's own row excluded.
    /// `total_price` is `Some` when room or dates changed.
    fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateReservation,
        total_price: Option<i64>,
    ) -> impl Future<Output = HotelierResult<Reservation>> + Send;
    /// Apply a lifecycle transition atomically: re-checks the current
    /// status still equals `from` (a lost race reports
    /// `InvalidTransition`), gates `CheckedOut` on a zero balance
    /// (`OutstandingBalance`), stamps `checked_in_at`/`checked_out_at`
    /// exactly once, and applies the room-status side effect —
    /// `CheckedIn` sets the room `Occupied`; `CheckedOut` sets it
    /// `Available` unless staff put it in `Maintenance`.
    fn transition(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> impl Future<Output = HotelierResult<Reservation>> + Send;
    fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = HotelierResult<PaginatedResult<Reservation>>> + Send;
    fn list_for_room(
        &self,
        tenant_id: Uuid,
        room_id: Uuid,
    ) -> impl Future<Output = HotelierResult<Vec<Reservation>>> + Send;
}

pub trait PaymentRepository: Send + Sync {
    /// Record a payment. When the payment arrives `Completed`, the
    /// overpayment cap (completed total + amount ≤ grand total) is
    /// checked inside the insert transaction; `Pending`/`Failed`
    /// payments are always accepted.
    fn create(
        &self,
        tenant_id: Uuid,
        input: CreatePayment,
    ) -> impl Future<Output = HotelierResult<Payment>> + Send;
    fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = HotelierResult<Payment>> + Send;
    /// Same cap as [`PaymentRepository::create`], computed with this
    /// payment excluded from the existing-completed total.
    fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdatePayment,
    ) -> impl Future<Output = HotelierResult<Payment>> + Send;
    /// Unconditional: deleting a payment can only reduce the due amount.
    fn delete(&self, tenant_id: Uuid, id: Uuid) -> impl Future<Output = HotelierResult<()>> + Send;
    fn list_for_reservation(
        &self,
        tenant_id: Uuid,
        reservation_id: Uuid,
    ) -> impl Future<Output = HotelierResult<Vec<Payment>>> + Send;
    /// Sum, count, and per-method breakdown of `Completed` payments
    /// whose `created_at` falls within `[from, to)`.
    fn aggregate_window(
        &self,
        tenant_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Future<Output = HotelierResult<CloseTotals>> + Send;
}

pub trait ChargeRepository: Send + Sync {
    /// Add a charge. Refused with `BookingLocked` when the owning
    /// reservation is `Cancelled` or `CheckedOut`; the stored total is
    /// always recomputed server-side as `quantity × unit_price`.
    fn create(&self, input: CreateCharge) -> impl Future<Output = HotelierResult<Charge>> + Send;
    fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = HotelierResult<Charge>> + Send;
    /// Same status gate as [`ChargeRepository::create`]. Additionally
    /// refused with `Overpayment` when the shrunk grand total would fall
    /// below the already-completed payment total.
    fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateCharge,
    ) -> impl Future<Output = HotelierResult<Charge>> + Send;
    /// Guarded like [`ChargeRepository::update`].
    fn delete(&self, tenant_id: Uuid, id: Uuid) -> impl Future<Output = HotelierResult<()>> + Send;
    fn list_for_reservation(
        &self,
        tenant_id: Uuid,
        reservation_id: Uuid,
    ) -> impl Future<Output = HotelierResult<Vec<Charge>>> + Send;
}

pub trait DailyCloseRepository: Send + Sync {
    /// Aggregate completed payments inside `window` and persist the
    /// snapshot in one transaction. A snapshot already existing for
    /// (tenant, date_key) reports `DailyCloseExists`; a storage-level
    /// uniqueness constraint is the final race-breaker between
    /// concurrent close attempts.
    fn create(
        &self,
        input: CreateDailyClose,
        window: (DateTime<Utc>, DateTime<Utc>),
    ) -> impl Future<Output = HotelierResult<DailyClose>> + Send;
    fn get_by_date(
        &self,
        tenant_id: Uuid,
        date_key: NaiveDate,
    ) -> impl Future<Output = HotelierResult<DailyClose>> + Send;
    fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = HotelierResult<PaginatedResult<DailyClose>>> + Send;
}

pub trait AuditLogRepository: Send + Sync {
    fn append(
        &self,
        input: CreateAuditLogEntry,
    ) -> impl Future<Output = HotelierResult<AuditLogEntry>> + Send;
    fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = HotelierResult<PaginatedResult<AuditLogEntry>>> + Send;
}
