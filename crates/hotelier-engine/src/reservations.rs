//! Booking service — reservation creation, edits, and lifecycle
//! transitions.

use chrono::{DateTime, Utc};
use hotelier_core::error::{HotelierError, HotelierResult};
use hotelier_core::models::audit::{AuditOutcome, CreateAuditLogEntry};
use hotelier_core::models::reservation::{
    CreateReservation, Reservation, ReservationStatus, UpdateReservation,
};
use hotelier_core::models::room::{Room, RoomStatus};
use hotelier_core::repository::{
    AuditLogRepository, ReservationRepository, RoomRepository, RoomTypeRepository,
};
use uuid::Uuid;

use crate::availability;
use crate::billing;
use crate::config::EngineConfig;
use crate::lifecycle;

/// Reservation orchestration.
///
/// Generic over repository implementations so the engine has no
/// dependency on the database crate. The repository performs the
/// transactional re-checks; this service owns input validation, the
/// lifecycle table, price computation, and the audit trail.
pub struct BookingService<R, M, T, A>
where
    R: ReservationRepository,
    M: RoomRepository,
    T: RoomTypeRepository,
    A: AuditLogRepository,
{
    reservations: R,
    rooms: M,
    room_types: T,
    audit: A,
    config: EngineConfig,
}

impl<R, M, T, A> BookingService<R, M, T, A>
where
    R: ReservationRepository,
    M: RoomRepository,
    T: RoomTypeRepository,
    A: AuditLogRepository,
{
    pub fn new(reservations: R, rooms: M, room_types: T, audit: A, config: EngineConfig) -> Self {
        Self {
            reservations,
            rooms,
            room_types,
            audit,
            config,
        }
    }

    /// Whether the room is free over `[check_in, check_out)`, excluding
    /// cancelled reservations and optionally one reservation (for
    /// edit-in-place). Read-only; the authoritative check re-runs inside
    /// the create/update transaction.
    pub async fn is_available(
        &self,
        tenant_id: Uuid,
        room_id: Uuid,
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> HotelierResult<bool> {
        self.validate_interval(check_in, check_out)?;
        let existing = self.reservations.list_for_room(tenant_id, room_id).await?;
        let conflict = existing
            .iter()
            .filter(|r| r.status != ReservationStatus::Cancelled)
            .filter(|r| Some(r.id) != exclude)
            .any(|r| availability::overlaps(r.check_in, r.check_out, check_in, check_out));
        Ok(!conflict)
    }

    /// Create a reservation: validates the dates, re-validates that the
    /// room belongs to the tenant and is not under maintenance, computes
    /// the total price from the room type's current rate, and inserts
    /// through the transactional availability re-check.
    pub async fn create_reservation(
        &self,
        actor: Option<Uuid>,
        input: CreateReservation,
    ) -> HotelierResult<Reservation> {
        let nights = self.validate_interval(input.check_in, input.check_out)?;
        let room = self.bookable_room(input.tenant_id, input.room_id).await?;
        let room_type = self
            .room_types
            .get_by_id(input.tenant_id, room.room_type_id)
            .await?;
        let total_price = billing::room_total(nights, room_type.base_rate);

        let reservation = self.reservations.create(input, total_price).await?;

        self.audit(CreateAuditLogEntry {
            tenant_id: reservation.tenant_id,
            actor_id: actor,
            action: "reservation.create".into(),
            entity: "reservation".into(),
            entity_id: Some(reservation.id),
            outcome: AuditOutcome::Success,
            detail: Some(serde_json::json!({
                "room_id": reservation.room_id,
                "check_in": reservation.check_in,
                "check_out": reservation.check_out,
                "total_price": reservation.total_price,
            })),
        })
        .await;

        Ok(reservation)
    }

    /// Edit room, guest, dates, or notes. Only `Pending`/`Confirmed`
    /// reservations are editable; the total price is recomputed when the
    /// room or dates change, and the transactional overlap re-check
    /// excludes the edited row.
    pub async fn update_reservation(
        &self,
        actor: Option<Uuid>,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateReservation,
    ) -> HotelierResult<Reservation> {
        let existing = self.reservations.get_by_id(tenant_id, id).await?;
        if !lifecycle::is_editable(&existing.status) {
            return Err(HotelierError::BookingLocked {
                status: existing.status,
            });
        }

        let room_id = input.room_id.unwrap_or(existing.room_id);
        let check_in = input.check_in.unwrap_or(existing.check_in);
        let check_out = input.check_out.unwrap_or(existing.check_out);
        let nights = self.validate_interval(check_in, check_out)?;

        // Re-validate the (possibly unchanged) room on every edit.
        let room = self.bookable_room(tenant_id, room_id).await?;

        let repriced = room_id != existing.room_id
            || check_in != existing.check_in
            || check_out != existing.check_out;
        let total_price = if repriced {
            let room_type = self.room_types.get_by_id(tenant_id, room.room_type_id).await?;
            Some(billing::room_total(nights, room_type.base_rate))
        } else {
            None
        };

        let reservation = self
            .reservations
            .update(tenant_id, id, input, total_price)
            .await?;

        self.audit(CreateAuditLogEntry {
            tenant_id,
            actor_id: actor,
            action: "reservation.update".into(),
            entity: "reservation".into(),
            entity_id: Some(id),
            outcome: AuditOutcome::Success,
            detail: Some(serde_json::json!({
                "room_id": reservation.room_id,
                "check_in": reservation.check_in,
                "check_out": reservation.check_out,
                "total_price": reservation.total_price,
            })),
        })
        .await;

        Ok(reservation)
    }

    /// Drive the reservation to `to`.
    ///
    /// The lifecycle table decides whether the transition exists at all;
    /// the repository then applies it atomically — re-checking the
    /// current status, gating checkout on a zero balance, stamping the
    /// check-in/check-out timestamps once, and synchronizing the room
    /// status.
    pub async fn transition(
        &self,
        actor: Option<Uuid>,
        tenant_id: Uuid,
        id: Uuid,
        to: ReservationStatus,
    ) -> HotelierResult<Reservation> {
        let current = self.reservations.get_by_id(tenant_id, id).await?;
        let from = current.status.clone();

        if !lifecycle::transition_allowed(&from, &to) {
            let err = HotelierError::InvalidTransition { from, to };
            self.audit_transition_failure(tenant_id, actor, id, &err).await;
            return Err(err);
        }

        match self
            .reservations
            .transition(tenant_id, id, from.clone(), to.clone())
            .await
        {
            Ok(reservation) => {
                self.audit(CreateAuditLogEntry {
                    tenant_id,
                    actor_id: actor,
                    action: "reservation.transition".into(),
                    entity: "reservation".into(),
                    entity_id: Some(id),
                    outcome: AuditOutcome::Success,
                    detail: Some(serde_json::json!({
                        "from": from,
                        "to": to,
                    })),
                })
                .await;
                Ok(reservation)
            }
            Err(err) => {
                self.audit_transition_failure(tenant_id, actor, id, &err).await;
                Err(err)
            }
        }
    }

    fn validate_interval(
        &self,
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
    ) -> HotelierResult<i64> {
        if check_out <= check_in {
            return Err(HotelierError::Validation {
                field: "check_out".into(),
                message: "check-out must be strictly after check-in".into(),
            });
        }
        let nights = billing::nights(check_in, check_out);
        if nights > self.config.max_stay_nights {
            return Err(HotelierError::Validation {
                field: "check_out".into(),
                message: format!(
                    "stay of {nights} nights exceeds the maximum of {}",
                    self.config.max_stay_nights
                ),
            });
        }
        Ok(nights)
    }

    /// Load the room within the tenant and refuse rooms under
    /// maintenance. Applies to both creation and edits.
    async fn bookable_room(&self, tenant_id: Uuid, room_id: Uuid) -> HotelierResult<Room> {
        let room = self.rooms.get_by_id(tenant_id, room_id).await?;
        if room.status == RoomStatus::Maintenance {
            return Err(HotelierError::Validation {
                field: "room_id".into(),
                message: format!("room {} is under maintenance", room.number),
            });
        }
        Ok(room)
    }

    async fn audit_transition_failure(
        &self,
        tenant_id: Uuid,
        actor: Option<Uuid>,
        id: Uuid,
        err: &HotelierError,
    ) {
        self.audit(CreateAuditLogEntry {
            tenant_id,
            actor_id: actor,
            action: "reservation.transition".into(),
            entity: "reservation".into(),
            entity_id: Some(id),
            outcome: AuditOutcome::Failure,
            detail: Some(serde_json::json!({ "error": err.to_string() })),
        })
        .await;
    }

    /// Fire-and-forget: an audit failure never fails the operation.
    async fn audit(&self, entry: CreateAuditLogEntry) {
        if let Err(err) = self.audit.append(entry).await {
            tracing::warn!(error = %err, "audit append failed");
        }
    }
}
