//! Room service — manual room-status changes and deletion, guarded
//! against active check-ins.

use hotelier_core::error::{HotelierError, HotelierResult};
use hotelier_core::models::audit::{AuditOutcome, CreateAuditLogEntry};
use hotelier_core::models::room::{Room, RoomStatus};
use hotelier_core::repository::{AuditLogRepository, RoomRepository};
use uuid::Uuid;

pub struct RoomService<M, A>
where
    M: RoomRepository,
    A: AuditLogRepository,
{
    rooms: M,
    audit: A,
}

impl<M, A> RoomService<M, A>
where
    M: RoomRepository,
    A: AuditLogRepository,
{
    pub fn new(rooms: M, audit: A) -> Self {
        Self { rooms, audit }
    }

    /// Manually flip a room between `Available` and `Maintenance`.
    ///
    /// `Occupied` is owned by the reservation lifecycle and cannot be
    /// set by hand. The repository refuses the flip, inside the write
    /// transaction, while the room has a checked-in reservation.
    pub async fn set_room_status(
        &self,
        actor: Option<Uuid>,
        tenant_id: Uuid,
        room_id: Uuid,
        status: RoomStatus,
    ) -> HotelierResult<Room> {
        if status == RoomStatus::Occupied {
            return Err(HotelierError::Validation {
                field: "status".into(),
                message: "occupied is set by the reservation lifecycle, not manually".into(),
            });
        }

        let room = self.rooms.set_status(tenant_id, room_id, status).await?;

        self.audit(CreateAuditLogEntry {
            tenant_id,
            actor_id: actor,
            action: "room.set_status".into(),
            entity: "room".into(),
            entity_id: Some(room_id),
            outcome: AuditOutcome::Success,
            detail: Some(serde_json::json!({ "status": room.status })),
        })
        .await;

        Ok(room)
    }

    /// Delete a room. Refused while the room is occupied.
    pub async fn delete_room(
        &self,
        actor: Option<Uuid>,
        tenant_id: Uuid,
        room_id: Uuid,
    ) -> HotelierResult<()> {
        self.rooms.delete(tenant_id, room_id).await?;

        self.audit(CreateAuditLogEntry {
            tenant_id,
            actor_id: actor,
            action: "room.delete".into(),
            entity: "room".into(),
            entity_id: Some(room_id),
            outcome: AuditOutcome::Success,
            detail: None,
        })
        .await;

        Ok(())
    }

    /// Fire-and-forget: an audit failure never fails the operation.
    async fn audit(&self, entry: CreateAuditLogEntry) {
        if let Err(err) = self.audit.append(entry).await {
            tracing::warn!(error = %err, "audit append failed");
        }
    }
}
