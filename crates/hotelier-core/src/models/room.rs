//! Room domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Occupancy state of a room.
///
/// `Available` and `Occupied` follow the reservation lifecycle
/// automatically; `Maintenance` is set by staff and always wins over an
/// automatic availability update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum RoomStatus {
    Available,
    Occupied,
    Maintenance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub room_type_id: Uuid,
    /// Room number, unique within the tenant.
    pub number: String,
    pub floor: Option<i32>,
    pub status: RoomStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a room. New rooms start `Available`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoom {
    pub tenant_id: Uuid,
    pub room_type_id: Uuid,
    pub number: String,
    pub floor: Option<i32>,
    pub notes: Option<String>,
}

/// Fields that can be updated on a room. Status is deliberately absent:
/// it changes only through the guarded status operation or as a
/// lifecycle side effect.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateRoom {
    pub room_type_id: Option<Uuid>,
    pub number: Option<String>,
    pub floor: Option<i32>,
    pub notes: Option<String>,
}
