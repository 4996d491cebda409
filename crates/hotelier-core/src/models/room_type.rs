//! Room type domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A category of room with a nightly rate and capacity.
///
/// The rate is captured onto a reservation's total at booking time;
/// later rate changes never reprice existing reservations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomType {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// Unique within the tenant.
    pub name: String,
    /// Nightly base rate in minor currency units (cents).
    pub base_rate: i64,
    /// Maximum number of guests.
    pub capacity: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomType {
    pub tenant_id: Uuid,
    pub name: String,
    pub base_rate: i64,
    pub capacity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateRoomType {
    pub name: Option<String>,
    pub base_rate: Option<i64>,
    pub capacity: Option<u32>,
}
