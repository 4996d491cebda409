//! Incidental charge domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChargeKind {
    Minibar,
    Service,
    Laundry,
    Other,
}

/// An ad-hoc line item billed against a reservation.
///
/// The room reference is redundant with the reservation's room and kept
/// for per-room reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Charge {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub reservation_id: Uuid,
    pub room_id: Uuid,
    pub kind: ChargeKind,
    pub description: String,
    /// Always positive.
    pub quantity: i64,
    /// Minor currency units. Always positive.
    pub unit_price: i64,
    /// Server-computed `quantity × unit_price`; client-submitted totals
    /// are never trusted.
    pub total: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCharge {
    pub tenant_id: Uuid,
    pub reservation_id: Uuid,
    pub room_id: Uuid,
    pub kind: ChargeKind,
    pub description: String,
    pub quantity: i64,
    pub unit_price: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateCharge {
    pub kind: Option<ChargeKind>,
    pub description: Option<String>,
    pub quantity: Option<i64>,
    pub unit_price: Option<i64>,
}
