//! Payment domain model.
//!
//! Payments are recorded, not collected — gateway integration lives
//! outside the core. A payment belongs to a reservation; its tenant is
//! derived transitively and never stored on the row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Only `Completed` payments count toward money actually received.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub reservation_id: Uuid,
    /// Amount in minor currency units. Always positive.
    pub amount: i64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// Free-form external reference (terminal slip, transfer id).
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePayment {
    pub reservation_id: Uuid,
    pub amount: i64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdatePayment {
    pub amount: Option<i64>,
    pub method: Option<PaymentMethod>,
    pub status: Option<PaymentStatus>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = keep.
    pub reference: Option<Option<String>>,
}
