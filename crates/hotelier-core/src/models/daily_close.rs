//! Daily close domain model.
//!
//! A daily close is an immutable per-day snapshot of completed payments
//! for one tenant. Once published it is never recomputed or deleted,
//! regardless of later payment corrections.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::payment::PaymentMethod;

/// Completed-payment subtotal for a single payment method.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MethodTotal {
    pub method: PaymentMethod,
    pub amount: i64,
    pub count: i64,
}

/// Aggregate of completed payments within one reporting-day window.
/// Returned by the preview operation; persisted verbatim by the close.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseTotals {
    pub total_amount: i64,
    pub payment_count: i64,
    pub by_method: Vec<MethodTotal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyClose {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// Calendar date in the tenant's reporting day. Unique per tenant.
    pub date_key: NaiveDate,
    pub total_amount: i64,
    pub payment_count: i64,
    pub by_method: Vec<MethodTotal>,
    pub notes: Option<String>,
    /// Opaque staff actor who closed the day.
    pub closed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDailyClose {
    pub tenant_id: Uuid,
    pub date_key: NaiveDate,
    pub notes: Option<String>,
    pub closed_by: Option<Uuid>,
}
