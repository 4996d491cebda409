//! Audit log domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuditOutcome {
    Success,
    Failure,
}

/// Append-only record of a state-changing operation.
///
/// Written fire-and-forget: an audit failure never fails the primary
/// operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// Opaque staff actor, when known.
    pub actor_id: Option<Uuid>,
    /// Dotted action name, e.g. `reservation.transition`.
    pub action: String,
    /// Entity kind the action touched, e.g. `reservation`.
    pub entity: String,
    pub entity_id: Option<Uuid>,
    pub outcome: AuditOutcome,
    /// Structured context (attempted values, computed totals).
    pub detail: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuditLogEntry {
    pub tenant_id: Uuid,
    pub actor_id: Option<Uuid>,
    pub action: String,
    pub entity: String,
    pub entity_id: Option<Uuid>,
    pub outcome: AuditOutcome,
    pub detail: Option<serde_json::Value>,
}
