//! Tenant domain model.
//!
//! A tenant is a single hotel. Every other entity carries a tenant id
//! and is never visible or joinable across tenants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An isolated hotel account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    /// Human-readable hotel name.
    pub name: String,
    /// URL-safe unique identifier (e.g., `grand-plaza`).
    pub slug: String,
    /// Fixed offset of the hotel's reporting day relative to UTC, in
    /// minutes. Decides which calendar day a payment belongs to when the
    /// books are closed. `None` falls back to the engine default.
    pub reporting_offset_minutes: Option<i32>,
    /// Arbitrary key-value metadata.
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenant {
    pub name: String,
    pub slug: String,
    pub reporting_offset_minutes: Option<i32>,
    pub metadata: Option<serde_json::Value>,
}

/// Fields that can be updated on an existing tenant.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateTenant {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub reporting_offset_minutes: Option<i32>,
    pub metadata: Option<serde_json::Value>,
}
