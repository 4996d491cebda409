//! Daily close service — preview and publication of the per-day
//! financial snapshot.

use chrono::NaiveDate;
use hotelier_core::error::{HotelierError, HotelierResult};
use hotelier_core::models::audit::{AuditOutcome, CreateAuditLogEntry};
use hotelier_core::models::daily_close::{CloseTotals, CreateDailyClose, DailyClose};
use hotelier_core::repository::{
    AuditLogRepository, DailyCloseRepository, PaymentRepository, TenantRepository,
};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::reporting;

/// Daily close orchestration.
///
/// Both operations aggregate completed payments whose `created_at`
/// falls inside the tenant's reporting-day window. `preview` only
/// reads; `close` persists the aggregate once per (tenant, date) and
/// the published snapshot never changes afterward.
pub struct CloseService<D, P, T, A>
where
    D: DailyCloseRepository,
    P: PaymentRepository,
    T: TenantRepository,
    A: AuditLogRepository,
{
    daily_closes: D,
    payments: P,
    tenants: T,
    audit: A,
    config: EngineConfig,
}

impl<D, P, T, A> CloseService<D, P, T, A>
where
    D: DailyCloseRepository,
    P: PaymentRepository,
    T: TenantRepository,
    A: AuditLogRepository,
{
    pub fn new(daily_closes: D, payments: P, tenants: T, audit: A, config: EngineConfig) -> Self {
        Self {
            daily_closes,
            payments,
            tenants,
            audit,
            config,
        }
    }

    /// The aggregation the close would publish, without persisting it.
    pub async fn preview(&self, tenant_id: Uuid, date_key: NaiveDate) -> HotelierResult<CloseTotals> {
        let (from, to) = self.window(tenant_id, date_key).await?;
        self.payments.aggregate_window(tenant_id, from, to).await
    }

    /// Publish the snapshot for (tenant, date). Fails with
    /// `DailyCloseExists` when the day was already closed; the
    /// storage-level uniqueness constraint breaks ties between
    /// concurrent attempts.
    pub async fn close(
        &self,
        actor: Option<Uuid>,
        tenant_id: Uuid,
        date_key: NaiveDate,
        notes: Option<String>,
    ) -> HotelierResult<DailyClose> {
        let window = self.window(tenant_id, date_key).await?;

        let result = self
            .daily_closes
            .create(
                CreateDailyClose {
                    tenant_id,
                    date_key,
                    notes,
                    closed_by: actor,
                },
                window,
            )
            .await;

        match result {
            Ok(close) => {
                self.audit(CreateAuditLogEntry {
                    tenant_id,
                    actor_id: actor,
                    action: "daily_close.create".into(),
                    entity: "daily_close".into(),
                    entity_id: Some(close.id),
                    outcome: AuditOutcome::Success,
                    detail: Some(serde_json::json!({
                        "date_key": close.date_key,
                        "total_amount": close.total_amount,
                        "payment_count": close.payment_count,
                    })),
                })
                .await;
                Ok(close)
            }
            Err(err @ HotelierError::DailyCloseExists { .. }) => {
                self.audit(CreateAuditLogEntry {
                    tenant_id,
                    actor_id: actor,
                    action: "daily_close.create".into(),
                    entity: "daily_close".into(),
                    entity_id: None,
                    outcome: AuditOutcome::Failure,
                    detail: Some(serde_json::json!({ "error": err.to_string() })),
                })
                .await;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// The tenant's UTC window for its local calendar day.
    async fn window(
        &self,
        tenant_id: Uuid,
        date_key: NaiveDate,
    ) -> HotelierResult<(chrono::DateTime<chrono::Utc>, chrono::DateTime<chrono::Utc>)> {
        let tenant = self.tenants.get_by_id(tenant_id).await?;
        let offset = tenant
            .reporting_offset_minutes
            .unwrap_or(self.config.default_reporting_offset_minutes);
        Ok(reporting::day_window(date_key, offset))
    }

    /// Fire-and-forget: an audit failure never fails the operation.
    async fn audit(&self, entry: CreateAuditLogEntry) {
        if let Err(err) = self.audit.append(entry).await {
            tracing::warn!(error = %err, "audit append failed");
        }
    }
}
