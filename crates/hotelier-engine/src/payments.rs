//! Billing service — payments, incidental charges, and the due amount.

use hotelier_core::error::{HotelierError, HotelierResult};
use hotelier_core::models::audit::{AuditOutcome, CreateAuditLogEntry};
use hotelier_core::models::charge::{Charge, CreateCharge, UpdateCharge};
use hotelier_core::models::payment::{CreatePayment, Payment, UpdatePayment};
use hotelier_core::repository::{
    AuditLogRepository, ChargeRepository, PaymentRepository, ReservationRepository,
};
use uuid::Uuid;

use crate::billing;

/// A reservation's money position, recomputed from source rows on every
/// call. Cached or client-supplied totals are never trusted.
#[derive(Debug, Clone)]
pub struct BillingStatement {
    pub reservation_id: Uuid,
    pub room_total: i64,
    pub charges_total: i64,
    pub grand_total: i64,
    pub completed_total: i64,
    pub due: i64,
}

/// Payment and charge orchestration.
///
/// The overpayment cap and the charge status gates are enforced inside
/// the repository transactions; this service owns input validation, the
/// statement view, and the audit trail.
pub struct BillingService<P, C, R, A>
where
    P: PaymentRepository,
    C: ChargeRepository,
    R: ReservationRepository,
    A: AuditLogRepository,
{
    payments: P,
    charges: C,
    reservations: R,
    audit: A,
}

impl<P, C, R, A> BillingService<P, C, R, A>
where
    P: PaymentRepository,
    C: ChargeRepository,
    R: ReservationRepository,
    A: AuditLogRepository,
{
    pub fn new(payments: P, charges: C, reservations: R, audit: A) -> Self {
        Self {
            payments,
            charges,
            reservations,
            audit,
        }
    }

    /// Room total + charges − completed payments, from authoritative
    /// rows.
    pub async fn statement(
        &self,
        tenant_id: Uuid,
        reservation_id: Uuid,
    ) -> HotelierResult<BillingStatement> {
        let reservation = self.reservations.get_by_id(tenant_id, reservation_id).await?;
        let charges = self
            .charges
            .list_for_reservation(tenant_id, reservation_id)
            .await?;
        let payments = self
            .payments
            .list_for_reservation(tenant_id, reservation_id)
            .await?;

        let room_total = reservation.total_price;
        let grand_total = billing::grand_total(room_total, &charges);
        let completed_total = billing::completed_total(&payments, None);

        Ok(BillingStatement {
            reservation_id,
            room_total,
            charges_total: grand_total - room_total,
            grand_total,
            completed_total,
            due: billing::due_amount(grand_total, completed_total),
        })
    }

    /// Record a payment against a reservation. Completed payments are
    /// capped at the grand total inside the insert transaction;
    /// pending/failed payments never count toward the cap.
    pub async fn record_payment(
        &self,
        actor: Option<Uuid>,
        tenant_id: Uuid,
        input: CreatePayment,
    ) -> HotelierResult<Payment> {
        if input.amount <= 0 {
            return Err(positive_amount_error("amount"));
        }

        let payment = self.payments.create(tenant_id, input).await?;

        self.audit(CreateAuditLogEntry {
            tenant_id,
            actor_id: actor,
            action: "payment.create".into(),
            entity: "payment".into(),
            entity_id: Some(payment.id),
            outcome: AuditOutcome::Success,
            detail: Some(serde_json::json!({
                "reservation_id": payment.reservation_id,
                "amount": payment.amount,
                "method": payment.method,
                "status": payment.status,
            })),
        })
        .await;

        Ok(payment)
    }

    /// Edit a payment. The overpayment cap is recomputed with this
    /// payment excluded from the existing-completed total.
    pub async fn update_payment(
        &self,
        actor: Option<Uuid>,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdatePayment,
    ) -> HotelierResult<Payment> {
        if input.amount.is_some_and(|amount| amount <= 0) {
            return Err(positive_amount_error("amount"));
        }

        let payment = self.payments.update(tenant_id, id, input).await?;

        self.audit(CreateAuditLogEntry {
            tenant_id,
            actor_id: actor,
            action: "payment.update".into(),
            entity: "payment".into(),
            entity_id: Some(id),
            outcome: AuditOutcome::Success,
            detail: Some(serde_json::json!({
                "amount": payment.amount,
                "status": payment.status,
            })),
        })
        .await;

        Ok(payment)
    }

    /// Unconditionally allowed: removing a payment can only reduce the
    /// due amount.
    pub async fn delete_payment(
        &self,
        actor: Option<Uuid>,
        tenant_id: Uuid,
        id: Uuid,
    ) -> HotelierResult<()> {
        self.payments.delete(tenant_id, id).await?;

        self.audit(CreateAuditLogEntry {
            tenant_id,
            actor_id: actor,
            action: "payment.delete".into(),
            entity: "payment".into(),
            entity_id: Some(id),
            outcome: AuditOutcome::Success,
            detail: None,
        })
        .await;

        Ok(())
    }

    /// Add an incidental charge to a reservation that is neither
    /// cancelled nor checked out. The total is computed server-side.
    pub async fn add_charge(
        &self,
        actor: Option<Uuid>,
        input: CreateCharge,
    ) -> HotelierResult<Charge> {
        if input.quantity <= 0 {
            return Err(positive_amount_error("quantity"));
        }
        if input.unit_price <= 0 {
            return Err(positive_amount_error("unit_price"));
        }

        // The room reference is redundant for reporting; it must match
        // the reservation's actual room.
        let reservation = self
            .reservations
            .get_by_id(input.tenant_id, input.reservation_id)
            .await?;
        if reservation.room_id != input.room_id {
            return Err(HotelierError::Validation {
                field: "room_id".into(),
                message: "charge room does not match the reservation's room".into(),
            });
        }

        let charge = self.charges.create(input).await?;

        self.audit(CreateAuditLogEntry {
            tenant_id: charge.tenant_id,
            actor_id: actor,
            action: "charge.create".into(),
            entity: "charge".into(),
            entity_id: Some(charge.id),
            outcome: AuditOutcome::Success,
            detail: Some(serde_json::json!({
                "reservation_id": charge.reservation_id,
                "kind": charge.kind,
                "total": charge.total,
            })),
        })
        .await;

        Ok(charge)
    }

    pub async fn update_charge(
        &self,
        actor: Option<Uuid>,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateCharge,
    ) -> HotelierResult<Charge> {
        if input.quantity.is_some_and(|quantity| quantity <= 0) {
            return Err(positive_amount_error("quantity"));
        }
        if input.unit_price.is_some_and(|unit_price| unit_price <= 0) {
            return Err(positive_amount_error("unit_price"));
        }

        let charge = self.charges.update(tenant_id, id, input).await?;

        self.audit(CreateAuditLogEntry {
            tenant_id,
            actor_id: actor,
            action: "charge.update".into(),
            entity: "charge".into(),
            entity_id: Some(id),
            outcome: AuditOutcome::Success,
            detail: Some(serde_json::json!({ "total": charge.total })),
        })
        .await;

        Ok(charge)
    }

    pub async fn delete_charge(
        &self,
        actor: Option<Uuid>,
        tenant_id: Uuid,
        id: Uuid,
    ) -> HotelierResult<()> {
        self.charges.delete(tenant_id, id).await?;

        self.audit(CreateAuditLogEntry {
            tenant_id,
            actor_id: actor,
            action: "charge.delete".into(),
            entity: "charge".into(),
            entity_id: Some(id),
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

fn positive_amount_error(field: &str) -> HotelierError {
    HotelierError::Validation {
        field: field.into(),
        message: "must be positive".into(),
    }
}
