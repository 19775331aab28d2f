use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use larder_core::{DomainError, DomainResult, Entity, TenantId, UserId, domain_id};
use larder_inventory::{ItemId, LocationId};
use larder_uom::UomCode;

use crate::order::OrderId;

domain_id!(
    /// Depletion row identifier.
    DepletionId
);

/// Depletion lifecycle status.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DepletionStatus {
    Pending,
    Success,
    Failed,
    Skipped,
}

impl DepletionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DepletionStatus::Success | DepletionStatus::Skipped)
    }
}

impl core::fmt::Display for DepletionStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            DepletionStatus::Pending => "PENDING",
            DepletionStatus::Success => "SUCCESS",
            DepletionStatus::Failed => "FAILED",
            DepletionStatus::Skipped => "SKIPPED",
        };
        f.write_str(s)
    }
}

/// What one order demands of one ingredient item, in the recipe's unit.
///
/// Kept on the row so a retry re-derives the ledger quantity from scratch
/// (conversion config and stock are both re-read at attempt time).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientDemand {
    pub quantity: Decimal,
    pub uom: UomCode,
}

/// One (order, item) unit-of-work. Unique per (tenant, order, item).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Depletion {
    id: DepletionId,
    tenant_id: TenantId,
    order_id: OrderId,
    item_id: ItemId,
    location_id: LocationId,
    demands: Vec<IngredientDemand>,
    /// Ledger-unit quantity consumed by the successful attempt.
    consumed_qty: Option<Decimal>,
    /// Weighted unit cost of the successful attempt.
    unit_cost: Option<Decimal>,
    status: DepletionStatus,
    attempts: u32,
    failure_reason: Option<String>,
    resolved_by: Option<UserId>,
    resolution_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Depletion {
    pub fn new(
        id: DepletionId,
        tenant_id: TenantId,
        order_id: OrderId,
        item_id: ItemId,
        location_id: LocationId,
        demands: Vec<IngredientDemand>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            tenant_id,
            order_id,
            item_id,
            location_id,
            demands,
            consumed_qty: None,
            unit_cost: None,
            status: DepletionStatus::Pending,
            attempts: 0,
            failure_reason: None,
            resolved_by: None,
            resolution_reason: None,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn location_id(&self) -> LocationId {
        self.location_id
    }

    pub fn demands(&self) -> &[IngredientDemand] {
        &self.demands
    }

    pub fn consumed_qty(&self) -> Option<Decimal> {
        self.consumed_qty
    }

    pub fn unit_cost(&self) -> Option<Decimal> {
        self.unit_cost
    }

    pub fn status(&self) -> DepletionStatus {
        self.status
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn resolved_by(&self) -> Option<UserId> {
        self.resolved_by
    }

    pub fn resolution_reason(&self) -> Option<&str> {
        self.resolution_reason.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Record a successful consumption attempt. PENDING only.
    pub fn mark_succeeded(
        &mut self,
        consumed_qty: Decimal,
        unit_cost: Decimal,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.ensure_status(DepletionStatus::Pending, "mark succeeded")?;
        self.status = DepletionStatus::Success;
        self.attempts += 1;
        self.consumed_qty = Some(consumed_qty);
        self.unit_cost = Some(unit_cost);
        self.failure_reason = None;
        self.updated_at = now;
        Ok(())
    }

    /// Record a failed consumption attempt with the captured reason. PENDING only.
    pub fn mark_failed(&mut self, reason: impl Into<String>, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_status(DepletionStatus::Pending, "mark failed")?;
        self.status = DepletionStatus::Failed;
        self.attempts += 1;
        self.failure_reason = Some(reason.into());
        self.updated_at = now;
        Ok(())
    }

    /// Re-open a FAILED row for another attempt (stock is re-read by the
    /// orchestrator — this is not a replay of stale data).
    pub fn retry(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_status(DepletionStatus::Failed, "retry")?;
        self.status = DepletionStatus::Pending;
        self.updated_at = now;
        Ok(())
    }

    /// Resolve a FAILED row without touching stock. Reason is mandatory.
    pub fn skip(
        &mut self,
        user_id: UserId,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        let reason = reason.into().trim().to_string();
        if reason.is_empty() {
            return Err(DomainError::validation("skip requires a reason"));
        }
        self.ensure_status(DepletionStatus::Failed, "skip")?;
        self.status = DepletionStatus::Skipped;
        self.resolved_by = Some(user_id);
        self.resolution_reason = Some(reason);
        self.updated_at = now;
        Ok(())
    }

    /// Re-open a SUCCESS row after its stock effect was compensated, so the
    /// standard retry/skip recovery governs what happens next.
    pub fn mark_reversed(
        &mut self,
        user_id: UserId,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.ensure_status(DepletionStatus::Success, "reverse")?;
        self.status = DepletionStatus::Failed;
        self.failure_reason = Some(reason.into());
        self.resolved_by = Some(user_id);
        self.consumed_qty = None;
        self.unit_cost = None;
        self.updated_at = now;
        Ok(())
    }

    fn ensure_status(&self, expected: DepletionStatus, attempted: &str) -> DomainResult<()> {
        if self.status != expected {
            return Err(DomainError::invalid_state(
                self.status.to_string(),
                attempted,
            ));
        }
        Ok(())
    }
}

impl Entity for Depletion {
    type Id = DepletionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
