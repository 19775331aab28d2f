//! Cost layer engine: FIFO consumption, reversal, valuation.
//!
//! Layer *creation* rides on receipt (each receipt is exactly one lot and one
//! layer, see [`super::registry::LotRegistry::receive`]); this service owns
//! drawing value back out of the layers and putting it back on reversal.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::info;

use larder_core::{AggregateId, DomainError, DomainResult, TenantId, UserId};
use larder_costing::{ConsumptionPlan, CostLayer, plan_fifo};
use larder_depletion::{Depletion, DepletionId, DepletionStatus};
use larder_inventory::{ItemId, LocationId};
use larder_ledger::{EntryId, EntrySource, LedgerEntry};

use super::state::StockState;
use super::store::StockStore;

/// Parameters for a standalone FIFO consumption.
#[derive(Debug, Clone)]
pub struct ConsumeStock {
    pub item_id: ItemId,
    pub location_id: LocationId,
    pub quantity: Decimal,
    pub source: EntrySource,
    pub source_ref: AggregateId,
    pub occurred_at: DateTime<Utc>,
    pub user_id: Option<UserId>,
}

/// What a committed consumption did: the plan that was applied and the ledger
/// entry that valued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedConsumption {
    pub plan: ConsumptionPlan,
    pub entry_id: EntryId,
}

/// Valuation of on-hand (ACTIVE) stock for one (item, location).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Valuation {
    pub item_id: ItemId,
    pub location_id: LocationId,
    pub quantity: Decimal,
    pub total_value: Decimal,
    /// `None` when no quantity remains.
    pub weighted_avg_cost: Option<Decimal>,
}

/// Creates, consumes, and reverses priced inventory slices.
#[derive(Debug, Clone)]
pub struct CostLayerEngine {
    store: Arc<StockStore>,
}

impl CostLayerEngine {
    pub fn new(store: Arc<StockStore>) -> Self {
        Self { store }
    }

    /// Consume FIFO across eligible layers, atomically with the lot drains
    /// and the valuing ledger entry.
    pub fn consume(&self, tenant_id: TenantId, cmd: ConsumeStock) -> DomainResult<AppliedConsumption> {
        let applied = self.store.with_txn(tenant_id, |state| {
            consume_in(
                state,
                tenant_id,
                cmd.item_id,
                cmd.location_id,
                cmd.quantity,
                cmd.source,
                cmd.source_ref,
                cmd.occurred_at,
                cmd.user_id,
            )
        })?;

        info!(
            tenant = %tenant_id,
            item = %cmd.item_id,
            qty = %cmd.quantity,
            unit_cost = %applied.plan.weighted_unit_cost,
            layers = applied.plan.draws.len(),
            "stock consumed"
        );
        Ok(applied)
    }

    /// Undo a committed SUCCESS depletion: restore every drawn slice to its
    /// layer and lot, append compensating entries referencing the originals,
    /// and re-open the row as FAILED so retry/skip govern it from here.
    pub fn reverse(
        &self,
        tenant_id: TenantId,
        depletion_id: DepletionId,
        user_id: UserId,
        reason: impl Into<String>,
    ) -> DomainResult<Depletion> {
        let reason = reason.into();
        let now = Utc::now();

        let row = self.store.with_txn(tenant_id, |state| {
            let row = state.depletion(depletion_id)?;
            if row.status() != DepletionStatus::Success {
                return Err(DomainError::invalid_state(
                    row.status().to_string(),
                    "reverse",
                ));
            }
            let (item_id, location_id) = (row.item_id(), row.location_id());

            let draws = state
                .take_draws(depletion_id)
                .ok_or_else(|| DomainError::invariant("no recorded draws for depletion"))?;
            for draw in &draws {
                state.layer_mut(draw.layer_id)?.restore(draw.quantity)?;
                // Restored stock can land on a since-blocked lot; it comes
                // back blocked, not lost.
                state.lot_mut(draw.lot_id)?.adjust_remaining(draw.quantity, false)?;
            }

            let original = state
                .ledger()
                .entries_for(item_id, location_id)
                .find(|e| {
                    e.source == EntrySource::Depletion
                        && e.source_ref == AggregateId::from(depletion_id)
                })
                .cloned()
                .ok_or_else(|| DomainError::invariant("no ledger entry for depletion"))?;
            state.ledger_mut().append(LedgerEntry::reversing(
                &original,
                depletion_id.into(),
                now,
                Some(user_id),
            ))?;

            let row = state.depletion_mut(depletion_id)?;
            row.mark_reversed(user_id, reason.clone(), now)?;
            Ok(row.clone())
        })?;

        info!(tenant = %tenant_id, depletion = %depletion_id, %reason, "depletion reversed");
        Ok(row)
    }

    /// Cost layers for one (item, location), FIFO order, eligible only.
    pub fn eligible_layers(
        &self,
        tenant_id: TenantId,
        item_id: ItemId,
        location_id: LocationId,
    ) -> DomainResult<Vec<CostLayer>> {
        self.store.read(tenant_id, |state| {
            state
                .eligible_layers(item_id, location_id)
                .into_iter()
                .cloned()
                .collect()
        })
    }

    /// Weighted valuation of remaining eligible layers.
    pub fn valuation(
        &self,
        tenant_id: TenantId,
        item_id: ItemId,
        location_id: LocationId,
    ) -> DomainResult<Valuation> {
        self.store.read(tenant_id, |state| {
            let layers = state.eligible_layers(item_id, location_id);
            let quantity: Decimal = layers.iter().map(|l| l.remaining_qty()).sum();
            let total_value: Decimal = layers.iter().map(|l| l.remaining_value()).sum();
            Valuation {
                item_id,
                location_id,
                quantity,
                total_value,
                weighted_avg_cost: (quantity > Decimal::ZERO).then(|| total_value / quantity),
            }
        })
    }
}

/// Plan and apply one FIFO consumption inside an open transaction.
///
/// Planning happens first against a read view; only a plan that fully covers
/// the request mutates anything, so a shortfall leaves the transaction
/// untouched (all-or-nothing).
#[allow(clippy::too_many_arguments)]
pub(crate) fn consume_in(
    state: &mut StockState,
    tenant_id: TenantId,
    item_id: ItemId,
    location_id: LocationId,
    quantity: Decimal,
    source: EntrySource,
    source_ref: AggregateId,
    occurred_at: DateTime<Utc>,
    user_id: Option<UserId>,
) -> DomainResult<AppliedConsumption> {
    let plan = {
        let eligible = state.eligible_layers(item_id, location_id);
        plan_fifo(item_id, location_id, &eligible, quantity)?
    };

    for draw in &plan.draws {
        state.layer_mut(draw.layer_id)?.draw(draw.quantity)?;
        state.lot_mut(draw.lot_id)?.adjust_remaining(-draw.quantity, false)?;
    }

    let entry_id = state.ledger_mut().append(LedgerEntry::new(
        tenant_id,
        item_id,
        location_id,
        -quantity,
        plan.weighted_unit_cost,
        source,
        source_ref,
        occurred_at,
        user_id,
    )?)?;

    Ok(AppliedConsumption { plan, entry_id })
}
