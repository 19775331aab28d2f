//! Order-triggered depletion orchestration.
//!
//! One completed order is one transaction: every ingredient of every ordered
//! menu item is converted to its ledger unit and consumed FIFO, or none of
//! them are. Business-rule failures (shortfall, blocked lot, missing
//! conversion) are captured into FAILED rows — one per (order, item) — so
//! each can be retried or skipped individually; invariant violations abort
//! and propagate.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use larder_core::{DomainError, DomainResult, Entity, TenantId, UserId};
use larder_depletion::{Depletion, DepletionId, IngredientDemand, OrderCompleted, OrderId, OrderLine};
use larder_inventory::{InventoryItem, ItemId, LocationId, MenuItemId, Recipe};
use larder_ledger::EntrySource;
use larder_uom::{ConversionResolver, ConversionSource};

use crate::catalog::Catalog;
use crate::stock::costing::consume_in;
use crate::stock::state::StockState;
use crate::stock::store::StockStore;

type DemandPlan = Vec<(ItemId, Vec<IngredientDemand>)>;

/// Drives the depletion state machine for completed orders.
#[derive(Clone)]
pub struct DepletionOrchestrator {
    store: Arc<StockStore>,
    items: Arc<dyn Catalog<ItemId, InventoryItem>>,
    recipes: Arc<dyn Catalog<MenuItemId, Recipe>>,
    resolver: Arc<ConversionResolver<Arc<dyn ConversionSource>>>,
}

impl DepletionOrchestrator {
    pub fn new(
        store: Arc<StockStore>,
        items: Arc<dyn Catalog<ItemId, InventoryItem>>,
        recipes: Arc<dyn Catalog<MenuItemId, Recipe>>,
        resolver: Arc<ConversionResolver<Arc<dyn ConversionSource>>>,
    ) -> Self {
        Self {
            store,
            items,
            recipes,
            resolver,
        }
    }

    /// Consume ingredient stock for a completed order.
    ///
    /// Idempotent per order: when rows for this order already exist (in any
    /// state) they are returned unchanged — re-delivery of an order event is
    /// a no-op, never an error. The whole order shares one transaction; on
    /// the first ingredient failure every staged consumption is discarded
    /// and all rows are persisted as FAILED (the failing item with the
    /// captured reason) so each is individually retryable.
    pub fn deplete_for_order(
        &self,
        tenant_id: TenantId,
        order_id: OrderId,
        location_id: LocationId,
        user_id: UserId,
        lines: &[OrderLine],
    ) -> DomainResult<Vec<Depletion>> {
        let now = Utc::now();
        let demand_plan = self.build_demand_plan(tenant_id, lines)?;
        if demand_plan.is_empty() {
            debug!(tenant = %tenant_id, order = %order_id, "order has no stocked ingredients");
            return Ok(vec![]);
        }

        let mut failure: Option<(ItemId, String)> = None;
        let result = self.store.with_txn(tenant_id, |state| {
            let existing = state.depletions_for_order(order_id);
            if !existing.is_empty() {
                return Ok(existing.into_iter().cloned().collect());
            }

            let mut rows = Vec::with_capacity(demand_plan.len());
            for (item_id, demands) in &demand_plan {
                let mut row = Depletion::new(
                    DepletionId::new(),
                    tenant_id,
                    order_id,
                    *item_id,
                    location_id,
                    demands.clone(),
                    now,
                );
                if let Err(e) = self.attempt_in(state, tenant_id, &mut row, user_id, now) {
                    failure = Some((*item_id, e.to_string()));
                    return Err(e);
                }
                state.insert_depletion(row.clone())?;
                rows.push(row);
            }
            Ok(rows)
        });

        match result {
            Ok(rows) => {
                if !rows.is_empty() {
                    info!(
                        tenant = %tenant_id,
                        order = %order_id,
                        items = rows.len(),
                        "order depleted"
                    );
                }
                Ok(rows)
            }
            Err(e) if e.is_recoverable() => {
                let Some((failing_item, reason)) = failure else {
                    return Err(e);
                };
                warn!(
                    tenant = %tenant_id,
                    order = %order_id,
                    item = %failing_item,
                    %reason,
                    "order depletion failed; recording FAILED rows"
                );
                self.record_aborted_order(
                    tenant_id,
                    order_id,
                    location_id,
                    &demand_plan,
                    failing_item,
                    &reason,
                    now,
                )
            }
            Err(e) => Err(e),
        }
    }

    /// Re-attempt one FAILED depletion, re-reading current stock and
    /// conversion config (never a replay of stale data).
    pub fn retry(
        &self,
        tenant_id: TenantId,
        depletion_id: DepletionId,
        user_id: UserId,
    ) -> DomainResult<Depletion> {
        let now = Utc::now();
        let row = self.store.with_txn(tenant_id, |state| {
            let row = state.depletion_mut(depletion_id)?;
            row.retry(now)?;
            let mut attempt = row.clone();

            match self.attempt_in(state, tenant_id, &mut attempt, user_id, now) {
                Ok(()) => {}
                Err(e) if e.is_recoverable() => {
                    // The failed attempt never mutated stock (planning is
                    // all-or-nothing), so committing the row alone is safe.
                    attempt.mark_failed(e.to_string(), now)?;
                }
                Err(e) => return Err(e),
            }
            *state.depletion_mut(depletion_id)? = attempt.clone();
            Ok(attempt)
        })?;

        info!(
            tenant = %tenant_id,
            depletion = %depletion_id,
            user = %user_id,
            status = %row.status(),
            attempts = row.attempts(),
            "depletion retried"
        );
        Ok(row)
    }

    /// Resolve one FAILED depletion without touching stock. Reason mandatory.
    pub fn skip(
        &self,
        tenant_id: TenantId,
        depletion_id: DepletionId,
        user_id: UserId,
        reason: impl Into<String>,
    ) -> DomainResult<Depletion> {
        let reason = reason.into();
        let now = Utc::now();
        let row = self.store.with_txn(tenant_id, |state| {
            let row = state.depletion_mut(depletion_id)?;
            row.skip(user_id, reason.clone(), now)?;
            Ok(row.clone())
        })?;

        info!(
            tenant = %tenant_id,
            depletion = %depletion_id,
            user = %user_id,
            %reason,
            "depletion skipped"
        );
        Ok(row)
    }

    /// The queued entry point: handle an order-completed event.
    pub fn handle_order_completed(&self, event: &OrderCompleted) -> DomainResult<Vec<Depletion>> {
        self.deplete_for_order(
            event.tenant_id,
            event.order_id,
            event.location_id,
            event.user_id,
            &event.lines,
        )
    }

    pub fn depletion(&self, tenant_id: TenantId, id: DepletionId) -> DomainResult<Depletion> {
        self.store
            .read(tenant_id, |state| state.depletion(id).cloned())?
    }

    pub fn depletions_for_order(
        &self,
        tenant_id: TenantId,
        order_id: OrderId,
    ) -> DomainResult<Vec<Depletion>> {
        self.store.read(tenant_id, |state| {
            state
                .depletions_for_order(order_id)
                .into_iter()
                .cloned()
                .collect()
        })
    }

    /// Expand order lines through recipes into per-item demand, preserving
    /// first-seen item order (one row per (order, item) even when several
    /// menu items share an ingredient).
    fn build_demand_plan(&self, tenant_id: TenantId, lines: &[OrderLine]) -> DomainResult<DemandPlan> {
        let mut plan: DemandPlan = Vec::new();
        for line in lines {
            if line.quantity <= Decimal::ZERO {
                return Err(DomainError::validation("order line quantity must be > 0"));
            }
            let Some(recipe) = self.recipes.get(tenant_id, &line.menu_item_id) else {
                debug!(menu_item = %line.menu_item_id, "no recipe; line has no stock impact");
                continue;
            };
            for ingredient in &recipe.ingredients {
                let demand = IngredientDemand {
                    quantity: ingredient.quantity * line.quantity,
                    uom: ingredient.uom.clone(),
                };
                match plan.iter_mut().find(|(id, _)| *id == ingredient.item_id) {
                    Some((_, demands)) => demands.push(demand),
                    None => plan.push((ingredient.item_id, vec![demand])),
                }
            }
        }
        Ok(plan)
    }

    /// Attempt the consumption for one row inside an open transaction:
    /// convert demands to the item's ledger unit, consume FIFO, record the
    /// draws for later reversal, and mark the row SUCCESS.
    fn attempt_in(
        &self,
        state: &mut StockState,
        tenant_id: TenantId,
        row: &mut Depletion,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        let item_id = row.item_id();
        let item = self
            .items
            .get(tenant_id, &item_id)
            .ok_or_else(|| DomainError::invariant(format!("item {item_id} is not configured")))?;

        let mut total = Decimal::ZERO;
        for demand in row.demands() {
            total += self.resolver.convert(
                tenant_id,
                &demand.uom,
                item.ledger_uom(),
                demand.quantity,
            )?;
        }

        let applied = consume_in(
            state,
            tenant_id,
            item_id,
            row.location_id(),
            total,
            EntrySource::Depletion,
            (*row.id()).into(),
            now,
            Some(user_id),
        )?;

        state.record_draws(*row.id(), applied.plan.draws.clone());
        row.mark_succeeded(total, applied.plan.weighted_unit_cost, now)?;
        Ok(())
    }

    /// Persist the FAILED rows for an aborted order in their own transaction
    /// (the stock transaction was already discarded).
    #[allow(clippy::too_many_arguments)]
    fn record_aborted_order(
        &self,
        tenant_id: TenantId,
        order_id: OrderId,
        location_id: LocationId,
        demand_plan: &DemandPlan,
        failing_item: ItemId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<Depletion>> {
        self.store.with_txn(tenant_id, |state| {
            // Another caller may have won the race between our two
            // transactions; their rows take precedence (no-op path).
            let existing = state.depletions_for_order(order_id);
            if !existing.is_empty() {
                return Ok(existing.into_iter().cloned().collect());
            }

            let mut rows = Vec::with_capacity(demand_plan.len());
            for (item_id, demands) in demand_plan {
                let mut row = Depletion::new(
                    DepletionId::new(),
                    tenant_id,
                    order_id,
                    *item_id,
                    location_id,
                    demands.clone(),
                    now,
                );
                let why = if *item_id == failing_item {
                    reason.to_string()
                } else {
                    format!("order aborted: item {failing_item} failed: {reason}")
                };
                row.mark_failed(why, now)?;
                state.insert_depletion(row.clone())?;
                rows.push(row);
            }
            Ok(rows)
        })
    }
}
