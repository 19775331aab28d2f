//! The per-tenant stock tables: lots, cost layers, ledger, depletions.
//!
//! `StockState` is a plain data structure — services perform their reads and
//! guarded mutations against it inside a store transaction. Queries take
//! typed parameters; there are no stringly-typed filters.

use std::collections::HashMap;

use rust_decimal::Decimal;

use larder_core::{DomainError, DomainResult, Entity};
use larder_costing::{CostLayer, LayerDraw, LayerId};
use larder_depletion::{Depletion, DepletionId, OrderId};
use larder_inventory::{ItemId, LocationId, Lot, LotId, LotStatus};
use larder_ledger::Ledger;

/// Typed lot filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct LotQuery {
    pub item_id: Option<ItemId>,
    pub location_id: Option<LocationId>,
    pub status: Option<LotStatus>,
}

impl LotQuery {
    fn matches(&self, lot: &Lot) -> bool {
        self.item_id.is_none_or(|id| lot.item_id() == id)
            && self.location_id.is_none_or(|id| lot.location_id() == id)
            && self.status.is_none_or(|s| lot.status() == s)
    }
}

/// All stock tables for one tenant.
#[derive(Debug, Clone, Default)]
pub struct StockState {
    lots: HashMap<LotId, Lot>,
    layers: HashMap<LayerId, CostLayer>,
    /// 1:1 receipt invariant: each lot has exactly one layer.
    layer_by_lot: HashMap<LotId, LayerId>,
    ledger: Ledger,
    depletions: HashMap<DepletionId, Depletion>,
    /// Uniqueness index for (order, item) — the idempotency constraint.
    depletion_by_order_item: HashMap<(OrderId, ItemId), DepletionId>,
    /// Which layer slices a successful depletion drew (reversal support).
    draws_by_depletion: HashMap<DepletionId, Vec<LayerDraw>>,
}

impl StockState {
    pub fn new() -> Self {
        Self::default()
    }

    // --- lots ---

    pub fn lot(&self, id: LotId) -> DomainResult<&Lot> {
        self.lots.get(&id).ok_or(DomainError::NotFound)
    }

    pub fn lot_mut(&mut self, id: LotId) -> DomainResult<&mut Lot> {
        self.lots.get_mut(&id).ok_or(DomainError::NotFound)
    }

    pub fn lots(&self, query: &LotQuery) -> Vec<&Lot> {
        let mut found: Vec<&Lot> = self.lots.values().filter(|l| query.matches(l)).collect();
        found.sort_by_key(|l| (l.received_at(), *l.id().as_aggregate().as_uuid()));
        found
    }

    /// ACTIVE lots with stock remaining, FIFO by receipt timestamp.
    pub fn eligible_lots(&self, item_id: ItemId, location_id: LocationId) -> Vec<&Lot> {
        self.lots(&LotQuery {
            item_id: Some(item_id),
            location_id: Some(location_id),
            status: Some(LotStatus::Active),
        })
        .into_iter()
        .filter(|l| l.remaining_qty() > Decimal::ZERO)
        .collect()
    }

    /// Insert a freshly received lot with its (1:1) cost layer.
    pub fn insert_lot(&mut self, lot: Lot, layer: CostLayer) -> DomainResult<()> {
        let lot_id = *lot.id();
        if self.lots.contains_key(&lot_id) {
            return Err(DomainError::duplicate(format!("lot {lot_id} already exists")));
        }
        if layer.lot_id() != lot_id {
            return Err(DomainError::invariant("layer does not belong to the lot"));
        }
        self.layer_by_lot.insert(lot_id, *layer.id());
        self.layers.insert(*layer.id(), layer);
        self.lots.insert(lot_id, lot);
        Ok(())
    }

    // --- layers ---

    pub fn layer(&self, id: LayerId) -> DomainResult<&CostLayer> {
        self.layers.get(&id).ok_or(DomainError::NotFound)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> DomainResult<&mut CostLayer> {
        self.layers.get_mut(&id).ok_or(DomainError::NotFound)
    }

    pub fn layer_for_lot(&self, lot_id: LotId) -> DomainResult<&CostLayer> {
        let layer_id = self.layer_by_lot.get(&lot_id).ok_or(DomainError::NotFound)?;
        self.layer(*layer_id)
    }

    pub fn layer_for_lot_mut(&mut self, lot_id: LotId) -> DomainResult<&mut CostLayer> {
        let layer_id = *self.layer_by_lot.get(&lot_id).ok_or(DomainError::NotFound)?;
        self.layer_mut(layer_id)
    }

    /// Layers drawable by a FIFO consumption: lot ACTIVE, layer not exhausted.
    pub fn eligible_layers(&self, item_id: ItemId, location_id: LocationId) -> Vec<&CostLayer> {
        let mut found: Vec<&CostLayer> = self
            .layers
            .values()
            .filter(|layer| {
                layer.item_id() == item_id
                    && layer.location_id() == location_id
                    && !layer.is_exhausted()
                    && self
                        .lots
                        .get(&layer.lot_id())
                        .is_some_and(|lot| lot.status() == LotStatus::Active)
            })
            .collect();
        found.sort_by_key(|l| (l.created_at(), *l.id().as_aggregate().as_uuid()));
        found
    }

    // --- ledger ---

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    // --- depletions ---

    pub fn depletion(&self, id: DepletionId) -> DomainResult<&Depletion> {
        self.depletions.get(&id).ok_or(DomainError::NotFound)
    }

    pub fn depletion_mut(&mut self, id: DepletionId) -> DomainResult<&mut Depletion> {
        self.depletions.get_mut(&id).ok_or(DomainError::NotFound)
    }

    pub fn depletions_for_order(&self, order_id: OrderId) -> Vec<&Depletion> {
        let mut found: Vec<&Depletion> = self
            .depletions
            .values()
            .filter(|d| d.order_id() == order_id)
            .collect();
        found.sort_by_key(|d| (d.created_at(), *d.id().as_aggregate().as_uuid()));
        found
    }

    /// Insert a depletion row, enforcing the (order, item) uniqueness index.
    pub fn insert_depletion(&mut self, depletion: Depletion) -> DomainResult<()> {
        let key = (depletion.order_id(), depletion.item_id());
        if self.depletion_by_order_item.contains_key(&key) {
            return Err(DomainError::duplicate(format!(
                "depletion already recorded for order {} item {}",
                key.0, key.1
            )));
        }
        self.depletion_by_order_item.insert(key, *depletion.id());
        self.depletions.insert(*depletion.id(), depletion);
        Ok(())
    }

    pub fn record_draws(&mut self, depletion_id: DepletionId, draws: Vec<LayerDraw>) {
        self.draws_by_depletion.insert(depletion_id, draws);
    }

    pub fn take_draws(&mut self, depletion_id: DepletionId) -> Option<Vec<LayerDraw>> {
        self.draws_by_depletion.remove(&depletion_id)
    }
}
