//! Lot registry: receipt, waste, transfer, and status transitions.
//!
//! Every quantity mutation here appends to the ledger inside the same
//! transaction as the lot/layer change — the conservation invariant is kept
//! by transactional scoping, not by compensation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::info;

use larder_core::{DomainError, DomainResult, Entity, TenantId, UserId};
use larder_costing::{CostLayer, LayerId};
use larder_inventory::{ItemId, LocationId, Lot, LotId};
use larder_ledger::{EntrySource, LedgerEntry};

use super::state::StockState;
use super::store::StockStore;

/// Parameters for receiving one lot of stock.
#[derive(Debug, Clone)]
pub struct ReceiveStock {
    pub item_id: ItemId,
    pub location_id: LocationId,
    pub lot_number: String,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub expiry: Option<DateTime<Utc>>,
    pub received_at: DateTime<Utc>,
    pub received_by: Option<UserId>,
}

/// Tracks physical lots through their quantity/status lifecycle.
#[derive(Debug, Clone)]
pub struct LotRegistry {
    store: Arc<StockStore>,
}

impl LotRegistry {
    pub fn new(store: Arc<StockStore>) -> Self {
        Self { store }
    }

    /// Receive stock: one new lot, one new cost layer, one positive ledger
    /// entry — atomically.
    pub fn receive(&self, tenant_id: TenantId, cmd: ReceiveStock) -> DomainResult<Lot> {
        let lot = self
            .store
            .with_txn(tenant_id, |state| receive_in(state, tenant_id, &cmd))?;

        info!(
            tenant = %tenant_id,
            lot = %lot.id(),
            item = %cmd.item_id,
            qty = %cmd.quantity,
            unit_cost = %cmd.unit_cost,
            "stock received"
        );
        Ok(lot)
    }

    /// ACTIVE lots with stock remaining, FIFO by receipt timestamp.
    pub fn eligible(&self, tenant_id: TenantId, item_id: ItemId, location_id: LocationId) -> DomainResult<Vec<Lot>> {
        self.store.read(tenant_id, |state| {
            state
                .eligible_lots(item_id, location_id)
                .into_iter()
                .cloned()
                .collect()
        })
    }

    pub fn lot(&self, tenant_id: TenantId, lot_id: LotId) -> DomainResult<Lot> {
        self.store
            .read(tenant_id, |state| state.lot(lot_id).cloned())?
    }

    /// Quarantine a lot (blocks waste/transfer/depletion until released).
    pub fn block(
        &self,
        tenant_id: TenantId,
        lot_id: LotId,
        reason: impl Into<String>,
    ) -> DomainResult<Lot> {
        let reason = reason.into();
        let lot = self.store.with_txn(tenant_id, |state| {
            let lot = state.lot_mut(lot_id)?;
            lot.quarantine(reason.clone())?;
            Ok(lot.clone())
        })?;
        info!(tenant = %tenant_id, lot = %lot_id, %reason, "lot quarantined");
        Ok(lot)
    }

    /// Release a quarantined lot back into circulation.
    pub fn release(&self, tenant_id: TenantId, lot_id: LotId) -> DomainResult<Lot> {
        let lot = self.store.with_txn(tenant_id, |state| {
            let lot = state.lot_mut(lot_id)?;
            lot.release()?;
            Ok(lot.clone())
        })?;
        info!(tenant = %tenant_id, lot = %lot_id, "lot released from quarantine");
        Ok(lot)
    }

    /// Manually expire a lot: status transition plus the same write-off the
    /// expiry evaluator performs (remaining zeroed, ledger compensated).
    pub fn mark_expired(
        &self,
        tenant_id: TenantId,
        lot_id: LotId,
        user_id: Option<UserId>,
    ) -> DomainResult<Lot> {
        let now = Utc::now();
        let lot = self.store.with_txn(tenant_id, |state| {
            expire_lot_in(state, tenant_id, lot_id, now, user_id)?;
            state.lot(lot_id).cloned()
        })?;
        info!(tenant = %tenant_id, lot = %lot_id, "lot manually expired");
        Ok(lot)
    }

    /// Signed count correction against one lot.
    ///
    /// Allowed on blocked lots (corrections are how quarantine findings get
    /// booked); the remainder only goes negative with the explicit override.
    pub fn adjust_remaining(
        &self,
        tenant_id: TenantId,
        lot_id: LotId,
        delta: Decimal,
        allow_negative: bool,
        note: impl Into<String>,
        user_id: Option<UserId>,
    ) -> DomainResult<Lot> {
        if delta == Decimal::ZERO {
            return Err(DomainError::validation("adjustment delta cannot be zero"));
        }
        let note = note.into();
        let now = Utc::now();

        let lot = self.store.with_txn(tenant_id, |state| {
            let lot = state.lot_mut(lot_id)?;
            lot.adjust_remaining(delta, allow_negative)?;
            let (item_id, location_id, unit_cost) =
                (lot.item_id(), lot.location_id(), lot.unit_cost());
            let lot = lot.clone();

            state.layer_for_lot_mut(lot_id)?.adjust(delta);
            state.ledger_mut().append(
                LedgerEntry::new(
                    tenant_id,
                    item_id,
                    location_id,
                    delta,
                    unit_cost,
                    EntrySource::Adjustment,
                    lot_id.into(),
                    now,
                    user_id,
                )?
                .with_note(note.clone()),
            )?;
            Ok(lot)
        })?;

        info!(tenant = %tenant_id, lot = %lot_id, %delta, "lot remainder adjusted");
        Ok(lot)
    }

    /// Write off spoiled/damaged stock from one lot.
    pub fn waste(
        &self,
        tenant_id: TenantId,
        lot_id: LotId,
        quantity: Decimal,
        reason: impl Into<String>,
        user_id: Option<UserId>,
    ) -> DomainResult<Lot> {
        if quantity <= Decimal::ZERO {
            return Err(DomainError::validation("waste quantity must be > 0"));
        }
        let reason = reason.into();
        let now = Utc::now();

        let lot = self.store.with_txn(tenant_id, |state| {
            let lot = state.lot_mut(lot_id)?;
            lot.ensure_unblocked()?;
            lot.adjust_remaining(-quantity, false)?;
            let (item_id, location_id, unit_cost) =
                (lot.item_id(), lot.location_id(), lot.unit_cost());
            let lot = lot.clone();

            state.layer_for_lot_mut(lot_id)?.draw(quantity)?;
            state.ledger_mut().append(
                LedgerEntry::new(
                    tenant_id,
                    item_id,
                    location_id,
                    -quantity,
                    unit_cost,
                    EntrySource::Waste,
                    lot_id.into(),
                    now,
                    user_id,
                )?
                .with_note(reason.clone()),
            )?;
            Ok(lot)
        })?;

        info!(tenant = %tenant_id, lot = %lot_id, qty = %quantity, %reason, "stock wasted");
        Ok(lot)
    }

    /// Move stock from one location to another.
    ///
    /// The destination lot keeps the source's lot number, cost, expiry, and
    /// receipt timestamp — transferred stock must not jump the FIFO queue.
    pub fn transfer(
        &self,
        tenant_id: TenantId,
        lot_id: LotId,
        to_location: LocationId,
        quantity: Decimal,
        user_id: Option<UserId>,
    ) -> DomainResult<Lot> {
        if quantity <= Decimal::ZERO {
            return Err(DomainError::validation("transfer quantity must be > 0"));
        }
        let now = Utc::now();

        let dest = self.store.with_txn(tenant_id, |state| {
            let source = state.lot_mut(lot_id)?;
            source.ensure_unblocked()?;
            if source.location_id() == to_location {
                return Err(DomainError::validation(
                    "transfer destination equals the lot's location",
                ));
            }
            source.adjust_remaining(-quantity, false)?;
            let (item_id, from_location, unit_cost, expiry, lot_number, received_at) = (
                source.item_id(),
                source.location_id(),
                source.unit_cost(),
                source.expiry(),
                source.lot_number().to_string(),
                source.received_at(),
            );

            state.layer_for_lot_mut(lot_id)?.draw(quantity)?;

            let dest = Lot::receive(
                LotId::new(),
                tenant_id,
                item_id,
                to_location,
                lot_number,
                quantity,
                unit_cost,
                expiry,
                received_at,
            )?;
            let dest_layer = CostLayer::for_lot(LayerId::new(), &dest);
            let dest_id = *dest.id();
            state.insert_lot(dest.clone(), dest_layer)?;

            state.ledger_mut().append(LedgerEntry::new(
                tenant_id,
                item_id,
                from_location,
                -quantity,
                unit_cost,
                EntrySource::Transfer,
                lot_id.into(),
                now,
                user_id,
            )?)?;
            state.ledger_mut().append(LedgerEntry::new(
                tenant_id,
                item_id,
                to_location,
                quantity,
                unit_cost,
                EntrySource::Transfer,
                dest_id.into(),
                now,
                user_id,
            )?)?;

            Ok(dest)
        })?;

        info!(
            tenant = %tenant_id,
            from_lot = %lot_id,
            to_lot = %dest.id(),
            qty = %quantity,
            "stock transferred"
        );
        Ok(dest)
    }
}

/// Create lot + layer + receipt entry inside an open transaction.
pub(crate) fn receive_in(
    state: &mut StockState,
    tenant_id: TenantId,
    cmd: &ReceiveStock,
) -> DomainResult<Lot> {
    let lot = Lot::receive(
        LotId::new(),
        tenant_id,
        cmd.item_id,
        cmd.location_id,
        cmd.lot_number.clone(),
        cmd.quantity,
        cmd.unit_cost,
        cmd.expiry,
        cmd.received_at,
    )?;
    let layer = CostLayer::for_lot(LayerId::new(), &lot);
    let lot_id = *lot.id();

    state.insert_lot(lot.clone(), layer)?;
    state.ledger_mut().append(LedgerEntry::new(
        tenant_id,
        cmd.item_id,
        cmd.location_id,
        cmd.quantity,
        cmd.unit_cost,
        EntrySource::Receipt,
        lot_id.into(),
        cmd.received_at,
        cmd.received_by,
    )?)?;
    Ok(lot)
}

/// Expire one lot inside an open transaction: status transition, remaining
/// zeroed on lot and layer, and a compensating ledger entry valued at the
/// lot's unit cost. Returns `(quantity, value)` written off.
pub(crate) fn expire_lot_in(
    state: &mut StockState,
    tenant_id: TenantId,
    lot_id: LotId,
    now: DateTime<Utc>,
    user_id: Option<UserId>,
) -> DomainResult<(Decimal, Decimal)> {
    let lot = state.lot_mut(lot_id)?;
    lot.mark_expired()?;
    let removed = lot.remaining_qty();
    let (item_id, location_id, unit_cost) = (lot.item_id(), lot.location_id(), lot.unit_cost());
    if removed > Decimal::ZERO {
        lot.adjust_remaining(-removed, false)?;
    }

    state.layer_for_lot_mut(lot_id)?.write_off();

    if removed > Decimal::ZERO {
        state.ledger_mut().append(LedgerEntry::new(
            tenant_id,
            item_id,
            location_id,
            -removed,
            unit_cost,
            EntrySource::Expiry,
            lot_id.into(),
            now,
            user_id,
        )?)?;
    }

    Ok((removed, removed * unit_cost))
}
