use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use larder_core::{DomainError, DomainResult, Entity, TenantId, domain_id};
use larder_inventory::{ItemId, LocationId, Lot, LotId};

domain_id!(
    /// Cost layer identifier.
    LayerId
);

/// A priced, depletable slice of inventory created by one receipt.
///
/// Invariant: `remaining_qty <= original_qty`, monotonically non-increasing
/// except on reversal. `created_at` is the FIFO ordering key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostLayer {
    id: LayerId,
    tenant_id: TenantId,
    lot_id: LotId,
    item_id: ItemId,
    location_id: LocationId,
    original_qty: Decimal,
    remaining_qty: Decimal,
    unit_cost: Decimal,
    created_at: DateTime<Utc>,
}

impl CostLayer {
    /// Build the layer for a freshly received lot (1:1).
    pub fn for_lot(id: LayerId, lot: &Lot) -> Self {
        Self {
            id,
            tenant_id: lot.tenant_id(),
            lot_id: *lot.id(),
            item_id: lot.item_id(),
            location_id: lot.location_id(),
            original_qty: lot.remaining_qty(),
            remaining_qty: lot.remaining_qty(),
            unit_cost: lot.unit_cost(),
            created_at: lot.received_at(),
        }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn lot_id(&self) -> LotId {
        self.lot_id
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn location_id(&self) -> LocationId {
        self.location_id
    }

    pub fn original_qty(&self) -> Decimal {
        self.original_qty
    }

    pub fn remaining_qty(&self) -> Decimal {
        self.remaining_qty
    }

    pub fn unit_cost(&self) -> Decimal {
        self.unit_cost
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining_qty <= Decimal::ZERO
    }

    /// Remaining value of this layer (`remaining × unit cost`).
    pub fn remaining_value(&self) -> Decimal {
        self.remaining_qty * self.unit_cost
    }

    /// Drain quantity from the layer. The planner never produces a draw that
    /// overshoots, so an overshoot here is a bug, not a business failure.
    pub fn draw(&mut self, qty: Decimal) -> DomainResult<()> {
        if qty <= Decimal::ZERO {
            return Err(DomainError::invariant("layer draw must be > 0"));
        }
        if qty > self.remaining_qty {
            return Err(DomainError::invariant(format!(
                "layer {} over-drawn: {} requested, {} remaining",
                self.id, qty, self.remaining_qty
            )));
        }
        self.remaining_qty -= qty;
        Ok(())
    }

    /// Put quantity back on reversal. Capped by the original quantity.
    pub fn restore(&mut self, qty: Decimal) -> DomainResult<()> {
        if qty <= Decimal::ZERO {
            return Err(DomainError::invariant("layer restore must be > 0"));
        }
        let resulting = self.remaining_qty + qty;
        if resulting > self.original_qty {
            return Err(DomainError::invariant(format!(
                "layer {} restore would exceed original quantity ({} > {})",
                self.id, resulting, self.original_qty
            )));
        }
        self.remaining_qty = resulting;
        Ok(())
    }

    /// Apply a signed count correction. A correction can legitimately exceed
    /// the original receipt; the layer never carries negative value, so the
    /// remainder floors at zero even when the lot uses the negative override.
    pub fn adjust(&mut self, delta: Decimal) {
        let resulting = (self.remaining_qty + delta).max(Decimal::ZERO);
        self.remaining_qty = resulting;
        if resulting > self.original_qty {
            self.original_qty = resulting;
        }
    }

    /// Write the layer off entirely (expiry). Returns the quantity removed.
    pub fn write_off(&mut self) -> Decimal {
        let removed = self.remaining_qty;
        self.remaining_qty = Decimal::ZERO;
        removed
    }
}

impl Entity for CostLayer {
    type Id = LayerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_layer(qty: Decimal, cost: Decimal) -> CostLayer {
        let lot = Lot::receive(
            LotId::new(),
            TenantId::new(),
            ItemId::new(),
            LocationId::new(),
            "LOT-1",
            qty,
            cost,
            None,
            Utc::now(),
        )
        .unwrap();
        CostLayer::for_lot(LayerId::new(), &lot)
    }

    #[test]
    fn layer_mirrors_its_lot_on_creation() {
        let layer = test_layer(dec!(10), dec!(3.20));
        assert_eq!(layer.original_qty(), dec!(10));
        assert_eq!(layer.remaining_qty(), dec!(10));
        assert_eq!(layer.unit_cost(), dec!(3.20));
        assert!(!layer.is_exhausted());
    }

    #[test]
    fn draw_reduces_and_guards_overshoot() {
        let mut layer = test_layer(dec!(10), dec!(1));
        layer.draw(dec!(4)).unwrap();
        assert_eq!(layer.remaining_qty(), dec!(6));

        let err = layer.draw(dec!(7)).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(layer.remaining_qty(), dec!(6));
    }

    #[test]
    fn restore_is_capped_by_original() {
        let mut layer = test_layer(dec!(10), dec!(1));
        layer.draw(dec!(4)).unwrap();
        layer.restore(dec!(4)).unwrap();
        assert_eq!(layer.remaining_qty(), dec!(10));

        assert!(layer.restore(dec!(1)).is_err());
    }

    #[test]
    fn write_off_zeroes_the_layer() {
        let mut layer = test_layer(dec!(10), dec!(2));
        layer.draw(dec!(3)).unwrap();
        assert_eq!(layer.write_off(), dec!(7));
        assert!(layer.is_exhausted());
    }
}
