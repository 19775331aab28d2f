//! Pure FIFO consumption planning.
//!
//! Planning is all-or-nothing: if the eligible layers cannot cover the
//! requested quantity the whole plan fails with `InsufficientStock` and no
//! layer is touched. The returned weighted unit cost values the ledger
//! entries for that single consumption.

use rust_decimal::Decimal;

use larder_core::{DomainError, DomainResult, Entity};
use larder_inventory::{ItemId, LocationId, LotId};

use crate::layer::{CostLayer, LayerId};

/// One slice drawn from one layer by a consumption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerDraw {
    pub layer_id: LayerId,
    pub lot_id: LotId,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
}

impl LayerDraw {
    pub fn value(&self) -> Decimal {
        self.quantity * self.unit_cost
    }
}

/// The outcome of planning one consumption across eligible layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumptionPlan {
    pub requested: Decimal,
    pub draws: Vec<LayerDraw>,
    /// Quantity-weighted average unit cost across all draws.
    pub weighted_unit_cost: Decimal,
}

impl ConsumptionPlan {
    pub fn total_value(&self) -> Decimal {
        self.draws.iter().map(LayerDraw::value).sum()
    }
}

/// Plan a FIFO consumption of `requested` against `eligible` layers.
///
/// `eligible` must already be restricted to layers whose lot is ACTIVE;
/// ordering is re-derived here (creation timestamp ascending — oldest first)
/// so callers cannot accidentally feed a mis-sorted slice. Exhausted layers
/// are skipped. The last layer touched is split.
pub fn plan_fifo(
    item_id: ItemId,
    location_id: LocationId,
    eligible: &[&CostLayer],
    requested: Decimal,
) -> DomainResult<ConsumptionPlan> {
    if requested <= Decimal::ZERO {
        return Err(DomainError::validation(
            "consumption quantity must be > 0",
        ));
    }

    let mut layers: Vec<&CostLayer> = eligible
        .iter()
        .copied()
        .filter(|l| !l.is_exhausted())
        .collect();
    layers.sort_by_key(|l| l.created_at());

    let available: Decimal = layers.iter().map(|l| l.remaining_qty()).sum();
    if available < requested {
        return Err(DomainError::InsufficientStock {
            item_id: item_id.into(),
            location_id: location_id.into(),
            requested,
            available,
        });
    }

    let mut draws = Vec::new();
    let mut outstanding = requested;
    for layer in layers {
        if outstanding <= Decimal::ZERO {
            break;
        }
        let take = outstanding.min(layer.remaining_qty());
        draws.push(LayerDraw {
            layer_id: *layer.id(),
            lot_id: layer.lot_id(),
            quantity: take,
            unit_cost: layer.unit_cost(),
        });
        outstanding -= take;
    }

    let total_value: Decimal = draws.iter().map(LayerDraw::value).sum();
    Ok(ConsumptionPlan {
        requested,
        draws,
        weighted_unit_cost: total_value / requested,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use larder_core::{Entity, TenantId};
    use larder_inventory::Lot;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn layer_at(
        item_id: ItemId,
        location_id: LocationId,
        qty: Decimal,
        cost: Decimal,
        t: i64,
    ) -> CostLayer {
        let received = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(t);
        let lot = Lot::receive(
            LotId::new(),
            TenantId::new(),
            item_id,
            location_id,
            format!("LOT-{t}"),
            qty,
            cost,
            None,
            received,
        )
        .unwrap();
        CostLayer::for_lot(LayerId::new(), &lot)
    }

    #[test]
    fn fifo_splits_the_last_layer_and_weights_cost() {
        let item = ItemId::new();
        let loc = LocationId::new();
        let l1 = layer_at(item, loc, dec!(5), dec!(10), 1);
        let l2 = layer_at(item, loc, dec!(5), dec!(12), 2);

        let plan = plan_fifo(item, loc, &[&l2, &l1], dec!(7)).unwrap();

        assert_eq!(plan.draws.len(), 2);
        assert_eq!(plan.draws[0].layer_id, *l1.id());
        assert_eq!(plan.draws[0].quantity, dec!(5));
        assert_eq!(plan.draws[1].layer_id, *l2.id());
        assert_eq!(plan.draws[1].quantity, dec!(2));
        // (5·10 + 2·12) / 7
        assert_eq!(plan.weighted_unit_cost, dec!(74) / dec!(7));
        assert_eq!(plan.total_value(), dec!(74));
    }

    #[test]
    fn exact_boundary_drains_one_layer_only() {
        let item = ItemId::new();
        let loc = LocationId::new();
        let l1 = layer_at(item, loc, dec!(5), dec!(10), 1);
        let l2 = layer_at(item, loc, dec!(5), dec!(12), 2);

        let plan = plan_fifo(item, loc, &[&l1, &l2], dec!(5)).unwrap();
        assert_eq!(plan.draws.len(), 1);
        assert_eq!(plan.weighted_unit_cost, dec!(10));
    }

    #[test]
    fn shortfall_fails_whole_with_detail() {
        let item = ItemId::new();
        let loc = LocationId::new();
        let l1 = layer_at(item, loc, dec!(3), dec!(10), 1);

        let err = plan_fifo(item, loc, &[&l1], dec!(7)).unwrap_err();
        match err {
            DomainError::InsufficientStock {
                requested,
                available,
                ..
            } => {
                assert_eq!(requested, dec!(7));
                assert_eq!(available, dec!(3));
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn exhausted_layers_are_skipped() {
        let item = ItemId::new();
        let loc = LocationId::new();
        let mut l1 = layer_at(item, loc, dec!(5), dec!(10), 1);
        l1.draw(dec!(5)).unwrap();
        let l2 = layer_at(item, loc, dec!(5), dec!(12), 2);

        let plan = plan_fifo(item, loc, &[&l1, &l2], dec!(2)).unwrap();
        assert_eq!(plan.draws.len(), 1);
        assert_eq!(plan.draws[0].layer_id, *l2.id());
    }

    #[test]
    fn non_positive_request_is_rejected() {
        let item = ItemId::new();
        let loc = LocationId::new();
        assert!(plan_fifo(item, loc, &[], dec!(0)).is_err());
        assert!(plan_fifo(item, loc, &[], dec!(-1)).is_err());
    }

    proptest! {
        /// Property: a successful plan draws exactly the requested quantity,
        /// and the weighted cost lies within [min, max] of drawn layer costs.
        #[test]
        fn plan_conserves_quantity_and_bounds_cost(
            qtys in prop::collection::vec(1u32..500, 1..8),
            costs in prop::collection::vec(1u32..10_000, 8),
            take_pct in 1u32..100,
        ) {
            let item = ItemId::new();
            let loc = LocationId::new();

            let layers: Vec<CostLayer> = qtys
                .iter()
                .zip(costs.iter())
                .enumerate()
                .map(|(i, (&q, &c))| {
                    layer_at(
                        item,
                        loc,
                        Decimal::from(q),
                        Decimal::new(c as i64, 2),
                        i as i64,
                    )
                })
                .collect();
            let refs: Vec<&CostLayer> = layers.iter().collect();

            let available: Decimal = layers.iter().map(|l| l.remaining_qty()).sum();
            let requested = (available * Decimal::from(take_pct) / dec!(100))
                .round_dp(2)
                .max(dec!(0.01));

            let plan = plan_fifo(item, loc, &refs, requested).unwrap();

            let drawn: Decimal = plan.draws.iter().map(|d| d.quantity).sum();
            prop_assert_eq!(drawn, requested);

            let min_cost = plan.draws.iter().map(|d| d.unit_cost).min().unwrap();
            let max_cost = plan.draws.iter().map(|d| d.unit_cost).max().unwrap();
            prop_assert!(plan.weighted_unit_cost >= min_cost);
            prop_assert!(plan.weighted_unit_cost <= max_cost);
        }
    }
}
