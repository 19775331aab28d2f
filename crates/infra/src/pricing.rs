//! Supplier price book: time-sliced prices consumed read-only by costing.
//!
//! The owning purchasing service maintains the slices; the engine only ever
//! asks "what did this supplier item cost at time T". The invariant kept
//! here: at most one open slice (`effective_to = None`) per supplier item.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use larder_core::{DomainError, DomainResult, TenantId, domain_id};

domain_id!(
    /// Supplier item identifier (owned by the purchasing service).
    SupplierItemId
);

/// One price slice: valid from `effective_from` until `effective_to`
/// (exclusive), or open-ended when `effective_to` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierPrice {
    pub supplier_item_id: SupplierItemId,
    pub unit_cost: Decimal,
    pub effective_from: DateTime<Utc>,
    pub effective_to: Option<DateTime<Utc>>,
}

impl SupplierPrice {
    pub fn open(
        supplier_item_id: SupplierItemId,
        unit_cost: Decimal,
        effective_from: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if unit_cost < Decimal::ZERO {
            return Err(DomainError::validation("unit cost cannot be negative"));
        }
        Ok(Self {
            supplier_item_id,
            unit_cost,
            effective_from,
            effective_to: None,
        })
    }

    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        at >= self.effective_from && self.effective_to.is_none_or(|to| at < to)
    }
}

/// In-memory, tenant-isolated price book.
#[derive(Debug, Default)]
pub struct SupplierPriceBook {
    slices: RwLock<HashMap<(TenantId, SupplierItemId), Vec<SupplierPrice>>>,
}

impl SupplierPriceBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new open price, closing the previous open slice at the new
    /// slice's start (the time-sliced upsert the owning service performs).
    pub fn add_price(&self, tenant_id: TenantId, price: SupplierPrice) -> DomainResult<()> {
        let mut slices = self
            .slices
            .write()
            .map_err(|_| DomainError::conflict("price book lock poisoned"))?;
        let entry = slices
            .entry((tenant_id, price.supplier_item_id))
            .or_default();

        if let Some(open) = entry.iter_mut().find(|p| p.effective_to.is_none()) {
            if price.effective_from <= open.effective_from {
                return Err(DomainError::validation(
                    "new price must start after the current open slice",
                ));
            }
            open.effective_to = Some(price.effective_from);
        }

        entry.push(price);
        Ok(())
    }

    /// The unit cost effective at `at`, if any slice covers it.
    pub fn price_effective_at(
        &self,
        tenant_id: TenantId,
        supplier_item_id: SupplierItemId,
        at: DateTime<Utc>,
    ) -> Option<Decimal> {
        let slices = self.slices.read().ok()?;
        slices
            .get(&(tenant_id, supplier_item_id))?
            .iter()
            .find(|p| p.covers(at))
            .map(|p| p.unit_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    #[test]
    fn adding_a_price_closes_the_open_slice() {
        let book = SupplierPriceBook::new();
        let tenant = TenantId::new();
        let item = SupplierItemId::new();
        let t0 = Utc::now();

        book.add_price(tenant, SupplierPrice::open(item, dec!(2.00), t0).unwrap())
            .unwrap();
        book.add_price(
            tenant,
            SupplierPrice::open(item, dec!(2.40), t0 + Duration::days(10)).unwrap(),
        )
        .unwrap();

        // Old slice still answers for its window; the new one takes over after.
        assert_eq!(
            book.price_effective_at(tenant, item, t0 + Duration::days(5)),
            Some(dec!(2.00))
        );
        assert_eq!(
            book.price_effective_at(tenant, item, t0 + Duration::days(15)),
            Some(dec!(2.40))
        );
        // Before any slice: no price.
        assert_eq!(
            book.price_effective_at(tenant, item, t0 - Duration::days(1)),
            None
        );
    }

    #[test]
    fn backdated_open_price_is_rejected() {
        let book = SupplierPriceBook::new();
        let tenant = TenantId::new();
        let item = SupplierItemId::new();
        let t0 = Utc::now();

        book.add_price(tenant, SupplierPrice::open(item, dec!(1), t0).unwrap())
            .unwrap();
        let err = book
            .add_price(
                tenant,
                SupplierPrice::open(item, dec!(2), t0 - Duration::days(1)).unwrap(),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
