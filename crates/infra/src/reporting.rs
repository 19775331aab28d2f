//! Read-only stock reports (feed the out-of-scope notification/REST layer).

use std::sync::Arc;

use rust_decimal::Decimal;

use larder_core::{DomainResult, Entity, TenantId};
use larder_inventory::{InventoryItem, ItemId, LocationId};

use crate::catalog::Catalog;
use crate::stock::store::StockStore;

/// One item at or below its reorder point at a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowStockLine {
    pub item_id: ItemId,
    pub location_id: LocationId,
    pub sku: String,
    pub name: String,
    pub balance: Decimal,
    pub reorder_point: Decimal,
    pub reorder_qty: Option<Decimal>,
}

/// Pure reads over ledger balances and item thresholds.
#[derive(Clone)]
pub struct StockReports {
    store: Arc<StockStore>,
    items: Arc<dyn Catalog<ItemId, InventoryItem>>,
}

impl StockReports {
    pub fn new(store: Arc<StockStore>, items: Arc<dyn Catalog<ItemId, InventoryItem>>) -> Self {
        Self { store, items }
    }

    /// Active items whose ledger balance at `location_id` is at or below
    /// their reorder point, worst shortfall first.
    pub fn low_stock(
        &self,
        tenant_id: TenantId,
        location_id: LocationId,
    ) -> DomainResult<Vec<LowStockLine>> {
        let items = self.items.list(tenant_id);
        self.store.read(tenant_id, |state| {
            let mut lines: Vec<LowStockLine> = items
                .iter()
                .filter(|item| item.is_active())
                .filter_map(|item| {
                    let reorder_point = item.reorder_point()?;
                    let balance = state.ledger().balance(*item.id(), location_id);
                    (balance <= reorder_point).then(|| LowStockLine {
                        item_id: *item.id(),
                        location_id,
                        sku: item.sku().to_string(),
                        name: item.name().to_string(),
                        balance,
                        reorder_point,
                        reorder_qty: item.reorder_qty(),
                    })
                })
                .collect();
            lines.sort_by_key(|l| l.balance - l.reorder_point);
            lines
        })
    }
}
