use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use larder_core::{DomainError, DomainResult, Entity, TenantId, domain_id};
use larder_uom::UomCode;

domain_id!(
    /// Inventory item identifier (tenant-scoped).
    ItemId
);

domain_id!(
    /// Stock location identifier (a branch, store room, or kitchen).
    LocationId
);

/// A stocked item: identity, ledger unit, and reorder thresholds.
///
/// Items are never hard-deleted; retiring one clears the `active` flag so its
/// ledger history stays addressable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    id: ItemId,
    tenant_id: TenantId,
    sku: String,
    name: String,
    /// Unit every ledger quantity for this item is expressed in.
    ledger_uom: UomCode,
    reorder_point: Option<Decimal>,
    reorder_qty: Option<Decimal>,
    active: bool,
}

impl InventoryItem {
    pub fn new(
        id: ItemId,
        tenant_id: TenantId,
        sku: impl Into<String>,
        name: impl Into<String>,
        ledger_uom: UomCode,
    ) -> DomainResult<Self> {
        let sku = sku.into().trim().to_string();
        let name = name.into().trim().to_string();
        if sku.is_empty() {
            return Err(DomainError::validation("sku cannot be empty"));
        }
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        Ok(Self {
            id,
            tenant_id,
            sku,
            name,
            ledger_uom,
            reorder_point: None,
            reorder_qty: None,
            active: true,
        })
    }

    pub fn with_reorder(mut self, point: Decimal, qty: Decimal) -> DomainResult<Self> {
        if point < Decimal::ZERO || qty <= Decimal::ZERO {
            return Err(DomainError::validation(
                "reorder point must be >= 0 and reorder qty > 0",
            ));
        }
        self.reorder_point = Some(point);
        self.reorder_qty = Some(qty);
        Ok(self)
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ledger_uom(&self) -> &UomCode {
        &self.ledger_uom
    }

    pub fn reorder_point(&self) -> Option<Decimal> {
        self.reorder_point
    }

    pub fn reorder_qty(&self) -> Option<Decimal> {
        self.reorder_qty
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Soft delete: the item disappears from pick lists but keeps its history.
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn reactivate(&mut self) {
        self.active = true;
    }
}

impl Entity for InventoryItem {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_item() -> InventoryItem {
        InventoryItem::new(
            ItemId::new(),
            TenantId::new(),
            "TOM-001",
            "Roma tomatoes",
            UomCode::new("KG").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn blank_sku_is_rejected() {
        let result = InventoryItem::new(
            ItemId::new(),
            TenantId::new(),
            "  ",
            "Tomatoes",
            UomCode::new("KG").unwrap(),
        );
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn reorder_thresholds_are_validated() {
        assert!(test_item().with_reorder(dec!(5), dec!(20)).is_ok());
        assert!(test_item().with_reorder(dec!(-1), dec!(20)).is_err());
        assert!(test_item().with_reorder(dec!(5), dec!(0)).is_err());
    }

    #[test]
    fn deactivate_is_soft() {
        let mut item = test_item();
        assert!(item.is_active());
        item.deactivate();
        assert!(!item.is_active());
        assert_eq!(item.sku(), "TOM-001");
    }
}
