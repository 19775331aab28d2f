use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use larder_core::{DomainError, DomainResult, TenantId, domain_id};
use larder_uom::UomCode;

use crate::item::ItemId;

domain_id!(
    /// Menu item identifier (owned by the menu service; resolved to a recipe
    /// here).
    MenuItemId
);

/// One ingredient line of a recipe, in the recipe's own unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub item_id: ItemId,
    pub quantity: Decimal,
    pub uom: UomCode,
}

impl RecipeIngredient {
    pub fn new(item_id: ItemId, quantity: Decimal, uom: UomCode) -> DomainResult<Self> {
        if quantity <= Decimal::ZERO {
            return Err(DomainError::validation(
                "ingredient quantity must be > 0",
            ));
        }
        Ok(Self {
            item_id,
            quantity,
            uom,
        })
    }
}

/// The ingredient list consumed when one unit of a menu item is sold.
///
/// Menu items without a recipe simply have no stock impact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub tenant_id: TenantId,
    pub menu_item_id: MenuItemId,
    pub ingredients: Vec<RecipeIngredient>,
}

impl Recipe {
    pub fn new(
        tenant_id: TenantId,
        menu_item_id: MenuItemId,
        ingredients: Vec<RecipeIngredient>,
    ) -> Self {
        Self {
            tenant_id,
            menu_item_id,
            ingredients,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn zero_quantity_ingredient_is_rejected() {
        let result = RecipeIngredient::new(
            ItemId::new(),
            dec!(0),
            UomCode::new("KG").unwrap(),
        );
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }
}
