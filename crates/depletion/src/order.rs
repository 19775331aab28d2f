use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use larder_core::{TenantId, UserId, domain_id};
use larder_events::{Event, TenantScoped};
use larder_inventory::{LocationId, MenuItemId};

domain_id!(
    /// Order identifier (owned by the order service).
    OrderId
);

/// One sold line of a completed order, already resolved to a menu item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub menu_item_id: MenuItemId,
    pub quantity: Decimal,
}

/// Emitted by the order service when an order completes; consumed by the
/// depletion orchestrator (directly, or via the bus for the queued form).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCompleted {
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub location_id: LocationId,
    pub user_id: UserId,
    pub lines: Vec<OrderLine>,
    pub occurred_at: DateTime<Utc>,
}

impl Event for OrderCompleted {
    fn event_type(&self) -> &'static str {
        "orders.order.completed"
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

impl TenantScoped for OrderCompleted {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
