//! Event distribution mechanics: bus trait, subscriptions, in-memory bus.
//!
//! The stock engine's source of truth is the ledger journal; the bus only
//! distributes notifications (order completions, stock movements) to workers.
//! Delivery is at-least-once — consumers must be idempotent.

pub mod bus;
pub mod event;
pub mod in_memory_bus;
pub mod tenant;

pub use bus::{EventBus, Subscription};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use tenant::TenantScoped;
