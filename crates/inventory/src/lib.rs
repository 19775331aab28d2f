//! Inventory domain: items, physical lots, and recipes.
//!
//! This crate contains business rules only — deterministic domain logic with
//! no IO and no storage. Quantity truth lives in the ledger journal; a lot's
//! `remaining_qty` is the per-batch share of that truth and is kept in sync
//! by the transactional store.

pub mod item;
pub mod lot;
pub mod recipe;

pub use item::{InventoryItem, ItemId, LocationId};
pub use lot::{Lot, LotId, LotStatus};
pub use recipe::{MenuItemId, Recipe, RecipeIngredient};
