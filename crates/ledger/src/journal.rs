//! The journal container: append-only entries plus a cached balance counter.
//!
//! Balance is *defined* as the running sum of signed quantities. The cache is
//! an optimization updated inside `append`; [`Ledger::computed_balance`] folds
//! the history, and the two must always agree (tested, including under
//! property generation).

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use larder_core::DomainResult;
use larder_inventory::{ItemId, LocationId};

use crate::entry::{EntryId, LedgerEntry};

/// Append-only signed-quantity journal for one tenant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
    balances: HashMap<(ItemId, LocationId), Decimal>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append is the only write primitive. Returns the id of the stored entry.
    pub fn append(&mut self, entry: LedgerEntry) -> DomainResult<EntryId> {
        let id = entry.id;
        *self
            .balances
            .entry((entry.item_id, entry.location_id))
            .or_insert(Decimal::ZERO) += entry.quantity;
        self.entries.push(entry);
        Ok(id)
    }

    /// Current on-hand quantity for (item, location), from the cached counter.
    pub fn balance(&self, item_id: ItemId, location_id: LocationId) -> Decimal {
        self.balances
            .get(&(item_id, location_id))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// On-hand quantity recomputed by summation over the full history.
    /// Must always equal [`Ledger::balance`].
    pub fn computed_balance(&self, item_id: ItemId, location_id: LocationId) -> Decimal {
        self.entries
            .iter()
            .filter(|e| e.item_id == item_id && e.location_id == location_id)
            .map(|e| e.quantity)
            .sum()
    }

    /// Position watermark for cursor-based reads: the current journal length.
    pub fn position(&self) -> usize {
        self.entries.len()
    }

    /// Entries for (item, location) appended at or after `cursor` (a position
    /// previously obtained from [`Ledger::position`]).
    pub fn entries_since(
        &self,
        item_id: ItemId,
        location_id: LocationId,
        cursor: usize,
    ) -> impl Iterator<Item = &LedgerEntry> {
        self.entries
            .iter()
            .skip(cursor)
            .filter(move |e| e.item_id == item_id && e.location_id == location_id)
    }

    /// All entries for (item, location), oldest first.
    pub fn entries_for(
        &self,
        item_id: ItemId,
        location_id: LocationId,
    ) -> impl Iterator<Item = &LedgerEntry> {
        self.entries_since(item_id, location_id, 0)
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn find(&self, id: EntryId) -> Option<&LedgerEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
