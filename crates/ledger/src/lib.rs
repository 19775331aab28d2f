//! Append-only signed-quantity journal — the sole source of truth for
//! on-hand quantity per (item, location).
//!
//! Every quantity mutation anywhere in the engine is one or more appends
//! here, inside the same transaction as the domain change. History is never
//! edited; corrections are compensating entries with a back-reference.

pub mod entry;
pub mod journal;

pub use entry::{EntryId, EntrySource, LedgerEntry};
pub use journal::Ledger;
