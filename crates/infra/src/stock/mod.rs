//! Transactional stock storage and the services that mutate it.
//!
//! The shared mutable resource — lots, cost layers, ledger, depletions for
//! one tenant — is mutated only through [`StockStore::with_txn`], which makes
//! every operation all-or-nothing by construction.

pub mod costing;
pub mod registry;
pub mod state;
pub mod store;

pub use costing::{AppliedConsumption, ConsumeStock, CostLayerEngine, Valuation};
pub use registry::{LotRegistry, ReceiveStock};
pub use state::{LotQuery, StockState};
pub use store::StockStore;
