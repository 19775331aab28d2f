//! Infrastructure layer: transactional stock store, services, jobs, workers.
//!
//! Everything here composes the pure domain crates into the running engine:
//! the in-memory transactional store (the persistence seam), the stock
//! services (receipt/consumption/expiry/depletion), master-data catalogs,
//! the job queue, and the order-completed worker.

pub mod catalog;
pub mod expiry;
pub mod jobs;
pub mod orchestrator;
pub mod pricing;
pub mod reporting;
pub mod services;
pub mod stock;
pub mod workers;


pub use catalog::{Catalog, ConversionDirectory, InMemoryCatalog};
pub use expiry::{ExpiredLotDetail, ExpiryEvaluator, ExpiryReport};
pub use orchestrator::DepletionOrchestrator;
pub use pricing::{SupplierItemId, SupplierPrice, SupplierPriceBook};
pub use reporting::{LowStockLine, StockReports};
pub use services::StockEngine;
pub use stock::{
    AppliedConsumption, ConsumeStock, CostLayerEngine, LotRegistry, ReceiveStock, StockStore,
    Valuation,
};
pub use workers::{Worker, WorkerHandle};
