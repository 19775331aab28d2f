//! Explicit constructor wiring for the whole engine.
//!
//! No framework injection: [`StockEngine::new`] builds the store, catalogs,
//! and services and hands out references. Embedding processes (API, desktop,
//! tests) compose against this one type.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::debug;

use larder_core::{DomainError, DomainResult, TenantId};
use larder_depletion::OrderCompleted;
use larder_events::EventBus;
use larder_inventory::{InventoryItem, ItemId, MenuItemId, Recipe};
use larder_uom::{ConversionResolver, ConversionSource, UnitOfMeasure, UomCode};

use crate::catalog::{Catalog, ConversionDirectory, InMemoryCatalog};
use crate::expiry::ExpiryEvaluator;
use crate::jobs::{Job, JobExecutor, JobKind, JobResult, JobStore};
use crate::orchestrator::DepletionOrchestrator;
use crate::pricing::{SupplierItemId, SupplierPriceBook};
use crate::reporting::StockReports;
use crate::stock::costing::CostLayerEngine;
use crate::stock::registry::{LotRegistry, ReceiveStock};
use crate::stock::store::StockStore;
use crate::workers::{Worker, WorkerHandle};

/// The assembled inventory ledger & lot-cost engine.
pub struct StockEngine {
    store: Arc<StockStore>,
    items: Arc<InMemoryCatalog<ItemId, InventoryItem>>,
    recipes: Arc<InMemoryCatalog<MenuItemId, Recipe>>,
    uoms: Arc<InMemoryCatalog<UomCode, UnitOfMeasure>>,
    conversions: Arc<ConversionDirectory>,
    prices: Arc<SupplierPriceBook>,
    resolver: Arc<ConversionResolver<Arc<dyn ConversionSource>>>,
    registry: LotRegistry,
    costing: CostLayerEngine,
    orchestrator: DepletionOrchestrator,
    expiry: ExpiryEvaluator,
    reports: StockReports,
}

impl StockEngine {
    pub fn new() -> Self {
        let store = Arc::new(StockStore::new());
        let items = Arc::new(InMemoryCatalog::new());
        let recipes = Arc::new(InMemoryCatalog::new());
        let uoms = Arc::new(InMemoryCatalog::new());
        let conversions = Arc::new(ConversionDirectory::new());
        let prices = Arc::new(SupplierPriceBook::new());

        let source: Arc<dyn ConversionSource> = conversions.clone();
        let resolver = Arc::new(ConversionResolver::new(source));

        let items_dyn: Arc<dyn Catalog<ItemId, InventoryItem>> = items.clone();
        let recipes_dyn: Arc<dyn Catalog<MenuItemId, Recipe>> = recipes.clone();

        let registry = LotRegistry::new(store.clone());
        let costing = CostLayerEngine::new(store.clone());
        let orchestrator = DepletionOrchestrator::new(
            store.clone(),
            items_dyn.clone(),
            recipes_dyn,
            resolver.clone(),
        );
        let expiry = ExpiryEvaluator::new(store.clone());
        let reports = StockReports::new(store.clone(), items_dyn);

        Self {
            store,
            items,
            recipes,
            uoms,
            conversions,
            prices,
            resolver,
            registry,
            costing,
            orchestrator,
            expiry,
            reports,
        }
    }

    pub fn store(&self) -> &Arc<StockStore> {
        &self.store
    }

    pub fn items(&self) -> &InMemoryCatalog<ItemId, InventoryItem> {
        &self.items
    }

    pub fn recipes(&self) -> &InMemoryCatalog<MenuItemId, Recipe> {
        &self.recipes
    }

    pub fn uoms(&self) -> &InMemoryCatalog<UomCode, UnitOfMeasure> {
        &self.uoms
    }

    pub fn conversions(&self) -> &ConversionDirectory {
        &self.conversions
    }

    pub fn prices(&self) -> &SupplierPriceBook {
        &self.prices
    }

    pub fn registry(&self) -> &LotRegistry {
        &self.registry
    }

    pub fn costing(&self) -> &CostLayerEngine {
        &self.costing
    }

    pub fn depletions(&self) -> &DepletionOrchestrator {
        &self.orchestrator
    }

    pub fn expiry(&self) -> &ExpiryEvaluator {
        &self.expiry
    }

    pub fn reports(&self) -> &StockReports {
        &self.reports
    }

    /// One-hop unit conversion, exposed to collaborators.
    pub fn convert(
        &self,
        tenant_id: TenantId,
        from: &UomCode,
        to: &UomCode,
        qty: Decimal,
    ) -> DomainResult<Decimal> {
        self.resolver.convert(tenant_id, from, to, qty)
    }

    /// Receive a lot valued from the supplier price book (used when the
    /// receipt arrives without an explicit unit cost).
    pub fn receive_at_book_price(
        &self,
        tenant_id: TenantId,
        supplier_item_id: SupplierItemId,
        mut cmd: ReceiveStock,
    ) -> DomainResult<larder_inventory::Lot> {
        cmd.unit_cost = self
            .prices
            .price_effective_at(tenant_id, supplier_item_id, cmd.received_at)
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "no supplier price effective at {} for {}",
                    cmd.received_at, supplier_item_id
                ))
            })?;
        self.registry.receive(tenant_id, cmd)
    }

    /// Spawn the queued order-consumption path: a worker that feeds
    /// completed orders from the bus into the orchestrator.
    pub fn spawn_order_worker<B>(&self, bus: B, tenant_id: Option<TenantId>) -> WorkerHandle
    where
        B: EventBus<OrderCompleted> + Send + Sync + 'static,
    {
        let orchestrator = self.orchestrator.clone();
        Worker::spawn("depletion-worker", bus, tenant_id, move |event: OrderCompleted| {
            orchestrator.handle_order_completed(&event).map(|_| ())
        })
    }

    /// Build a job executor with the expiry-sweep handler registered.
    pub fn expiry_job_executor<S>(&self, store: S) -> JobExecutor<S>
    where
        S: JobStore + 'static,
    {
        let mut executor = JobExecutor::new(store);
        let evaluator = self.expiry.clone();
        executor.register_handler("expiry.sweep", move |job: &Job| {
            let location_id = match &job.kind {
                JobKind::ExpirySweep { location_id } => *location_id,
                _ => None,
            };
            match evaluator.evaluate(job.tenant_id, location_id, false, Utc::now()) {
                Ok(report) => {
                    debug!(
                        tenant = %job.tenant_id,
                        expired = report.lots_marked_expired,
                        "expiry sweep job finished"
                    );
                    JobResult::Success
                }
                Err(e) => JobResult::Failure(e.to_string()),
            }
        });
        executor
    }
}

impl Default for StockEngine {
    fn default() -> Self {
        Self::new()
    }
}
