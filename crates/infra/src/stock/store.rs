//! The transactional stock store.
//!
//! Writers take the tenant's write lock, run against a scratch copy of the
//! tenant's state, and the copy replaces the live state only when the
//! closure returns `Ok` — all-or-nothing by construction, no compensation
//! logic. Per-tenant writer serialization subsumes per-lot consume
//! serialization; readers share the lock and never block each other, and
//! different tenants never contend.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use larder_core::{DomainError, DomainResult, TenantId};

use super::state::StockState;

/// Tenant-partitioned stock storage with copy-on-write transactions.
///
/// Intended for tests/dev and single-process deployments; a database-backed
/// implementation would map `with_txn` onto a real transaction with row
/// locks. Not optimized for performance.
#[derive(Debug, Default)]
pub struct StockStore {
    tenants: RwLock<HashMap<TenantId, Arc<RwLock<StockState>>>>,
}

impl StockStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tenant_state(&self, tenant_id: TenantId) -> DomainResult<Arc<RwLock<StockState>>> {
        if let Ok(map) = self.tenants.read() {
            if let Some(cell) = map.get(&tenant_id) {
                return Ok(cell.clone());
            }
        }

        let mut map = self
            .tenants
            .write()
            .map_err(|_| DomainError::conflict("stock store lock poisoned"))?;
        Ok(map
            .entry(tenant_id)
            .or_insert_with(|| Arc::new(RwLock::new(StockState::new())))
            .clone())
    }

    /// Read-only access to a tenant's state.
    pub fn read<T>(
        &self,
        tenant_id: TenantId,
        f: impl FnOnce(&StockState) -> T,
    ) -> DomainResult<T> {
        let cell = self.tenant_state(tenant_id)?;
        let guard = cell
            .read()
            .map_err(|_| DomainError::conflict("stock state lock poisoned"))?;
        Ok(f(&guard))
    }

    /// Run `f` as one atomic transaction over the tenant's state.
    ///
    /// `f` sees (and mutates) a scratch copy; an `Err` return discards every
    /// staged change. Only a committed transaction is visible to readers.
    pub fn with_txn<T>(
        &self,
        tenant_id: TenantId,
        f: impl FnOnce(&mut StockState) -> DomainResult<T>,
    ) -> DomainResult<T> {
        let cell = self.tenant_state(tenant_id)?;
        let mut guard = cell
            .write()
            .map_err(|_| DomainError::conflict("stock state lock poisoned"))?;

        let mut scratch = guard.clone();
        let out = f(&mut scratch)?;
        *guard = scratch;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use larder_core::AggregateId;
    use larder_inventory::{ItemId, LocationId};
    use larder_ledger::{EntrySource, LedgerEntry};
    use rust_decimal_macros::dec;

    fn receipt_entry(tenant: TenantId, item: ItemId, loc: LocationId) -> LedgerEntry {
        LedgerEntry::new(
            tenant,
            item,
            loc,
            dec!(5),
            dec!(1),
            EntrySource::Receipt,
            AggregateId::new(),
            Utc::now(),
            None,
        )
        .unwrap()
    }

    #[test]
    fn committed_txn_is_visible_to_readers() {
        let store = StockStore::new();
        let tenant = TenantId::new();
        let item = ItemId::new();
        let loc = LocationId::new();

        store
            .with_txn(tenant, |state| {
                state.ledger_mut().append(receipt_entry(tenant, item, loc))
            })
            .unwrap();

        let balance = store
            .read(tenant, |state| state.ledger().balance(item, loc))
            .unwrap();
        assert_eq!(balance, dec!(5));
    }

    #[test]
    fn failed_txn_leaves_no_trace() {
        let store = StockStore::new();
        let tenant = TenantId::new();
        let item = ItemId::new();
        let loc = LocationId::new();

        let err = store
            .with_txn(tenant, |state| -> DomainResult<()> {
                state
                    .ledger_mut()
                    .append(receipt_entry(tenant, item, loc))?;
                Err(DomainError::invariant("boom"))
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));

        let position = store.read(tenant, |state| state.ledger().position()).unwrap();
        assert_eq!(position, 0);
    }

    #[test]
    fn tenants_have_independent_state() {
        let store = StockStore::new();
        let a = TenantId::new();
        let b = TenantId::new();
        let item = ItemId::new();
        let loc = LocationId::new();

        store
            .with_txn(a, |state| {
                state.ledger_mut().append(receipt_entry(a, item, loc))
            })
            .unwrap();

        let b_position = store.read(b, |state| state.ledger().position()).unwrap();
        assert_eq!(b_position, 0);
    }
}
