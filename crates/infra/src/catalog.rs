//! Tenant-isolated master-data catalogs (items, recipes, conversion edges).
//!
//! Master data is mutated by the out-of-scope CRUD/import layer and read by
//! the engine; it deliberately lives outside the transactional stock state.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use larder_core::TenantId;
use larder_uom::{ConversionSource, UnitConversion, UomCode};

/// Tenant-isolated key/value catalog abstraction.
pub trait Catalog<K, V>: Send + Sync {
    fn get(&self, tenant_id: TenantId, key: &K) -> Option<V>;
    fn upsert(&self, tenant_id: TenantId, key: K, value: V);
    fn list(&self, tenant_id: TenantId) -> Vec<V>;
    fn remove(&self, tenant_id: TenantId, key: &K);
}

impl<K, V, S> Catalog<K, V> for Arc<S>
where
    S: Catalog<K, V> + ?Sized,
{
    fn get(&self, tenant_id: TenantId, key: &K) -> Option<V> {
        (**self).get(tenant_id, key)
    }

    fn upsert(&self, tenant_id: TenantId, key: K, value: V) {
        (**self).upsert(tenant_id, key, value)
    }

    fn list(&self, tenant_id: TenantId) -> Vec<V> {
        (**self).list(tenant_id)
    }

    fn remove(&self, tenant_id: TenantId, key: &K) {
        (**self).remove(tenant_id, key)
    }
}

/// In-memory tenant-isolated catalog.
///
/// Intended for tests/dev and single-process deployments. Not optimized for
/// performance.
#[derive(Debug)]
pub struct InMemoryCatalog<K, V> {
    inner: RwLock<HashMap<(TenantId, K), V>>,
}

impl<K, V> InMemoryCatalog<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for InMemoryCatalog<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Catalog<K, V> for InMemoryCatalog<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, tenant_id: TenantId, key: &K) -> Option<V> {
        let map = self.inner.read().ok()?;
        map.get(&(tenant_id, key.clone())).cloned()
    }

    fn upsert(&self, tenant_id: TenantId, key: K, value: V) {
        if let Ok(mut map) = self.inner.write() {
            map.insert((tenant_id, key), value);
        }
    }

    fn list(&self, tenant_id: TenantId) -> Vec<V> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };

        map.iter()
            .filter_map(|((t, _k), v)| if *t == tenant_id { Some(v.clone()) } else { None })
            .collect()
    }

    fn remove(&self, tenant_id: TenantId, key: &K) {
        if let Ok(mut map) = self.inner.write() {
            map.remove(&(tenant_id, key.clone()));
        }
    }
}

/// Conversion-edge directory: one edge per ordered unit pair per tenant.
///
/// Upserting the same ordered pair replaces the edge, which is exactly the
/// uniqueness invariant the resolver relies on.
#[derive(Debug, Default)]
pub struct ConversionDirectory {
    edges: InMemoryCatalog<(UomCode, UomCode), UnitConversion>,
}

impl ConversionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, tenant_id: TenantId, edge: UnitConversion) {
        self.edges.upsert(
            tenant_id,
            (edge.from_uom().clone(), edge.to_uom().clone()),
            edge,
        );
    }

    pub fn remove(&self, tenant_id: TenantId, from: &UomCode, to: &UomCode) {
        self.edges.remove(tenant_id, &(from.clone(), to.clone()));
    }
}

impl ConversionSource for ConversionDirectory {
    fn direct(&self, tenant_id: TenantId, from: &UomCode, to: &UomCode) -> Option<UnitConversion> {
        self.edges.get(tenant_id, &(from.clone(), to.clone()))
    }
}
