//! One-hop conversion resolution.

use std::sync::Arc;

use rust_decimal::Decimal;

use larder_core::{DomainError, DomainResult, TenantId};

use crate::code::UomCode;
use crate::conversion::UnitConversion;

/// Lookup of a single stored conversion edge for a tenant.
///
/// The resolver only ever asks for one ordered pair at a time; implementations
/// back this with whatever directory they like (in-memory, DB table).
pub trait ConversionSource: Send + Sync {
    fn direct(&self, tenant_id: TenantId, from: &UomCode, to: &UomCode) -> Option<UnitConversion>;
}

impl<S> ConversionSource for Arc<S>
where
    S: ConversionSource + ?Sized,
{
    fn direct(&self, tenant_id: TenantId, from: &UomCode, to: &UomCode) -> Option<UnitConversion> {
        (**self).direct(tenant_id, from, to)
    }
}

/// Resolves a scalar factor between two units of measure.
///
/// Policy: identity short-circuit; else the direct edge; else the single
/// reverse edge applied as division. Never multi-hop — a missing pair is a
/// configuration error surfaced as [`DomainError::ConversionNotFound`].
#[derive(Debug)]
pub struct ConversionResolver<S> {
    source: S,
}

impl<S: ConversionSource> ConversionResolver<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn convert(
        &self,
        tenant_id: TenantId,
        from: &UomCode,
        to: &UomCode,
        qty: Decimal,
    ) -> DomainResult<Decimal> {
        if from == to {
            return Ok(qty);
        }

        if let Some(edge) = self.source.direct(tenant_id, from, to) {
            return Ok(edge.apply(qty));
        }

        // Reverse edge (to → from): divide instead of multiply.
        if let Some(edge) = self.source.direct(tenant_id, to, from) {
            return Ok(edge.apply_inverse(qty));
        }

        Err(DomainError::ConversionNotFound {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::RwLock;

    struct MapSource {
        edges: RwLock<HashMap<(TenantId, UomCode, UomCode), UnitConversion>>,
    }

    impl MapSource {
        fn new() -> Self {
            Self {
                edges: RwLock::new(HashMap::new()),
            }
        }

        fn insert(&self, tenant_id: TenantId, edge: UnitConversion) {
            self.edges.write().unwrap().insert(
                (tenant_id, edge.from_uom().clone(), edge.to_uom().clone()),
                edge,
            );
        }
    }

    impl ConversionSource for MapSource {
        fn direct(
            &self,
            tenant_id: TenantId,
            from: &UomCode,
            to: &UomCode,
        ) -> Option<UnitConversion> {
            self.edges
                .read()
                .unwrap()
                .get(&(tenant_id, from.clone(), to.clone()))
                .cloned()
        }
    }

    fn uom(code: &str) -> UomCode {
        UomCode::new(code).unwrap()
    }

    #[test]
    fn identity_short_circuits_without_lookup() {
        let resolver = ConversionResolver::new(MapSource::new());
        let qty = resolver
            .convert(TenantId::new(), &uom("KG"), &uom("KG"), dec!(3.5))
            .unwrap();
        assert_eq!(qty, dec!(3.5));
    }

    #[test]
    fn direct_edge_multiplies() {
        let source = MapSource::new();
        let tenant = TenantId::new();
        source.insert(
            tenant,
            UnitConversion::new(uom("A"), uom("B"), dec!(2)).unwrap(),
        );

        let resolver = ConversionResolver::new(source);
        assert_eq!(
            resolver.convert(tenant, &uom("A"), &uom("B"), dec!(3)).unwrap(),
            dec!(6)
        );
    }

    #[test]
    fn reverse_edge_divides() {
        let source = MapSource::new();
        let tenant = TenantId::new();
        // Only A→B stored; converting B→A must use the inverse.
        source.insert(
            tenant,
            UnitConversion::new(uom("A"), uom("B"), dec!(2)).unwrap(),
        );

        let resolver = ConversionResolver::new(source);
        assert_eq!(
            resolver.convert(tenant, &uom("B"), &uom("A"), dec!(3)).unwrap(),
            dec!(1.5)
        );
    }

    #[test]
    fn missing_pair_fails_with_conversion_not_found() {
        let resolver = ConversionResolver::new(MapSource::new());
        let err = resolver
            .convert(TenantId::new(), &uom("A"), &uom("B"), dec!(1))
            .unwrap_err();
        assert!(matches!(err, DomainError::ConversionNotFound { .. }));
    }

    #[test]
    fn no_multi_hop_chaining() {
        let source = MapSource::new();
        let tenant = TenantId::new();
        // A→B and B→C exist, but A→C must still fail.
        source.insert(
            tenant,
            UnitConversion::new(uom("A"), uom("B"), dec!(2)).unwrap(),
        );
        source.insert(
            tenant,
            UnitConversion::new(uom("B"), uom("C"), dec!(4)).unwrap(),
        );

        let resolver = ConversionResolver::new(source);
        let err = resolver
            .convert(tenant, &uom("A"), &uom("C"), dec!(1))
            .unwrap_err();
        assert!(matches!(err, DomainError::ConversionNotFound { .. }));
    }

    #[test]
    fn tenants_do_not_share_edges() {
        let source = MapSource::new();
        let tenant_a = TenantId::new();
        let tenant_b = TenantId::new();
        source.insert(
            tenant_a,
            UnitConversion::new(uom("A"), uom("B"), dec!(2)).unwrap(),
        );

        let resolver = ConversionResolver::new(source);
        assert!(resolver.convert(tenant_b, &uom("A"), &uom("B"), dec!(1)).is_err());
    }
}
