use larder_core::TenantId;

/// Helper trait for tenant-scoped messages.
///
/// Marks message types that carry a tenant id, so infrastructure components
/// (workers, handlers) can be pinned to a single tenant and filter everything
/// else as defense in depth.
pub trait TenantScoped {
    fn tenant_id(&self) -> TenantId;
}
