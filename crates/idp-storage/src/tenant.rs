//! Tenant storage provider trait.

use async_trait::async_trait;
use idp_model::Tenant;

use crate::error::StorageResult;

/// Provider for tenant storage operations.
///
/// Implementations must be thread-safe and support concurrent access.
#[async_trait]
pub trait TenantProvider: Send + Sync {
    /// Creates a new tenant.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Duplicate` if the tenant ID is taken.
    async fn create(&self, tenant: &Tenant) -> StorageResult<()>;

    /// Replaces an existing tenant.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the tenant doesn't exist.
    async fn update(&self, tenant: &Tenant) -> StorageResult<()>;

    /// Gets a tenant by ID.
    async fn get(&self, tenant_id: &str) -> StorageResult<Option<Tenant>>;
}
