//! Scope storage provider trait.

use async_trait::async_trait;
use idp_model::{ClientScopeRel, Scope};

use crate::error::StorageResult;

/// Provider for scopes and their assignment to clients.
#[async_trait]
pub trait ScopeProvider: Send + Sync {
    /// Creates a scope.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Duplicate` if the scope exists in the tenant.
    async fn create(&self, scope: &Scope) -> StorageResult<()>;

    /// Lists the scopes defined in a tenant.
    async fn list(&self, tenant_id: &str) -> StorageResult<Vec<Scope>>;

    /// Grants a scope to a client. Granting twice is a no-op.
    async fn grant(&self, rel: &ClientScopeRel) -> StorageResult<()>;

    /// Lists the scopes granted to a client.
    async fn list_for_client(
        &self,
        tenant_id: &str,
        client_id: &str,
    ) -> StorageResult<Vec<ClientScopeRel>>;
}
