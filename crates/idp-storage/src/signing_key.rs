//! Signing key storage provider trait.

use async_trait::async_trait;
use idp_model::SigningKey;

use crate::error::StorageResult;

/// Provider for signing key material.
#[async_trait]
pub trait SigningKeyProvider: Send + Sync {
    /// Stores a new key.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Duplicate` if the key ID exists.
    async fn create(&self, key: &SigningKey) -> StorageResult<()>;

    /// Lists every key owned by a tenant, in creation order.
    ///
    /// Filtering by status, use, and expiry is the caller's job.
    async fn list_for_tenant(&self, tenant_id: &str) -> StorageResult<Vec<SigningKey>>;

    /// Marks a key revoked.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the key doesn't exist.
    async fn revoke(&self, key_id: &str) -> StorageResult<()>;
}
