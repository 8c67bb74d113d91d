//! Client storage provider trait.

use async_trait::async_trait;
use idp_model::Client;

use crate::error::StorageResult;

/// Provider for client storage operations.
///
/// Client IDs are globally unique; callers check tenant ownership.
#[async_trait]
pub trait ClientProvider: Send + Sync {
    /// Creates a new client.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Duplicate` if a client with the same `client_id` exists.
    async fn create(&self, client: &Client) -> StorageResult<()>;

    /// Replaces an existing client.
    ///
    /// Implementations must reject a change of `tenant_id` or `client_secret`.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the client doesn't exist, or
    /// `StorageError::InvalidData` if an immutable field changed.
    async fn update(&self, client: &Client) -> StorageResult<()>;

    /// Gets a client by `client_id`.
    async fn get(&self, client_id: &str) -> StorageResult<Option<Client>>;
}
