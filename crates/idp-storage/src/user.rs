//! User storage provider trait.

use async_trait::async_trait;
use idp_model::User;

use crate::error::StorageResult;

/// Provider for end-user lookups.
#[async_trait]
pub trait UserProvider: Send + Sync {
    /// Creates a user.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Duplicate` if the user already exists in the tenant.
    async fn create(&self, user: &User) -> StorageResult<()>;

    /// Gets a user within a tenant.
    async fn get(&self, tenant_id: &str, user_id: &str) -> StorageResult<Option<User>>;
}
