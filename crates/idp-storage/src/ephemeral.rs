//! Contracts for expiring protocol records.
//!
//! Any key-value or relational store that supports create, find by key, and
//! delete by key satisfies [`EphemeralStore`]. Reads must never return an
//! expired record.

use async_trait::async_trait;
use idp_model::{EphemeralRecord, RefreshData};

use crate::error::StorageResult;

/// Keyed store of expiring records of one type.
#[async_trait]
pub trait EphemeralStore<R: EphemeralRecord>: Send + Sync {
    /// Persists a record under [`EphemeralRecord::key`].
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Duplicate` if an unexpired record with the same
    /// key exists.
    async fn create(&self, record: &R) -> StorageResult<()>;

    /// Finds an unexpired record.
    async fn find(&self, key: &str) -> StorageResult<Option<R>>;

    /// Deletes a record. Returns whether an unexpired record was removed.
    async fn delete(&self, key: &str) -> StorageResult<bool>;

    /// Removes and returns an unexpired record.
    ///
    /// Only one of several concurrent callers observes `Some`.
    async fn take(&self, key: &str) -> StorageResult<Option<R>> {
        let Some(record) = self.find(key).await? else {
            return Ok(None);
        };
        Ok(self.delete(key).await?.then_some(record))
    }

    /// Physically removes expired records. Returns how many were removed.
    async fn purge_expired(&self) -> StorageResult<usize>;
}

/// Refresh grant store.
#[async_trait]
pub trait RefreshDataStore: EphemeralStore<RefreshData> {
    /// Deletes every refresh grant for one `(user, tenant, client)` tuple.
    ///
    /// Returns how many records were removed.
    async fn delete_for_grant(
        &self,
        user_id: &str,
        tenant_id: &str,
        client_id: &str,
    ) -> StorageResult<usize>;
}
