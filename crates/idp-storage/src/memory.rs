//! In-memory storage providers.
//!
//! Process-local reference implementations of every storage contract. Used
//! by the server binary for development and by tests. For multi-instance
//! deployments use a shared backend.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use idp_core::SharedClock;
use idp_model::{
    Client, ClientScopeRel, EphemeralRecord, RefreshData, Scope, SigningKey, Tenant, User,
};

use crate::Stores;
use crate::client::ClientProvider;
use crate::ephemeral::{EphemeralStore, RefreshDataStore};
use crate::error::{StorageError, StorageResult};
use crate::scope::ScopeProvider;
use crate::signing_key::SigningKeyProvider;
use crate::tenant::TenantProvider;
use crate::user::UserProvider;

/// Builds a full set of in-memory stores sharing one clock.
#[must_use]
pub fn stores(clock: SharedClock) -> Stores {
    Stores {
        tenants: Arc::new(InMemoryTenantProvider::default()),
        clients: Arc::new(InMemoryClientProvider::default()),
        users: Arc::new(InMemoryUserProvider::default()),
        scopes: Arc::new(InMemoryScopeProvider::default()),
        signing_keys: Arc::new(InMemorySigningKeyProvider::default()),
        pre_auth: Arc::new(InMemoryEphemeralStore::new(Arc::clone(&clock))),
        authorization: Arc::new(InMemoryEphemeralStore::new(Arc::clone(&clock))),
        refresh: Arc::new(InMemoryEphemeralStore::new(Arc::clone(&clock))),
        client_auth_history: Arc::new(InMemoryEphemeralStore::new(clock)),
    }
}

// ============================================================================
// Tenants
// ============================================================================

/// In-memory tenant provider.
#[derive(Debug, Default)]
pub struct InMemoryTenantProvider {
    tenants: DashMap<String, Tenant>,
}

#[async_trait]
impl TenantProvider for InMemoryTenantProvider {
    async fn create(&self, tenant: &Tenant) -> StorageResult<()> {
        if self.tenants.contains_key(&tenant.tenant_id) {
            return Err(StorageError::duplicate("Tenant", &tenant.tenant_id));
        }
        self.tenants
            .insert(tenant.tenant_id.clone(), tenant.clone());
        Ok(())
    }

    async fn update(&self, tenant: &Tenant) -> StorageResult<()> {
        let mut existing = self
            .tenants
            .get_mut(&tenant.tenant_id)
            .ok_or_else(|| StorageError::not_found("Tenant", &tenant.tenant_id))?;
        *existing = tenant.clone();
        Ok(())
    }

    async fn get(&self, tenant_id: &str) -> StorageResult<Option<Tenant>> {
        Ok(self.tenants.get(tenant_id).map(|t| t.clone()))
    }
}

// ============================================================================
// Clients
// ============================================================================

/// In-memory client provider.
#[derive(Debug, Default)]
pub struct InMemoryClientProvider {
    clients: DashMap<String, Client>,
}

#[async_trait]
impl ClientProvider for InMemoryClientProvider {
    async fn create(&self, client: &Client) -> StorageResult<()> {
        if self.clients.contains_key(&client.client_id) {
            return Err(StorageError::duplicate("Client", &client.client_id));
        }
        self.clients
            .insert(client.client_id.clone(), client.clone());
        Ok(())
    }

    async fn update(&self, client: &Client) -> StorageResult<()> {
        let mut existing = self
            .clients
            .get_mut(&client.client_id)
            .ok_or_else(|| StorageError::not_found("Client", &client.client_id))?;
        if existing.tenant_id != client.tenant_id {
            return Err(StorageError::InvalidData(
                "client tenant cannot change".to_string(),
            ));
        }
        if existing.client_secret != client.client_secret {
            return Err(StorageError::InvalidData(
                "client secret cannot change".to_string(),
            ));
        }
        *existing = client.clone();
        Ok(())
    }

    async fn get(&self, client_id: &str) -> StorageResult<Option<Client>> {
        Ok(self.clients.get(client_id).map(|c| c.clone()))
    }
}

// ============================================================================
// Users
// ============================================================================

/// In-memory user provider.
#[derive(Debug, Default)]
pub struct InMemoryUserProvider {
    users: DashMap<(String, String), User>,
}

#[async_trait]
impl UserProvider for InMemoryUserProvider {
    async fn create(&self, user: &User) -> StorageResult<()> {
        let key = (user.tenant_id.clone(), user.user_id.clone());
        if self.users.contains_key(&key) {
            return Err(StorageError::duplicate("User", &user.user_id));
        }
        self.users.insert(key, user.clone());
        Ok(())
    }

    async fn get(&self, tenant_id: &str, user_id: &str) -> StorageResult<Option<User>> {
        Ok(self
            .users
            .get(&(tenant_id.to_string(), user_id.to_string()))
            .map(|u| u.clone()))
    }
}

// ============================================================================
// Scopes
// ============================================================================

/// In-memory scope provider.
#[derive(Debug, Default)]
pub struct InMemoryScopeProvider {
    scopes: DashMap<(String, String), Scope>,
    grants: DashMap<(String, String), HashSet<String>>,
}

#[async_trait]
impl ScopeProvider for InMemoryScopeProvider {
    async fn create(&self, scope: &Scope) -> StorageResult<()> {
        let key = (scope.tenant_id.clone(), scope.scope_name.clone());
        if self.scopes.contains_key(&key) {
            return Err(StorageError::duplicate("Scope", &scope.scope_name));
        }
        self.scopes.insert(key, scope.clone());
        Ok(())
    }

    async fn list(&self, tenant_id: &str) -> StorageResult<Vec<Scope>> {
        let mut scopes: Vec<Scope> = self
            .scopes
            .iter()
            .filter(|entry| entry.key().0 == tenant_id)
            .map(|entry| entry.value().clone())
            .collect();
        scopes.sort_by(|a, b| a.scope_name.cmp(&b.scope_name));
        Ok(scopes)
    }

    async fn grant(&self, rel: &ClientScopeRel) -> StorageResult<()> {
        self.grants
            .entry((rel.tenant_id.clone(), rel.client_id.clone()))
            .or_default()
            .insert(rel.scope_name.clone());
        Ok(())
    }

    async fn list_for_client(
        &self,
        tenant_id: &str,
        client_id: &str,
    ) -> StorageResult<Vec<ClientScopeRel>> {
        let Some(names) = self
            .grants
            .get(&(tenant_id.to_string(), client_id.to_string()))
        else {
            return Ok(Vec::new());
        };
        let mut rels: Vec<ClientScopeRel> = names
            .iter()
            .map(|name| ClientScopeRel::new(tenant_id, client_id, name.as_str()))
            .collect();
        rels.sort_by(|a, b| a.scope_name.cmp(&b.scope_name));
        Ok(rels)
    }
}

// ============================================================================
// Signing keys
// ============================================================================

/// In-memory signing key provider.
///
/// Preserves insertion order so listing reflects creation order.
#[derive(Debug, Default)]
pub struct InMemorySigningKeyProvider {
    keys: std::sync::RwLock<Vec<SigningKey>>,
}

impl InMemorySigningKeyProvider {
    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<SigningKey>> {
        self.keys
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<SigningKey>> {
        self.keys
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl SigningKeyProvider for InMemorySigningKeyProvider {
    async fn create(&self, key: &SigningKey) -> StorageResult<()> {
        let mut keys = self.write();
        if keys.iter().any(|k| k.key_id == key.key_id) {
            return Err(StorageError::duplicate("SigningKey", &key.key_id));
        }
        keys.push(key.clone());
        Ok(())
    }

    async fn list_for_tenant(&self, tenant_id: &str) -> StorageResult<Vec<SigningKey>> {
        Ok(self
            .read()
            .iter()
            .filter(|k| k.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn revoke(&self, key_id: &str) -> StorageResult<()> {
        let mut keys = self.write();
        let key = keys
            .iter_mut()
            .find(|k| k.key_id == key_id)
            .ok_or_else(|| StorageError::not_found("SigningKey", key_id))?;
        key.revoke();
        Ok(())
    }
}

// ============================================================================
// Ephemeral records
// ============================================================================

/// In-memory store for one kind of expiring record.
///
/// Expired records are invisible to reads immediately and are physically
/// removed by [`EphemeralStore::purge_expired`] or when overwritten.
#[derive(Debug)]
pub struct InMemoryEphemeralStore<R> {
    records: DashMap<String, R>,
    clock: SharedClock,
}

impl<R: EphemeralRecord> InMemoryEphemeralStore<R> {
    /// Creates an empty store reading time from `clock`.
    #[must_use]
    pub fn new(clock: SharedClock) -> Self {
        Self {
            records: DashMap::new(),
            clock,
        }
    }

    /// Number of physically stored records, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns whether no records are physically stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl<R: EphemeralRecord> EphemeralStore<R> for InMemoryEphemeralStore<R> {
    async fn create(&self, record: &R) -> StorageResult<()> {
        let now = self.clock.now();
        match self.records.entry(record.key().to_string()) {
            Entry::Occupied(mut entry) => {
                if !entry.get().is_expired(now) {
                    return Err(StorageError::duplicate(R::KIND, record.key()));
                }
                entry.insert(record.clone());
            }
            Entry::Vacant(entry) => {
                entry.insert(record.clone());
            }
        }
        Ok(())
    }

    async fn find(&self, key: &str) -> StorageResult<Option<R>> {
        let now = self.clock.now();
        Ok(self
            .records
            .get(key)
            .filter(|record| !record.is_expired(now))
            .map(|record| record.clone()))
    }

    async fn delete(&self, key: &str) -> StorageResult<bool> {
        let now = self.clock.now();
        Ok(self
            .records
            .remove(key)
            .is_some_and(|(_, record)| !record.is_expired(now)))
    }

    async fn take(&self, key: &str) -> StorageResult<Option<R>> {
        let now = self.clock.now();
        Ok(self
            .records
            .remove(key)
            .map(|(_, record)| record)
            .filter(|record| !record.is_expired(now)))
    }

    async fn purge_expired(&self) -> StorageResult<usize> {
        let now = self.clock.now();
        let before = self.records.len();
        self.records.retain(|_, record| !record.is_expired(now));
        let purged = before.saturating_sub(self.records.len());
        if purged > 0 {
            tracing::debug!(kind = R::KIND, purged, "Purged expired records");
        }
        Ok(purged)
    }
}

#[async_trait]
impl RefreshDataStore for InMemoryEphemeralStore<RefreshData> {
    async fn delete_for_grant(
        &self,
        user_id: &str,
        tenant_id: &str,
        client_id: &str,
    ) -> StorageResult<usize> {
        let before = self.records.len();
        self.records.retain(|_, record| {
            !(record.user_id == user_id
                && record.tenant_id == tenant_id
                && record.client_id == client_id)
        });
        Ok(before.saturating_sub(self.records.len()))
    }
}
