//! # idp-storage
//!
//! Storage contracts for the identity provider protocol core.
//!
//! The protocol core depends only on these traits. Concrete backends
//! (relational, document, file) live outside this workspace; the
//! [`memory`] module provides reference implementations used by the
//! server binary and by tests.
//!
//! ## Provider Traits
//!
//! - [`TenantProvider`] - tenant lookups
//! - [`ClientProvider`] - client lookups
//! - [`UserProvider`] - end-user lookups
//! - [`ScopeProvider`] - scopes and client scope grants
//! - [`SigningKeyProvider`] - signing key material
//! - [`EphemeralStore`] - expiring protocol records
//! - [`RefreshDataStore`] - refresh grants

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod client;
pub mod ephemeral;
pub mod error;
pub mod memory;
pub mod scope;
pub mod signing_key;
pub mod tenant;
pub mod user;

use std::sync::Arc;

use idp_model::{AuthorizationState, ClientAuthHistory, PreAuthenticationState};

pub use client::ClientProvider;
pub use ephemeral::{EphemeralStore, RefreshDataStore};
pub use error::{StorageError, StorageResult};
pub use scope::ScopeProvider;
pub use signing_key::SigningKeyProvider;
pub use tenant::TenantProvider;
pub use user::UserProvider;

/// Handles to every store the protocol core reads or writes.
#[derive(Clone)]
pub struct Stores {
    /// Tenants.
    pub tenants: Arc<dyn TenantProvider>,
    /// Clients.
    pub clients: Arc<dyn ClientProvider>,
    /// End users.
    pub users: Arc<dyn UserProvider>,
    /// Scopes and client scope grants.
    pub scopes: Arc<dyn ScopeProvider>,
    /// Signing keys.
    pub signing_keys: Arc<dyn SigningKeyProvider>,
    /// Pre-authentication state.
    pub pre_auth: Arc<dyn EphemeralStore<PreAuthenticationState>>,
    /// Authorization codes.
    pub authorization: Arc<dyn EphemeralStore<AuthorizationState>>,
    /// Refresh grants.
    pub refresh: Arc<dyn RefreshDataStore>,
    /// Client assertion replay history.
    pub client_auth_history: Arc<dyn EphemeralStore<ClientAuthHistory>>,
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}
