//! Scope entities.

use serde::{Deserialize, Serialize};

/// A named capability a client may request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    /// Scope name as it appears in `scope` parameters.
    pub scope_name: String,
    /// Owning tenant.
    pub tenant_id: String,
    /// Human description.
    pub description: Option<String>,
}

impl Scope {
    /// Creates a scope.
    #[must_use]
    pub fn new(tenant_id: impl Into<String>, scope_name: impl Into<String>) -> Self {
        Self {
            scope_name: scope_name.into(),
            tenant_id: tenant_id.into(),
            description: None,
        }
    }
}

/// Grants a scope to a client for delegated and refresh flows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientScopeRel {
    /// Client the scope is granted to.
    pub client_id: String,
    /// Tenant of the client.
    pub tenant_id: String,
    /// Granted scope name.
    pub scope_name: String,
}

impl ClientScopeRel {
    /// Creates a relation.
    #[must_use]
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        scope_name: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            tenant_id: tenant_id.into(),
            scope_name: scope_name.into(),
        }
    }
}
