//! Tenant domain model.
//!
//! A tenant is the top-level isolation boundary. Every client, user, and
//! ephemeral protocol record belongs to exactly one tenant. The root tenant
//! additionally owns the system-wide JWT signing keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default request rate limit applied to a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    /// Requests allowed per window.
    pub requests: u32,
    /// Window length in seconds.
    pub window_seconds: u32,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            requests: 100,
            window_seconds: 60,
        }
    }
}

/// A tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    /// Tenant identifier. Immutable.
    pub tenant_id: String,
    /// Display name.
    pub name: String,
    /// Whether the tenant accepts protocol requests.
    pub enabled: bool,
    /// Whether anonymous-user tokens may be issued in this tenant.
    pub allow_anonymous_users: bool,
    /// Whether rate limiting is bypassed.
    pub allow_unlimited_rate: bool,
    /// Default rate limit for clients of this tenant.
    pub default_rate_limit: RateLimit,
    /// Soft-delete marker.
    pub marked_for_delete: bool,
    /// When the tenant was created.
    pub created_at: DateTime<Utc>,
}

impl Tenant {
    /// Creates an enabled tenant with default flags.
    #[must_use]
    pub fn new(tenant_id: impl Into<String>) -> Self {
        let tenant_id = tenant_id.into();
        Self {
            name: tenant_id.clone(),
            tenant_id,
            enabled: true,
            allow_anonymous_users: false,
            allow_unlimited_rate: false,
            default_rate_limit: RateLimit::default(),
            marked_for_delete: false,
            created_at: Utc::now(),
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the enabled flag.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Allows anonymous-user token issuance.
    #[must_use]
    pub const fn with_anonymous_users(mut self) -> Self {
        self.allow_anonymous_users = true;
        self
    }

    /// Marks the tenant for deletion and disables it.
    pub const fn mark_for_delete(&mut self) {
        self.marked_for_delete = true;
        self.enabled = false;
    }

    /// Returns whether the tenant may serve protocol requests.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.enabled && !self.marked_for_delete
    }
}
