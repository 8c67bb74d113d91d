//! Structured audit events for protocol operations.
//!
//! Every authorization, client authentication, and token operation emits an
//! [`AuthEvent`] through `tracing` under the `idp::audit` target. Events
//! carry identifiers only, never secrets, assertions, or token values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// Authorization request accepted and pre-authentication state stored.
    AuthorizationRequest,
    /// Authorization request rejected.
    AuthorizationRequestError,
    /// Login completed and authorization code created.
    LoginComplete,
    /// Client authenticated.
    ClientLogin,
    /// Client authentication failed.
    ClientLoginError,
    /// Authorization code exchanged for tokens.
    CodeToToken,
    /// Authorization code exchange failed.
    CodeToTokenError,
    /// Refresh grant redeemed.
    RefreshToken,
    /// Refresh grant rejected.
    RefreshTokenError,
    /// Service-account token issued.
    ClientCredentials,
    /// Anonymous-user token issued.
    AnonymousToken,
    /// Refresh grants revoked.
    RevokeGrant,
    /// Signing key cache reloaded.
    SigningKeysLoaded,
}

impl EventType {
    /// Returns the wire name of this event type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AuthorizationRequest => "AUTHORIZATION_REQUEST",
            Self::AuthorizationRequestError => "AUTHORIZATION_REQUEST_ERROR",
            Self::LoginComplete => "LOGIN_COMPLETE",
            Self::ClientLogin => "CLIENT_LOGIN",
            Self::ClientLoginError => "CLIENT_LOGIN_ERROR",
            Self::CodeToToken => "CODE_TO_TOKEN",
            Self::CodeToTokenError => "CODE_TO_TOKEN_ERROR",
            Self::RefreshToken => "REFRESH_TOKEN",
            Self::RefreshTokenError => "REFRESH_TOKEN_ERROR",
            Self::ClientCredentials => "CLIENT_CREDENTIALS",
            Self::AnonymousToken => "ANONYMOUS_TOKEN",
            Self::RevokeGrant => "REVOKE_GRANT",
            Self::SigningKeysLoaded => "SIGNING_KEYS_LOADED",
        }
    }
}

/// Outcome of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOutcome {
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Failure,
}

/// A protocol audit event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthEvent {
    /// Unique event identifier.
    pub id: Uuid,
    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,
    /// Type of event.
    pub event_type: EventType,
    /// Outcome of the event.
    pub outcome: EventOutcome,
    /// Tenant the event occurred in.
    pub tenant_id: Option<String>,
    /// Client involved.
    pub client_id: Option<String>,
    /// End user involved.
    pub user_id: Option<String>,
    /// Stable error code for failure events.
    pub error: Option<String>,
    /// Additional details as key-value pairs.
    pub details: Vec<(String, String)>,
}

impl AuthEvent {
    /// Creates a new event builder.
    #[must_use]
    pub const fn builder(event_type: EventType) -> AuthEventBuilder {
        AuthEventBuilder::new(event_type)
    }

    /// Writes the event to the audit log.
    pub fn emit(&self) {
        let tenant_id = self.tenant_id.as_deref().unwrap_or("-");
        let client_id = self.client_id.as_deref().unwrap_or("-");
        let user_id = self.user_id.as_deref().unwrap_or("-");
        match self.outcome {
            EventOutcome::Success => tracing::info!(
                target: "idp::audit",
                event_id = %self.id,
                event_type = self.event_type.as_str(),
                tenant_id,
                client_id,
                user_id,
                details = ?self.details,
                "protocol event"
            ),
            EventOutcome::Failure => tracing::warn!(
                target: "idp::audit",
                event_id = %self.id,
                event_type = self.event_type.as_str(),
                tenant_id,
                client_id,
                user_id,
                error = self.error.as_deref().unwrap_or("-"),
                details = ?self.details,
                "protocol event failed"
            ),
        }
    }
}

/// Builder for [`AuthEvent`].
#[derive(Debug)]
pub struct AuthEventBuilder {
    event_type: EventType,
    outcome: EventOutcome,
    tenant_id: Option<String>,
    client_id: Option<String>,
    user_id: Option<String>,
    error: Option<String>,
    details: Vec<(String, String)>,
}

impl AuthEventBuilder {
    /// Creates a new event builder with a success outcome.
    #[must_use]
    pub const fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            outcome: EventOutcome::Success,
            tenant_id: None,
            client_id: None,
            user_id: None,
            error: None,
            details: Vec::new(),
        }
    }

    /// Sets the outcome to failure with an error code.
    #[must_use]
    pub fn failure(mut self, error: impl Into<String>) -> Self {
        self.outcome = EventOutcome::Failure;
        self.error = Some(error.into());
        self
    }

    /// Sets the tenant ID.
    #[must_use]
    pub fn tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Sets the client ID.
    #[must_use]
    pub fn client(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Sets the user ID.
    #[must_use]
    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Adds a detail key-value pair.
    #[must_use]
    pub fn detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.push((key.into(), value.into()));
        self
    }

    /// Builds the event.
    #[must_use]
    pub fn build(self) -> AuthEvent {
        AuthEvent {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            event_type: self.event_type,
            outcome: self.outcome,
            tenant_id: self.tenant_id,
            client_id: self.client_id,
            user_id: self.user_id,
            error: self.error,
            details: self.details,
        }
    }

    /// Builds and emits the event.
    pub fn emit(self) {
        self.build().emit();
    }
}
