//! Token issuance.
//!
//! Builds and signs access, ID, and refresh tokens for end users, service
//! accounts, and anonymous users. Every path signs with the current key
//! from the [`SigningKeyCache`] using RS256 and sets the `kid` header.
//!
//! Issuance is all-or-nothing: tokens are signed before any refresh grant is
//! persisted, and any failed check or signing error yields an error and no
//! token.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use idp_core::{AuthEvent, Config, EventType, SharedClock};
use idp_model::{Client, RefreshData, Tenant};
use idp_storage::Stores;
use jsonwebtoken::{Algorithm, Header, encode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::claims::TokenClaims;
use crate::error::{OidcError, OidcResult};
use crate::key_cache::{CachedSigningKey, SigningKeyCache};
use crate::scope::scope_tokens;
use crate::types::{ANONYMOUS_USER_CREATE_SCOPE, TokenType};
use crate::verify::TokenVerifier;

/// Token endpoint response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The access token.
    pub access_token: String,

    /// Token type (always "Bearer").
    pub token_type: String,

    /// Access token lifetime in seconds.
    pub expires_in: i64,

    /// Refresh token (if issued).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// ID token (if `openid` scope was granted).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,

    /// Granted scope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl TokenResponse {
    fn bearer(access_token: String, expires_in: i64, scope: Option<String>) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in,
            refresh_token: None,
            id_token: None,
            scope,
        }
    }
}

/// Issues signed tokens.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    config: Arc<Config>,
    clock: SharedClock,
    stores: Stores,
    key_cache: Arc<SigningKeyCache>,
    verifier: TokenVerifier,
}

impl TokenIssuer {
    /// Creates an issuer.
    #[must_use]
    pub const fn new(
        config: Arc<Config>,
        clock: SharedClock,
        stores: Stores,
        key_cache: Arc<SigningKeyCache>,
        verifier: TokenVerifier,
    ) -> Self {
        Self {
            config,
            clock,
            stores,
            key_cache,
            verifier,
        }
    }

    /// Issues tokens for a signed-in end user.
    ///
    /// `refresh_count` is how many times the grant chain has already been
    /// redeemed; a refresh token is issued only while it is below the
    /// client's `max_refresh_token_count`.
    ///
    /// # Errors
    ///
    /// Returns [`OidcError::InvalidGrant`] if the tenant, client, or user is
    /// missing or disabled, [`OidcError::NoSigningKey`] if no key is
    /// available, or a signing or storage error.
    pub async fn issue_end_user_token(
        &self,
        tenant_id: &str,
        client_id: &str,
        user_id: &str,
        scope: &str,
        refresh_count: u32,
    ) -> OidcResult<TokenResponse> {
        self.active_tenant(tenant_id, not_permitted).await?;
        let client = self.enabled_client(tenant_id, client_id, not_permitted).await?;
        let user = match self.stores.users.get(tenant_id, user_id).await? {
            Some(user) if user.enabled => user,
            _ => {
                debug!(tenant_id, client_id, "user missing or disabled");
                return Err(not_permitted());
            }
        };

        let key = self.key_cache.get_current_signing_key().await?;
        let now = self.clock.now();
        let ttl = client
            .end_user_token_ttl_seconds
            .unwrap_or(self.config.tokens.default_token_ttl_seconds);

        let claims = TokenClaims::new(
            self.config.issuer(tenant_id),
            &user.user_id,
            tenant_id,
            client_id,
            TokenType::EndUser,
            now,
            expiry(now, ttl)?,
        )
        .with_user(&user)
        .with_scope(scope);
        let access_token = sign(&claims, &key)?;
        let id_token = if claims.has_scope("openid") {
            let mut id_claims = claims.clone();
            id_claims.jti = Uuid::new_v4().to_string();
            id_claims.scope = None;
            Some(sign(&id_claims, &key)?)
        } else {
            None
        };

        let refresh_token = if client.max_refresh_token_count > refresh_count {
            let ttl = client
                .refresh_token_ttl_seconds
                .unwrap_or(self.config.tokens.default_refresh_token_ttl_seconds);
            let record = RefreshData {
                refresh_token: idp_crypto::generate_opaque_token(),
                user_id: user.user_id.clone(),
                client_id: client.client_id.clone(),
                tenant_id: tenant_id.to_string(),
                scope: scope.to_string(),
                refresh_count,
                expires_at: expiry(now, ttl)?,
            };
            self.stores.refresh.create(&record).await?;
            Some(record.refresh_token)
        } else {
            None
        };

        info!(tenant_id, client_id, kid = %key.key_id, "end-user token issued");

        let mut response = TokenResponse::bearer(access_token, ttl, claims.scope);
        response.id_token = id_token;
        response.refresh_token = refresh_token;
        Ok(response)
    }

    /// Issues a token for a service-account client acting as itself.
    ///
    /// With no `scope`, every scope granted to the client is included.
    ///
    /// # Errors
    ///
    /// Returns [`OidcError::UnauthorizedClient`] if the tenant or client is
    /// missing or disabled or the client is not a service account,
    /// [`OidcError::InvalidScope`] if a requested scope is not granted to the
    /// client, or a key, signing, or storage error.
    pub async fn issue_service_account_token(
        &self,
        tenant_id: &str,
        client_id: &str,
        scope: Option<&str>,
    ) -> OidcResult<TokenResponse> {
        self.active_tenant(tenant_id, unauthorized).await?;
        let client = self.enabled_client(tenant_id, client_id, unauthorized).await?;
        if !client.is_service_account() {
            debug!(tenant_id, client_id, "client is not a service account");
            return Err(unauthorized());
        }

        let granted: HashSet<String> = self
            .stores
            .scopes
            .list_for_client(tenant_id, client_id)
            .await?
            .into_iter()
            .map(|rel| rel.scope_name)
            .collect();
        let scope = match scope.map(str::trim).filter(|s| !s.is_empty()) {
            Some(requested) => {
                if let Some(unknown) = scope_tokens(requested).find(|s| !granted.contains(*s)) {
                    return Err(OidcError::InvalidScope(format!(
                        "scope {unknown} is not granted to this client"
                    )));
                }
                scope_tokens(requested).collect::<Vec<_>>().join(" ")
            }
            None => {
                let mut all: Vec<_> = granted.into_iter().collect();
                all.sort();
                all.join(" ")
            }
        };

        let key = self.key_cache.get_current_signing_key().await?;
        let ttl = self.config.tokens.default_token_ttl_seconds;
        let now = self.clock.now();
        let claims = TokenClaims::new(
            self.config.issuer(tenant_id),
            client_id,
            tenant_id,
            client_id,
            TokenType::ServiceAccount,
            now,
            expiry(now, ttl)?,
        )
        .with_scope(scope);
        let access_token = sign(&claims, &key)?;

        info!(tenant_id, client_id, kid = %key.key_id, "service-account token issued");
        Ok(TokenResponse::bearer(access_token, ttl, claims.scope))
    }

    /// Issues a token for a fresh anonymous user.
    ///
    /// The caller must present a service-account token for this tenant
    /// carrying the `anonymous_user.create` scope, and the tenant must allow
    /// anonymous users. The new token is issued to `client_id`.
    ///
    /// # Errors
    ///
    /// Returns [`OidcError::UnauthorizedClient`] if any of those checks
    /// fail, or a key, signing, or storage error.
    pub async fn issue_anonymous_user_token(
        &self,
        tenant_id: &str,
        client_id: &str,
        caller_token: &str,
    ) -> OidcResult<TokenResponse> {
        let tenant = self.active_tenant(tenant_id, unauthorized).await?;
        if !tenant.allow_anonymous_users {
            debug!(tenant_id, "anonymous users not allowed");
            return Err(unauthorized());
        }

        let caller = match self.verifier.verify(tenant_id, caller_token).await {
            Ok(claims) => claims,
            Err(e) if e.is_server_error() => return Err(e),
            Err(_) => return Err(unauthorized()),
        };
        if caller.token_type != TokenType::ServiceAccount
            || !caller.has_scope(ANONYMOUS_USER_CREATE_SCOPE)
        {
            debug!(
                tenant_id,
                caller = %caller.client_id,
                "caller may not create anonymous users"
            );
            return Err(unauthorized());
        }
        self.enabled_client(tenant_id, client_id, unauthorized).await?;

        let key = self.key_cache.get_current_signing_key().await?;
        let ttl = self.config.tokens.default_token_ttl_seconds;
        let now = self.clock.now();
        let claims = TokenClaims::new(
            self.config.issuer(tenant_id),
            Uuid::new_v4().to_string(),
            tenant_id,
            client_id,
            TokenType::AnonymousUser,
            now,
            expiry(now, ttl)?,
        );
        let access_token = sign(&claims, &key)?;

        info!(
            tenant_id,
            client_id,
            caller = %caller.client_id,
            kid = %key.key_id,
            "anonymous-user token issued"
        );
        AuthEvent::builder(EventType::AnonymousToken)
            .tenant(tenant_id)
            .client(client_id)
            .user(&claims.sub)
            .detail("caller", &caller.client_id)
            .emit();
        Ok(TokenResponse::bearer(access_token, ttl, None))
    }

    async fn active_tenant(
        &self,
        tenant_id: &str,
        reject: fn() -> OidcError,
    ) -> OidcResult<Tenant> {
        match self.stores.tenants.get(tenant_id).await? {
            Some(tenant) if tenant.is_active() => Ok(tenant),
            _ => {
                debug!(tenant_id, "tenant missing or disabled");
                Err(reject())
            }
        }
    }

    async fn enabled_client(
        &self,
        tenant_id: &str,
        client_id: &str,
        reject: fn() -> OidcError,
    ) -> OidcResult<Client> {
        match self.stores.clients.get(client_id).await? {
            Some(client) if client.tenant_id == tenant_id && client.enabled => Ok(client),
            _ => {
                debug!(tenant_id, client_id, "client missing, disabled, or in another tenant");
                Err(reject())
            }
        }
    }
}

fn not_permitted() -> OidcError {
    OidcError::InvalidGrant("token issuance not permitted".to_string())
}

fn unauthorized() -> OidcError {
    OidcError::UnauthorizedClient("client is not authorized for this request".to_string())
}

/// Adds `ttl_seconds` to `issued_at`, failing if the result is not a
/// representable instant.
fn expiry(issued_at: DateTime<Utc>, ttl_seconds: i64) -> OidcResult<DateTime<Utc>> {
    Duration::try_seconds(ttl_seconds)
        .and_then(|ttl| issued_at.checked_add_signed(ttl))
        .ok_or_else(|| OidcError::ServerError(format!("token lifetime {ttl_seconds}s is out of range")))
}

fn sign(claims: &TokenClaims, key: &CachedSigningKey) -> OidcResult<String> {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(key.key_id.clone());
    header.typ = Some("JWT".to_string());

    encode(&header, claims, key.encoding_key()).map_err(|e| OidcError::TokenSigning(e.to_string()))
}
