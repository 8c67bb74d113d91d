//! Grant handling for the token and revocation endpoints.
//!
//! Supported grant types:
//! - `authorization_code`: redeem a code from the login flow
//! - `refresh_token`: redeem a refresh grant for a new token set
//! - `client_credentials`: service-account clients acting as themselves
//!
//! The client is always authenticated before a grant handler runs.

use std::collections::HashSet;

use idp_core::{AuthEvent, EventType};
use idp_model::{Client, RefreshData};
use idp_storage::Stores;
use tracing::{debug, info, warn};

use crate::authorization_code::AuthorizationCodeService;
use crate::error::{OidcError, OidcResult};
use crate::request::TokenRequest;
use crate::scope::scope_tokens;
use crate::token::{TokenIssuer, TokenResponse};
use crate::types::GrantType;

/// Dispatches token requests to grant handlers.
#[derive(Debug, Clone)]
pub struct GrantHandler {
    stores: Stores,
    codes: AuthorizationCodeService,
    issuer: TokenIssuer,
}

impl GrantHandler {
    /// Creates a handler.
    #[must_use]
    pub const fn new(stores: Stores, codes: AuthorizationCodeService, issuer: TokenIssuer) -> Self {
        Self {
            stores,
            codes,
            issuer,
        }
    }

    /// Handles a token request from an authenticated `client`.
    ///
    /// # Errors
    ///
    /// Returns [`OidcError::UnsupportedGrantType`] for an unknown
    /// `grant_type`, or the error of the selected grant.
    pub async fn handle(
        &self,
        tenant_id: &str,
        client: &Client,
        request: &TokenRequest,
    ) -> OidcResult<TokenResponse> {
        let grant_type = request
            .parsed_grant_type()
            .map_err(OidcError::UnsupportedGrantType)?;

        let (result, success, failure) = match grant_type {
            GrantType::AuthorizationCode => (
                self.authorization_code(tenant_id, client, request).await,
                EventType::CodeToToken,
                EventType::CodeToTokenError,
            ),
            GrantType::RefreshToken => (
                self.refresh_token(tenant_id, client, request).await,
                EventType::RefreshToken,
                EventType::RefreshTokenError,
            ),
            GrantType::ClientCredentials => (
                self.issuer
                    .issue_service_account_token(
                        tenant_id,
                        &client.client_id,
                        request.scope.as_deref(),
                    )
                    .await,
                EventType::ClientCredentials,
                EventType::ClientCredentials,
            ),
        };

        match &result {
            Ok(_) => AuthEvent::builder(success)
                .tenant(tenant_id)
                .client(&client.client_id)
                .detail("grant_type", grant_type.to_string())
                .emit(),
            Err(e) => AuthEvent::builder(failure)
                .failure(e.error_code())
                .tenant(tenant_id)
                .client(&client.client_id)
                .detail("grant_type", grant_type.to_string())
                .emit(),
        }
        result
    }

    async fn authorization_code(
        &self,
        tenant_id: &str,
        client: &Client,
        request: &TokenRequest,
    ) -> OidcResult<TokenResponse> {
        let code = request
            .code
            .as_deref()
            .ok_or_else(|| OidcError::InvalidRequest("code is required".to_string()))?;
        let redirect_uri = request
            .redirect_uri
            .as_deref()
            .ok_or_else(|| OidcError::InvalidRequest("redirect_uri is required".to_string()))?;

        let state = self
            .codes
            .redeem(
                tenant_id,
                &client.client_id,
                code,
                Some(redirect_uri),
                request.code_verifier.as_deref(),
            )
            .await?;

        self.issuer
            .issue_end_user_token(tenant_id, &client.client_id, &state.user_id, &state.scope, 0)
            .await
    }

    async fn refresh_token(
        &self,
        tenant_id: &str,
        client: &Client,
        request: &TokenRequest,
    ) -> OidcResult<TokenResponse> {
        let token = request
            .refresh_token
            .as_deref()
            .ok_or_else(|| OidcError::InvalidRequest("refresh_token is required".to_string()))?;

        let Some(grant) = self.stores.refresh.find(token).await? else {
            debug!(tenant_id, client_id = %client.client_id, "refresh token unknown or expired");
            return Err(invalid_refresh());
        };
        if grant.tenant_id != tenant_id || grant.client_id != client.client_id {
            debug!(tenant_id, client_id = %client.client_id, "refresh token issued to another client");
            return Err(invalid_refresh());
        }
        if grant.refresh_count >= client.max_refresh_token_count {
            debug!(
                tenant_id,
                client_id = %client.client_id,
                refresh_count = grant.refresh_count,
                "refresh limit reached"
            );
            return Err(invalid_refresh());
        }
        let scope = narrowed_scope(&grant, request.scope.as_deref())?;

        if self.stores.refresh.take(token).await?.is_none() {
            debug!(tenant_id, client_id = %client.client_id, "refresh token already redeemed");
            return Err(invalid_refresh());
        }

        let response = match self
            .issuer
            .issue_end_user_token(
                tenant_id,
                &client.client_id,
                &grant.user_id,
                &scope,
                grant.refresh_count + 1,
            )
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_server_error() => {
                // The grant stays redeemable after an infrastructure failure.
                if let Err(restore) = self.stores.refresh.create(&grant).await {
                    warn!(
                        tenant_id,
                        client_id = %client.client_id,
                        error = %restore,
                        "refresh grant could not be restored"
                    );
                }
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        info!(
            tenant_id,
            client_id = %client.client_id,
            refresh_count = grant.refresh_count + 1,
            "refresh grant redeemed"
        );
        Ok(response)
    }

    /// Revokes the refresh grant behind `token` for an authenticated `client`.
    ///
    /// Every refresh record for the same user, tenant, and client is
    /// deleted. Unknown or expired tokens are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`OidcError::UnauthorizedClient`] if the token belongs to
    /// another client, or a storage error.
    pub async fn revoke(&self, tenant_id: &str, client: &Client, token: &str) -> OidcResult<()> {
        let Some(grant) = self.stores.refresh.find(token).await? else {
            debug!(tenant_id, client_id = %client.client_id, "revocation of unknown token");
            return Ok(());
        };
        if grant.tenant_id != tenant_id || grant.client_id != client.client_id {
            AuthEvent::builder(EventType::RevokeGrant)
                .failure("unauthorized_client")
                .tenant(tenant_id)
                .client(&client.client_id)
                .emit();
            return Err(OidcError::UnauthorizedClient(
                "token was not issued to this client".to_string(),
            ));
        }

        let removed = self
            .stores
            .refresh
            .delete_for_grant(&grant.user_id, tenant_id, &client.client_id)
            .await?;
        info!(tenant_id, client_id = %client.client_id, removed, "refresh grant revoked");
        AuthEvent::builder(EventType::RevokeGrant)
            .tenant(tenant_id)
            .client(&client.client_id)
            .user(&grant.user_id)
            .emit();
        Ok(())
    }
}

/// Returns the scope for a refreshed token set: the original scope, or a
/// subset of it if one was requested.
fn narrowed_scope(grant: &RefreshData, requested: Option<&str>) -> OidcResult<String> {
    let Some(requested) = requested.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(grant.scope.clone());
    };
    let original: HashSet<&str> = scope_tokens(&grant.scope).collect();
    if let Some(extra) = scope_tokens(requested).find(|s| !original.contains(s)) {
        return Err(OidcError::InvalidScope(format!(
            "scope {extra} exceeds the original grant"
        )));
    }
    Ok(scope_tokens(requested).collect::<Vec<_>>().join(" "))
}

fn invalid_refresh() -> OidcError {
    OidcError::InvalidGrant("invalid refresh token".to_string())
}
