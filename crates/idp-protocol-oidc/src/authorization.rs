//! Authorization request validation.
//!
//! Turns a raw authorization request into a server-held
//! [`PreAuthenticationState`] and a redirect to the login surface carrying
//! only its opaque handle. Checks run in a fixed order and stop at the first
//! failure; no store is read after a failed check.

use std::sync::Arc;

use chrono::Duration;
use idp_core::{AuthEvent, Config, EventType, SharedClock};
use idp_model::{Client, PreAuthenticationState, ResponseMode};
use idp_storage::Stores;
use tracing::{debug, info};
use url::{Host, Url};

use crate::error::OidcResult;
use crate::redirect::{AuthorizationErrorCode, build_login_error_redirect, build_login_redirect};
use crate::request::AuthorizationRequest;
use crate::scope::{allowed_scopes, first_unknown_scope, scope_tokens};
use crate::types::{PKCE_METHOD_S256, RESPONSE_TYPE_CODE};

/// Result of validating an authorization request.
///
/// Both variants are redirects to the login surface.
#[derive(Debug, Clone)]
pub enum AuthorizationOutcome {
    /// The request was accepted and its state persisted.
    LoginRedirect {
        /// Persisted state.
        pre_auth: PreAuthenticationState,
        /// Login surface URL carrying the handle.
        location: Url,
    },
    /// The request was rejected.
    ErrorRedirect {
        /// Failure code.
        code: AuthorizationErrorCode,
        /// Login surface URL carrying the error.
        location: Url,
    },
}

impl AuthorizationOutcome {
    /// Returns the redirect target.
    #[must_use]
    pub const fn location(&self) -> &Url {
        match self {
            Self::LoginRedirect { location, .. } | Self::ErrorRedirect { location, .. } => location,
        }
    }

    /// Returns the failure code, if the request was rejected.
    #[must_use]
    pub const fn error_code(&self) -> Option<AuthorizationErrorCode> {
        match self {
            Self::LoginRedirect { .. } => None,
            Self::ErrorRedirect { code, .. } => Some(*code),
        }
    }
}

struct Accepted {
    client_id: String,
    redirect_uri: String,
    scope: String,
}

/// Validates authorization requests.
#[derive(Debug, Clone)]
pub struct AuthorizationRequestValidator {
    config: Arc<Config>,
    clock: SharedClock,
    stores: Stores,
}

impl AuthorizationRequestValidator {
    /// Creates a validator.
    #[must_use]
    pub const fn new(config: Arc<Config>, clock: SharedClock, stores: Stores) -> Self {
        Self {
            config,
            clock,
            stores,
        }
    }

    /// Validates a request for `tenant_id`.
    ///
    /// Protocol failures are returned as [`AuthorizationOutcome::ErrorRedirect`].
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure failures: a store is
    /// unavailable or the login URL is misconfigured.
    pub async fn validate(
        &self,
        tenant_id: &str,
        request: &AuthorizationRequest,
    ) -> OidcResult<AuthorizationOutcome> {
        let accepted = match self.check(tenant_id, request).await? {
            Ok(accepted) => accepted,
            Err(code) => return self.reject(tenant_id, request, code),
        };

        let now = self.clock.now();
        let pre_auth = PreAuthenticationState {
            token: idp_crypto::generate_opaque_token(),
            client_id: accepted.client_id,
            tenant_id: tenant_id.to_string(),
            redirect_uri: accepted.redirect_uri,
            scope: accepted.scope,
            response_type: RESPONSE_TYPE_CODE.to_string(),
            response_mode: ResponseMode::from_param(request.response_mode.as_deref()),
            code_challenge: request.code_challenge().map(ToString::to_string),
            code_challenge_method: request.code_challenge_method().map(ToString::to_string),
            state: request.state.clone(),
            created_at: now,
            expires_at: now + Duration::seconds(self.config.tokens.pre_auth_ttl_seconds),
        };
        let location = build_login_redirect(
            &self.config.login.login_url,
            tenant_id,
            &pre_auth.redirect_uri,
            &pre_auth.token,
        )?;
        self.stores.pre_auth.create(&pre_auth).await?;

        info!(
            tenant_id,
            client_id = %pre_auth.client_id,
            "authorization request accepted"
        );
        AuthEvent::builder(EventType::AuthorizationRequest)
            .tenant(tenant_id)
            .client(&pre_auth.client_id)
            .emit();

        Ok(AuthorizationOutcome::LoginRedirect { pre_auth, location })
    }

    fn reject(
        &self,
        tenant_id: &str,
        request: &AuthorizationRequest,
        code: AuthorizationErrorCode,
    ) -> OidcResult<AuthorizationOutcome> {
        debug!(
            tenant_id,
            client_id = request.client_id.as_deref().unwrap_or("-"),
            error_code = code.as_str(),
            "authorization request rejected"
        );
        let mut event = AuthEvent::builder(EventType::AuthorizationRequestError)
            .failure(code.as_str())
            .tenant(tenant_id);
        if let Some(client_id) = &request.client_id {
            event = event.client(client_id);
        }
        event.emit();

        let location =
            build_login_error_redirect(&self.config.login.login_url, tenant_id, request, code)?;
        Ok(AuthorizationOutcome::ErrorRedirect { code, location })
    }

    async fn check(
        &self,
        tenant_id: &str,
        request: &AuthorizationRequest,
    ) -> OidcResult<Result<Accepted, AuthorizationErrorCode>> {
        use AuthorizationErrorCode as E;

        let Some(scope) = request.scope() else {
            return Ok(Err(E::MissingScope));
        };
        if request.response_type.as_deref() != Some(RESPONSE_TYPE_CODE) {
            return Ok(Err(E::UnsupportedResponseType));
        }

        match self.stores.tenants.get(tenant_id).await? {
            Some(tenant) if tenant.enabled => {}
            _ => return Ok(Err(E::InvalidTenant)),
        }

        let Some(client_id) = request.client_id.as_deref().filter(|id| !id.is_empty()) else {
            return Ok(Err(E::InvalidClient));
        };
        let client = match self.stores.clients.get(client_id).await? {
            Some(client) if client.tenant_id == tenant_id && client.enabled => client,
            _ => return Ok(Err(E::InvalidClient)),
        };
        if client.is_service_account() {
            return Ok(Err(E::ClientNotEnabledForSso));
        }

        if !client.oidc_enabled {
            return Ok(Err(E::ClientNotEnabledForOidc));
        }
        let Some(redirect_uri) = request.redirect_uri.as_deref() else {
            return Ok(Err(E::InvalidRedirectUri));
        };
        if !redirect_uri_allowed(&client, redirect_uri) {
            return Ok(Err(E::InvalidRedirectUri));
        }

        let challenge = request.code_challenge();
        let method = request.code_challenge_method();
        if challenge.is_some() || method.is_some() {
            if !client.pkce_enabled {
                return Ok(Err(E::PkceNotEnabledForClient));
            }
            if method.is_some_and(|m| m != PKCE_METHOD_S256) {
                return Ok(Err(E::InvalidCodeChallengeMethod));
            }
            if challenge.is_none() || method.is_none() {
                return Ok(Err(E::CodeChallengeParametersMissing));
            }
        }

        let allowed = allowed_scopes(self.stores.scopes.as_ref(), &client).await?;
        if let Some(unknown) = first_unknown_scope(scope, &allowed) {
            debug!(tenant_id, client_id, scope = unknown, "scope not allowed");
            return Ok(Err(E::InvalidScope));
        }

        Ok(Ok(Accepted {
            client_id: client.client_id,
            redirect_uri: redirect_uri.to_string(),
            scope: scope_tokens(scope).collect::<Vec<_>>().join(" "),
        }))
    }
}

/// Returns whether `redirect_uri` matches one of the client's registered URIs.
///
/// Matching is exact, except that a registered loopback URI matches the same
/// URI on any port.
#[must_use]
pub fn redirect_uri_allowed(client: &Client, redirect_uri: &str) -> bool {
    if client.redirect_uris.contains(redirect_uri) {
        return true;
    }
    let Ok(requested) = Url::parse(redirect_uri) else {
        return false;
    };
    if !is_loopback(&requested) {
        return false;
    }
    client
        .redirect_uris
        .iter()
        .filter_map(|registered| Url::parse(registered).ok())
        .any(|registered| {
            is_loopback(&registered)
                && registered.scheme() == requested.scheme()
                && registered.host() == requested.host()
                && registered.path() == requested.path()
                && registered.query() == requested.query()
        })
}

fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}
