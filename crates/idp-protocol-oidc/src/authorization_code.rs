//! Authorization codes.
//!
//! After the login surface has authenticated the user it hands back the
//! pre-authentication token. The pending request is consumed and replaced
//! by a single-use authorization code, which the client later redeems at
//! the token endpoint.

use std::sync::Arc;

use chrono::Duration;
use idp_core::{AuthEvent, Config, EventType, SharedClock};
use idp_crypto::{constant_time_eq, pkce_s256_challenge};
use idp_model::AuthorizationState;
use idp_storage::Stores;
use tracing::{debug, info};
use url::Url;

use crate::error::{OidcError, OidcResult};
use crate::redirect::build_client_redirect;
use crate::types::PKCE_METHOD_S256;

// ============================================================================
// PKCE Validation
// ============================================================================

/// Checks a PKCE `code_verifier` against the stored `S256` challenge.
///
/// # Errors
///
/// Returns [`OidcError::InvalidGrant`] if the verifier is malformed or does
/// not hash to the challenge.
pub fn verify_pkce(code_verifier: &str, code_challenge: &str) -> OidcResult<()> {
    if code_verifier.len() < 43 || code_verifier.len() > 128 {
        return Err(OidcError::InvalidGrant(
            "code_verifier must be between 43 and 128 characters".to_string(),
        ));
    }
    if !code_verifier
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~'))
    {
        return Err(OidcError::InvalidGrant(
            "code_verifier contains invalid characters".to_string(),
        ));
    }

    let computed = pkce_s256_challenge(code_verifier);
    if !constant_time_eq(computed.as_bytes(), code_challenge.as_bytes()) {
        return Err(OidcError::InvalidGrant("PKCE verification failed".to_string()));
    }
    Ok(())
}

// ============================================================================
// Service
// ============================================================================

/// Issues and redeems authorization codes.
#[derive(Debug, Clone)]
pub struct AuthorizationCodeService {
    config: Arc<Config>,
    clock: SharedClock,
    stores: Stores,
}

impl AuthorizationCodeService {
    /// Creates the service.
    #[must_use]
    pub const fn new(config: Arc<Config>, clock: SharedClock, stores: Stores) -> Self {
        Self {
            config,
            clock,
            stores,
        }
    }

    /// Completes a login for `user_id`.
    ///
    /// Consumes the pre-authentication state, stores a fresh authorization
    /// code, and returns the client redirect carrying `code` and `state`.
    ///
    /// # Errors
    ///
    /// Returns [`OidcError::InvalidGrant`] if the pre-authentication token is
    /// unknown, expired, or already used, or if the user is missing or
    /// disabled; or a storage error.
    pub async fn complete_login(&self, pre_auth_token: &str, user_id: &str) -> OidcResult<Url> {
        let Some(pre_auth) = self.stores.pre_auth.take(pre_auth_token).await? else {
            debug!("pre-authentication token unknown or expired");
            return Err(OidcError::InvalidGrant(
                "login session expired".to_string(),
            ));
        };
        let tenant_id = pre_auth.tenant_id.as_str();

        match self.stores.users.get(tenant_id, user_id).await? {
            Some(user) if user.enabled => {}
            _ => {
                debug!(tenant_id, client_id = %pre_auth.client_id, "user missing or disabled");
                return Err(OidcError::InvalidGrant("login not permitted".to_string()));
            }
        }

        let state = AuthorizationState {
            code: idp_crypto::generate_opaque_token(),
            user_id: user_id.to_string(),
            client_id: pre_auth.client_id.clone(),
            tenant_id: tenant_id.to_string(),
            redirect_uri: pre_auth.redirect_uri.clone(),
            scope: pre_auth.scope.clone(),
            code_challenge: pre_auth.code_challenge.clone(),
            code_challenge_method: pre_auth.code_challenge_method.clone(),
            expires_at: self.clock.now()
                + Duration::seconds(self.config.tokens.authorization_code_ttl_seconds),
        };
        let location = build_client_redirect(
            &state.redirect_uri,
            &state.code,
            pre_auth.state.as_deref(),
            pre_auth.response_mode,
        )?;
        self.stores.authorization.create(&state).await?;

        info!(tenant_id, client_id = %state.client_id, "authorization code issued");
        AuthEvent::builder(EventType::LoginComplete)
            .tenant(tenant_id)
            .client(&state.client_id)
            .user(user_id)
            .emit();
        Ok(location)
    }

    /// Redeems an authorization code for `client_id`.
    ///
    /// The code is consumed before any other check, so it cannot be retried
    /// after a failed redemption.
    ///
    /// # Errors
    ///
    /// Returns [`OidcError::InvalidGrant`] if the code is unknown, expired,
    /// or used, was issued to another client or tenant, the redirect URI
    /// differs, or PKCE verification fails; or a storage error.
    pub async fn redeem(
        &self,
        tenant_id: &str,
        client_id: &str,
        code: &str,
        redirect_uri: Option<&str>,
        code_verifier: Option<&str>,
    ) -> OidcResult<AuthorizationState> {
        let Some(state) = self.stores.authorization.take(code).await? else {
            debug!(tenant_id, client_id, "authorization code unknown or expired");
            return Err(invalid_code());
        };
        if state.tenant_id != tenant_id || state.client_id != client_id {
            debug!(tenant_id, client_id, "authorization code issued to another client");
            return Err(invalid_code());
        }
        if redirect_uri != Some(state.redirect_uri.as_str()) {
            debug!(tenant_id, client_id, "redirect_uri does not match authorization request");
            return Err(invalid_code());
        }

        match (&state.code_challenge, code_verifier) {
            (Some(challenge), Some(verifier)) => {
                if state.code_challenge_method.as_deref() != Some(PKCE_METHOD_S256) {
                    return Err(OidcError::InvalidGrant(
                        "unsupported code_challenge_method".to_string(),
                    ));
                }
                verify_pkce(verifier, challenge)?;
            }
            (Some(_), None) => {
                return Err(OidcError::InvalidGrant(
                    "code_verifier is required".to_string(),
                ));
            }
            (None, Some(_)) => {
                return Err(OidcError::InvalidGrant(
                    "code_verifier sent without a code_challenge".to_string(),
                ));
            }
            (None, None) => {}
        }

        Ok(state)
    }
}

fn invalid_code() -> OidcError {
    OidcError::InvalidGrant("invalid authorization code".to_string())
}
