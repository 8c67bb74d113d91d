//! Shared state for OIDC endpoints.

use std::sync::Arc;

use idp_core::{Config, SharedClock};
use idp_storage::Stores;

use crate::authorization::AuthorizationRequestValidator;
use crate::authorization_code::AuthorizationCodeService;
use crate::client_auth::ClientAuthenticator;
use crate::grants::GrantHandler;
use crate::key_cache::SigningKeyCache;
use crate::token::TokenIssuer;
use crate::verify::TokenVerifier;

/// Shared state for OIDC endpoints.
///
/// Every service shares one configuration, clock, set of stores, and
/// signing key cache.
#[derive(Debug, Clone)]
pub struct OidcState {
    /// Protocol configuration.
    pub config: Arc<Config>,
    /// Time source.
    pub clock: SharedClock,
    /// Storage handles.
    pub stores: Stores,
    /// Signing key cache.
    pub key_cache: Arc<SigningKeyCache>,
    /// Authorization request validation.
    pub validator: AuthorizationRequestValidator,
    /// Authorization codes.
    pub codes: AuthorizationCodeService,
    /// Client authentication.
    pub authenticator: ClientAuthenticator,
    /// Token verification.
    pub verifier: TokenVerifier,
    /// Token issuance.
    pub issuer: TokenIssuer,
    /// Token endpoint grants and revocation.
    pub grants: GrantHandler,
}

impl OidcState {
    /// Wires every service from one configuration, store set, and clock.
    #[must_use]
    pub fn new(config: Config, stores: Stores, clock: SharedClock) -> Self {
        let config = Arc::new(config);
        let key_cache = Arc::new(SigningKeyCache::new(
            Arc::clone(&stores.signing_keys),
            &config,
            Arc::clone(&clock),
        ));
        let validator = AuthorizationRequestValidator::new(
            Arc::clone(&config),
            Arc::clone(&clock),
            stores.clone(),
        );
        let codes =
            AuthorizationCodeService::new(Arc::clone(&config), Arc::clone(&clock), stores.clone());
        let authenticator =
            ClientAuthenticator::new(Arc::clone(&config), Arc::clone(&clock), stores.clone());
        let verifier = TokenVerifier::new(
            Arc::clone(&config),
            Arc::clone(&clock),
            Arc::clone(&key_cache),
        );
        let issuer = TokenIssuer::new(
            Arc::clone(&config),
            Arc::clone(&clock),
            stores.clone(),
            Arc::clone(&key_cache),
            verifier.clone(),
        );
        let grants = GrantHandler::new(stores.clone(), codes.clone(), issuer.clone());

        Self {
            config,
            clock,
            stores,
            key_cache,
            validator,
            codes,
            authenticator,
            verifier,
            issuer,
            grants,
        }
    }
}
