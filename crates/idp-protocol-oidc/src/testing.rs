//! Shared unit-test fixture.

use std::sync::Arc;

use chrono::Duration;
use idp_core::{Clock, Config, ManualClock, SharedClock};
use idp_model::{SigningKey, Tenant};
use idp_storage::{Stores, memory};

use crate::authorization::AuthorizationRequestValidator;
use crate::authorization_code::AuthorizationCodeService;
use crate::client_auth::ClientAuthenticator;
use crate::grants::GrantHandler;
use crate::key_cache::SigningKeyCache;
use crate::token::TokenIssuer;
use crate::verify::TokenVerifier;

pub const SIGNING_KEY: &str = include_str!("../../../testdata/signing_key.pem");
pub const SIGNING_KEY_PUBLIC: &str = include_str!("../../../testdata/signing_key.pub.pem");

/// In-memory stores, a manual clock, tenants `T1` and `root`, and one
/// signing key `k1` valid for 90 days.
pub struct Fixture {
    pub config: Arc<Config>,
    pub clock: Arc<ManualClock>,
    pub stores: Stores,
    pub key_cache: Arc<SigningKeyCache>,
}

impl Fixture {
    pub async fn new() -> Self {
        let fixture = Self::without_keys().await;
        let key = SigningKey::new(
            "k1",
            "root",
            SIGNING_KEY,
            fixture.clock.now() + Duration::days(90),
        )
        .with_public_key(SIGNING_KEY_PUBLIC);
        fixture.stores.signing_keys.create(&key).await.unwrap();
        fixture
    }

    pub async fn without_keys() -> Self {
        let config = Arc::new(Config::default());
        let clock = Arc::new(ManualClock::default());
        let stores = memory::stores(Arc::clone(&clock) as SharedClock);
        stores.tenants.create(&Tenant::new("T1")).await.unwrap();
        stores.tenants.create(&Tenant::new("root")).await.unwrap();
        let key_cache = Arc::new(SigningKeyCache::new(
            Arc::clone(&stores.signing_keys),
            &config,
            Arc::clone(&clock) as SharedClock,
        ));
        Self {
            config,
            clock,
            stores,
            key_cache,
        }
    }

    fn shared_clock(&self) -> SharedClock {
        Arc::clone(&self.clock) as SharedClock
    }

    pub fn validator(&self) -> AuthorizationRequestValidator {
        AuthorizationRequestValidator::new(
            Arc::clone(&self.config),
            self.shared_clock(),
            self.stores.clone(),
        )
    }

    pub fn verifier(&self) -> TokenVerifier {
        TokenVerifier::new(
            Arc::clone(&self.config),
            self.shared_clock(),
            Arc::clone(&self.key_cache),
        )
    }

    pub fn issuer(&self) -> TokenIssuer {
        TokenIssuer::new(
            Arc::clone(&self.config),
            self.shared_clock(),
            self.stores.clone(),
            Arc::clone(&self.key_cache),
            self.verifier(),
        )
    }

    pub fn authenticator(&self) -> ClientAuthenticator {
        ClientAuthenticator::new(
            Arc::clone(&self.config),
            self.shared_clock(),
            self.stores.clone(),
        )
    }

    pub fn codes(&self) -> AuthorizationCodeService {
        AuthorizationCodeService::new(
            Arc::clone(&self.config),
            self.shared_clock(),
            self.stores.clone(),
        )
    }

    pub fn grants(&self) -> GrantHandler {
        GrantHandler::new(self.stores.clone(), self.codes(), self.issuer())
    }
}
