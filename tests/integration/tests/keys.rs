//! Signing key, JWKS, and discovery integration tests.

use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Duration;
use idp_core::{Clock, ManualClock, SharedClock};
use idp_model::SigningKey;
use idp_protocol_oidc::JsonWebKeySet;
use idp_server::{Server, ServerConfig};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde_json::Value;

use crate::common::{TENANT, TestEnv, basic};

const ROTATED_KEY: &str = include_str!("../../../testdata/rotated_key.enc.pem");
const ROTATED_CERT: &str = include_str!("../../../testdata/rotated_key.crt.pem");

async fn service_token(env: &TestEnv) -> anyhow::Result<String> {
    let client = env.service_client("svc", &["orders.read"]).await?;
    let body: Value = env
        .token(&[("grant_type", "client_credentials")], Some(&basic(&client)))
        .await?
        .json()?;
    body["access_token"]
        .as_str()
        .map(ToString::to_string)
        .ok_or_else(|| anyhow::anyhow!("no access token: {body}"))
}

/// Issued tokens verify against the published key with matching `kid`.
#[tokio::test]
async fn issued_token_verifies_against_jwks() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let token = service_token(&env).await?;

    let jwks: JsonWebKeySet = env.get(&format!("/{TENANT}/oidc/jwks")).await?.json()?;
    let kid = decode_header(&token)?.kid.expect("kid header");
    assert_eq!(kid, "k1");
    let jwk = jwks.find_key(&kid).expect("published key");
    assert_eq!(jwk.key_use, "sig");

    let mut validation = Validation::new(Algorithm::RS256);
    validation.leeway = 0;
    validation.validate_aud = false;
    validation.set_issuer(&[env.state().config.issuer(TENANT)]);
    let decoded = decode::<Value>(
        &token,
        &DecodingKey::from_rsa_components(&jwk.n, &jwk.e)?,
        &validation,
    )?;
    assert_eq!(decoded.claims["token_type"], "SERVICE_ACCOUNT");

    // The same token stops verifying once it has expired.
    assert!(env.state().verifier.verify(TENANT, &token).await.is_ok());
    env.clock.advance(Duration::seconds(3_601));
    assert!(env.state().verifier.verify(TENANT, &token).await.is_err());
    Ok(())
}

/// JWKS is byte-identical across calls within the cache TTL.
#[tokio::test]
async fn jwks_is_stable_within_cache_ttl() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let uri = format!("/{TENANT}/oidc/jwks");

    let first = env.get(&uri).await?;
    assert_eq!(first.status, StatusCode::OK);

    let rotated = SigningKey::new(
        "k2",
        "root",
        ROTATED_KEY,
        env.clock.now() + Duration::days(180),
    )
    .with_passphrase("correct-horse")
    .with_certificate(ROTATED_CERT);
    env.stores().signing_keys.create(&rotated).await?;

    let second = env.get(&uri).await?;
    assert_eq!(first.body, second.body);

    // Past the TTL the new key is picked up, published with its chain.
    env.clock.advance(Duration::hours(12) + Duration::seconds(1));
    let refreshed: JsonWebKeySet = env.get(&uri).await?.json()?;
    assert_eq!(refreshed.keys.len(), 2);
    let k2 = refreshed.find_key("k2").expect("rotated key published");
    assert!(k2.x5c.as_ref().is_some_and(|chain| !chain.is_empty()));

    // The rotated key expires last, so it now signs.
    let token = service_token(&env).await?;
    assert_eq!(decode_header(&token)?.kid.as_deref(), Some("k2"));
    Ok(())
}

/// With no usable key, issuance fails without producing a token.
#[tokio::test]
async fn no_signing_key_means_no_token() -> anyhow::Result<()> {
    let clock = Arc::new(ManualClock::default());
    let server = Server::with_clock(ServerConfig::for_testing(), clock as SharedClock).await?;
    server.stores().tenants.create(&idp_model::Tenant::new(TENANT)).await?;
    let client = idp_model::Client::with_id("svc", TENANT, idp_model::ClientType::ServiceAccount);
    server.stores().clients.create(&client).await?;

    let err = server
        .state()
        .issuer
        .issue_service_account_token(TENANT, "svc", None)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "server_error");
    assert!(server.state().key_cache.get_current_signing_key().await.is_err());
    Ok(())
}

/// Expired keys stop signing but stay published through the grace window.
#[tokio::test]
async fn expired_key_remains_published_for_grace_window() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let uri = format!("/{TENANT}/oidc/jwks");

    env.clock.advance(Duration::days(91));
    let jwks: JsonWebKeySet = env.get(&uri).await?.json()?;
    assert!(jwks.find_key("k1").is_some());
    assert!(env.state().key_cache.get_current_signing_key().await.is_err());

    env.clock.advance(Duration::days(30));
    let jwks: JsonWebKeySet = env.get(&uri).await?.json()?;
    assert!(jwks.keys.is_empty());
    Ok(())
}

/// Discovery advertises tenant-scoped endpoints.
#[tokio::test]
async fn discovery_document() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let response = env
        .get(&format!("/{TENANT}/.well-known/openid-configuration"))
        .await?;
    assert_eq!(response.status, StatusCode::OK);
    let metadata: Value = response.json()?;
    assert_eq!(metadata["issuer"], "http://localhost:8080/T1");
    assert_eq!(metadata["token_endpoint"], env.token_endpoint());
    assert_eq!(metadata["jwks_uri"], "http://localhost:8080/T1/oidc/jwks");
    assert_eq!(metadata["code_challenge_methods_supported"][0], "S256");

    let unknown = env.get("/ghost/.well-known/openid-configuration").await?;
    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);
    Ok(())
}
