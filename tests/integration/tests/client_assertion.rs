//! Client assertion (`client_secret_jwt`) integration tests.

use axum::http::StatusCode;
use chrono::Duration;
use idp_core::Clock;
use idp_model::Client;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::{Value, json};

use crate::common::{TestEnv, TestResponse};

const ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

fn claims(env: &TestEnv, client_id: &str, jti: &str) -> Value {
    json!({
        "iss": client_id,
        "sub": client_id,
        "aud": env.token_endpoint(),
        "exp": (env.clock.now() + Duration::minutes(5)).timestamp(),
        "jti": jti,
    })
}

fn sign(claims: &Value, secret: &str) -> String {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("assertion encodes")
}

async fn present(env: &TestEnv, assertion: &str) -> anyhow::Result<TestResponse> {
    env.token(
        &[
            ("grant_type", "client_credentials"),
            ("client_assertion_type", ASSERTION_TYPE),
            ("client_assertion", assertion),
        ],
        None,
    )
    .await
}

async fn service(env: &TestEnv) -> anyhow::Result<Client> {
    env.service_client("svc", &["orders.read"]).await
}

/// A signed assertion authenticates the client once.
#[tokio::test]
async fn assertion_authenticates_once() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let client = service(&env).await?;
    let assertion = sign(&claims(&env, "svc", "jti-1"), &client.client_secret);

    let first = present(&env, &assertion).await?;
    assert_eq!(first.status, StatusCode::OK);
    let body: Value = first.json()?;
    assert!(body["access_token"].is_string());

    let replay = present(&env, &assertion).await?;
    assert_eq!(replay.status, StatusCode::BAD_REQUEST);
    assert_eq!(replay.json::<Value>()?["error"], "unauthorized_client");
    Ok(())
}

/// After a valid assertion, any token reusing its `jti` is rejected.
#[tokio::test]
async fn reused_jti_is_rejected_whatever_the_signature() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let client = service(&env).await?;

    let valid = sign(&claims(&env, "svc", "X"), &client.client_secret);
    assert_eq!(present(&env, &valid).await?.status, StatusCode::OK);

    // A different, freshly signed assertion with the same jti.
    let mut fresh = claims(&env, "svc", "X");
    fresh["exp"] = json!((env.clock.now() + Duration::minutes(10)).timestamp());
    let resigned = sign(&fresh, &client.client_secret);
    assert_eq!(present(&env, &resigned).await?.status, StatusCode::BAD_REQUEST);

    let forged = sign(&claims(&env, "svc", "X"), "not-the-secret");
    assert_eq!(present(&env, &forged).await?.status, StatusCode::BAD_REQUEST);
    Ok(())
}

/// A forged assertion burns its `jti` for the genuine client.
#[tokio::test]
async fn forged_assertion_burns_jti() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let client = service(&env).await?;

    let forged = sign(&claims(&env, "svc", "captured"), "guess");
    assert_eq!(present(&env, &forged).await?.status, StatusCode::BAD_REQUEST);
    assert!(
        env.stores()
            .client_auth_history
            .find("captured")
            .await?
            .is_some()
    );

    let genuine = sign(&claims(&env, "svc", "captured"), &client.client_secret);
    assert_eq!(present(&env, &genuine).await?.status, StatusCode::BAD_REQUEST);
    Ok(())
}

/// Claim checks reject before any history is written.
#[tokio::test]
async fn claim_checks() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let client = service(&env).await?;

    let mut wrong_aud = claims(&env, "svc", "a1");
    wrong_aud["aud"] = json!("https://elsewhere.example.com/token");
    let mut expired = claims(&env, "svc", "a2");
    expired["exp"] = json!((env.clock.now() - Duration::seconds(1)).timestamp());
    let mut mismatched = claims(&env, "svc", "a3");
    mismatched["iss"] = json!("someone-else");
    let mut no_jti = claims(&env, "svc", "a4");
    no_jti.as_object_mut().map(|c| c.remove("jti"));

    for (name, bad) in [
        ("aud", wrong_aud),
        ("exp", expired),
        ("iss", mismatched),
        ("jti", no_jti),
    ] {
        let response = present(&env, &sign(&bad, &client.client_secret)).await?;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "claim {name}");
    }

    for jti in ["a1", "a2", "a3"] {
        assert!(env.stores().client_auth_history.find(jti).await?.is_none());
    }
    Ok(())
}

/// Only one authentication method per request.
#[tokio::test]
async fn assertion_with_secret_is_ambiguous() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let client = service(&env).await?;
    let assertion = sign(&claims(&env, "svc", "m1"), &client.client_secret);

    let response = env
        .token(
            &[
                ("grant_type", "client_credentials"),
                ("client_id", "svc"),
                ("client_secret", &client.client_secret),
                ("client_assertion_type", ASSERTION_TYPE),
                ("client_assertion", &assertion),
            ],
            None,
        )
        .await?;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()?["error"], "invalid_request");
    Ok(())
}

/// An `exp` past the representable date range is never accepted.
#[tokio::test]
async fn far_future_exp_cannot_be_replayed() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let client = service(&env).await?;
    let mut far = claims(&env, "svc", "far-future");
    far["exp"] = json!(9_000_000_000_000_i64);
    let assertion = sign(&far, &client.client_secret);

    for _ in 0..2 {
        let response = present(&env, &assertion).await?;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()?["error"], "unauthorized_client");
    }
    Ok(())
}
