//! Token endpoint and revocation integration tests.

use axum::http::{StatusCode, header};
use serde::Deserialize;
use serde_json::Value;

use crate::common::{CODE_VERIFIER, REDIRECT_URI, TENANT, TestEnv, basic, bearer};

/// Token response from token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
    pub scope: Option<String>,
}

/// Error response.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_description: Option<String>,
}

/// Tests the authorization code flow end-to-end, including `UserInfo`.
#[tokio::test]
async fn authorization_code_flow() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let client = env.web_client().await?;
    env.add_user("u1").await?;

    let code = env.authorization_code("u1").await?;
    let response = env
        .token(
            &[
                ("grant_type", "authorization_code"),
                ("code", &code),
                ("redirect_uri", REDIRECT_URI),
                ("code_verifier", CODE_VERIFIER),
            ],
            Some(&basic(&client)),
        )
        .await?;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.headers[header::CACHE_CONTROL], "no-store");
    let token: TokenResponse = response.json()?;
    assert_eq!(token.token_type, "Bearer");
    assert_eq!(token.expires_in, 3_600);
    assert_eq!(token.scope.as_deref(), Some("openid profile email"));
    assert!(token.id_token.is_some());
    let refresh_token = token.refresh_token.expect("refresh token for C1");
    assert_eq!(refresh_token.len(), 64);

    let userinfo = env
        .get_authorized(
            &format!("/{TENANT}/oidc/userinfo"),
            &bearer(&token.access_token),
        )
        .await?;
    assert_eq!(userinfo.status, StatusCode::OK);
    let body: Value = userinfo.json()?;
    assert_eq!(body["sub"], "u1");
    assert_eq!(body["name"], "Ada Lovelace");
    assert_eq!(body["email"], "ada@example.com");

    Ok(())
}

/// A code is single use, even after a successful redemption.
#[tokio::test]
async fn authorization_code_is_single_use() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let client = env.web_client().await?;
    env.add_user("u1").await?;

    let code = env.authorization_code("u1").await?;
    let form = [
        ("grant_type", "authorization_code"),
        ("code", code.as_str()),
        ("redirect_uri", REDIRECT_URI),
        ("code_verifier", CODE_VERIFIER),
    ];

    let first = env.token(&form, Some(&basic(&client))).await?;
    assert_eq!(first.status, StatusCode::OK);

    let second = env.token(&form, Some(&basic(&client))).await?;
    assert_eq!(second.status, StatusCode::BAD_REQUEST);
    let error: ErrorResponse = second.json()?;
    assert_eq!(error.error, "invalid_grant");

    Ok(())
}

/// A wrong verifier fails, and the code cannot be retried.
#[tokio::test]
async fn wrong_code_verifier_is_rejected() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let client = env.web_client().await?;
    env.add_user("u1").await?;

    let code = env.authorization_code("u1").await?;
    let wrong = "x".repeat(43);
    let response = env
        .token(
            &[
                ("grant_type", "authorization_code"),
                ("code", &code),
                ("redirect_uri", REDIRECT_URI),
                ("code_verifier", &wrong),
            ],
            Some(&basic(&client)),
        )
        .await?;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<ErrorResponse>()?.error, "invalid_grant");

    let retry = env
        .token(
            &[
                ("grant_type", "authorization_code"),
                ("code", &code),
                ("redirect_uri", REDIRECT_URI),
                ("code_verifier", CODE_VERIFIER),
            ],
            Some(&basic(&client)),
        )
        .await?;
    assert_eq!(retry.status, StatusCode::BAD_REQUEST);

    Ok(())
}

/// Wrong secret is an authentication failure; no secret is `invalid_client`.
#[tokio::test]
async fn client_authentication_is_required() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let mut client = env.service_client("svc", &["orders.read"]).await?;

    let missing = env
        .token(&[("grant_type", "client_credentials")], None)
        .await?;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    let error: ErrorResponse = missing.json()?;
    assert_eq!(error.error, "invalid_client");
    assert!(error.error_description.is_some());

    client.client_secret = "0".repeat(64);
    let wrong = env
        .token(&[("grant_type", "client_credentials")], Some(&basic(&client)))
        .await?;
    assert_eq!(wrong.status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong.json::<ErrorResponse>()?.error, "unauthorized_client");

    Ok(())
}

/// Client credentials with `client_secret_post`.
#[tokio::test]
async fn client_credentials_flow() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let client = env
        .service_client("svc", &["orders.read", "orders.write"])
        .await?;

    let response = env
        .token(
            &[
                ("grant_type", "client_credentials"),
                ("client_id", "svc"),
                ("client_secret", &client.client_secret),
                ("scope", "orders.read"),
            ],
            None,
        )
        .await?;

    assert_eq!(response.status, StatusCode::OK);
    let token: TokenResponse = response.json()?;
    assert_eq!(token.scope.as_deref(), Some("orders.read"));
    assert!(token.refresh_token.is_none());
    assert!(token.id_token.is_none());

    let claims = env
        .state()
        .verifier
        .verify(TENANT, &token.access_token)
        .await?;
    assert_eq!(claims.sub, "svc");

    let denied = env
        .token(
            &[
                ("grant_type", "client_credentials"),
                ("client_id", "svc"),
                ("client_secret", &client.client_secret),
                ("scope", "orders.delete"),
            ],
            None,
        )
        .await?;
    assert_eq!(denied.json::<ErrorResponse>()?.error, "invalid_scope");

    Ok(())
}

/// Unknown grant types are rejected after authentication.
#[tokio::test]
async fn unsupported_grant_type() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let client = env.web_client().await?;

    let response = env
        .token(&[("grant_type", "password")], Some(&basic(&client)))
        .await?;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<ErrorResponse>()?.error,
        "unsupported_grant_type"
    );
    Ok(())
}

async fn first_refresh_token(env: &TestEnv) -> anyhow::Result<(idp_model::Client, String)> {
    let client = env.web_client().await?;
    env.add_user("u1").await?;
    let code = env.authorization_code("u1").await?;
    let token: TokenResponse = env
        .token(
            &[
                ("grant_type", "authorization_code"),
                ("code", &code),
                ("redirect_uri", REDIRECT_URI),
                ("code_verifier", CODE_VERIFIER),
            ],
            Some(&basic(&client)),
        )
        .await?
        .json()?;
    let refresh = token
        .refresh_token
        .ok_or_else(|| anyhow::anyhow!("no refresh token"))?;
    Ok((client, refresh))
}

/// Refresh rotates the token until the redemption limit is reached.
#[tokio::test]
async fn refresh_token_rotation_and_limit() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let (client, mut refresh) = first_refresh_token(&env).await?;

    // C1 allows three redemptions; the third returns no new refresh token.
    for redemption in 1..=3 {
        let response = env
            .token(
                &[("grant_type", "refresh_token"), ("refresh_token", &refresh)],
                Some(&basic(&client)),
            )
            .await?;
        assert_eq!(response.status, StatusCode::OK);
        let token: TokenResponse = response.json()?;
        if redemption < 3 {
            let next = token.refresh_token.expect("rotated refresh token");
            assert_ne!(next, refresh);
            refresh = next;
        } else {
            assert!(token.refresh_token.is_none());
        }
    }

    Ok(())
}

/// Lowering the client's limit invalidates outstanding grants past it.
#[tokio::test]
async fn refresh_beyond_lowered_limit_is_rejected() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let (client, refresh) = first_refresh_token(&env).await?;
    let token: TokenResponse = env
        .token(
            &[("grant_type", "refresh_token"), ("refresh_token", &refresh)],
            Some(&basic(&client)),
        )
        .await?
        .json()?;
    let second = token.refresh_token.expect("rotated refresh token");

    let lowered = client.clone().with_max_refresh_token_count(1);
    env.stores().clients.update(&lowered).await?;

    let response = env
        .token(
            &[("grant_type", "refresh_token"), ("refresh_token", &second)],
            Some(&basic(&client)),
        )
        .await?;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<ErrorResponse>()?.error, "invalid_grant");

    Ok(())
}

/// A redeemed refresh token cannot be replayed.
#[tokio::test]
async fn refresh_token_is_single_use() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let (client, refresh) = first_refresh_token(&env).await?;
    let form = [("grant_type", "refresh_token"), ("refresh_token", refresh.as_str())];

    assert_eq!(
        env.token(&form, Some(&basic(&client))).await?.status,
        StatusCode::OK
    );
    let replay = env.token(&form, Some(&basic(&client))).await?;
    assert_eq!(replay.json::<ErrorResponse>()?.error, "invalid_grant");

    Ok(())
}

/// Revocation removes the grant for the user and client only.
#[tokio::test]
async fn revocation_removes_grant() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let (client, refresh) = first_refresh_token(&env).await?;
    let revoke_uri = format!("/{TENANT}/oidc/revoke");

    let response = env
        .post_form(&revoke_uri, &[("token", &refresh)], Some(&basic(&client)))
        .await?;
    assert_eq!(response.status, StatusCode::OK);
    assert!(env.stores().refresh.find(&refresh).await?.is_none());

    let refused = env
        .token(
            &[("grant_type", "refresh_token"), ("refresh_token", &refresh)],
            Some(&basic(&client)),
        )
        .await?;
    assert_eq!(refused.json::<ErrorResponse>()?.error, "invalid_grant");

    // Unknown tokens are accepted silently.
    let unknown = env
        .post_form(&revoke_uri, &[("token", "not-a-token")], Some(&basic(&client)))
        .await?;
    assert_eq!(unknown.status, StatusCode::OK);

    Ok(())
}

/// Another client cannot revoke a grant it does not own.
#[tokio::test]
async fn revocation_by_other_client_is_rejected() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let (_, refresh) = first_refresh_token(&env).await?;
    let other = env.service_client("svc", &[]).await?;

    let response = env
        .post_form(
            &format!("/{TENANT}/oidc/revoke"),
            &[("token", &refresh)],
            Some(&basic(&other)),
        )
        .await?;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<ErrorResponse>()?.error, "unauthorized_client");
    assert!(env.stores().refresh.find(&refresh).await?.is_some());
    Ok(())
}
