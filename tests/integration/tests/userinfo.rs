//! `UserInfo` and anonymous-user token integration tests.

use axum::http::StatusCode;
use idp_model::Tenant;
use idp_protocol_oidc::types::TokenType;
use serde_json::Value;

use crate::common::{TENANT, TestEnv, basic, bearer};

fn userinfo_uri() -> String {
    format!("/{TENANT}/oidc/userinfo")
}

/// Missing and invalid bearer tokens get distinct structured errors.
#[tokio::test]
async fn userinfo_rejections() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let missing = env.get(&userinfo_uri()).await?;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    let body: Value = missing.json()?;
    assert_eq!(body["error"], "invalid_request");
    assert_eq!(body["error_code"], "ERROR_MISSING_AUTHORIZATION_HEADER");
    assert!(body["timestamp"].is_string());
    assert!(body["trace_id"].is_string());

    let invalid = env
        .get_authorized(&userinfo_uri(), &bearer("not.a.jwt"))
        .await?;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    let body: Value = invalid.json()?;
    assert_eq!(body["error"], "invalid_token");
    assert_eq!(body["error_code"], "ERROR_INVALID_TOKEN");
    Ok(())
}

/// A token from one tenant does not verify under another's issuer.
#[tokio::test]
async fn userinfo_is_tenant_scoped() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let client = env.service_client("svc", &[]).await?;
    let token: Value = env
        .token(&[("grant_type", "client_credentials")], Some(&basic(&client)))
        .await?
        .json()?;
    let access_token = token["access_token"].as_str().unwrap_or_default();

    let own = env
        .get_authorized(&userinfo_uri(), &bearer(access_token))
        .await?;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(own.json::<Value>()?["sub"], "svc");

    let foreign = env
        .get_authorized("/root/oidc/userinfo", &bearer(access_token))
        .await?;
    assert_eq!(foreign.status, StatusCode::BAD_REQUEST);
    Ok(())
}

async fn anonymous_setup(env: &TestEnv, allow: bool, scopes: &[&str]) -> anyhow::Result<String> {
    let tenant = if allow {
        Tenant::new(TENANT).with_anonymous_users()
    } else {
        Tenant::new(TENANT)
    };
    env.stores().tenants.update(&tenant).await?;
    env.web_client().await?;
    let service = env.service_client("svc", scopes).await?;
    let body: Value = env
        .token(&[("grant_type", "client_credentials")], Some(&basic(&service)))
        .await?
        .json()?;
    body["access_token"]
        .as_str()
        .map(ToString::to_string)
        .ok_or_else(|| anyhow::anyhow!("no access token: {body}"))
}

async fn request_anonymous(env: &TestEnv, caller: Option<&str>) -> anyhow::Result<crate::common::TestResponse> {
    let authorization = caller.map(bearer);
    env.post_form(
        &format!("/{TENANT}/oidc/anonymous-token"),
        &[("client_id", "C1")],
        authorization.as_deref(),
    )
    .await
}

/// A service account with `anonymous_user.create` mints anonymous tokens.
#[tokio::test]
async fn anonymous_token_issued() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let caller = anonymous_setup(&env, true, &["anonymous_user.create"]).await?;

    let response = request_anonymous(&env, Some(&caller)).await?;
    assert_eq!(response.status, StatusCode::OK);
    let body: Value = response.json()?;
    assert!(body.get("refresh_token").is_none());
    assert_eq!(body["expires_in"], 3_600);

    let token = body["access_token"].as_str().unwrap_or_default();
    let claims = env.state().verifier.verify(TENANT, token).await?;
    assert_eq!(claims.token_type, TokenType::AnonymousUser);
    assert_eq!(claims.client_id, "C1");
    assert_ne!(claims.sub, "svc");

    let second: Value = request_anonymous(&env, Some(&caller)).await?.json()?;
    let second_claims = env
        .state()
        .verifier
        .verify(TENANT, second["access_token"].as_str().unwrap_or_default())
        .await?;
    assert_ne!(claims.sub, second_claims.sub);
    Ok(())
}

/// Tenant opt-in, caller scope, and a bearer token are all required.
#[tokio::test]
async fn anonymous_token_rejections() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let caller = anonymous_setup(&env, false, &["anonymous_user.create"]).await?;
    let response = request_anonymous(&env, Some(&caller)).await?;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()?["error"], "unauthorized_client");

    let env = TestEnv::new().await?;
    let caller = anonymous_setup(&env, true, &["orders.read"]).await?;
    let response = request_anonymous(&env, Some(&caller)).await?;
    assert_eq!(response.json::<Value>()?["error"], "unauthorized_client");

    let response = request_anonymous(&env, None).await?;
    assert_eq!(response.json::<Value>()?["error"], "invalid_request");
    Ok(())
}
