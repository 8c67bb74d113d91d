//! Authorization endpoint integration tests.

use axum::http::{StatusCode, header};
use chrono::Duration;
use idp_core::Clock;
use idp_model::{Client, ClientType};

use crate::common::{
    CODE_CHALLENGE, LOGIN_URL, REDIRECT_URI, TENANT, TestEnv, authorize_uri,
};

fn base_request<'a>() -> Vec<(&'a str, &'a str)> {
    vec![
        ("client_id", "C1"),
        ("redirect_uri", REDIRECT_URI),
        ("scope", "openid profile"),
        ("response_type", "code"),
        ("state", "s-123"),
    ]
}

/// Valid request without PKCE: the login surface receives only the handle.
#[tokio::test]
async fn valid_request_creates_pre_authentication_state() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    env.web_client().await?;

    let response = env.get(&authorize_uri(&base_request())).await?;

    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.headers[header::CACHE_CONTROL], "no-store");
    let location = response.location()?;
    assert!(location.as_str().starts_with(LOGIN_URL));

    let params = response.location_params()?;
    assert_eq!(params.len(), 3);
    assert_eq!(params["tenant_id"], TENANT);
    assert_eq!(params["redirect_uri"], REDIRECT_URI);
    let token = &params["preauth_token"];
    assert_eq!(token.len(), 64);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));

    let state = env
        .stores()
        .pre_auth
        .find(token)
        .await?
        .expect("pre-authentication state persisted");
    assert_eq!(state.client_id, "C1");
    assert_eq!(state.scope, "openid profile");
    assert_eq!(state.state.as_deref(), Some("s-123"));
    assert_eq!(state.expires_at - state.created_at, Duration::minutes(5));
    assert_eq!(state.created_at, env.clock.now());

    Ok(())
}

/// Two identical requests produce distinct handles.
#[tokio::test]
async fn pre_authentication_tokens_are_unique() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    env.web_client().await?;

    let first = env.get(&authorize_uri(&base_request())).await?;
    let second = env.get(&authorize_uri(&base_request())).await?;

    assert_ne!(
        first.location_params()?["preauth_token"],
        second.location_params()?["preauth_token"]
    );
    Ok(())
}

/// Pre-authentication state is gone after five minutes.
#[tokio::test]
async fn pre_authentication_state_expires() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    env.web_client().await?;

    let response = env.get(&authorize_uri(&base_request())).await?;
    let token = response.location_params()?["preauth_token"].clone();

    env.clock.advance(Duration::minutes(5) + Duration::seconds(1));

    assert!(env.stores().pre_auth.find(&token).await?.is_none());
    assert!(env.state().codes.complete_login(&token, "u1").await.is_err());
    Ok(())
}

/// `code_challenge` without a method is rejected.
#[tokio::test]
async fn challenge_without_method_is_rejected() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    env.web_client().await?;

    let mut request = base_request();
    request.push(("code_challenge", "abc"));
    let response = env.get(&authorize_uri(&request)).await?;

    assert_eq!(response.status, StatusCode::FOUND);
    let params = response.location_params()?;
    assert_eq!(
        params["error_code"],
        "ERROR_INVALID_CODE_CHALLENGE_PARAMETERS_MISSING_ONE_OR_MORE"
    );
    assert_eq!(params["error"], "invalid_request");
    assert_eq!(params["client_id"], "C1");
    assert_eq!(params["state"], "s-123");
    assert!(!params.contains_key("code_challenge"));
    assert!(!params.contains_key("preauth_token"));
    Ok(())
}

/// A method without a challenge is rejected the same way.
#[tokio::test]
async fn method_without_challenge_is_rejected() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    env.web_client().await?;

    let mut request = base_request();
    request.push(("code_challenge_method", "S256"));
    let response = env.get(&authorize_uri(&request)).await?;

    assert_eq!(
        response.location_params()?["error_code"],
        "ERROR_INVALID_CODE_CHALLENGE_PARAMETERS_MISSING_ONE_OR_MORE"
    );
    Ok(())
}

/// Only `S256` is accepted.
#[tokio::test]
async fn plain_challenge_method_is_rejected() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    env.web_client().await?;

    for method in ["plain", "s256", "RS256"] {
        let mut request = base_request();
        request.push(("code_challenge", CODE_CHALLENGE));
        request.push(("code_challenge_method", method));
        let response = env.get(&authorize_uri(&request)).await?;

        assert_eq!(
            response.location_params()?["error_code"],
            "ERROR_INVALID_CODE_CHALLENGE_METHOD",
            "method {method}"
        );
    }
    Ok(())
}

/// PKCE parameters on a client without PKCE.
#[tokio::test]
async fn pkce_on_client_without_pkce_is_rejected() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    env.add_client(
        Client::with_id("C2", TENANT, ClientType::Standard).with_redirect_uri(REDIRECT_URI),
    )
    .await?;

    let response = env
        .get(&authorize_uri(&[
            ("client_id", "C2"),
            ("redirect_uri", REDIRECT_URI),
            ("scope", "openid"),
            ("response_type", "code"),
            ("code_challenge", CODE_CHALLENGE),
            ("code_challenge_method", "S256"),
        ]))
        .await?;

    let params = response.location_params()?;
    assert_eq!(params["error_code"], "ERROR_PKCE_NOT_ENABLED_FOR_CLIENT");
    assert_eq!(params["error"], "unauthorized_client");
    Ok(())
}

/// Service accounts cannot use the authorization code flow.
#[tokio::test]
async fn service_account_client_is_rejected() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    env.add_client(
        Client::with_id("svc", TENANT, ClientType::ServiceAccount).with_redirect_uri(REDIRECT_URI),
    )
    .await?;

    let response = env
        .get(&authorize_uri(&[
            ("client_id", "svc"),
            ("redirect_uri", REDIRECT_URI),
            ("scope", "openid"),
            ("response_type", "code"),
        ]))
        .await?;

    assert_eq!(
        response.location_params()?["error_code"],
        "ERROR_CLIENT_NOT_ENABLED_FOR_SSO"
    );
    Ok(())
}

/// Unknown, foreign, and disabled clients share one error code.
#[tokio::test]
async fn client_lookup_failures_are_indistinguishable() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    env.add_client(
        Client::with_id("off", TENANT, ClientType::Standard)
            .with_redirect_uri(REDIRECT_URI)
            .with_enabled(false),
    )
    .await?;
    env.add_client(Client::with_id("elsewhere", "root", ClientType::Standard).with_redirect_uri(REDIRECT_URI))
        .await?;

    for client_id in ["missing", "off", "elsewhere"] {
        let response = env
            .get(&authorize_uri(&[
                ("client_id", client_id),
                ("redirect_uri", REDIRECT_URI),
                ("scope", "openid"),
                ("response_type", "code"),
            ]))
            .await?;

        assert_eq!(
            response.location_params()?["error_code"],
            "ERROR_INVALID_CLIENT",
            "client {client_id}"
        );
    }
    Ok(())
}

/// Validation is ordered: scope, then response type, then tenant.
#[tokio::test]
async fn earlier_checks_win() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let response = env
        .get(&authorize_uri(&[("client_id", "C1"), ("response_type", "token")]))
        .await?;
    assert_eq!(response.location_params()?["error_code"], "ERROR_MISSING_SCOPE");

    let response = env
        .get(&authorize_uri(&[
            ("client_id", "C1"),
            ("scope", "openid"),
            ("response_type", "token"),
        ]))
        .await?;
    assert_eq!(
        response.location_params()?["error_code"],
        "ERROR_UNSUPPORTED_RESPONSE_TYPE"
    );

    let response = env
        .get("/nope/oidc/authorize?client_id=C1&scope=openid&response_type=code")
        .await?;
    assert_eq!(response.location_params()?["error_code"], "ERROR_INVALID_TENANT");
    Ok(())
}

/// Redirect URIs match exactly, except loopback ports.
#[tokio::test]
async fn redirect_uri_matching() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    env.add_client(
        Client::with_id("native", TENANT, ClientType::Standard)
            .with_redirect_uri("http://127.0.0.1/callback")
            .with_redirect_uri(REDIRECT_URI),
    )
    .await?;

    let request = |redirect_uri: &'static str| {
        authorize_uri(&[
            ("client_id", "native"),
            ("redirect_uri", redirect_uri),
            ("scope", "openid"),
            ("response_type", "code"),
        ])
    };

    let response = env.get(&request("http://127.0.0.1:53111/callback")).await?;
    assert!(response.location_params()?.contains_key("preauth_token"));

    for bad in ["https://app/cb/", "https://app/cb?x=1", "http://127.0.0.1:53111/other"] {
        let response = env.get(&request(bad)).await?;
        assert_eq!(
            response.location_params()?["error_code"],
            "ERROR_INVALID_REDIRECT_URI",
            "redirect {bad}"
        );
    }
    Ok(())
}

/// Unknown scopes are rejected.
#[tokio::test]
async fn unknown_scope_is_rejected() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    env.web_client().await?;

    let response = env
        .get(&authorize_uri(&[
            ("client_id", "C1"),
            ("redirect_uri", REDIRECT_URI),
            ("scope", "openid admin"),
            ("response_type", "code"),
        ]))
        .await?;

    let params = response.location_params()?;
    assert_eq!(params["error_code"], "ERROR_INVALID_SCOPE");
    assert_eq!(params["error"], "invalid_scope");
    Ok(())
}
