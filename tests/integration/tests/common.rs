//! Common test utilities and fixtures.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use idp_core::{ManualClock, SharedClock};
use idp_model::{Client, ClientScopeRel, Tenant, User};
use idp_protocol_oidc::OidcState;
use idp_server::{Server, ServerConfig};
use idp_storage::Stores;
use serde::de::DeserializeOwned;
use tower::ServiceExt;
use url::Url;

/// Login surface the authorization endpoint redirects to.
pub const LOGIN_URL: &str = "https://login.example.com/signin";

/// Tenant every test works in.
pub const TENANT: &str = "T1";

/// Registered redirect URI of the standard web client.
pub const REDIRECT_URI: &str = "https://app/cb";

/// RFC 7636 appendix B verifier and its `S256` challenge.
pub const CODE_VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
pub const CODE_CHALLENGE: &str = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";

fn testdata(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../testdata")
        .join(name)
}

/// A captured HTTP response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Parses the `Location` header.
    pub fn location(&self) -> anyhow::Result<Url> {
        let location = self
            .headers
            .get(header::LOCATION)
            .ok_or_else(|| anyhow::anyhow!("no Location header"))?;
        Ok(Url::parse(location.to_str()?)?)
    }

    /// Returns the `Location` query parameters.
    pub fn location_params(&self) -> anyhow::Result<HashMap<String, String>> {
        Ok(self.location()?.query_pairs().into_owned().collect())
    }
}

/// Test environment: a server over in-memory stores and a manual clock.
///
/// The store holds tenant `T1`, the root tenant, and signing key `k1`
/// loaded from `testdata/`.
pub struct TestEnv {
    pub server: Server,
    pub clock: Arc<ManualClock>,
    router: Router,
}

impl TestEnv {
    /// Creates a new test environment.
    pub async fn new() -> anyhow::Result<Self> {
        let config = ServerConfig {
            login_url: LOGIN_URL.to_string(),
            signing_key_id: "k1".to_string(),
            signing_key_file: Some(testdata("signing_key.pem")),
            signing_public_key_file: Some(testdata("signing_key.pub.pem")),
            ..ServerConfig::for_testing()
        };
        let clock = Arc::new(ManualClock::default());
        let server = Server::with_clock(config, Arc::clone(&clock) as SharedClock).await?;
        server.stores().tenants.create(&Tenant::new(TENANT)).await?;
        let router = server.test_router();

        Ok(Self {
            server,
            clock,
            router,
        })
    }

    pub fn stores(&self) -> &Stores {
        self.server.stores()
    }

    pub fn state(&self) -> &OidcState {
        self.server.state()
    }

    /// Stores a client and returns it (with its generated secret).
    pub async fn add_client(&self, client: Client) -> anyhow::Result<Client> {
        self.stores().clients.create(&client).await?;
        Ok(client)
    }

    /// Registers the standard web client `C1` with PKCE and refresh tokens.
    pub async fn web_client(&self) -> anyhow::Result<Client> {
        self.add_client(
            Client::with_id("C1", TENANT, idp_model::ClientType::Standard)
                .with_redirect_uri(REDIRECT_URI)
                .with_pkce()
                .with_max_refresh_token_count(3),
        )
        .await
    }

    /// Registers a service-account client holding the given scopes.
    pub async fn service_client(&self, client_id: &str, scopes: &[&str]) -> anyhow::Result<Client> {
        let client = self
            .add_client(Client::with_id(
                client_id,
                TENANT,
                idp_model::ClientType::ServiceAccount,
            ))
            .await?;
        for scope in scopes {
            self.stores()
                .scopes
                .grant(&ClientScopeRel::new(TENANT, client_id, *scope))
                .await?;
        }
        Ok(client)
    }

    /// Stores an enabled end user.
    pub async fn add_user(&self, user_id: &str) -> anyhow::Result<User> {
        let user = User::new(TENANT, user_id)
            .with_name("Ada", "Lovelace")
            .with_email("ada@example.com");
        self.stores().users.create(&user).await?;
        Ok(user)
    }

    /// Returns the token endpoint URL clients use as assertion `aud`.
    pub fn token_endpoint(&self) -> String {
        self.state().config.token_endpoint(TENANT)
    }

    async fn send(&self, request: Request<Body>) -> anyhow::Result<TestResponse> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        Ok(TestResponse {
            status,
            headers,
            body,
        })
    }

    /// Sends a GET request.
    pub async fn get(&self, uri: &str) -> anyhow::Result<TestResponse> {
        self.send(Request::get(uri).body(Body::empty())?).await
    }

    /// Sends a GET request with an `Authorization` header.
    pub async fn get_authorized(&self, uri: &str, authorization: &str) -> anyhow::Result<TestResponse> {
        self.send(
            Request::get(uri)
                .header(header::AUTHORIZATION, authorization)
                .body(Body::empty())?,
        )
        .await
    }

    /// Sends a form-encoded POST request.
    pub async fn post_form(
        &self,
        uri: &str,
        form: &[(&str, &str)],
        authorization: Option<&str>,
    ) -> anyhow::Result<TestResponse> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(form)
            .finish();
        let mut request = Request::post(uri).header(
            header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        );
        if let Some(authorization) = authorization {
            request = request.header(header::AUTHORIZATION, authorization);
        }
        self.send(request.body(Body::from(body))?).await
    }

    /// Sends a token request.
    pub async fn token(
        &self,
        form: &[(&str, &str)],
        authorization: Option<&str>,
    ) -> anyhow::Result<TestResponse> {
        self.post_form(&format!("/{TENANT}/oidc/token"), form, authorization)
            .await
    }

    /// Runs the authorization endpoint and login completion for `C1`,
    /// returning the issued authorization code.
    pub async fn authorization_code(&self, user_id: &str) -> anyhow::Result<String> {
        let response = self.get(&authorize_uri(&[
            ("client_id", "C1"),
            ("redirect_uri", REDIRECT_URI),
            ("scope", "openid profile email"),
            ("response_type", "code"),
            ("state", "xyz"),
            ("code_challenge", CODE_CHALLENGE),
            ("code_challenge_method", "S256"),
        ]))
        .await?;
        anyhow::ensure!(response.status == StatusCode::FOUND, "authorize failed");
        let preauth = response
            .location_params()?
            .remove("preauth_token")
            .ok_or_else(|| anyhow::anyhow!("no preauth_token"))?;

        let redirect = self.state().codes.complete_login(&preauth, user_id).await?;
        redirect
            .query_pairs()
            .find(|(k, _)| k == "code")
            .map(|(_, v)| v.into_owned())
            .ok_or_else(|| anyhow::anyhow!("no code in client redirect"))
    }
}

/// Builds an authorization endpoint URI for tenant `T1`.
pub fn authorize_uri(params: &[(&str, &str)]) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();
    format!("/{TENANT}/oidc/authorize?{query}")
}

/// Builds a `client_secret_basic` header value.
pub fn basic(client: &Client) -> String {
    let raw = format!("{}:{}", client.client_id, client.client_secret);
    format!("Basic {}", STANDARD.encode(raw))
}

/// Builds a bearer header value.
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
