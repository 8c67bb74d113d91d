//! `OpenID` Connect Discovery 1.0 implementation.
//!
//! Implements the `OpenID` Provider Metadata as defined in:
//! - [OpenID Connect Discovery 1.0](https://openid.net/specs/openid-connect-discovery-1_0.html)
//! - [RFC 8414](https://tools.ietf.org/html/rfc8414) (OAuth 2.0 Authorization Server Metadata)

use idp_core::Config;
use idp_model::ResponseMode;
use serde::{Deserialize, Serialize};

use crate::client_auth::ClientAuthMethod;
use crate::scope::STANDARD_SCOPES;
use crate::types::{GrantType, PKCE_METHOD_S256, RESPONSE_TYPE_CODE};

/// `OpenID` Provider Metadata.
///
/// This is returned by the `.well-known/openid-configuration` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMetadata {
    // === Required Fields ===
    /// URL of the authorization server's issuer identifier.
    pub issuer: String,

    /// URL of the authorization endpoint.
    pub authorization_endpoint: String,

    /// URL of the token endpoint.
    pub token_endpoint: String,

    /// URL of the JSON Web Key Set document.
    pub jwks_uri: String,

    /// List of supported response types.
    pub response_types_supported: Vec<String>,

    /// List of supported subject types.
    pub subject_types_supported: Vec<String>,

    /// List of supported signing algorithms for ID tokens.
    pub id_token_signing_alg_values_supported: Vec<String>,

    // === Recommended Fields ===
    /// URL of the `UserInfo` endpoint.
    pub userinfo_endpoint: String,

    /// List of supported scopes.
    pub scopes_supported: Vec<String>,

    /// List of supported response modes.
    pub response_modes_supported: Vec<ResponseMode>,

    /// List of supported grant types.
    pub grant_types_supported: Vec<String>,

    // === Token Endpoint Auth ===
    /// List of supported client authentication methods for token endpoint.
    pub token_endpoint_auth_methods_supported: Vec<String>,

    /// List of supported signing algorithms for client assertions.
    pub token_endpoint_auth_signing_alg_values_supported: Vec<String>,

    /// List of supported claims.
    pub claims_supported: Vec<String>,

    // === Additional Endpoints ===
    /// URL of the token revocation endpoint.
    pub revocation_endpoint: String,

    /// Supported auth methods for revocation endpoint.
    pub revocation_endpoint_auth_methods_supported: Vec<String>,

    // === PKCE ===
    /// Supported code challenge methods.
    pub code_challenge_methods_supported: Vec<String>,
}

fn strings<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    values.into_iter().map(String::from).collect()
}

/// Returns supported OIDC claims.
fn supported_claims() -> Vec<String> {
    strings([
        "sub", "iss", "aud", "exp", "iat", "jti", "name", "given_name", "middle_name",
        "family_name", "email", "email_verified", "phone_number", "phone_number_verified",
        "address", "locale", "scope", "tenant_id", "client_id", "token_type",
    ])
}

/// Returns supported client auth methods.
fn client_auth_methods() -> Vec<String> {
    strings(
        [
            ClientAuthMethod::ClientSecretBasic,
            ClientAuthMethod::ClientSecretPost,
            ClientAuthMethod::ClientSecretJwt,
        ]
        .iter()
        .map(ClientAuthMethod::as_str),
    )
}

/// Builder for creating `ProviderMetadata`.
#[derive(Debug, Clone)]
pub struct ProviderMetadataBuilder {
    issuer: String,
    token_endpoint: String,
}

impl ProviderMetadataBuilder {
    /// Creates a builder for one tenant.
    #[must_use]
    pub fn new(config: &Config, tenant_id: &str) -> Self {
        Self {
            issuer: config.issuer(tenant_id),
            token_endpoint: config.token_endpoint(tenant_id),
        }
    }

    /// Builds the provider metadata.
    #[must_use]
    pub fn build(&self) -> ProviderMetadata {
        let protocol_url = format!("{}/oidc", self.issuer);

        ProviderMetadata {
            issuer: self.issuer.clone(),
            authorization_endpoint: format!("{protocol_url}/authorize"),
            token_endpoint: self.token_endpoint.clone(),
            jwks_uri: format!("{protocol_url}/jwks"),
            response_types_supported: strings([RESPONSE_TYPE_CODE]),
            subject_types_supported: strings(["public"]),
            id_token_signing_alg_values_supported: strings(["RS256"]),
            userinfo_endpoint: format!("{protocol_url}/userinfo"),
            scopes_supported: strings(STANDARD_SCOPES),
            response_modes_supported: vec![ResponseMode::Query, ResponseMode::Fragment],
            grant_types_supported: GrantType::ALL.iter().map(ToString::to_string).collect(),
            token_endpoint_auth_methods_supported: client_auth_methods(),
            token_endpoint_auth_signing_alg_values_supported: strings(["HS256"]),
            claims_supported: supported_claims(),
            revocation_endpoint: format!("{protocol_url}/revoke"),
            revocation_endpoint_auth_methods_supported: client_auth_methods(),
            code_challenge_methods_supported: strings([PKCE_METHOD_S256]),
        }
    }
}
