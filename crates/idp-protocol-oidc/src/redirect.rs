//! Redirect URL construction.
//!
//! Authorization failures are reported to the user agent as a 302 to the
//! login surface, never as an error body. These functions are pure so the
//! mapping from request context and error code to URL can be tested on its
//! own.

use idp_model::ResponseMode;
use url::Url;
use url::form_urlencoded;

use crate::error::{OidcError, OidcResult};
use crate::request::AuthorizationRequest;

/// Stable authorization failure codes.
///
/// Not-found, wrong-tenant, and disabled conditions share one code per
/// entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationErrorCode {
    /// `scope` is empty or missing.
    MissingScope,
    /// A scope token is not requestable by this client.
    InvalidScope,
    /// `response_type` is not `code`.
    UnsupportedResponseType,
    /// Tenant is missing or disabled.
    InvalidTenant,
    /// Client is missing, in another tenant, or disabled.
    InvalidClient,
    /// Client is a service account.
    ClientNotEnabledForSso,
    /// Client has OIDC disabled.
    ClientNotEnabledForOidc,
    /// `redirect_uri` is not registered for the client.
    InvalidRedirectUri,
    /// PKCE parameters sent to a client without PKCE.
    PkceNotEnabledForClient,
    /// `code_challenge_method` is not `S256`.
    InvalidCodeChallengeMethod,
    /// Only one of the two PKCE parameters was sent.
    CodeChallengeParametersMissing,
}

impl AuthorizationErrorCode {
    /// Returns the stable code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MissingScope => "ERROR_MISSING_SCOPE",
            Self::InvalidScope => "ERROR_INVALID_SCOPE",
            Self::UnsupportedResponseType => "ERROR_UNSUPPORTED_RESPONSE_TYPE",
            Self::InvalidTenant => "ERROR_INVALID_TENANT",
            Self::InvalidClient => "ERROR_INVALID_CLIENT",
            Self::ClientNotEnabledForSso => "ERROR_CLIENT_NOT_ENABLED_FOR_SSO",
            Self::ClientNotEnabledForOidc => "ERROR_CLIENT_NOT_ENABLED_FOR_OIDC",
            Self::InvalidRedirectUri => "ERROR_INVALID_REDIRECT_URI",
            Self::PkceNotEnabledForClient => "ERROR_PKCE_NOT_ENABLED_FOR_CLIENT",
            Self::InvalidCodeChallengeMethod => "ERROR_INVALID_CODE_CHALLENGE_METHOD",
            Self::CodeChallengeParametersMissing => {
                "ERROR_INVALID_CODE_CHALLENGE_PARAMETERS_MISSING_ONE_OR_MORE"
            }
        }
    }

    /// Returns the OAuth 2.0 `error` value.
    #[must_use]
    pub const fn oauth_error(&self) -> &'static str {
        match self {
            Self::MissingScope | Self::InvalidScope => "invalid_scope",
            Self::UnsupportedResponseType => "unsupported_response_type",
            Self::ClientNotEnabledForSso
            | Self::ClientNotEnabledForOidc
            | Self::PkceNotEnabledForClient => "unauthorized_client",
            Self::InvalidTenant
            | Self::InvalidClient
            | Self::InvalidRedirectUri
            | Self::InvalidCodeChallengeMethod
            | Self::CodeChallengeParametersMissing => "invalid_request",
        }
    }

    /// Returns a human-readable description.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::MissingScope => "The scope parameter is required",
            Self::InvalidScope => "One or more requested scopes are not allowed",
            Self::UnsupportedResponseType => "Only the code response type is supported",
            Self::InvalidTenant => "The tenant is not valid",
            Self::InvalidClient => "The client is not valid",
            Self::ClientNotEnabledForSso => "The client is not enabled for single sign-on",
            Self::ClientNotEnabledForOidc => "The client is not enabled for OpenID Connect",
            Self::InvalidRedirectUri => "The redirect URI is not registered for this client",
            Self::PkceNotEnabledForClient => "PKCE is not enabled for this client",
            Self::InvalidCodeChallengeMethod => "The code challenge method must be S256",
            Self::CodeChallengeParametersMissing => {
                "code_challenge and code_challenge_method must be sent together"
            }
        }
    }
}

impl std::fmt::Display for AuthorizationErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn parse_url(value: &str) -> OidcResult<Url> {
    Url::parse(value).map_err(|e| OidcError::ServerError(format!("invalid URL {value}: {e}")))
}

/// Builds the login-surface redirect for a failed authorization request.
///
/// Echoes the non-sensitive request parameters. PKCE values are never
/// included.
///
/// # Errors
///
/// Returns [`OidcError::ServerError`] if `login_url` is not a valid URL.
pub fn build_login_error_redirect(
    login_url: &str,
    tenant_id: &str,
    request: &AuthorizationRequest,
    code: AuthorizationErrorCode,
) -> OidcResult<Url> {
    let mut url = parse_url(login_url)?;
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("error", code.oauth_error())
            .append_pair("error_code", code.as_str())
            .append_pair("error_description", code.description())
            .append_pair("tenant_id", tenant_id);

        let echoed = [
            ("client_id", &request.client_id),
            ("redirect_uri", &request.redirect_uri),
            ("state", &request.state),
            ("scope", &request.scope),
            ("response_type", &request.response_type),
            ("response_mode", &request.response_mode),
        ];
        for (name, value) in echoed {
            if let Some(value) = value {
                query.append_pair(name, value);
            }
        }
    }
    Ok(url)
}

/// Builds the login-surface redirect for a validated authorization request.
///
/// # Errors
///
/// Returns [`OidcError::ServerError`] if `login_url` is not a valid URL.
pub fn build_login_redirect(
    login_url: &str,
    tenant_id: &str,
    redirect_uri: &str,
    preauth_token: &str,
) -> OidcResult<Url> {
    let mut url = parse_url(login_url)?;
    url.query_pairs_mut()
        .append_pair("preauth_token", preauth_token)
        .append_pair("tenant_id", tenant_id)
        .append_pair("redirect_uri", redirect_uri);
    Ok(url)
}

/// Builds the client redirect carrying an authorization code.
///
/// # Errors
///
/// Returns [`OidcError::ServerError`] if `redirect_uri` is not a valid URL.
pub fn build_client_redirect(
    redirect_uri: &str,
    code: &str,
    state: Option<&str>,
    mode: ResponseMode,
) -> OidcResult<Url> {
    let mut url = parse_url(redirect_uri)?;
    match mode {
        ResponseMode::Query => {
            let mut query = url.query_pairs_mut();
            query.append_pair("code", code);
            if let Some(state) = state {
                query.append_pair("state", state);
            }
        }
        ResponseMode::Fragment => {
            let mut fragment = form_urlencoded::Serializer::new(String::new());
            fragment.append_pair("code", code);
            if let Some(state) = state {
                fragment.append_pair("state", state);
            }
            url.set_fragment(Some(&fragment.finish()));
        }
    }
    Ok(url)
}
