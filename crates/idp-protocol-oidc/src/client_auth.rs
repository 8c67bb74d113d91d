//! Client authentication.
//!
//! A client authenticates at the token and revocation endpoints with exactly
//! one of:
//!
//! - a shared secret, sent as HTTP Basic credentials (`client_secret_basic`)
//!   or as `client_id`/`client_secret` form fields (`client_secret_post`)
//! - a self-issued HS256 assertion keyed by the client secret
//!   (`client_secret_jwt`)
//!
//! Assertion `jti` values are recorded in the client authentication history
//! before the signature is checked, so a captured `jti` cannot be retried
//! even with a forged signature.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use idp_core::{AuthEvent, Config, EventType, SharedClock};
use idp_crypto::constant_time_eq;
use idp_model::{Client, ClientAuthHistory};
use idp_storage::Stores;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, dangerous, decode};
use tracing::debug;

use crate::claims::ClientAssertionClaims;
use crate::error::{OidcError, OidcResult};
use crate::types::CLIENT_ASSERTION_TYPE_JWT;

// ============================================================================
// Credentials
// ============================================================================

/// How a client presented its credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientAuthMethod {
    /// HTTP Basic authentication.
    ClientSecretBasic,
    /// Secret in the form body.
    ClientSecretPost,
    /// HS256 client assertion.
    ClientSecretJwt,
}

impl ClientAuthMethod {
    /// Returns the registered method name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ClientSecretBasic => "client_secret_basic",
            Self::ClientSecretPost => "client_secret_post",
            Self::ClientSecretJwt => "client_secret_jwt",
        }
    }
}

/// Credentials extracted from a request.
#[derive(Clone, PartialEq, Eq)]
pub enum ClientCredentials {
    /// A shared secret.
    Secret {
        /// Client ID.
        client_id: String,
        /// Presented secret.
        client_secret: String,
        /// Whether it came from the header or the body.
        method: ClientAuthMethod,
    },
    /// A signed client assertion.
    Assertion {
        /// Client ID from the form, if sent. Falls back to the assertion's `sub`.
        client_id: Option<String>,
        /// The compact JWT.
        assertion: String,
    },
}

impl ClientCredentials {
    /// Returns the authentication method.
    #[must_use]
    pub const fn method(&self) -> ClientAuthMethod {
        match self {
            Self::Secret { method, .. } => *method,
            Self::Assertion { .. } => ClientAuthMethod::ClientSecretJwt,
        }
    }
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Secret {
                client_id, method, ..
            } => f
                .debug_struct("Secret")
                .field("client_id", client_id)
                .field("method", method)
                .finish_non_exhaustive(),
            Self::Assertion { client_id, .. } => f
                .debug_struct("Assertion")
                .field("client_id", client_id)
                .finish_non_exhaustive(),
        }
    }
}

/// Extracts client credentials from the `Authorization` header and form
/// fields.
///
/// # Errors
///
/// Returns [`OidcError::InvalidRequest`] if more than one method is used,
/// the Basic header is malformed, or the assertion type is wrong, and
/// [`OidcError::InvalidClient`] if no credentials are present.
pub fn extract_client_credentials(
    auth_header: Option<&str>,
    client_id: Option<&str>,
    client_secret: Option<&str>,
    client_assertion: Option<&str>,
    client_assertion_type: Option<&str>,
) -> OidcResult<ClientCredentials> {
    let basic = auth_header.and_then(|h| h.strip_prefix("Basic "));
    let methods = usize::from(basic.is_some())
        + usize::from(client_secret.is_some())
        + usize::from(client_assertion.is_some());
    if methods > 1 {
        return Err(OidcError::InvalidRequest(
            "multiple client authentication methods".to_string(),
        ));
    }

    if let Some(encoded) = basic {
        let (id, secret) = decode_basic(encoded)?;
        if client_id.is_some_and(|form_id| form_id != id) {
            return Err(OidcError::InvalidRequest(
                "client_id does not match credentials".to_string(),
            ));
        }
        return Ok(ClientCredentials::Secret {
            client_id: id,
            client_secret: secret,
            method: ClientAuthMethod::ClientSecretBasic,
        });
    }

    if let Some(secret) = client_secret {
        let id = client_id.ok_or_else(|| {
            OidcError::InvalidRequest("client_id is required with client_secret".to_string())
        })?;
        return Ok(ClientCredentials::Secret {
            client_id: id.to_string(),
            client_secret: secret.to_string(),
            method: ClientAuthMethod::ClientSecretPost,
        });
    }

    if let Some(assertion) = client_assertion {
        if client_assertion_type != Some(CLIENT_ASSERTION_TYPE_JWT) {
            return Err(OidcError::InvalidRequest(
                "unsupported client_assertion_type".to_string(),
            ));
        }
        return Ok(ClientCredentials::Assertion {
            client_id: client_id.map(ToString::to_string),
            assertion: assertion.to_string(),
        });
    }

    Err(OidcError::InvalidClient(
        "client authentication required".to_string(),
    ))
}

fn decode_basic(encoded: &str) -> OidcResult<(String, String)> {
    let malformed = || OidcError::InvalidRequest("malformed Basic credentials".to_string());

    let decoded = STANDARD.decode(encoded.trim()).map_err(|_| malformed())?;
    let decoded = String::from_utf8(decoded).map_err(|_| malformed())?;
    let (id, secret) = decoded.split_once(':').ok_or_else(malformed)?;

    let id = urlencoding::decode(id).map_err(|_| malformed())?;
    let secret = urlencoding::decode(secret).map_err(|_| malformed())?;
    Ok((id.into_owned(), secret.into_owned()))
}

// ============================================================================
// Authenticator
// ============================================================================

/// Authenticates clients.
#[derive(Debug, Clone)]
pub struct ClientAuthenticator {
    config: Arc<Config>,
    clock: SharedClock,
    stores: Stores,
}

impl ClientAuthenticator {
    /// Creates an authenticator.
    #[must_use]
    pub const fn new(config: Arc<Config>, clock: SharedClock, stores: Stores) -> Self {
        Self {
            config,
            clock,
            stores,
        }
    }

    /// Checks a shared secret.
    ///
    /// An unknown client yields `false`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the client store fails.
    pub async fn validate_secret(&self, client_id: &str, secret: &str) -> OidcResult<bool> {
        let Some(client) = self.stores.clients.get(client_id).await? else {
            debug!(client_id, "unknown client");
            return Ok(false);
        };
        Ok(constant_time_eq(
            client.client_secret.as_bytes(),
            secret.as_bytes(),
        ))
    }

    /// Checks a client assertion for `client_id` in `tenant_id`.
    ///
    /// Checks run in order and stop at the first failure: subject binding,
    /// audience, expiry, client and tenant state, `jti` presence, replay
    /// history, and finally the HS256 signature. The `jti` is recorded
    /// before the signature is checked and stays recorded if it fails.
    ///
    /// # Errors
    ///
    /// Returns an error only if a store fails. Rejections are `Ok(false)`.
    pub async fn validate_assertion(
        &self,
        assertion: &str,
        client_id: &str,
        tenant_id: &str,
    ) -> OidcResult<bool> {
        let Some(claims) = peek_assertion_claims(assertion) else {
            return Ok(reject(tenant_id, client_id, "undecodable assertion"));
        };
        if claims.sub.as_deref() != Some(client_id) || claims.iss != claims.sub {
            return Ok(reject(tenant_id, client_id, "iss/sub do not match client"));
        }

        let token_endpoint = self.config.token_endpoint(tenant_id);
        if !claims
            .aud
            .as_ref()
            .is_some_and(|aud| aud.is_exactly(&token_endpoint))
        {
            return Ok(reject(tenant_id, client_id, "audience mismatch"));
        }

        let now = self.clock.now();
        let Some(exp) = claims
            .exp
            .and_then(|exp| DateTime::<Utc>::from_timestamp(exp, 0))
            .filter(|exp| *exp > now)
        else {
            return Ok(reject(tenant_id, client_id, "assertion exp missing or not in the future"));
        };

        let client = match self.stores.clients.get(client_id).await? {
            Some(client) if client.tenant_id == tenant_id && client.enabled => client,
            _ => return Ok(reject(tenant_id, client_id, "client missing or disabled")),
        };
        match self.stores.tenants.get(tenant_id).await? {
            Some(tenant) if tenant.is_active() => {}
            _ => return Ok(reject(tenant_id, client_id, "tenant missing or disabled")),
        }

        let Some(jti) = claims.jti.filter(|jti| !jti.is_empty()) else {
            return Ok(reject(tenant_id, client_id, "assertion missing jti"));
        };

        if self.stores.client_auth_history.find(&jti).await?.is_some() {
            debug!(tenant_id, client_id, jti = %jti, "assertion replayed");
            return Ok(false);
        }
        let history = ClientAuthHistory {
            jti: jti.clone(),
            client_id: client_id.to_string(),
            tenant_id: tenant_id.to_string(),
            expires_at_seconds: exp.timestamp(),
        };
        match self.stores.client_auth_history.create(&history).await {
            Ok(()) => {}
            Err(e) if e.is_duplicate() => {
                debug!(tenant_id, client_id, jti = %jti, "assertion replayed");
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims::<&str>(&[]);
        let key = DecodingKey::from_secret(client.client_secret.as_bytes());
        if let Err(e) = decode::<serde_json::Value>(assertion, &key, &validation) {
            debug!(tenant_id, client_id, jti = %jti, error = %e, "assertion signature rejected");
            return Ok(false);
        }
        Ok(true)
    }

    /// Authenticates a client for a request to `tenant_id`.
    ///
    /// # Errors
    ///
    /// Returns [`OidcError::UnauthorizedClient`] if the credentials are
    /// wrong or the client is missing, disabled, or in another tenant, or a
    /// storage error.
    pub async fn authenticate(
        &self,
        tenant_id: &str,
        credentials: &ClientCredentials,
    ) -> OidcResult<Client> {
        let method = credentials.method();
        let (client_id, accepted) = match credentials {
            ClientCredentials::Secret {
                client_id,
                client_secret,
                ..
            } => (
                client_id.clone(),
                self.validate_secret(client_id, client_secret).await?,
            ),
            ClientCredentials::Assertion {
                client_id,
                assertion,
            } => {
                let client_id = client_id
                    .clone()
                    .or_else(|| peek_assertion_claims(assertion).and_then(|c| c.sub))
                    .unwrap_or_default();
                let accepted = self
                    .validate_assertion(assertion, &client_id, tenant_id)
                    .await?;
                (client_id, accepted)
            }
        };

        let client = if accepted {
            self.bound_client(tenant_id, &client_id).await?
        } else {
            None
        };

        match client {
            Some(client) => {
                AuthEvent::builder(EventType::ClientLogin)
                    .tenant(tenant_id)
                    .client(&client_id)
                    .detail("method", method.as_str())
                    .emit();
                Ok(client)
            }
            None => {
                AuthEvent::builder(EventType::ClientLoginError)
                    .failure("unauthorized_client")
                    .tenant(tenant_id)
                    .client(&client_id)
                    .detail("method", method.as_str())
                    .emit();
                Err(OidcError::UnauthorizedClient(
                    "client authentication failed".to_string(),
                ))
            }
        }
    }

    async fn bound_client(&self, tenant_id: &str, client_id: &str) -> OidcResult<Option<Client>> {
        let client = match self.stores.clients.get(client_id).await? {
            Some(client) if client.tenant_id == tenant_id && client.enabled => client,
            _ => {
                debug!(tenant_id, client_id, "client missing, disabled, or in another tenant");
                return Ok(None);
            }
        };
        match self.stores.tenants.get(tenant_id).await? {
            Some(tenant) if tenant.is_active() => Ok(Some(client)),
            _ => {
                debug!(tenant_id, "tenant missing or disabled");
                Ok(None)
            }
        }
    }
}

/// Reads assertion claims without checking the signature.
fn peek_assertion_claims(assertion: &str) -> Option<ClientAssertionClaims> {
    dangerous::insecure_decode::<ClientAssertionClaims>(assertion)
        .ok()
        .map(|data| data.claims)
}

fn reject(tenant_id: &str, client_id: &str, reason: &str) -> bool {
    debug!(tenant_id, client_id, reason, "client assertion rejected");
    false
}
