//! # idp-protocol-oidc
//!
//! `OpenID` Connect protocol core for a multi-tenant identity provider.
//!
//! This crate implements:
//! - Authorization endpoint (authorization code flow, `S256` PKCE)
//! - Token endpoint (`authorization_code`, `refresh_token`,
//!   `client_credentials`)
//! - Client authentication by shared secret or HS256 client assertion, with
//!   `jti` replay protection
//! - RS256 token issuance with a cached, rotating signing key
//! - JWKS, `UserInfo`, revocation, anonymous-user tokens, and discovery
//!
//! Every tenant, client, key, and protocol record is read through the
//! `idp-storage` traits.
//!
//! ## Modules
//!
//! - [`authorization`] - Authorization request validation
//! - [`authorization_code`] - Login completion and code redemption
//! - [`claims`] - JWT claim types for issued tokens and client assertions
//! - [`client_auth`] - Client authentication
//! - [`discovery`] - `OpenID` Provider Metadata for `.well-known` endpoint
//! - [`endpoints`] - Axum HTTP handlers for OIDC endpoints
//! - [`error`] - OIDC error types following RFC 6749
//! - [`grants`] - Token endpoint grant handling and revocation
//! - [`jwks`] - JSON Web Key Set types
//! - [`key_cache`] - Signing key cache
//! - [`redirect`] - Redirect URL construction and authorization error codes
//! - [`request`] - Request types for OIDC endpoints
//! - [`scope`] - Scope parsing and allowed scope sets
//! - [`token`] - Token issuance
//! - [`types`] - Common OIDC types (grant types, token types)
//! - [`verify`] - Token verification

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod authorization;
pub mod authorization_code;
pub mod claims;
pub mod client_auth;
pub mod discovery;
pub mod endpoints;
pub mod error;
pub mod grants;
pub mod jwks;
pub mod key_cache;
pub mod redirect;
pub mod request;
pub mod scope;
pub mod token;
pub mod types;
pub mod verify;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use authorization::{AuthorizationOutcome, AuthorizationRequestValidator};
pub use authorization_code::AuthorizationCodeService;
pub use claims::{Audience, ClientAssertionClaims, TokenClaims};
pub use client_auth::{
    ClientAuthMethod, ClientAuthenticator, ClientCredentials, extract_client_credentials,
};
pub use discovery::{ProviderMetadata, ProviderMetadataBuilder};
pub use endpoints::{OidcState, oidc_router};
pub use error::{ErrorResponse, OidcError, OidcResult};
pub use grants::GrantHandler;
pub use jwks::{JsonWebKey, JsonWebKeySet, KeyType};
pub use key_cache::{CachedSigningKey, SigningKeyCache};
pub use redirect::AuthorizationErrorCode;
pub use request::{AuthorizationRequest, RevocationRequest, TokenRequest};
pub use token::{TokenIssuer, TokenResponse};
pub use types::{GrantType, TokenType};
pub use verify::TokenVerifier;
