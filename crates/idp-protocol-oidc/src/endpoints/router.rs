//! OIDC router configuration.
//!
//! Provides the Axum router for all OIDC endpoints.

use axum::{
    Router,
    routing::{get, post},
};

use super::anonymous::anonymous_token;
use super::authorization::authorize;
use super::discovery::{jwks, well_known};
use super::revocation::revoke;
use super::state::OidcState;
use super::token::token;
use super::userinfo::userinfo;

/// Creates the OIDC protocol router.
///
/// # Endpoints
///
/// | Method | Path                                          | Handler           |
/// |--------|-----------------------------------------------|-------------------|
/// | GET    | `/:tenant_id/.well-known/openid-configuration` | `well_known`      |
/// | GET    | `/:tenant_id/oidc/authorize`                  | `authorize`       |
/// | POST   | `/:tenant_id/oidc/token`                      | `token`           |
/// | GET    | `/:tenant_id/oidc/jwks`                       | `jwks`            |
/// | GET    | `/:tenant_id/oidc/userinfo`                   | `userinfo`        |
/// | POST   | `/:tenant_id/oidc/userinfo`                   | `userinfo`        |
/// | POST   | `/:tenant_id/oidc/revoke`                     | `revoke`          |
/// | POST   | `/:tenant_id/oidc/anonymous-token`            | `anonymous_token` |
pub fn oidc_router() -> Router<OidcState> {
    Router::new()
        // Discovery endpoints
        .route(
            "/:tenant_id/.well-known/openid-configuration",
            get(well_known),
        )
        .route("/:tenant_id/oidc/jwks", get(jwks))
        // Authorization endpoint
        .route("/:tenant_id/oidc/authorize", get(authorize))
        // Token endpoints
        .route("/:tenant_id/oidc/token", post(token))
        .route("/:tenant_id/oidc/revoke", post(revoke))
        .route("/:tenant_id/oidc/anonymous-token", post(anonymous_token))
        // `UserInfo` endpoint
        .route("/:tenant_id/oidc/userinfo", get(userinfo).post(userinfo))
}
