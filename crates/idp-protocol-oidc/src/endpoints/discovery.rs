//! Discovery endpoint handlers.
//!
//! Implements:
//! - GET `/.well-known/openid-configuration` - `OpenID` Provider Metadata
//! - GET `/oidc/jwks` - JSON Web Key Set

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::discovery::{ProviderMetadata, ProviderMetadataBuilder};
use crate::error::{OidcError, OidcResult};

use super::error_response;
use super::state::OidcState;

/// GET `/.well-known/openid-configuration`
///
/// Returns the `OpenID` Provider Metadata for the tenant.
///
/// # Responses
///
/// - 200 OK: Provider metadata JSON
/// - 400 Bad Request: Tenant does not exist or is disabled
pub async fn well_known(
    State(state): State<OidcState>,
    Path(tenant_id): Path<String>,
) -> Response {
    match provider_metadata(&state, &tenant_id).await {
        Ok(metadata) => (StatusCode::OK, Json(metadata)).into_response(),
        Err(ref err) => error_response(err),
    }
}

/// GET `/oidc/jwks`
///
/// Returns the published signing keys. The key set is shared by every
/// tenant and comes from the signing key cache, so repeated calls within
/// the cache TTL return identical documents.
///
/// # Responses
///
/// - 200 OK: JWKS JSON
/// - 400 Bad Request: Tenant does not exist or is disabled
/// - 500 Internal Server Error: Keys could not be loaded
pub async fn jwks(State(state): State<OidcState>, Path(tenant_id): Path<String>) -> Response {
    let result = async {
        require_tenant(&state, &tenant_id).await?;
        state.key_cache.jwks().await
    }
    .await;

    match result {
        Ok(jwks) => (StatusCode::OK, Json(jwks.as_ref().clone())).into_response(),
        Err(ref err) => error_response(err),
    }
}

async fn provider_metadata(state: &OidcState, tenant_id: &str) -> OidcResult<ProviderMetadata> {
    require_tenant(state, tenant_id).await?;
    Ok(ProviderMetadataBuilder::new(&state.config, tenant_id).build())
}

async fn require_tenant(state: &OidcState, tenant_id: &str) -> OidcResult<()> {
    match state.stores.tenants.get(tenant_id).await? {
        Some(tenant) if tenant.is_active() => Ok(()),
        _ => Err(OidcError::InvalidRequest("unknown tenant".to_string())),
    }
}
