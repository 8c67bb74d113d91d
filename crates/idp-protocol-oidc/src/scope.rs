//! Requestable scope resolution.

use std::collections::HashSet;

use idp_model::Client;
use idp_storage::ScopeProvider;

use crate::error::OidcResult;

/// Scopes every tenant recognises.
pub const STANDARD_SCOPES: [&str; 6] = [
    "openid",
    "profile",
    "email",
    "address",
    "phone",
    "offline_access",
];

/// Splits a space-separated scope parameter into tokens.
pub fn scope_tokens(scope: &str) -> impl Iterator<Item = &str> {
    scope.split_whitespace()
}

/// Returns the scopes `client` may request.
///
/// The standard set, plus the client's granted scopes when it is a device or
/// user-delegated client with refresh tokens enabled.
///
/// # Errors
///
/// Returns an error if the scope store fails.
pub async fn allowed_scopes(
    scopes: &dyn ScopeProvider,
    client: &Client,
) -> OidcResult<HashSet<String>> {
    let mut allowed: HashSet<String> = STANDARD_SCOPES.iter().map(ToString::to_string).collect();
    if client.uses_delegated_scopes() {
        let granted = scopes
            .list_for_client(&client.tenant_id, &client.client_id)
            .await?;
        allowed.extend(granted.into_iter().map(|rel| rel.scope_name));
    }
    Ok(allowed)
}

/// Returns the first scope token not in `allowed`, if any.
#[must_use]
pub fn first_unknown_scope<'a>(scope: &'a str, allowed: &HashSet<String>) -> Option<&'a str> {
    scope_tokens(scope).find(|token| !allowed.contains(*token))
}
