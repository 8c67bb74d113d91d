//! Startup seeding and background maintenance for the in-memory stores.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use chrono::Duration as ChronoDuration;
use idp_core::{AuthEvent, EventType, SharedClock};
use idp_crypto::keys::{load_rsa_private_key, load_rsa_public_key, parse_certificate_chain};
use idp_model::{SigningKey, Tenant};
use idp_storage::{StorageResult, Stores};
use tokio::task::JoinHandle;

use crate::config::ServerConfig;

/// Creates the root tenant unless it already exists.
pub async fn seed_root_tenant(stores: &Stores, tenant_id: &str) -> anyhow::Result<()> {
    if stores.tenants.get(tenant_id).await?.is_some() {
        return Ok(());
    }
    stores
        .tenants
        .create(&Tenant::new(tenant_id).with_name("Root"))
        .await?;
    tracing::info!(tenant_id, "root tenant created");
    Ok(())
}

fn read_pem(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

/// Loads the configured signing key into the store.
///
/// Returns the key id, or `None` when no key file is configured. The key is
/// parsed before it is stored so a bad file or passphrase fails at startup.
pub async fn seed_signing_key(
    stores: &Stores,
    config: &ServerConfig,
    clock: &SharedClock,
) -> anyhow::Result<Option<String>> {
    let Some(path) = &config.signing_key_file else {
        return Ok(None);
    };

    let private_pem = read_pem(path)?;
    load_rsa_private_key(&private_pem, config.signing_key_passphrase.as_deref())
        .with_context(|| format!("loading signing key {}", path.display()))?;

    let expires_at = ChronoDuration::try_days(config.signing_key_validity_days)
        .and_then(|validity| clock.now().checked_add_signed(validity))
        .with_context(|| {
            format!(
                "signing key validity of {} days is out of range",
                config.signing_key_validity_days
            )
        })?;
    let mut key = SigningKey::new(
        config.signing_key_id.clone(),
        config.root_tenant_id.clone(),
        private_pem,
        expires_at,
    );
    if let Some(passphrase) = &config.signing_key_passphrase {
        key = key.with_passphrase(passphrase.clone());
    }

    match (&config.signing_certificate_file, &config.signing_public_key_file) {
        (Some(cert_path), _) => {
            let pem = read_pem(cert_path)?;
            parse_certificate_chain(&pem)
                .with_context(|| format!("parsing certificate {}", cert_path.display()))?;
            key = key.with_certificate(pem);
        }
        (None, Some(public_path)) => {
            let pem = read_pem(public_path)?;
            load_rsa_public_key(&pem)
                .with_context(|| format!("parsing public key {}", public_path.display()))?;
            key = key.with_public_key(pem);
        }
        (None, None) => anyhow::bail!(
            "IDP_SIGNING_KEY_FILE requires IDP_SIGNING_PUBLIC_KEY_FILE or IDP_SIGNING_CERTIFICATE_FILE"
        ),
    }

    stores.signing_keys.create(&key).await?;
    AuthEvent::builder(EventType::SigningKeysLoaded)
        .tenant(&config.root_tenant_id)
        .detail("kid", &config.signing_key_id)
        .emit();
    tracing::info!(kid = %config.signing_key_id, %expires_at, "signing key seeded");
    Ok(Some(config.signing_key_id.clone()))
}

/// Removes expired records from every ephemeral store.
pub async fn purge_expired(stores: &Stores) -> StorageResult<usize> {
    Ok(stores.pre_auth.purge_expired().await?
        + stores.authorization.purge_expired().await?
        + stores.refresh.purge_expired().await?
        + stores.client_auth_history.purge_expired().await?)
}

/// Runs [`purge_expired`] on a fixed interval until the runtime shuts down.
pub fn spawn_purge_task(stores: Stores, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            match purge_expired(&stores).await {
                Ok(0) => {}
                Ok(purged) => tracing::debug!(purged, "expired ephemeral records purged"),
                Err(e) => tracing::error!(error = %e, "ephemeral purge failed"),
            }
        }
    })
}
