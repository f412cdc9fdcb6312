//! CLI command implementations.
//!
//! Storefront commands run against a [`Storefront`] over the file-backed
//! local store, so repeated invocations see the same cart, wishlist and
//! session. Admin commands talk to the hosted store with the service key.

pub mod account;
pub mod admin;
pub mod shop;

use std::path::PathBuf;
use std::sync::Arc;

use neemon_core::remote::PostgrestClient;
use neemon_storefront::config::{AuthBackend, ConfigError, StorefrontConfig};
use neemon_storefront::services::auth::GoTrueClient;
use neemon_storefront::store::FileStore;
use neemon_storefront::{IdentityBacking, Storefront, StorefrontOptions};
use thiserror::Error;

/// Errors raised before a command runs.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("admin configuration error: {0}")]
    AdminConfig(#[from] neemon_admin::config::ConfigError),
    #[error("could not create client: {0}")]
    Client(String),
}

/// Open the storefront over the configured data directory.
///
/// `data_dir` overrides `STOREFRONT_DATA_DIR`.
///
/// # Errors
///
/// Returns [`SetupError`] if configuration is incomplete or a client cannot
/// be built.
pub async fn open_storefront(data_dir: Option<PathBuf>) -> Result<Storefront, SetupError> {
    let config = StorefrontConfig::from_env()?;
    let data_dir = data_dir.unwrap_or_else(|| config.data_dir.clone());

    let remote = PostgrestClient::new(config.supabase.url.as_str(), &config.supabase.anon_key)
        .map_err(|e| SetupError::Client(e.to_string()))?;
    let backing = match config.auth_backend {
        AuthBackend::Local => IdentityBacking::Local,
        AuthBackend::Remote => IdentityBacking::Remote(Arc::new(
            GoTrueClient::new(config.supabase.url.as_str(), &config.supabase.anon_key)
                .map_err(|e| SetupError::Client(e.to_string()))?,
        )),
    };

    tracing::debug!(data_dir = %data_dir.display(), "Opening storefront");
    let storefront = Storefront::new(
        Arc::new(FileStore::new(data_dir)),
        Arc::new(remote),
        backing,
        StorefrontOptions::from(&config),
    );
    storefront.restore().await;
    Ok(storefront)
}

/// Build admin state from `SUPABASE_URL` and `SUPABASE_SERVICE_KEY`.
///
/// # Errors
///
/// Returns [`SetupError`] if configuration is incomplete or the client
/// cannot be built.
pub fn open_admin() -> Result<neemon_admin::AppState, SetupError> {
    let config = neemon_admin::config::AdminConfig::from_env()?;
    let remote = PostgrestClient::new(config.supabase.url.as_str(), &config.supabase.service_key)
        .map_err(|e| SetupError::Client(e.to_string()))?;
    Ok(neemon_admin::AppState::new(
        Arc::new(remote),
        config.low_stock_threshold,
    ))
}
