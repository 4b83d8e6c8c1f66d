/**
 * Server Configuration
 *
 * Process-level settings read from the environment, and loading of the
 * optional SQLite catalog.
 *
 * # Environment
 *
 * - `SERVER_PORT` - listen port (default 3000)
 * - `PUBLIC_BASE_URL` - base of presigned download URLs
 *   (default `http://127.0.0.1:{port}`)
 * - `DOWNLOAD_SIGNING_SECRET` - HS256 secret for download tokens
 * - `DATABASE_URL` - SQLite catalog, e.g. `sqlite://vault.db`
 * - `VAULT_RECONCILE_INTERVAL_SECS` - enables the reconcile timer
 * - `VAULT_SIMULATED_RESTORE_SECS` - restore delay of the in-memory backend
 *
 * # Error Handling
 *
 * Unparseable values are logged and replaced by defaults. A catalog that
 * cannot be opened does not prevent startup; the server falls back to an
 * in-memory catalog.
 */

use std::sync::Arc;
use std::time::Duration;

use crate::backend::vault::{Catalog, InMemoryCatalog, SqliteCatalog};

const DEFAULT_PORT: u16 = 3000;

/// Settings of the server process
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub public_base_url: String,
    pub signing_secret: String,
    pub database_url: Option<String>,
    /// `None` leaves reconciliation entirely to callers
    pub reconcile_interval: Option<Duration>,
    pub simulated_restore_delay: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            public_base_url: format!("http://127.0.0.1:{}", DEFAULT_PORT),
            signing_secret: uuid::Uuid::new_v4().to_string(),
            database_url: None,
            reconcile_interval: None,
            simulated_restore_delay: Duration::ZERO,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}={:?}", key, raw);
            default
        }),
        Err(_) => default,
    }
}

impl ServerConfig {
    /// Read the environment on top of the defaults
    pub fn from_env() -> Self {
        let port = env_or("SERVER_PORT", DEFAULT_PORT);
        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://127.0.0.1:{}", port));

        let signing_secret = match std::env::var("DOWNLOAD_SIGNING_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ => {
                tracing::warn!(
                    "DOWNLOAD_SIGNING_SECRET not set. Download links will not survive a restart."
                );
                uuid::Uuid::new_v4().to_string()
            }
        };

        let interval_secs = env_or("VAULT_RECONCILE_INTERVAL_SECS", 0u64);
        Self {
            port,
            public_base_url,
            signing_secret,
            database_url: std::env::var("DATABASE_URL").ok(),
            reconcile_interval: (interval_secs > 0).then(|| Duration::from_secs(interval_secs)),
            simulated_restore_delay: Duration::from_secs(env_or(
                "VAULT_SIMULATED_RESTORE_SECS",
                0u64,
            )),
        }
    }
}

/// Open the catalog named by `database_url`
///
/// Returns an in-memory catalog when no URL is given or the database cannot
/// be opened.
pub async fn load_catalog(database_url: Option<&str>) -> Arc<dyn Catalog> {
    let Some(url) = database_url else {
        tracing::warn!("DATABASE_URL not set. Catalog will be kept in memory.");
        return Arc::new(InMemoryCatalog::new());
    };

    tracing::info!("Opening catalog database...");
    match SqliteCatalog::connect(url).await {
        Ok(catalog) => {
            tracing::info!("Catalog database ready");
            Arc::new(catalog)
        }
        Err(e) => {
            tracing::error!("Failed to open catalog database: {:?}", e);
            tracing::warn!("Catalog will be kept in memory.");
            Arc::new(InMemoryCatalog::new())
        }
    }
}
