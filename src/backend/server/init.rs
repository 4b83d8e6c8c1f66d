/**
 * Server Initialization
 *
 * Builds the application from configuration: the download signer, the
 * cold storage backend, the catalog, the archive manager and the router.
 *
 * # Initialization Process
 *
 * 1. Create the download signer from the configured secret
 * 2. Create the cold storage backend
 * 3. Load the catalog (SQLite if configured, in memory otherwise)
 * 4. Create the archive manager and app state
 * 5. Start the reconcile timer if one is configured
 * 6. Create the router
 */

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::task::JoinHandle;

use crate::backend::routes::router::create_router;
use crate::backend::server::config::{ServerConfig, load_catalog};
use crate::backend::server::state::AppState;
use crate::backend::storage::{ColdStorage, DownloadSigner, MemoryColdStorage};
use crate::backend::vault::ArchiveManager;
use crate::shared::config::VaultConfig;

/// Create and configure the Axum application
///
/// A missing or unreachable catalog database does not stop startup; the
/// catalog is then kept in memory.
pub async fn create_app(server: ServerConfig, vault: VaultConfig) -> Router<()> {
    tracing::info!("Initializing cold vault server");

    let signer = DownloadSigner::new(server.signing_secret.as_bytes());
    let storage: Arc<dyn ColdStorage> = Arc::new(
        MemoryColdStorage::new(signer.clone(), server.public_base_url.clone())
            .with_default_restore_delay(server.simulated_restore_delay),
    );
    tracing::info!(
        "Cold storage ready (simulated restore delay {}s)",
        server.simulated_restore_delay.as_secs()
    );

    let catalog = load_catalog(server.database_url.as_deref()).await;
    let manager = Arc::new(ArchiveManager::new(storage.clone(), catalog, vault));
    let app_state = AppState::new(manager.clone(), storage, signer);

    if let Some(period) = server.reconcile_interval {
        spawn_reconcile_timer(manager, period);
        tracing::info!("Reconciling pending restores every {}s", period.as_secs());
    }

    create_router(app_state)
}

/// Periodically reconcile every item with a restore in flight
///
/// The manager never polls on its own; this timer is the server's opt-in
/// caller.
pub fn spawn_reconcile_timer(manager: Arc<ArchiveManager>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            match manager.reconcile_pending().await {
                Ok(0) => tracing::debug!("Reconcile sweep found no changes"),
                Ok(changed) => tracing::info!("Reconcile sweep updated {} items", changed),
                Err(e) => tracing::warn!("Reconcile sweep failed: {}", e),
            }
        }
    })
}
