/**
 * Application State Management
 *
 * `AppState` is the central state container handed to the axum router.
 * The `FromRef` implementations let handlers extract only the part they
 * need, following axum's recommended pattern.
 *
 * # Example
 *
 * ```rust,no_run
 * use std::sync::Arc;
 * use axum::extract::State;
 * use coldvault::backend::vault::ArchiveManager;
 *
 * async fn handler(State(manager): State<Arc<ArchiveManager>>) {
 *     let _ = manager.config().download_ttl;
 * }
 * ```
 */

use std::sync::Arc;

use axum::extract::FromRef;

use crate::backend::storage::{ColdStorage, DownloadSigner};
use crate::backend::vault::ArchiveManager;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    /// Archive lifecycle manager; the only writer of the catalog
    pub manager: Arc<ArchiveManager>,

    /// Backend the manager writes to, used directly by the blob route
    pub storage: Arc<dyn ColdStorage>,

    /// Verifies download tokens presented to `/blobs/{token}`
    pub signer: DownloadSigner,
}

impl AppState {
    pub fn new(
        manager: Arc<ArchiveManager>,
        storage: Arc<dyn ColdStorage>,
        signer: DownloadSigner,
    ) -> Self {
        Self {
            manager,
            storage,
            signer,
        }
    }
}

impl FromRef<AppState> for Arc<ArchiveManager> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.manager.clone()
    }
}

impl FromRef<AppState> for Arc<dyn ColdStorage> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for DownloadSigner {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.signer.clone()
    }
}
