//! Manager fixtures
//!
//! Builds an `ArchiveManager` over a scripted backend and an in-memory
//! catalog, keeping handles to both so tests can inspect them.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};

use coldvault::backend::vault::{ArchiveManager, InMemoryCatalog};
use coldvault::shared::{ArchiveRequest, ArchivedItem, VaultConfig};

use super::mock_storage::ScriptedStorage;

pub struct Harness {
    pub manager: Arc<ArchiveManager>,
    pub storage: Arc<ScriptedStorage>,
    pub catalog: InMemoryCatalog,
}

pub fn harness() -> Harness {
    harness_with(VaultConfig::default())
}

pub fn harness_with(config: VaultConfig) -> Harness {
    let storage = Arc::new(ScriptedStorage::new());
    let catalog = InMemoryCatalog::new();
    let manager = ArchiveManager::new(storage.clone(), Arc::new(catalog.clone()), config);
    Harness {
        manager: Arc::new(manager),
        storage,
        catalog,
    }
}

/// An image upload of `size` bytes
pub fn photo(owner: &str, size: usize) -> (ArchiveRequest, Bytes) {
    let request = ArchiveRequest::new(owner, "beach.png", "image/png", size as u64);
    (request, Bytes::from(vec![0xAB; size]))
}

impl Harness {
    /// Archive a small photo for `owner`
    pub async fn archived(&self, owner: &str) -> ArchivedItem {
        let (request, content) = photo(owner, 64);
        self.manager
            .archive(request, content)
            .await
            .expect("archive should succeed")
    }
}

pub fn hours_from_now(hours: i64) -> DateTime<Utc> {
    Utc::now() + Duration::hours(hours)
}
