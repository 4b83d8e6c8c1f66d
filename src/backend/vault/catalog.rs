/**
 * Catalog Store
 *
 * The catalog holds the authoritative record of every archived item. It is
 * a plain keyed store: lifecycle rules live in the manager, which is the only
 * writer. `InMemoryCatalog` backs tests and single-process deployments;
 * `SqliteCatalog` persists across restarts.
 */

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::shared::archive::{ArchiveStatus, ArchivedItem};

/// Catalog store errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog already holds item {0}")]
    Duplicate(Uuid),

    #[error("catalog has no item {0}")]
    Missing(Uuid),

    /// A stored record could not be decoded
    #[error("corrupt catalog record: {0}")]
    Corrupt(String),

    #[error("catalog database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Keyed store of archived items
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Add a new item; fails if the id is taken
    async fn insert(&self, item: ArchivedItem) -> Result<(), CatalogError>;

    async fn get(&self, id: Uuid) -> Result<Option<ArchivedItem>, CatalogError>;

    /// Overwrite an existing item
    async fn replace(&self, item: &ArchivedItem) -> Result<(), CatalogError>;

    /// Returns whether an item was removed
    async fn remove(&self, id: Uuid) -> Result<bool, CatalogError>;

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<ArchivedItem>, CatalogError>;

    async fn list_with_status(
        &self,
        statuses: &[ArchiveStatus],
    ) -> Result<Vec<ArchivedItem>, CatalogError>;
}

/// Catalog held in process memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    items: Arc<RwLock<HashMap<Uuid, ArchivedItem>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn insert(&self, item: ArchivedItem) -> Result<(), CatalogError> {
        let mut items = self.items.write().await;
        if items.contains_key(&item.id) {
            return Err(CatalogError::Duplicate(item.id));
        }
        items.insert(item.id, item);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<ArchivedItem>, CatalogError> {
        Ok(self.items.read().await.get(&id).cloned())
    }

    async fn replace(&self, item: &ArchivedItem) -> Result<(), CatalogError> {
        let mut items = self.items.write().await;
        match items.get_mut(&item.id) {
            Some(slot) => {
                *slot = item.clone();
                Ok(())
            }
            None => Err(CatalogError::Missing(item.id)),
        }
    }

    async fn remove(&self, id: Uuid) -> Result<bool, CatalogError> {
        Ok(self.items.write().await.remove(&id).is_some())
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<ArchivedItem>, CatalogError> {
        let items = self.items.read().await;
        Ok(items
            .values()
            .filter(|item| item.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn list_with_status(
        &self,
        statuses: &[ArchiveStatus],
    ) -> Result<Vec<ArchivedItem>, CatalogError> {
        let items = self.items.read().await;
        Ok(items
            .values()
            .filter(|item| statuses.contains(&item.status))
            .cloned()
            .collect())
    }
}
