/**
 * Archive Lifecycle Manager
 *
 * Owns the catalog of archived items and drives them through the archive
 * lifecycle against a cold storage backend.
 *
 * # Operations
 *
 * - `archive` - write new content in the coldest class and catalog it
 * - `request_restore` - ask the backend for a temporary readable copy
 * - `reconcile_status` - re-derive an item's status from backend metadata
 * - `get_download_reference` - presigned reference to a restored copy
 * - `update_metadata` - change title, description or tags
 * - `delete` - remove the backend object, then the catalog entry
 * - `stats` - per-owner aggregates from the catalog alone
 *
 * # Concurrency
 *
 * Every operation that may write an existing item holds that item's lock
 * from the first catalog read to the last catalog write. Operations on
 * different items run in parallel. The manager never polls on its own;
 * callers drive `reconcile_status` / `reconcile_pending` at their cadence.
 */

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use futures_util::{StreamExt, stream};
use uuid::Uuid;

use crate::backend::storage::{ColdStorage, PutObject, RestoreAck, StorageError};
use crate::backend::vault::catalog::Catalog;
use crate::backend::vault::error::{ArchiveError, StorageOp};
use crate::backend::vault::locks::ItemLocks;
use crate::backend::vault::reconcile;
use crate::shared::archive::{
    ArchiveRequest, ArchiveStatus, ArchivedItem, DownloadReference, MetadataUpdate, OwnerStats,
    RestoreReceipt, RestoreTier,
};
use crate::shared::config::VaultConfig;

/// Statuses `reconcile_pending` looks at
const PENDING_STATUSES: [ArchiveStatus; 3] = [
    ArchiveStatus::RestoreRequested,
    ArchiveStatus::Restoring,
    ArchiveStatus::Restored,
];

/// Build the backend key for an item
///
/// `{prefix}/{owner}/{id}/{file name}`. Slashes in the owner id are replaced
/// and only the last path segment of the original name is kept, so keys of
/// different owners never collide.
pub fn storage_key(prefix: &str, owner_id: &str, id: Uuid, original_name: &str) -> String {
    let owner = owner_id.trim().replace('/', "_");
    let name = original_name
        .rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or("object");
    format!("{}/{}/{}/{}", prefix.trim_end_matches('/'), owner, id, name)
}

fn object_metadata(item: &ArchivedItem) -> HashMap<String, String> {
    let mut metadata = HashMap::from([
        ("item-id".to_string(), item.id.to_string()),
        ("owner-id".to_string(), item.owner_id.clone()),
    ]);
    if let Some(title) = &item.title {
        metadata.insert("title".to_string(), title.clone());
    }
    if let Some(description) = &item.description {
        metadata.insert("description".to_string(), description.clone());
    }
    if !item.tags.is_empty() {
        let tags: Vec<&str> = item.tags.iter().map(String::as_str).collect();
        metadata.insert("tags".to_string(), tags.join(","));
    }
    metadata
}

/// The archive lifecycle manager
pub struct ArchiveManager {
    storage: Arc<dyn ColdStorage>,
    catalog: Arc<dyn Catalog>,
    locks: ItemLocks,
    config: VaultConfig,
}

impl ArchiveManager {
    pub fn new(
        storage: Arc<dyn ColdStorage>,
        catalog: Arc<dyn Catalog>,
        config: VaultConfig,
    ) -> Self {
        Self {
            storage,
            catalog,
            locks: ItemLocks::new(),
            config,
        }
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Run a backend call under the configured timeout
    async fn call<T, F>(&self, call: F) -> Result<T, StorageError>
    where
        F: Future<Output = Result<T, StorageError>>,
    {
        match self.config.backend_timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
                Err(StorageError::Unavailable(format!(
                    "backend call timed out after {}ms",
                    limit.as_millis()
                )))
            }),
            None => call.await,
        }
    }

    async fn load(&self, id: Uuid) -> Result<ArchivedItem, ArchiveError> {
        self.catalog
            .get(id)
            .await?
            .ok_or(ArchiveError::NotFound { id })
    }

    /// Write `content` to cold storage and catalog it
    ///
    /// The item is inserted only after the backend acknowledged the write.
    /// Dropping the returned future before that point leaves no catalog
    /// entry behind.
    pub async fn archive(
        &self,
        request: ArchiveRequest,
        content: Bytes,
    ) -> Result<ArchivedItem, ArchiveError> {
        let tags = request.validate(self.config.max_upload_bytes)?;
        if content.len() as u64 != request.size_bytes {
            return Err(ArchiveError::validation(
                "sizeBytes",
                format!(
                    "declared {} bytes but received {}",
                    request.size_bytes,
                    content.len()
                ),
            ));
        }

        let id = Uuid::new_v4();
        let key = storage_key(
            &self.config.key_prefix,
            &request.owner_id,
            id,
            &request.original_name,
        );
        let mut item = ArchivedItem::uploading(id, &request, key, tags, Utc::now());

        let object = PutObject {
            key: item.storage_key.clone(),
            body: content,
            content_type: item.content_type.clone(),
            storage_class: self.storage.coldest_class(),
            metadata: object_metadata(&item),
        };
        let storage_class = object.storage_class;

        if let Err(e) = self.call(self.storage.put(object)).await {
            item.advance(ArchiveStatus::Failed, None)?;
            tracing::warn!("[Vault] Upload of {} failed: {}", item.storage_key, e);
            return Err(ArchiveError::storage(StorageOp::Write, &item.storage_key, e));
        }

        item.advance(ArchiveStatus::Archived, None)?;
        if let Err(e) = self.catalog.insert(item.clone()).await {
            tracing::error!("[Vault] Failed to catalog {}: {}", item.id, e);
            if let Err(cleanup) = self.call(self.storage.delete(&item.storage_key)).await {
                tracing::warn!(
                    "[Vault] Could not remove uncatalogued object {}: {}",
                    item.storage_key,
                    cleanup
                );
            }
            return Err(e.into());
        }

        tracing::info!(
            "[Vault] Archived {} for {} ({} bytes, {})",
            item.id,
            item.owner_id,
            item.size_bytes,
            storage_class
        );
        Ok(item)
    }

    pub async fn get(&self, id: Uuid) -> Result<ArchivedItem, ArchiveError> {
        self.load(id).await
    }

    /// Items of one owner, newest first
    pub async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<ArchivedItem>, ArchiveError> {
        let owner_id = owner_id.trim();
        if owner_id.is_empty() {
            return Err(ArchiveError::validation("ownerId", "owner id cannot be empty"));
        }
        let mut items = self.catalog.list_by_owner(owner_id).await?;
        items.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(items)
    }

    /// Ask the backend for a temporary readable copy
    ///
    /// A restored copy the backend still reports as live makes this a
    /// no-op. A request the backend answers with a restore already in
    /// flight is coalesced into success.
    pub async fn request_restore(
        &self,
        id: Uuid,
        tier: RestoreTier,
    ) -> Result<RestoreReceipt, ArchiveError> {
        let _guard = self.locks.acquire(id).await;
        let mut item = self.load(id).await?;
        let settings = self.config.tiers.get(tier);

        if item.status == ArchiveStatus::Restored {
            self.reconcile_locked(&mut item).await?;
            if item.restore_is_live(Utc::now()) {
                tracing::debug!("[Vault] {} already restored, nothing to do", id);
                return Ok(RestoreReceipt {
                    id,
                    tier,
                    status: item.status,
                    coalesced: false,
                    estimated_completion_secs: 0,
                    restore_expires_at: item.restore_expires_at,
                });
            }
        }

        let in_flight = item.status.is_restore_in_flight();
        if !in_flight && item.status != ArchiveStatus::Archived {
            return Err(ArchiveError::InvalidTransition {
                from: item.status,
                to: ArchiveStatus::RestoreRequested,
            });
        }

        let ack = self
            .call(self.storage.restore(
                &item.storage_key,
                &settings.backend_name,
                self.config.restore_retention_days,
            ))
            .await
            .map_err(|e| {
                tracing::warn!("[Vault] Restore of {} failed: {}", item.storage_key, e);
                ArchiveError::storage(StorageOp::Read, &item.storage_key, e)
            })?;

        if item.status == ArchiveStatus::Archived {
            let mut next = item.clone();
            next.advance(ArchiveStatus::RestoreRequested, None)?;
            self.catalog.replace(&next).await?;
            item = next;
        }

        let coalesced = ack == RestoreAck::AlreadyInProgress;
        tracing::info!(
            "[Vault] Restore of {} requested ({}, {}){}",
            id,
            tier,
            settings.backend_name,
            if coalesced { ", coalesced" } else { "" }
        );

        Ok(RestoreReceipt {
            id,
            tier,
            status: item.status,
            coalesced,
            estimated_completion_secs: settings.estimated_completion.as_secs(),
            restore_expires_at: item.restore_expires_at,
        })
    }

    /// Re-derive the item's status from a fresh backend poll
    pub async fn reconcile_status(&self, id: Uuid) -> Result<ArchiveStatus, ArchiveError> {
        let _guard = self.locks.acquire(id).await;
        let mut item = self.load(id).await?;
        self.reconcile_locked(&mut item).await?;
        Ok(item.status)
    }

    /// Reconcile every item with a restore in flight or a restored copy
    ///
    /// Returns how many items changed status. Failures are logged and
    /// skipped so one bad object does not stall the sweep.
    pub async fn reconcile_pending(&self) -> Result<usize, ArchiveError> {
        let pending = self.catalog.list_with_status(&PENDING_STATUSES).await?;
        let checked = pending.len();

        let changed = stream::iter(pending)
            .map(|item| async move {
                match self.reconcile_status(item.id).await {
                    Ok(status) => status != item.status,
                    Err(e) => {
                        tracing::warn!("[Vault] Reconcile of {} failed: {}", item.id, e);
                        false
                    }
                }
            })
            .buffer_unordered(self.config.reconcile_concurrency.max(1))
            .filter(|changed| futures_util::future::ready(*changed))
            .count()
            .await;

        tracing::debug!("[Vault] Reconciled {} items, {} changed", checked, changed);
        Ok(changed)
    }

    /// Caller must hold the item's lock
    async fn reconcile_locked(&self, item: &mut ArchivedItem) -> Result<(), ArchiveError> {
        if matches!(item.status, ArchiveStatus::Failed | ArchiveStatus::Uploading) {
            return Ok(());
        }

        let head = match self.call(self.storage.head(&item.storage_key)).await {
            Ok(head) => head,
            Err(StorageError::NotFound { .. }) if item.status == ArchiveStatus::RestoreRequested => {
                let mut failed = item.clone();
                failed.advance(ArchiveStatus::Failed, None)?;
                self.catalog.replace(&failed).await?;
                tracing::warn!(
                    "[Vault] {} vanished from cold storage while a restore was pending",
                    item.id
                );
                *item = failed;
                return Ok(());
            }
            Err(e) => return Err(ArchiveError::storage(StorageOp::Read, &item.storage_key, e)),
        };

        let now = Utc::now();
        let observed = reconcile::observe(&head, now);
        let Some((target, expiry)) = reconcile::target(item.status, observed, now) else {
            tracing::debug!("[Vault] {} stays {} ({:?})", item.id, item.status, observed);
            return Ok(());
        };

        let mut next = item.clone();
        let entered = next.walk_to(target, expiry)?;
        if next != *item {
            self.catalog.replace(&next).await?;
            if !entered.is_empty() {
                tracing::info!("[Vault] {} {} -> {}", item.id, item.status, next.status);
            }
            *item = next;
        }
        Ok(())
    }

    /// Presigned reference to a restored copy
    ///
    /// Valid for the configured download TTL, never past the end of the
    /// restore window.
    pub async fn get_download_reference(
        &self,
        id: Uuid,
    ) -> Result<DownloadReference, ArchiveError> {
        let _guard = self.locks.acquire(id).await;
        let mut item = self.load(id).await?;
        self.reconcile_locked(&mut item).await?;

        let now = Utc::now();
        let expires_at = match item.restore_expires_at {
            Some(expires_at) if item.restore_is_live(now) => expires_at,
            _ => {
                return Err(ArchiveError::NotRestored {
                    id,
                    status: item.status,
                });
            }
        };

        let remaining = (expires_at - now).to_std().unwrap_or(Duration::ZERO);
        let ttl = self.config.download_ttl.min(remaining);
        let presigned = self
            .call(self.storage.presign(&item.storage_key, ttl))
            .await
            .map_err(|e| ArchiveError::storage(StorageOp::Read, &item.storage_key, e))?;

        tracing::debug!("[Vault] Issued download reference for {} ({}s)", id, ttl.as_secs());
        Ok(DownloadReference {
            id,
            url: presigned.url,
            expires_at: presigned.expires_at,
            ttl_secs: ttl.as_secs(),
        })
    }

    /// Change title, description or tags
    pub async fn update_metadata(
        &self,
        id: Uuid,
        update: MetadataUpdate,
    ) -> Result<ArchivedItem, ArchiveError> {
        let _guard = self.locks.acquire(id).await;
        let item = self.load(id).await?;
        if update.is_empty() {
            return Ok(item);
        }

        let mut next = item;
        next.apply_update(&update)?;
        self.catalog.replace(&next).await?;
        tracing::info!("[Vault] Updated metadata of {}", id);
        Ok(next)
    }

    /// Remove the backend object, then the catalog entry
    ///
    /// The catalog entry survives a failed backend delete.
    pub async fn delete(&self, id: Uuid) -> Result<(), ArchiveError> {
        let _guard = self.locks.acquire(id).await;
        let item = self.load(id).await?;

        match self.call(self.storage.delete(&item.storage_key)).await {
            Ok(()) | Err(StorageError::NotFound { .. }) => {}
            Err(e) => {
                tracing::warn!("[Vault] Delete of {} failed: {}", item.storage_key, e);
                return Err(ArchiveError::storage(StorageOp::Delete, &item.storage_key, e));
            }
        }

        self.catalog.remove(id).await?;
        tracing::info!("[Vault] Deleted {}", id);
        Ok(())
    }

    /// Counts and byte totals by status; no backend calls
    pub async fn stats(&self, owner_id: &str) -> Result<OwnerStats, ArchiveError> {
        let owner_id = owner_id.trim();
        if owner_id.is_empty() {
            return Err(ArchiveError::validation("ownerId", "owner id cannot be empty"));
        }
        let items = self.catalog.list_by_owner(owner_id).await?;
        Ok(OwnerStats::from_items(owner_id, &items))
    }
}
