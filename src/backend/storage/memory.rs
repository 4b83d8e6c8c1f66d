/**
 * In-Process Cold Storage
 *
 * A `ColdStorage` implementation that keeps objects in memory and simulates
 * the pacing of a real archive tier: restore jobs finish after a
 * per-tier delay, restored copies lapse after their retention period, and
 * cold objects cannot be read without a live restored copy.
 *
 * Presigned references point at `{base_url}/blobs/{token}` where `token` is
 * a download token from `DownloadSigner`.
 */

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{
    ColdStorage, DownloadSigner, ObjectHead, PresignedUrl, PutObject, RestoreAck, RestoreMarker,
    StorageClass, StorageError,
};

#[derive(Debug, Clone)]
struct StoredObject {
    body: Bytes,
    content_type: String,
    storage_class: StorageClass,
    metadata: HashMap<String, String>,
    restore: Option<RestoreJob>,
}

#[derive(Debug, Clone, Copy)]
struct RestoreJob {
    ready_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

enum RestoreState {
    None,
    Ongoing,
    Live(DateTime<Utc>),
}

impl StoredObject {
    fn restore_state(&self, now: DateTime<Utc>) -> RestoreState {
        match self.restore {
            Some(job) if now < job.ready_at => RestoreState::Ongoing,
            Some(job) if now < job.expires_at => RestoreState::Live(job.expires_at),
            _ => RestoreState::None,
        }
    }

    fn readable(&self, now: DateTime<Utc>) -> bool {
        !self.storage_class.is_cold() || matches!(self.restore_state(now), RestoreState::Live(_))
    }
}

/// In-memory `ColdStorage`
#[derive(Debug, Clone)]
pub struct MemoryColdStorage {
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
    signer: DownloadSigner,
    base_url: String,
    restore_delays: HashMap<String, Duration>,
    default_restore_delay: Duration,
}

impl MemoryColdStorage {
    /// Restores complete immediately unless delays are configured
    pub fn new(signer: DownloadSigner, base_url: impl Into<String>) -> Self {
        Self {
            objects: Arc::new(RwLock::new(HashMap::new())),
            signer,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            restore_delays: HashMap::new(),
            default_restore_delay: Duration::ZERO,
        }
    }

    /// Delay for tiers without a specific setting
    pub fn with_default_restore_delay(mut self, delay: Duration) -> Self {
        self.default_restore_delay = delay;
        self
    }

    /// Delay for one backend tier name
    pub fn with_restore_delay(mut self, tier: impl Into<String>, delay: Duration) -> Self {
        self.restore_delays.insert(tier.into(), delay);
        self
    }

    fn restore_delay(&self, tier: &str) -> Duration {
        self.restore_delays
            .get(tier)
            .copied()
            .unwrap_or(self.default_restore_delay)
    }

    /// Number of stored objects
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }

    /// User metadata written with the object
    pub async fn metadata(&self, key: &str) -> Option<HashMap<String, String>> {
        self.objects
            .read()
            .await
            .get(key)
            .map(|object| object.metadata.clone())
    }
}

fn chrono_duration(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::days(36_500))
}

#[async_trait]
impl ColdStorage for MemoryColdStorage {
    fn coldest_class(&self) -> StorageClass {
        StorageClass::DeepArchive
    }

    async fn put(&self, object: PutObject) -> Result<(), StorageError> {
        if object.key.is_empty() {
            return Err(StorageError::Rejected("empty object key".to_string()));
        }
        tracing::debug!(
            "[MemoryStorage] put {} ({} bytes, {})",
            object.key,
            object.body.len(),
            object.storage_class
        );
        let stored = StoredObject {
            body: object.body,
            content_type: object.content_type,
            storage_class: object.storage_class,
            metadata: object.metadata,
            restore: None,
        };
        self.objects.write().await.insert(object.key, stored);
        Ok(())
    }

    async fn head(&self, key: &str) -> Result<ObjectHead, StorageError> {
        let objects = self.objects.read().await;
        let object = objects.get(key).ok_or_else(|| StorageError::NotFound {
            key: key.to_string(),
        })?;
        let restore = match object.restore_state(Utc::now()) {
            RestoreState::None => None,
            RestoreState::Ongoing => Some(RestoreMarker::ongoing()),
            RestoreState::Live(expiry) => Some(RestoreMarker::completed(expiry)),
        };
        Ok(ObjectHead {
            storage_class: object.storage_class,
            restore,
            content_length: object.body.len() as u64,
            content_type: object.content_type.clone(),
        })
    }

    async fn restore(
        &self,
        key: &str,
        tier: &str,
        retention_days: u32,
    ) -> Result<RestoreAck, StorageError> {
        let mut objects = self.objects.write().await;
        let object = objects.get_mut(key).ok_or_else(|| StorageError::NotFound {
            key: key.to_string(),
        })?;
        if !object.storage_class.is_cold() {
            return Err(StorageError::Rejected(format!(
                "object {} is in {} and needs no restore",
                key, object.storage_class
            )));
        }

        let now = Utc::now();
        let retention = chrono::Duration::days(i64::from(retention_days));
        match object.restore_state(now) {
            RestoreState::Ongoing => Ok(RestoreAck::AlreadyInProgress),
            RestoreState::Live(_) => {
                // A restore on a live copy only moves its expiry.
                if let Some(job) = object.restore.as_mut() {
                    job.expires_at = now + retention;
                }
                Ok(RestoreAck::Accepted)
            }
            RestoreState::None => {
                let ready_at = now + chrono_duration(self.restore_delay(tier));
                object.restore = Some(RestoreJob {
                    ready_at,
                    expires_at: ready_at + retention,
                });
                tracing::debug!("[MemoryStorage] restore of {} ({}) ready at {}", key, tier, ready_at);
                Ok(RestoreAck::Accepted)
            }
        }
    }

    async fn get(&self, key: &str) -> Result<Bytes, StorageError> {
        let objects = self.objects.read().await;
        let object = objects.get(key).ok_or_else(|| StorageError::NotFound {
            key: key.to_string(),
        })?;
        if !object.readable(Utc::now()) {
            return Err(StorageError::InvalidObjectState {
                key: key.to_string(),
            });
        }
        Ok(object.body.clone())
    }

    async fn presign(&self, key: &str, ttl: Duration) -> Result<PresignedUrl, StorageError> {
        if !self.objects.read().await.contains_key(key) {
            return Err(StorageError::NotFound {
                key: key.to_string(),
            });
        }
        let (token, expires_at) = self
            .signer
            .sign(key, ttl)
            .map_err(|e| StorageError::Rejected(format!("failed to sign reference: {}", e)))?;
        Ok(PresignedUrl {
            url: format!("{}/blobs/{}", self.base_url, token),
            expires_at,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        // Deleting a missing key succeeds, as on object stores.
        self.objects.write().await.remove(key);
        Ok(())
    }
}
