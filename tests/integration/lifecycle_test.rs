//! Archive, metadata, delete and stats against a scripted backend

use std::collections::BTreeSet;
use std::time::Duration;

use assert_matches::assert_matches;
use bytes::Bytes;
use pretty_assertions::assert_eq;

use coldvault::backend::storage::{StorageClass, StorageError};
use coldvault::backend::vault::{ArchiveError, Catalog};
use coldvault::shared::{ArchiveRequest, ArchiveStatus, MetadataUpdate, VaultConfig};

use crate::common::{harness, harness_with, photo};

#[tokio::test]
async fn test_archive_stores_cold_object_then_catalogs_it() {
    let h = harness();
    let (request, content) = photo("u1", 1000);
    let request = request.with_tags(["a", "b"]);

    let item = assert_ok!(h.manager.archive(request, content).await);

    assert_eq!(item.status, ArchiveStatus::Archived);
    assert_eq!(
        item.tags,
        BTreeSet::from(["a".to_string(), "b".to_string()])
    );
    assert_eq!(item.size_bytes, 1000);
    assert!(item.restore_expires_at.is_none());

    let object = h.storage.object(&item.storage_key).expect("object written");
    assert_eq!(object.storage_class, StorageClass::DeepArchive);
    assert_eq!(object.body.len(), 1000);
    assert_eq!(object.metadata["owner-id"], "u1");
    assert_eq!(object.metadata["item-id"], item.id.to_string());

    let stored = h.catalog.get(item.id).await.unwrap().expect("catalogued");
    assert_eq!(stored, item);
}

#[tokio::test]
async fn test_keys_do_not_collide_across_owners() {
    let h = harness();
    let a = h.archived("u1").await;
    let b = h.archived("u2").await;
    assert_ne!(a.storage_key, b.storage_key);
    assert_contains!(a.storage_key, "/u1/");
    assert_contains!(b.storage_key, "/u2/");
}

#[tokio::test]
async fn test_failed_write_leaves_no_catalog_entry() {
    let h = harness();
    h.storage
        .fail_puts(StorageError::Rejected("access denied".to_string()));

    let (request, content) = photo("u1", 10);
    let err = h.manager.archive(request, content).await.unwrap_err();

    assert_matches!(err, ArchiveError::StorageWriteFailed { .. });
    assert!(h.catalog.is_empty().await);
    assert!(h.manager.list_for_owner("u1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_transient_write_failure_is_unavailable() {
    let h = harness();
    h.storage
        .fail_puts(StorageError::Unavailable("slow down".to_string()));

    let (request, content) = photo("u1", 10);
    let err = h.manager.archive(request, content).await.unwrap_err();
    assert!(err.is_retryable());
    assert!(h.catalog.is_empty().await);
}

#[tokio::test]
async fn test_validation_happens_before_any_backend_call() {
    let h = harness_with(VaultConfig::builder().max_upload_bytes(100).build().unwrap());

    let (request, content) = photo("", 10);
    assert_err!(
        h.manager.archive(request, content).await,
        ArchiveError::Validation { .. }
    );

    let (request, content) = photo("u1", 101);
    assert_err!(
        h.manager.archive(request, content).await,
        ArchiveError::Validation { .. }
    );

    let request = ArchiveRequest::new("u1", "a.png", "image/png", 3).with_tags(["ok", " "]);
    assert_err!(
        h.manager.archive(request, Bytes::from_static(b"abc")).await,
        ArchiveError::Validation { .. }
    );

    assert_eq!(h.storage.calls("put"), 0);
}

#[tokio::test]
async fn test_cancelled_upload_leaves_no_trace() {
    let h = harness();
    h.storage.slow_puts(Duration::from_secs(5));

    let (request, content) = photo("u1", 10);
    let outcome =
        tokio::time::timeout(Duration::from_millis(50), h.manager.archive(request, content)).await;

    assert!(outcome.is_err(), "upload should still be pending");
    assert_eq!(h.storage.calls("put"), 1);
    assert!(h.catalog.is_empty().await);
    assert_eq!(h.storage.object_count(), 0);
}

#[tokio::test]
async fn test_backend_timeout_maps_to_unavailable() {
    let config = VaultConfig::builder()
        .backend_timeout(Duration::from_millis(20))
        .build()
        .unwrap();
    let h = harness_with(config);
    h.storage.slow_puts(Duration::from_secs(2));

    let (request, content) = photo("u1", 10);
    let err = h.manager.archive(request, content).await.unwrap_err();
    assert_matches!(err, ArchiveError::Unavailable { .. });
    assert!(h.catalog.is_empty().await);
}

#[tokio::test]
async fn test_update_metadata_round_trip() {
    let h = harness();
    let (request, content) = photo("u1", 10);
    let item = h
        .manager
        .archive(
            request.with_title("Old").with_description("Keep me"),
            content,
        )
        .await
        .unwrap();

    let update = MetadataUpdate {
        title: Some("New".to_string()),
        tags: Some(vec!["x".to_string(), "y".to_string(), "x".to_string()]),
        ..Default::default()
    };
    let updated = assert_ok!(h.manager.update_metadata(item.id, update).await);
    let read_back = h.manager.get(item.id).await.unwrap();

    assert_eq!(read_back, updated);
    assert_eq!(read_back.title.as_deref(), Some("New"));
    assert_eq!(read_back.description.as_deref(), Some("Keep me"));
    assert_eq!(read_back.tags.len(), 2);
    assert_eq!(read_back.id, item.id);
    assert_eq!(read_back.storage_key, item.storage_key);
    assert_eq!(read_back.size_bytes, item.size_bytes);
    assert_eq!(read_back.status, item.status);
    assert_eq!(read_back.uploaded_at, item.uploaded_at);
}

#[tokio::test]
async fn test_update_unknown_item() {
    let h = harness();
    assert_err!(
        h.manager
            .update_metadata(uuid::Uuid::new_v4(), MetadataUpdate::default())
            .await,
        ArchiveError::NotFound { .. }
    );
}

#[tokio::test]
async fn test_failed_backend_delete_keeps_catalog_entry() {
    let h = harness();
    let item = h.archived("u1").await;
    h.storage
        .fail_deletes(StorageError::Rejected("object locked".to_string()));

    let err = h.manager.delete(item.id).await.unwrap_err();

    assert_matches!(err, ArchiveError::StorageDeleteFailed { ref key, .. } if *key == item.storage_key);
    assert_eq!(h.manager.get(item.id).await.unwrap().id, item.id);
    assert!(h.storage.object(&item.storage_key).is_some());

    h.storage.heal();
    assert_ok!(h.manager.delete(item.id).await);
    assert!(h.catalog.is_empty().await);
    assert!(h.storage.object(&item.storage_key).is_none());
}

#[tokio::test]
async fn test_delete_tolerates_missing_backend_object() {
    let h = harness();
    let item = h.archived("u1").await;
    h.storage.lose(&item.storage_key);

    assert_ok!(h.manager.delete(item.id).await);
    assert_err!(h.manager.get(item.id).await, ArchiveError::NotFound { .. });
}

#[tokio::test]
async fn test_stats_come_from_catalog_only() {
    let h = harness();
    let a = h.archived("u1").await;
    h.archived("u1").await;
    h.archived("u2").await;
    h.manager
        .request_restore(a.id, coldvault::shared::RestoreTier::Bulk)
        .await
        .unwrap();

    let heads_before = h.storage.calls("head");
    let stats = h.manager.stats("u1").await.unwrap();

    assert_eq!(h.storage.calls("head"), heads_before);
    assert_eq!(stats.total_items, 2);
    assert_eq!(stats.total_bytes, 128);
    assert_eq!(stats.count(ArchiveStatus::Archived), 1);
    assert_eq!(stats.count(ArchiveStatus::RestoreRequested), 1);
    assert_eq!(stats.restoring(), 1);
}

#[tokio::test]
async fn test_list_for_owner_newest_first() {
    let h = harness();
    let first = h.archived("u1").await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = h.archived("u1").await;

    let items = h.manager.list_for_owner("u1").await.unwrap();
    let ids: Vec<_> = items.iter().map(|item| item.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}
