//! Property-based tests for reconciliation

use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use coldvault::backend::storage::{ObjectHead, RestoreMarker, StorageClass};
use coldvault::backend::vault::reconcile::{self, Observed};
use coldvault::shared::{ArchiveRequest, ArchiveStatus, ArchivedItem};

fn item_at(status: ArchiveStatus, now: DateTime<Utc>) -> ArchivedItem {
    let request = ArchiveRequest::new("u1", "cat.png", "image/png", 10);
    let mut item = ArchivedItem::uploading(
        Uuid::new_v4(),
        &request,
        "photos/u1/cat.png".to_string(),
        Default::default(),
        now,
    );
    item.advance(ArchiveStatus::Archived, None).unwrap();
    item.walk_to(status, Some(now + Duration::hours(3))).unwrap();
    item
}

fn cycle_status() -> impl Strategy<Value = ArchiveStatus> {
    prop::sample::select(vec![
        ArchiveStatus::Archived,
        ArchiveStatus::RestoreRequested,
        ArchiveStatus::Restoring,
        ArchiveStatus::Restored,
    ])
}

/// Restore marker as reported by the backend, expiry as an hour offset
fn marker() -> impl Strategy<Value = Option<(bool, Option<i64>)>> {
    proptest::option::of((
        any::<bool>(),
        proptest::option::of(prop_oneof![-72i64..=-1, 1i64..=72]),
    ))
}

proptest! {
    #[test]
    fn test_reconcile_always_finds_a_legal_path(
        current in cycle_status(),
        reported in marker(),
    ) {
        let now = Utc::now();
        let mut item = item_at(current, now);
        let head = ObjectHead {
            storage_class: StorageClass::DeepArchive,
            restore: reported.map(|(ongoing, offset)| RestoreMarker {
                ongoing,
                expiry: offset.map(|hours| now + Duration::hours(hours)),
            }),
            content_length: 10,
            content_type: "image/png".to_string(),
        };

        let observed = reconcile::observe(&head, now);
        if let Some((target, expiry)) = reconcile::target(item.status, observed, now) {
            item.walk_to(target, expiry).unwrap();
            prop_assert_eq!(item.status, target);
        } else {
            prop_assert_eq!(item.status, current);
        }
        prop_assert!(item.has_consistent_restore_window());

        match observed {
            Observed::Restored { expires_at } => {
                prop_assert_eq!(item.status, ArchiveStatus::Restored);
                prop_assert_eq!(item.restore_expires_at, Some(expires_at));
            }
            Observed::Expired { .. } => prop_assert_eq!(item.status, ArchiveStatus::Archived),
            Observed::Restoring => prop_assert_eq!(item.status, ArchiveStatus::Restoring),
            Observed::Archived => prop_assert_eq!(item.status, ArchiveStatus::Archived),
        }
    }

    #[test]
    fn test_reconcile_is_idempotent(
        current in cycle_status(),
        reported in marker(),
    ) {
        let now = Utc::now();
        let mut item = item_at(current, now);
        let head = ObjectHead {
            storage_class: StorageClass::DeepArchive,
            restore: reported.map(|(ongoing, offset)| RestoreMarker {
                ongoing,
                expiry: offset.map(|hours| now + Duration::hours(hours)),
            }),
            content_length: 10,
            content_type: "image/png".to_string(),
        };

        let observed = reconcile::observe(&head, now);
        if let Some((target, expiry)) = reconcile::target(item.status, observed, now) {
            item.walk_to(target, expiry).unwrap();
        }
        let settled = item.clone();
        if let Some((target, expiry)) = reconcile::target(item.status, observed, now) {
            let entered = item.walk_to(target, expiry).unwrap();
            prop_assert!(entered.is_empty());
        }
        prop_assert_eq!(item, settled);
    }
}
