/**
 * Status Reconciliation
 *
 * Derives an item's status from a fresh backend head response. The local
 * status is only used to decide how to get to the observed state without
 * skipping lifecycle edges; it is never trusted over the backend. A restore
 * the catalog still thinks is in flight but the backend no longer reports
 * is walked through `Restored` with a lapsed expiry back to `Archived`.
 *
 * | backend signal                                   | observed        |
 * |--------------------------------------------------|-----------------|
 * | no restore marker                                | `Archived`      |
 * | marker, `ongoing=true`                           | `Restoring`     |
 * | marker, `ongoing=false`, expiry in the future    | `Restored`      |
 * | marker, `ongoing=false`, expiry in the past      | `Expired`       |
 * | marker, `ongoing=false`, no expiry               | `Restoring`     |
 */

use chrono::{DateTime, Utc};

use crate::backend::storage::ObjectHead;
use crate::shared::archive::ArchiveStatus;

/// What the backend says about an object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observed {
    /// Cold, no restore job or restored copy
    Archived,
    /// A restore job is running
    Restoring,
    /// A restored copy is readable until the given time
    Restored { expires_at: DateTime<Utc> },
    /// The restored copy has lapsed
    Expired { expired_at: DateTime<Utc> },
}

/// Interpret a head response at `now`
pub fn observe(head: &ObjectHead, now: DateTime<Utc>) -> Observed {
    match head.restore {
        None => {
            if !head.storage_class.is_cold() {
                tracing::warn!(
                    "[Reconcile] object reported in {} without restore marker",
                    head.storage_class
                );
            }
            Observed::Archived
        }
        Some(marker) if marker.ongoing => Observed::Restoring,
        Some(marker) => match marker.expiry {
            Some(expiry) if expiry > now => Observed::Restored { expires_at: expiry },
            Some(expiry) => Observed::Expired { expired_at: expiry },
            // Completion without an expiry is not trusted yet.
            None => Observed::Restoring,
        },
    }
}

/// Status to walk to, and the expiry to use when passing through `Restored`
///
/// `None` means the current status stands: `Failed` is terminal and an
/// upload is not reconciled.
pub fn target(
    current: ArchiveStatus,
    observed: Observed,
    now: DateTime<Utc>,
) -> Option<(ArchiveStatus, Option<DateTime<Utc>>)> {
    if matches!(current, ArchiveStatus::Failed | ArchiveStatus::Uploading) {
        return None;
    }
    match observed {
        Observed::Archived if current.is_restore_in_flight() => {
            Some((ArchiveStatus::Archived, Some(now)))
        }
        Observed::Archived => Some((ArchiveStatus::Archived, None)),
        Observed::Restoring => Some((ArchiveStatus::Restoring, None)),
        Observed::Restored { expires_at } => Some((ArchiveStatus::Restored, Some(expires_at))),
        Observed::Expired { expired_at } => Some((ArchiveStatus::Archived, Some(expired_at))),
    }
}
