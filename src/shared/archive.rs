//! Archived Item Data Model
//!
//! Plain records describing items held in cold storage, together with the
//! lifecycle state machine that governs their `status`.
//!
//! # Lifecycle
//!
//! ```text
//! Uploading -> Archived -> RestoreRequested -> Restoring -> Restored
//!     |                          |                             |
//!     v                          v                             |
//!   Failed                     Failed          Archived <------+
//! ```
//!
//! `Restored -> Archived` is the only edge that closes the cycle. Every
//! status change goes through [`ArchivedItem::advance`] or
//! [`ArchivedItem::walk_to`], which keep `restore_expires_at` present exactly
//! while the item is `Restored`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::SharedError;

/// Longest tag accepted on an item
pub const MAX_TAG_LEN: usize = 64;

/// Position of an item in the archive lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveStatus {
    Uploading,
    Archived,
    RestoreRequested,
    Restoring,
    Restored,
    Failed,
}

impl ArchiveStatus {
    pub const ALL: [ArchiveStatus; 6] = [
        ArchiveStatus::Uploading,
        ArchiveStatus::Archived,
        ArchiveStatus::RestoreRequested,
        ArchiveStatus::Restoring,
        ArchiveStatus::Restored,
        ArchiveStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveStatus::Uploading => "uploading",
            ArchiveStatus::Archived => "archived",
            ArchiveStatus::RestoreRequested => "restore_requested",
            ArchiveStatus::Restoring => "restoring",
            ArchiveStatus::Restored => "restored",
            ArchiveStatus::Failed => "failed",
        }
    }

    /// Whether `next` is a lifecycle edge out of this status
    pub fn can_transition_to(self, next: ArchiveStatus) -> bool {
        use ArchiveStatus::*;
        matches!(
            (self, next),
            (Uploading, Archived)
                | (Uploading, Failed)
                | (Archived, RestoreRequested)
                | (RestoreRequested, Restoring)
                | (RestoreRequested, Failed)
                | (Restoring, Restored)
                | (Restored, Archived)
        )
    }

    /// Successor on the restore cycle, `None` outside of it
    pub fn next_in_cycle(self) -> Option<ArchiveStatus> {
        use ArchiveStatus::*;
        match self {
            Archived => Some(RestoreRequested),
            RestoreRequested => Some(Restoring),
            Restoring => Some(Restored),
            Restored => Some(Archived),
            Uploading | Failed => None,
        }
    }

    /// A restore job has been issued and has not completed yet
    pub fn is_restore_in_flight(self) -> bool {
        matches!(self, ArchiveStatus::RestoreRequested | ArchiveStatus::Restoring)
    }
}

impl fmt::Display for ArchiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArchiveStatus {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArchiveStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| SharedError::validation("status", format!("unknown status '{}'", s)))
    }
}

/// Abstract restore speed class
///
/// Each tier is mapped to a backend tier name and an estimated completion
/// window through configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum RestoreTier {
    Expedited,
    #[default]
    Standard,
    Bulk,
}

impl RestoreTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestoreTier::Expedited => "Expedited",
            RestoreTier::Standard => "Standard",
            RestoreTier::Bulk => "Bulk",
        }
    }
}

impl fmt::Display for RestoreTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RestoreTier {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "expedited" => Ok(RestoreTier::Expedited),
            "standard" => Ok(RestoreTier::Standard),
            "bulk" => Ok(RestoreTier::Bulk),
            other => Err(SharedError::validation(
                "tier",
                format!("unknown restore tier '{}'", other),
            )),
        }
    }
}

/// An item durably stored in cold storage and tracked by the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedItem {
    pub id: Uuid,
    pub owner_id: String,
    /// Backend-specific object location
    pub storage_key: String,
    pub original_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub status: ArchiveStatus,
    pub uploaded_at: DateTime<Utc>,
    /// Present only while a restored copy is live
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restore_expires_at: Option<DateTime<Utc>>,
}

impl ArchivedItem {
    /// Start a new item in `Uploading` from a validated request
    pub fn uploading(
        id: Uuid,
        request: &ArchiveRequest,
        storage_key: String,
        tags: BTreeSet<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id: request.owner_id.trim().to_string(),
            storage_key,
            original_name: request.original_name.clone(),
            content_type: request.content_type.clone(),
            size_bytes: request.size_bytes,
            title: non_blank(request.title.as_deref()),
            description: non_blank(request.description.as_deref()),
            tags,
            status: ArchiveStatus::Uploading,
            uploaded_at: now,
            restore_expires_at: None,
        }
    }

    /// Move along a single lifecycle edge
    ///
    /// `restore_expires_at` is required when entering `Restored` and is
    /// cleared on every other edge.
    pub fn advance(
        &mut self,
        next: ArchiveStatus,
        restore_expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), SharedError> {
        if !self.status.can_transition_to(next) {
            return Err(SharedError::transition(self.status, next));
        }
        if next == ArchiveStatus::Restored {
            let expires_at = restore_expires_at.ok_or_else(|| {
                SharedError::validation("restoreExpiresAt", "a restored item needs an expiry")
            })?;
            self.restore_expires_at = Some(expires_at);
        } else {
            self.restore_expires_at = None;
        }
        self.status = next;
        Ok(())
    }

    /// Follow the restore cycle edge by edge until `target` is reached
    ///
    /// Returns the statuses entered, in order. On error the item is left
    /// untouched. When already at `Restored`, a new expiry replaces the old
    /// one since the backend may extend a live restore.
    pub fn walk_to(
        &mut self,
        target: ArchiveStatus,
        restore_expires_at: Option<DateTime<Utc>>,
    ) -> Result<Vec<ArchiveStatus>, SharedError> {
        if self.status == target {
            if target == ArchiveStatus::Restored {
                if let Some(expires_at) = restore_expires_at {
                    self.restore_expires_at = Some(expires_at);
                }
            }
            return Ok(Vec::new());
        }

        let mut scratch = self.clone();
        let mut entered = Vec::new();
        while scratch.status != target {
            let next = scratch
                .status
                .next_in_cycle()
                .filter(|_| entered.len() < 4)
                .ok_or_else(|| SharedError::transition(self.status, target))?;
            scratch.advance(next, restore_expires_at)?;
            entered.push(next);
        }
        *self = scratch;
        Ok(entered)
    }

    /// Restored and, by the local clock, not yet expired
    pub fn restore_is_live(&self, now: DateTime<Utc>) -> bool {
        self.status == ArchiveStatus::Restored
            && self.restore_expires_at.map_or(false, |expires_at| expires_at > now)
    }

    /// `restore_expires_at` is set exactly when the item is `Restored`
    pub fn has_consistent_restore_window(&self) -> bool {
        (self.status == ArchiveStatus::Restored) == self.restore_expires_at.is_some()
    }

    /// Apply the mutable subset of fields
    ///
    /// Blank `title`/`description` clear the field. Validation happens
    /// before anything is written.
    pub fn apply_update(&mut self, update: &MetadataUpdate) -> Result<(), SharedError> {
        let tags = match &update.tags {
            Some(tags) => Some(normalize_tags(tags)?),
            None => None,
        };
        if let Some(title) = &update.title {
            self.title = non_blank(Some(title));
        }
        if let Some(description) = &update.description {
            self.description = non_blank(Some(description));
        }
        if let Some(tags) = tags {
            self.tags = tags;
        }
        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Trim tags and collapse duplicates
pub fn normalize_tags<S: AsRef<str>>(tags: &[S]) -> Result<BTreeSet<String>, SharedError> {
    let mut set = BTreeSet::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if tag.is_empty() {
            return Err(SharedError::validation("tags", "tags cannot be empty"));
        }
        if tag.chars().count() > MAX_TAG_LEN {
            return Err(SharedError::validation(
                "tags",
                format!("tag '{}' is longer than {} characters", tag, MAX_TAG_LEN),
            ));
        }
        set.insert(tag.to_string());
    }
    Ok(set)
}

/// Input to the archive operation; the content travels separately
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveRequest {
    pub owner_id: String,
    pub original_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ArchiveRequest {
    pub fn new(
        owner_id: impl Into<String>,
        original_name: impl Into<String>,
        content_type: impl Into<String>,
        size_bytes: u64,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            original_name: original_name.into(),
            content_type: content_type.into(),
            size_bytes,
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Check local preconditions and return the normalized tag set
    pub fn validate(&self, max_upload_bytes: u64) -> Result<BTreeSet<String>, SharedError> {
        if self.owner_id.trim().is_empty() {
            return Err(SharedError::validation("ownerId", "owner id cannot be empty"));
        }
        if self.original_name.trim().is_empty() {
            return Err(SharedError::validation("originalName", "file name cannot be empty"));
        }
        if self.content_type.trim().is_empty() {
            return Err(SharedError::validation("contentType", "content type cannot be empty"));
        }
        if self.size_bytes > max_upload_bytes {
            return Err(SharedError::validation(
                "sizeBytes",
                format!(
                    "{} bytes exceeds the {} byte upload limit",
                    self.size_bytes, max_upload_bytes
                ),
            ));
        }
        normalize_tags(&self.tags)
    }
}

/// Partial update of the mutable item fields
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MetadataUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl MetadataUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.tags.is_none()
    }
}

/// Outcome of a restore request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RestoreReceipt {
    pub id: Uuid,
    pub tier: RestoreTier,
    pub status: ArchiveStatus,
    /// The backend already had a restore in flight for this object
    pub coalesced: bool,
    /// Configured completion window for the tier, zero for a no-op
    pub estimated_completion_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restore_expires_at: Option<DateTime<Utc>>,
}

/// Short-lived, object-scoped access reference
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DownloadReference {
    pub id: Uuid,
    pub url: String,
    pub expires_at: DateTime<Utc>,
    pub ttl_secs: u64,
}

/// Count and byte total for one status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StatusTally {
    pub count: u64,
    pub bytes: u64,
}

/// Per-owner aggregate, computed from the catalog alone
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OwnerStats {
    pub owner_id: String,
    pub total_items: u64,
    pub total_bytes: u64,
    pub by_status: BTreeMap<ArchiveStatus, StatusTally>,
}

impl OwnerStats {
    pub fn from_items<'a, I>(owner_id: &str, items: I) -> Self
    where
        I: IntoIterator<Item = &'a ArchivedItem>,
    {
        let mut stats = OwnerStats {
            owner_id: owner_id.to_string(),
            total_items: 0,
            total_bytes: 0,
            by_status: BTreeMap::new(),
        };
        for item in items.into_iter().filter(|item| item.owner_id == owner_id) {
            stats.total_items += 1;
            stats.total_bytes += item.size_bytes;
            let tally = stats.by_status.entry(item.status).or_default();
            tally.count += 1;
            tally.bytes += item.size_bytes;
        }
        stats
    }

    pub fn count(&self, status: ArchiveStatus) -> u64 {
        self.by_status.get(&status).map_or(0, |tally| tally.count)
    }

    /// Items with a restore job in flight
    pub fn restoring(&self) -> u64 {
        self.count(ArchiveStatus::RestoreRequested) + self.count(ArchiveStatus::Restoring)
    }
}
