//! HTTP request and response bodies
//!
//! Wire shapes for the vault API. They wrap the records in
//! [`crate::shared::archive`] and never expose backend types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::archive::{ArchiveStatus, ArchivedItem, RestoreTier};

/// Single item response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemResponse {
    pub item: ArchivedItem,
}

/// Items owned by one owner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemListResponse {
    pub items: Vec<ArchivedItem>,
    pub count: usize,
}

/// `owner` query parameter for list and stats
///
/// Optional at the extractor so a missing owner is reported with the usual
/// JSON error body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwnerQuery {
    #[serde(default)]
    pub owner: Option<String>,
}

/// Body of `POST /items/{id}/restore`; an empty body means the default tier
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RestoreBody {
    #[serde(default)]
    pub tier: RestoreTier,
}

/// Result of a reconcile poll
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub id: Uuid,
    pub status: ArchiveStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restore_expires_at: Option<DateTime<Utc>>,
}
