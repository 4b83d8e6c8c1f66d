//! Vault HTTP Handlers
//!
//! Thin axum wrappers around `ArchiveManager`. The image-only upload policy
//! lives here, not in the manager.

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::storage::{ColdStorage, DownloadSigner, StorageError};
use crate::backend::vault::manager::ArchiveManager;
use crate::shared::api::{ItemListResponse, ItemResponse, OwnerQuery, RestoreBody, StatusResponse};
use crate::shared::archive::{
    ArchiveRequest, DownloadReference, MetadataUpdate, OwnerStats, RestoreReceipt,
};

/// Accept a JSON array (`["a","b"]`) or a comma list (`a, b`)
fn parse_tags(raw: &str) -> Result<Vec<String>, BackendError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    if raw.starts_with('[') {
        return serde_json::from_str(raw)
            .map_err(|e| BackendError::bad_request(format!("tags must be a JSON array: {}", e)));
    }
    Ok(raw
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect())
}

struct Upload {
    file_name: String,
    content_type: String,
    content: Bytes,
}

/// Archive an uploaded file
///
/// Multipart fields: `file` (or `photo`), `ownerId`, `title`,
/// `description`, `tags`.
pub async fn upload_item(
    State(manager): State<Arc<ArchiveManager>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ItemResponse>), BackendError> {
    let mut upload = None;
    let mut owner_id = None;
    let mut title = None;
    let mut description = None;
    let mut tags = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| BackendError::bad_request(format!("malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" | "photo" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let content = field.bytes().await.map_err(|e| {
                    BackendError::bad_request(format!("failed to read upload: {}", e))
                })?;
                upload = Some(Upload {
                    file_name,
                    content_type,
                    content,
                });
            }
            "ownerId" | "userId" | "title" | "description" | "tags" => {
                let value = field.text().await.map_err(|e| {
                    BackendError::bad_request(format!("failed to read field '{}': {}", name, e))
                })?;
                match name.as_str() {
                    "title" => title = Some(value),
                    "description" => description = Some(value),
                    "tags" => tags = parse_tags(&value)?,
                    _ => owner_id = Some(value),
                }
            }
            other => tracing::debug!("[Server] Ignoring multipart field '{}'", other),
        }
    }

    let upload = upload.ok_or_else(|| BackendError::bad_request("no file uploaded"))?;
    let owner_id = owner_id.ok_or_else(|| BackendError::bad_request("ownerId is required"))?;
    if !manager.config().accepts_media_type(&upload.content_type) {
        tracing::warn!("[Server] Rejected upload of type {}", upload.content_type);
        return Err(BackendError::handler(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            format!("media type {} is not accepted", upload.content_type),
        ));
    }

    let mut request = ArchiveRequest::new(
        owner_id,
        upload.file_name,
        upload.content_type,
        upload.content.len() as u64,
    )
    .with_tags(tags);
    request.title = title;
    request.description = description;

    let item = manager.archive(request, upload.content).await?;
    Ok((StatusCode::CREATED, Json(ItemResponse { item })))
}

fn required_owner(query: OwnerQuery) -> Result<String, BackendError> {
    query
        .owner
        .ok_or_else(|| BackendError::bad_request("owner query parameter is required"))
}

pub async fn list_items(
    State(manager): State<Arc<ArchiveManager>>,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<ItemListResponse>, BackendError> {
    let owner = required_owner(query)?;
    let items = manager.list_for_owner(&owner).await?;
    Ok(Json(ItemListResponse {
        count: items.len(),
        items,
    }))
}

pub async fn owner_stats(
    State(manager): State<Arc<ArchiveManager>>,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<OwnerStats>, BackendError> {
    let owner = required_owner(query)?;
    Ok(Json(manager.stats(&owner).await?))
}

pub async fn get_item(
    State(manager): State<Arc<ArchiveManager>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ItemResponse>, BackendError> {
    let item = manager.get(id).await?;
    Ok(Json(ItemResponse { item }))
}

pub async fn update_item(
    State(manager): State<Arc<ArchiveManager>>,
    Path(id): Path<Uuid>,
    Json(update): Json<MetadataUpdate>,
) -> Result<Json<ItemResponse>, BackendError> {
    let item = manager.update_metadata(id, update).await?;
    Ok(Json(ItemResponse { item }))
}

pub async fn delete_item(
    State(manager): State<Arc<ArchiveManager>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, BackendError> {
    manager.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Request a restore; an absent body uses the default tier
pub async fn request_restore(
    State(manager): State<Arc<ArchiveManager>>,
    Path(id): Path<Uuid>,
    body: Option<Json<RestoreBody>>,
) -> Result<Json<RestoreReceipt>, BackendError> {
    let Json(body) = body.unwrap_or_default();
    Ok(Json(manager.request_restore(id, body.tier).await?))
}

/// Poll the backend and report the reconciled status
pub async fn item_status(
    State(manager): State<Arc<ArchiveManager>>,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusResponse>, BackendError> {
    manager.reconcile_status(id).await?;
    let item = manager.get(id).await?;
    Ok(Json(StatusResponse {
        id,
        status: item.status,
        restore_expires_at: item.restore_expires_at,
    }))
}

pub async fn download_reference(
    State(manager): State<Arc<ArchiveManager>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DownloadReference>, BackendError> {
    Ok(Json(manager.get_download_reference(id).await?))
}

/// Serve the object a download token points at
pub async fn serve_blob(
    State(storage): State<Arc<dyn ColdStorage>>,
    State(signer): State<DownloadSigner>,
    Path(token): Path<String>,
) -> Result<Response, BackendError> {
    let claims = signer.verify(&token).map_err(|e| {
        tracing::warn!("[Server] Rejected download token: {}", e);
        BackendError::handler(StatusCode::FORBIDDEN, "invalid or expired download token")
    })?;

    let body = storage.get(&claims.sub).await.map_err(|e| match e {
        StorageError::NotFound { .. } => BackendError::handler(StatusCode::NOT_FOUND, e.to_string()),
        StorageError::InvalidObjectState { .. } => {
            BackendError::handler(StatusCode::CONFLICT, e.to_string())
        }
        StorageError::Unavailable(_) => {
            BackendError::handler(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
        StorageError::Rejected(_) => BackendError::handler(StatusCode::BAD_GATEWAY, e.to_string()),
    })?;
    let content_type = storage
        .head(&claims.sub)
        .await
        .map(|head| head.content_type)
        .unwrap_or_else(|_| "application/octet-stream".to_string());

    Ok(([(header::CONTENT_TYPE, content_type)], Body::from(body)).into_response())
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
