/**
 * Vault Routes
 *
 * # Items
 * - `POST /items` - archive an uploaded file (multipart)
 * - `GET /items?owner=` - items of an owner, newest first
 * - `GET /items/stats?owner=` - per-status counts and sizes
 * - `GET /items/{id}` - item metadata
 * - `PATCH /items/{id}` - update title, description, tags
 * - `DELETE /items/{id}` - delete object and catalog entry
 *
 * # Restore
 * - `POST /items/{id}/restore` - request a restore (`{"tier": "Bulk"}`)
 * - `GET /items/{id}/status` - poll the backend and reconcile
 * - `GET /items/{id}/download` - presigned reference to a restored copy
 * - `GET /blobs/{token}` - serve the object behind a presigned reference
 */

use axum::{
    Router,
    routing::{get, post},
};

use crate::backend::server::state::AppState;
use crate::backend::vault::handlers::{
    delete_item, download_reference, get_item, item_status, list_items, owner_stats,
    request_restore, serve_blob, update_item, upload_item,
};

/// Add the vault routes to `router`
pub fn configure_vault_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/items", post(upload_item).get(list_items))
        .route("/items/stats", get(owner_stats))
        .route(
            "/items/{id}",
            get(get_item).patch(update_item).delete(delete_item),
        )
        .route("/items/{id}/restore", post(request_restore))
        .route("/items/{id}/status", get(item_status))
        .route("/items/{id}/download", get(download_reference))
        .route("/blobs/{token}", get(serve_blob))
}
