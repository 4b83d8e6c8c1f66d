/**
 * Router Configuration
 *
 * Combines the vault routes, the health check and the middleware stack into
 * one Axum router.
 *
 * # Middleware
 *
 * - `TraceLayer` - one tracing span per request
 * - `RequestBodyLimitLayer` - uploads may not exceed the configured maximum
 *   plus room for multipart framing
 */

use axum::{Router, extract::DefaultBodyLimit, routing::get};
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::backend::routes::api_routes::configure_vault_routes;
use crate::backend::server::state::AppState;
use crate::backend::vault::handlers::health;

/// Room for multipart boundaries and text fields on top of the file itself
const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router<()> {
    let body_limit = app_state
        .manager
        .config()
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    let router = Router::new().route("/health", get(health));
    let router = configure_vault_routes(router);

    let router = router
        .fallback(|| async { (axum::http::StatusCode::NOT_FOUND, "404 Not Found") })
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(body_limit)),
        );

    router.with_state(app_state)
}
