//! Defines routes for the SEO metadata service.
//!
//! ## Structure
//! - **Read surface**
//!   - `GET /seo` — resolve metadata for a (path, language) pair
//!
//! - **Lifecycle hooks** (called by the host persistence layer)
//!   - `POST   /hooks/{model}/{id}` — object created or updated
//!   - `DELETE /hooks/{model}/{id}` — object removed
//!
//! - **Administrative endpoints**
//!   - `GET    /admin/metadata` — list records
//!   - `POST   /admin/metadata` — create a path-based record
//!   - `PUT    /admin/metadata/{id}` — edit title/description
//!   - `DELETE /admin/metadata/{id}` — delete a record
//!   - `POST   /admin/models/{model}/sync` — bulk sync one model
//!   - `POST   /admin/models/{model}/reset` — reset still-default records

use crate::{
    handlers::{
        admin_handlers::{
            create_metadata, delete_metadata, list_metadata, reset_model, sync_model,
            update_metadata,
        },
        health_handlers::{healthz, readyz},
        seo_handlers::{get_seo, object_deleted, object_saved},
    },
    services::AppState,
};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Build and return the router for the whole service.
///
/// The router carries shared state (`AppState`) to all handlers.
pub fn routes() -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // read surface
        .route("/seo", get(get_seo))
        // lifecycle hooks
        .route(
            "/hooks/{model}/{id}",
            post(object_saved).delete(object_deleted),
        )
        // admin
        .route("/admin/metadata", get(list_metadata).post(create_metadata))
        .route(
            "/admin/metadata/{id}",
            put(update_metadata).delete(delete_metadata),
        )
        .route("/admin/models/{model}/sync", post(sync_model))
        .route("/admin/models/{model}/reset", post(reset_model))
}
