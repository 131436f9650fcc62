//! HTTP handlers for administrative operations: record CRUD and the bulk
//! sync/reset commands. All of these are thin wrappers; validation and
//! persistence live in the store and the sync engine.

use crate::{
    errors::AppError,
    models::record::MetadataRecord,
    pattern::{self, PathTemplate},
    services::AppState,
    services::store::NewRecord,
    services::sync::SyncReport,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub lang: Option<String>,
}

/// `GET /admin/metadata[?lang=…]`
pub async fn list_metadata(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<MetadataRecord>>, AppError> {
    let records = state.store.list(q.lang.as_deref()).await?;
    Ok(Json(records))
}

#[derive(Debug, Deserialize)]
pub struct CreateMetadataReq {
    pub path: String,
    pub lang_code: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// `POST /admin/metadata` — create a path-based record.
///
/// Templated paths are compiled up front so malformed placeholder syntax is
/// rejected here, at configuration time, not during resolution. Duplicate
/// literal paths come back as 409.
pub async fn create_metadata(
    State(state): State<AppState>,
    Json(req): Json<CreateMetadataReq>,
) -> Result<impl IntoResponse, AppError> {
    if pattern::has_parameters(&req.path) {
        PathTemplate::compile(&req.path)?;
    }
    if !state.config.languages.contains(&req.lang_code) {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            format!("language `{}` is not configured", req.lang_code),
        ));
    }

    let record = state
        .store
        .insert(NewRecord {
            path: req.path,
            lang_code: req.lang_code,
            title: req.title,
            description: req.description,
            model_type: None,
            object_id: None,
            // Hand-created records carry user-authored content from the start.
            is_default: false,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateMetadataReq {
    pub title: String,
    pub description: String,
}

/// `PUT /admin/metadata/{id}` — edit title/description. Changed content
/// permanently clears the record's default flag.
pub async fn update_metadata(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateMetadataReq>,
) -> Result<Json<MetadataRecord>, AppError> {
    let record = state
        .store
        .update_content(id, &req.title, &req.description)
        .await?;
    Ok(Json(record))
}

/// `DELETE /admin/metadata/{id}`
pub async fn delete_metadata(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.store.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct SyncQuery {
    pub auto: Option<bool>,
    pub remove_stale: Option<bool>,
}

/// `POST /admin/models/{model}/sync[?auto=false&remove_stale=true]`
///
/// Idempotent bulk sync for one registered model. `auto` defaults to true,
/// matching the sync command's record-creating behavior.
pub async fn sync_model(
    State(state): State<AppState>,
    Path(model): Path<String>,
    Query(q): Query<SyncQuery>,
) -> Result<Json<SyncReport>, AppError> {
    let auto = q.auto.unwrap_or(true);
    let remove_stale = q.remove_stale.unwrap_or(state.config.remove_stale);
    let report = state.sync.sync_model(&model, auto, remove_stale).await?;
    Ok(Json(report))
}

/// `POST /admin/models/{model}/reset` — recompute still-default records.
pub async fn reset_model(
    State(state): State<AppState>,
    Path(model): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let reset = state.sync.reset_model(&model).await?;
    Ok(Json(json!({ "reset": reset })))
}
