//! HTTP handlers for the read surface and the lifecycle hooks.
//!
//! `GET /seo` is the once-per-rendered-page query; the `/hooks` endpoints
//! are how a host persistence layer tells the sync engine about object
//! saves and deletions when it is not embedding the crate directly.

use crate::{errors::AppError, services::AppState, services::sync::SyncReport};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;

/// `GET /seo?path=…&lang=…[&model=…&object_id=…][&<extra>=…]`
///
/// `path` is required. Any query key beyond the reserved ones is passed to
/// the interpolator as caller context, mirroring a view handing extra values
/// to the template layer.
pub async fn get_seo(
    State(state): State<AppState>,
    Query(mut params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let path = params
        .remove("path")
        .ok_or_else(|| AppError::new(StatusCode::BAD_REQUEST, "missing `path` query parameter"))?;
    let lang = params
        .remove("lang")
        .unwrap_or_else(|| state.config.default_lang.clone());

    let model = params.remove("model");
    let object_id = match params.remove("object_id") {
        Some(raw) => Some(raw.parse::<i64>().map_err(|_| {
            AppError::new(StatusCode::BAD_REQUEST, "`object_id` must be an integer")
        })?),
        None => None,
    };

    let object = match (model, object_id) {
        (Some(model), Some(id)) => {
            if state.registry.get(&model).is_none() {
                return Err(AppError::not_found(format!(
                    "model `{}` is not registered",
                    model
                )));
            }
            state.registry.find_object(&model, id)
        }
        (Some(_), None) => {
            return Err(AppError::new(
                StatusCode::BAD_REQUEST,
                "`model` requires `object_id`",
            ));
        }
        (None, Some(_)) => {
            return Err(AppError::new(
                StatusCode::BAD_REQUEST,
                "`object_id` requires `model`",
            ));
        }
        (None, None) => None,
    };

    let metadata = state
        .resolver
        .resolve(&path, &lang, object.as_deref(), &params)
        .await?;

    Ok(Json(metadata))
}

/// Optional body for the save hook.
#[derive(Debug, Deserialize)]
pub struct SaveHookReq {
    /// Languages in which a missing record should be auto-created. Empty
    /// (the default) means a plain update: only existing paths refresh.
    #[serde(default)]
    pub auto_languages: Vec<String>,
}

/// `POST /hooks/{model}/{id}` — object created or updated.
pub async fn object_saved(
    State(state): State<AppState>,
    Path((model, id)): Path<(String, i64)>,
    payload: Option<Json<SaveHookReq>>,
) -> Result<Json<SyncReport>, AppError> {
    let object = state
        .registry
        .find_object(&model, id)
        .ok_or_else(|| AppError::not_found(format!("no `{}` object with id {}", model, id)))?;

    let auto_languages = payload.map(|Json(req)| req.auto_languages).unwrap_or_default();
    let report = state
        .sync
        .sync_object(object.as_ref(), &auto_languages)
        .await?;
    Ok(Json(report))
}

/// `DELETE /hooks/{model}/{id}` — object removed. The object is usually
/// already gone from the host, so only its reference is needed.
pub async fn object_deleted(
    State(state): State<AppState>,
    Path((model, id)): Path<(String, i64)>,
) -> Result<impl IntoResponse, AppError> {
    if state.registry.get(&model).is_none() {
        return Err(AppError::not_found(format!(
            "model `{}` is not registered",
            model
        )));
    }
    let removed = state.sync.on_delete(&model, id).await?;
    Ok(Json(json!({ "removed": removed })))
}
