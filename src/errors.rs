use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// Domain errors surfaced by pattern compilation, interpolation and the
/// storage-backed services. Absence of metadata at any resolution tier is
/// never an error; these cover malformed configuration, strict-mode
/// interpolation failures and storage problems.
#[derive(Debug, Error)]
pub enum SeoError {
    #[error("template `{template}` is malformed: {reason}")]
    MalformedTemplate { template: String, reason: String },
    #[error("placeholder `{{{0}}}` could not be resolved")]
    MissingPlaceholder(String),
    #[error("metadata for path `{path}` and language `{lang_code}` already exists")]
    DuplicateRecord { path: String, lang_code: String },
    #[error("model `{0}` is not registered")]
    UnknownModel(String),
    #[error("metadata record `{0}` not found")]
    RecordNotFound(uuid::Uuid),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type SeoResult<T> = Result<T, SeoError>;

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<SeoError> for AppError {
    fn from(err: SeoError) -> Self {
        let status = match &err {
            SeoError::DuplicateRecord { .. } => StatusCode::CONFLICT,
            SeoError::UnknownModel(_) | SeoError::RecordNotFound(_) => StatusCode::NOT_FOUND,
            SeoError::MalformedTemplate { .. } | SeoError::MissingPlaceholder(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            SeoError::Sqlx(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        AppError::new(status, err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::internal(err.to_string())
    }
}
