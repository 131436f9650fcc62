//! Represents registered fallback metadata for a model type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Default metadata registered for a model type and language, not tied to
/// any specific object instance.
///
/// Several rows may exist for the same (model_type, lang_code); the resolver
/// picks one by object id modulo the row count so repeated lookups for the
/// same object stay stable.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct RegisteredDefault {
    /// Internal UUID for DB indexing.
    pub id: Uuid,

    /// Type tag of the domain model this default applies to.
    pub model_type: String,

    /// Two-letter language code.
    pub lang_code: String,

    /// Default title; may contain placeholders.
    pub title: String,

    /// Default description; may contain placeholders.
    pub description: String,

    /// Timestamp when this default was registered.
    pub created_at: DateTime<Utc>,
}
