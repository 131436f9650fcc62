//! Represents a stored SEO metadata record for a URL path and language.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A per-path, per-language SEO metadata entry.
///
/// The `path` is either a literal absolute path (`/pages/5/`) or a template
/// containing `{0}`-style or `{name}`-style placeholders. Literal records are
/// unique per (path, lang_code); templated records may overlap and are
/// disambiguated at resolution time.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct MetadataRecord {
    /// Internal UUID for DB indexing.
    pub id: Uuid,

    /// Absolute path, excluding the domain name. Example: `/foo/bar/`.
    pub path: String,

    /// Two-letter language code.
    pub lang_code: String,

    /// Page title; may contain placeholders.
    pub title: String,

    /// Page description; may contain placeholders.
    pub description: String,

    /// True when `path` contains placeholder syntax.
    pub has_parameters: bool,

    /// Type tag of the associated domain object, if any.
    pub model_type: Option<String>,

    /// Identifier of the associated domain object, if any.
    pub object_id: Option<i64>,

    /// True while title/description still equal the model defaults. Flips to
    /// false permanently once either field is edited.
    pub is_default: bool,

    /// Timestamp when this record was created.
    pub created_at: DateTime<Utc>,

    /// Timestamp when this record was last modified.
    pub updated_at: DateTime<Utc>,
}
