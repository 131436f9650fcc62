//! src/services/store.rs
//!
//! MetadataStore — the low-level sqlx query layer shared by the resolver and
//! the sync engine. It owns every SQL statement in the crate; the services
//! above it only see typed records and domain errors. Uniqueness of literal
//! (path, lang_code) pairs is enforced by a partial unique index, so a racing
//! insert surfaces as a recoverable `DuplicateRecord` instead of corrupting
//! data.

use crate::errors::{SeoError, SeoResult};
use crate::models::record::MetadataRecord;
use crate::models::registered::RegisteredDefault;
use crate::pattern;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

/// Fields for a record about to be inserted. The store derives
/// `has_parameters` from the path and stamps id and timestamps itself.
#[derive(Clone, Debug)]
pub struct NewRecord {
    pub path: String,
    pub lang_code: String,
    pub title: String,
    pub description: String,
    pub model_type: Option<String>,
    pub object_id: Option<i64>,
    pub is_default: bool,
}

const RECORD_COLUMNS: &str = "id, path, lang_code, title, description, has_parameters, \
     model_type, object_id, is_default, created_at, updated_at";

#[derive(Clone)]
pub struct MetadataStore {
    /// Shared SQLite connection pool.
    pub db: Arc<SqlitePool>,
}

impl MetadataStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Exact-match lookup among literal (non-parameterized) records.
    pub async fn exact(&self, path: &str, lang_code: &str) -> SeoResult<Option<MetadataRecord>> {
        let record = sqlx::query_as::<_, MetadataRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM seo_metadata
             WHERE path = ? AND lang_code = ? AND has_parameters = 0"
        ))
        .bind(path)
        .bind(lang_code)
        .fetch_optional(&*self.db)
        .await?;
        Ok(record)
    }

    /// All parameterized records for a language, most specific path first.
    /// The id tie-break makes the order total: equal template paths are
    /// allowed, and index-based candidate selection needs a stable sequence
    /// across calls and restarts.
    pub async fn parameterized(&self, lang_code: &str) -> SeoResult<Vec<MetadataRecord>> {
        let records = sqlx::query_as::<_, MetadataRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM seo_metadata
             WHERE lang_code = ? AND has_parameters = 1
             ORDER BY path DESC, id ASC"
        ))
        .bind(lang_code)
        .fetch_all(&*self.db)
        .await?;
        Ok(records)
    }

    /// Every record referencing an object, across all languages.
    pub async fn for_object(
        &self,
        model_type: &str,
        object_id: i64,
    ) -> SeoResult<Vec<MetadataRecord>> {
        let records = sqlx::query_as::<_, MetadataRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM seo_metadata
             WHERE model_type = ? AND object_id = ?
             ORDER BY lang_code ASC"
        ))
        .bind(model_type)
        .bind(object_id)
        .fetch_all(&*self.db)
        .await?;
        Ok(records)
    }

    /// Every record referencing any object of a model type.
    pub async fn for_model(&self, model_type: &str) -> SeoResult<Vec<MetadataRecord>> {
        let records = sqlx::query_as::<_, MetadataRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM seo_metadata
             WHERE model_type = ? AND object_id IS NOT NULL
             ORDER BY object_id ASC, lang_code ASC"
        ))
        .bind(model_type)
        .fetch_all(&*self.db)
        .await?;
        Ok(records)
    }

    /// The record for one (object, language) pair, if any.
    pub async fn for_object_lang(
        &self,
        model_type: &str,
        object_id: i64,
        lang_code: &str,
    ) -> SeoResult<Option<MetadataRecord>> {
        let record = sqlx::query_as::<_, MetadataRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM seo_metadata
             WHERE model_type = ? AND object_id = ? AND lang_code = ?"
        ))
        .bind(model_type)
        .bind(object_id)
        .bind(lang_code)
        .fetch_optional(&*self.db)
        .await?;
        Ok(record)
    }

    pub async fn get(&self, id: Uuid) -> SeoResult<MetadataRecord> {
        sqlx::query_as::<_, MetadataRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM seo_metadata WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&*self.db)
        .await?
        .ok_or(SeoError::RecordNotFound(id))
    }

    /// List records, optionally filtered by language.
    pub async fn list(&self, lang_code: Option<&str>) -> SeoResult<Vec<MetadataRecord>> {
        let records = match lang_code {
            Some(lang) => {
                sqlx::query_as::<_, MetadataRecord>(&format!(
                    "SELECT {RECORD_COLUMNS} FROM seo_metadata
                     WHERE lang_code = ? ORDER BY path ASC, lang_code ASC"
                ))
                .bind(lang)
                .fetch_all(&*self.db)
                .await?
            }
            None => {
                sqlx::query_as::<_, MetadataRecord>(&format!(
                    "SELECT {RECORD_COLUMNS} FROM seo_metadata
                     ORDER BY path ASC, lang_code ASC"
                ))
                .fetch_all(&*self.db)
                .await?
            }
        };
        Ok(records)
    }

    /// Insert a record. A unique-index violation on literal paths maps to
    /// `DuplicateRecord` so callers can treat it as "someone else won".
    pub async fn insert(&self, new: NewRecord) -> SeoResult<MetadataRecord> {
        let now = Utc::now();
        let record = MetadataRecord {
            id: Uuid::new_v4(),
            has_parameters: pattern::has_parameters(&new.path),
            path: new.path,
            lang_code: new.lang_code,
            title: new.title,
            description: new.description,
            model_type: new.model_type,
            object_id: new.object_id,
            is_default: new.is_default,
            created_at: now,
            updated_at: now,
        };

        let result = sqlx::query(
            "INSERT INTO seo_metadata (
                id, path, lang_code, title, description, has_parameters,
                model_type, object_id, is_default, created_at, updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.id)
        .bind(&record.path)
        .bind(&record.lang_code)
        .bind(&record.title)
        .bind(&record.description)
        .bind(record.has_parameters)
        .bind(&record.model_type)
        .bind(record.object_id)
        .bind(record.is_default)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&*self.db)
        .await;

        match result {
            Ok(_) => Ok(record),
            Err(err) if is_unique_violation(&err) => Err(SeoError::DuplicateRecord {
                path: record.path,
                lang_code: record.lang_code,
            }),
            Err(err) => Err(SeoError::Sqlx(err)),
        }
    }

    /// Repoint a record at a new canonical path. Title and description are
    /// untouched; they belong to the user once the record exists.
    pub async fn update_path(&self, id: Uuid, path: &str) -> SeoResult<()> {
        let result = sqlx::query(
            "UPDATE seo_metadata
             SET path = ?, has_parameters = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(path)
        .bind(pattern::has_parameters(path))
        .bind(Utc::now())
        .bind(id)
        .execute(&*self.db)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Err(SeoError::RecordNotFound(id)),
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => {
                let record = self.get(id).await?;
                Err(SeoError::DuplicateRecord {
                    path: path.to_string(),
                    lang_code: record.lang_code,
                })
            }
            Err(err) => Err(SeoError::Sqlx(err)),
        }
    }

    /// Update title/description. When the content differs from what is
    /// stored, `is_default` flips to false and never flips back here; the
    /// reset operation uses `overwrite_defaults` instead.
    pub async fn update_content(
        &self,
        id: Uuid,
        title: &str,
        description: &str,
    ) -> SeoResult<MetadataRecord> {
        let current = self.get(id).await?;
        let edited = current.title != title || current.description != description;
        let is_default = current.is_default && !edited;

        sqlx::query(
            "UPDATE seo_metadata
             SET title = ?, description = ?, is_default = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(title)
        .bind(description)
        .bind(is_default)
        .bind(Utc::now())
        .bind(id)
        .execute(&*self.db)
        .await?;

        self.get(id).await
    }

    /// Rewrite title/description of a still-default record while keeping
    /// `is_default` true. Used by reset-to-default only.
    pub async fn overwrite_defaults(
        &self,
        id: Uuid,
        title: &str,
        description: &str,
    ) -> SeoResult<()> {
        sqlx::query(
            "UPDATE seo_metadata
             SET title = ?, description = ?, updated_at = ?
             WHERE id = ? AND is_default = 1",
        )
        .bind(title)
        .bind(description)
        .bind(Utc::now())
        .bind(id)
        .execute(&*self.db)
        .await?;
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> SeoResult<()> {
        let result = sqlx::query("DELETE FROM seo_metadata WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(SeoError::RecordNotFound(id));
        }
        Ok(())
    }

    /// Remove every record referencing an object. Returns how many went.
    pub async fn delete_for_object(&self, model_type: &str, object_id: i64) -> SeoResult<u64> {
        let result = sqlx::query("DELETE FROM seo_metadata WHERE model_type = ? AND object_id = ?")
            .bind(model_type)
            .bind(object_id)
            .execute(&*self.db)
            .await?;
        Ok(result.rows_affected())
    }

    /// Registered defaults for (model_type, lang_code) in registration order.
    pub async fn registered_defaults(
        &self,
        model_type: &str,
        lang_code: &str,
    ) -> SeoResult<Vec<RegisteredDefault>> {
        let defaults = sqlx::query_as::<_, RegisteredDefault>(
            "SELECT id, model_type, lang_code, title, description, created_at
             FROM seo_registered_model
             WHERE model_type = ? AND lang_code = ?
             ORDER BY created_at ASC, id ASC",
        )
        .bind(model_type)
        .bind(lang_code)
        .fetch_all(&*self.db)
        .await?;
        Ok(defaults)
    }

    pub async fn insert_registered_default(
        &self,
        model_type: &str,
        lang_code: &str,
        title: &str,
        description: &str,
    ) -> SeoResult<RegisteredDefault> {
        let default = RegisteredDefault {
            id: Uuid::new_v4(),
            model_type: model_type.to_string(),
            lang_code: lang_code.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO seo_registered_model (id, model_type, lang_code, title, description, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(default.id)
        .bind(&default.model_type)
        .bind(&default.lang_code)
        .bind(&default.title)
        .bind(&default.description)
        .bind(default.created_at)
        .execute(&*self.db)
        .await?;

        Ok(default)
    }
}

/// Run SQLite migrations from the embedded SQL file.
pub async fn run_migrations(db: &SqlitePool) -> SeoResult<()> {
    let sql = include_str!("../../migrations/0001_init.sql");
    let statements = sql
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();

    tracing::debug!("Running {} migration statements", statements.len());
    for stmt in statements {
        sqlx::query(stmt).execute(db).await?;
    }
    Ok(())
}

/// Return true if SQLx error indicates a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.message().to_ascii_lowercase().contains("unique")
    )
}

#[cfg(test)]
pub(crate) async fn memory_store() -> MetadataStore {
    use sqlx::sqlite::SqlitePoolOptions;

    let db = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    run_migrations(&db).await.unwrap();
    MetadataStore::new(Arc::new(db))
}
