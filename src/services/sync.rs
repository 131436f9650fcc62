//! src/services/sync.rs
//!
//! SyncEngine — keeps stored metadata records aligned with domain-object
//! lifecycles. On save it refreshes the record's path per configured
//! language (creating records seeded from defaults for languages in
//! `auto_languages`); on delete it removes every record referencing the
//! object; reset-to-default recomputes content for rows still flagged
//! default. Languages are threaded explicitly through every call, so no
//! process-wide language state exists to switch and restore.

use crate::config::SeoConfig;
use crate::errors::{SeoError, SeoResult};
use crate::models::Metadata;
use crate::models::domain::{ModelRegistry, SeoModel, SeoObject};
use crate::services::resolver::{fallback_metadata, path_index};
use crate::services::store::{MetadataStore, NewRecord};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Counters returned by sync operations so callers (CLI, admin endpoints)
/// can report what happened.
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub created: u64,
    pub updated: u64,
    pub removed: u64,
}

impl SyncReport {
    fn absorb(&mut self, other: SyncReport) {
        self.created += other.created;
        self.updated += other.updated;
        self.removed += other.removed;
    }
}

#[derive(Clone)]
pub struct SyncEngine {
    store: MetadataStore,
    config: Arc<SeoConfig>,
    registry: Arc<ModelRegistry>,
}

impl SyncEngine {
    pub fn new(store: MetadataStore, config: Arc<SeoConfig>, registry: Arc<ModelRegistry>) -> Self {
        Self {
            store,
            config,
            registry,
        }
    }

    /// React to an object being created or updated.
    ///
    /// For every configured language: if a record exists and the canonical
    /// path moved, repoint it (content stays user-owned). If none exists and
    /// the language is in `auto_languages`, create one seeded from the
    /// registered defaults or the global fallback. A duplicate on insert
    /// means a concurrent writer got there first; that is logged and skipped.
    pub async fn sync_object(
        &self,
        object: &dyn SeoObject,
        auto_languages: &[String],
    ) -> SeoResult<SyncReport> {
        let mut report = SyncReport::default();
        let model_type = object.model_type();

        for lang in &self.config.languages {
            let canonical = object.canonical_path(lang);

            if let Some(existing) = self
                .store
                .for_object_lang(model_type, object.id(), lang)
                .await?
            {
                let Some(path) = canonical else { continue };
                if path != existing.path {
                    match self.store.update_path(existing.id, &path).await {
                        Ok(()) => report.updated += 1,
                        Err(SeoError::DuplicateRecord { .. }) => {
                            warn!(
                                "path `{}` ({}) already claimed by another record; leaving `{}` in place",
                                path, lang, existing.path
                            );
                        }
                        Err(err) => return Err(err),
                    }
                }
            } else if auto_languages.contains(lang) {
                let Some(path) = canonical else { continue };
                let seed = self.seed_metadata(object, lang, &path).await?;
                let result = self
                    .store
                    .insert(NewRecord {
                        path,
                        lang_code: lang.clone(),
                        title: seed.title,
                        description: seed.description,
                        model_type: Some(model_type.to_string()),
                        object_id: Some(object.id()),
                        is_default: true,
                    })
                    .await;
                match result {
                    Ok(_) => report.created += 1,
                    Err(SeoError::DuplicateRecord { path, .. }) => {
                        debug!("record for `{}` created concurrently; skipping", path);
                    }
                    Err(err) => return Err(err),
                }
            }
        }

        Ok(report)
    }

    /// React to an object being removed: drop every record referencing it,
    /// in all languages. The store cannot cascade across entity types, so
    /// this hook owns the cleanup.
    pub async fn on_delete(&self, model_type: &str, object_id: i64) -> SeoResult<u64> {
        let removed = self.store.delete_for_object(model_type, object_id).await?;
        if removed > 0 {
            debug!(
                "removed {} metadata records for {}:{}",
                removed, model_type, object_id
            );
        }
        Ok(removed)
    }

    /// Recompute title/description for the object's records still flagged
    /// default. The flag stays true; user-edited records are untouched.
    pub async fn reset_defaults(&self, object: &dyn SeoObject) -> SeoResult<u64> {
        let mut reset = 0;
        let records = self
            .store
            .for_object(object.model_type(), object.id())
            .await?;

        for record in records.into_iter().filter(|r| r.is_default) {
            let seed = self
                .seed_metadata(object, &record.lang_code, &record.path)
                .await?;
            self.store
                .overwrite_defaults(record.id, &seed.title, &seed.description)
                .await?;
            reset += 1;
        }
        Ok(reset)
    }

    /// Sync every instance of one registered model.
    ///
    /// `auto` seeds records for all configured languages (the bulk-sync
    /// behavior); without it only existing records get their paths
    /// refreshed. `remove_stale` additionally drops records whose object no
    /// longer exists in the host.
    pub async fn sync_model(
        &self,
        model_type: &str,
        auto: bool,
        remove_stale: bool,
    ) -> SeoResult<SyncReport> {
        let model = self
            .registry
            .get(model_type)
            .ok_or_else(|| SeoError::UnknownModel(model_type.to_string()))?;

        self.ensure_registered_defaults(model).await?;

        let auto_languages: Vec<String> = if auto {
            self.config.languages.clone()
        } else {
            Vec::new()
        };

        let mut report = SyncReport::default();
        let instances = model.instances();
        for object in &instances {
            report.absorb(self.sync_object(object.as_ref(), &auto_languages).await?);
        }

        if remove_stale {
            let live: HashSet<i64> = instances.iter().map(|o| o.id()).collect();
            for record in self.store.for_model(model_type).await? {
                let Some(object_id) = record.object_id else { continue };
                if !live.contains(&object_id) {
                    report.removed += self.store.delete_for_object(model_type, object_id).await?;
                }
            }
        }

        info!(
            "synced {} instances of `{}`: {:?}",
            instances.len(),
            model_type,
            report
        );
        Ok(report)
    }

    /// Reset still-default records for every instance of one model.
    pub async fn reset_model(&self, model_type: &str) -> SeoResult<u64> {
        let model = self
            .registry
            .get(model_type)
            .ok_or_else(|| SeoError::UnknownModel(model_type.to_string()))?;

        let mut reset = 0;
        for object in model.instances() {
            reset += self.reset_defaults(object.as_ref()).await?;
        }
        info!("reset {} records for `{}`", reset, model_type);
        Ok(reset)
    }

    /// Bulk sync across every registered model. Safe to re-run.
    pub async fn sync_all(&self, auto: bool, remove_stale: bool) -> SeoResult<SyncReport> {
        let mut report = SyncReport::default();
        for model in self.registry.iter() {
            report.absorb(
                self.sync_model(model.model_type(), auto, remove_stale)
                    .await?,
            );
        }
        Ok(report)
    }

    /// Bulk reset across every registered model.
    pub async fn reset_all(&self) -> SeoResult<u64> {
        let mut reset = 0;
        for model in self.registry.iter() {
            reset += self.reset_model(model.model_type()).await?;
        }
        Ok(reset)
    }

    /// Seed rows in the registered-defaults table from the model's
    /// class-level defaults. Idempotent: languages that already have rows
    /// are left alone, so manual edits survive re-registration.
    async fn ensure_registered_defaults(&self, model: &dyn SeoModel) -> SeoResult<()> {
        for lang in &self.config.languages {
            if !self
                .store
                .registered_defaults(model.model_type(), lang)
                .await?
                .is_empty()
            {
                continue;
            }

            let titles = model.default_titles(lang);
            let descriptions = model.default_descriptions(lang);
            let rows = titles.len().max(descriptions.len());
            let fallback = fallback_metadata(&self.config, lang, 0);

            for i in 0..rows {
                let title = titles.get(i).unwrap_or(&fallback.title);
                let description = descriptions.get(i).unwrap_or(&fallback.description);
                self.store
                    .insert_registered_default(model.model_type(), lang, title, description)
                    .await?;
            }
        }
        Ok(())
    }

    /// Starting metadata for a fresh or reset record: registered defaults
    /// selected by object id, else the global fallback selected by path.
    async fn seed_metadata(
        &self,
        object: &dyn SeoObject,
        lang: &str,
        path: &str,
    ) -> SeoResult<Metadata> {
        let defaults = self
            .store
            .registered_defaults(object.model_type(), lang)
            .await?;
        if !defaults.is_empty() {
            let chosen = &defaults[object.id().unsigned_abs() as usize % defaults.len()];
            return Ok(Metadata {
                title: chosen.title.clone(),
                description: chosen.description.clone(),
            });
        }
        Ok(fallback_metadata(&self.config, lang, path_index(path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::resolver::tests::{TestPage, test_config, test_registry};
    use crate::services::resolver::MetadataResolver;
    use crate::services::store::memory_store;
    use std::collections::HashMap;

    async fn engine(pages: Vec<(i64, String)>) -> SyncEngine {
        SyncEngine::new(memory_store().await, test_config(), test_registry(pages))
    }

    fn page(id: i64) -> TestPage {
        TestPage {
            id,
            name: format!("Page {}", id),
        }
    }

    #[tokio::test]
    async fn sync_creates_records_only_for_auto_languages() {
        let engine = engine(vec![(5, "Page 5".to_string())]).await;
        let report = engine
            .sync_object(&page(5), &["en".to_string()])
            .await
            .unwrap();
        assert_eq!(report.created, 1);

        let records = engine.store.for_object("page", 5).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].path, "/pages/5/");
        assert_eq!(records[0].lang_code, "en");
        assert!(records[0].is_default);
    }

    #[tokio::test]
    async fn synced_record_seeds_from_registered_defaults() {
        let engine = engine(vec![(5, "Page 5".to_string())]).await;
        // sync_model registers the class-level defaults first.
        engine.sync_model("page", true, false).await.unwrap();

        let en = engine
            .store
            .for_object_lang("page", 5, "en")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(en.title, "Page");
        let es = engine
            .store
            .for_object_lang("page", 5, "es")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(es.title, "Página");
    }

    #[tokio::test]
    async fn sync_twice_is_a_no_op() {
        let engine = engine(vec![(5, "Page 5".to_string())]).await;
        let auto = vec!["en".to_string(), "es".to_string()];
        let first = engine.sync_object(&page(5), &auto).await.unwrap();
        assert_eq!(first.created, 2);

        let second = engine.sync_object(&page(5), &auto).await.unwrap();
        assert_eq!(second, SyncReport::default());
    }

    #[tokio::test]
    async fn sync_repoints_path_but_keeps_content() {
        let engine = engine(vec![(5, "Page 5".to_string())]).await;
        engine
            .sync_object(&page(5), &["en".to_string()])
            .await
            .unwrap();
        let record = engine
            .store
            .for_object_lang("page", 5, "en")
            .await
            .unwrap()
            .unwrap();
        engine
            .store
            .update_content(record.id, "Hand-written", "Kept")
            .await
            .unwrap();

        // The object moved: simulate by editing the stored path away from
        // the canonical one, then syncing again.
        engine
            .store
            .update_path(record.id, "/old/pages/5/")
            .await
            .unwrap();
        let report = engine
            .sync_object(&page(5), &[])
            .await
            .unwrap();
        assert_eq!(report.updated, 1);

        let after = engine.store.get(record.id).await.unwrap();
        assert_eq!(after.path, "/pages/5/");
        assert_eq!(after.title, "Hand-written");
        assert!(!after.is_default);
    }

    #[tokio::test]
    async fn delete_removes_all_languages() {
        let engine = engine(vec![(5, "Page 5".to_string())]).await;
        let auto = vec!["en".to_string(), "es".to_string()];
        engine.sync_object(&page(5), &auto).await.unwrap();

        let removed = engine.on_delete("page", 5).await.unwrap();
        assert_eq!(removed, 2);
        assert!(engine.store.for_object("page", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reset_defaults_skips_edited_records() {
        let engine = engine(vec![(5, "Page 5".to_string())]).await;
        engine.sync_model("page", true, false).await.unwrap();

        let en = engine
            .store
            .for_object_lang("page", 5, "en")
            .await
            .unwrap()
            .unwrap();
        engine
            .store
            .update_content(en.id, "Edited", "Edited")
            .await
            .unwrap();

        let reset = engine.reset_defaults(&page(5)).await.unwrap();
        // Only the still-default Spanish record was recomputed.
        assert_eq!(reset, 1);

        let en_after = engine.store.get(en.id).await.unwrap();
        assert_eq!(en_after.title, "Edited");
        assert!(!en_after.is_default);

        let es_after = engine
            .store
            .for_object_lang("page", 5, "es")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(es_after.title, "Página");
        assert!(es_after.is_default);
    }

    #[tokio::test]
    async fn reset_then_resolve_returns_recomputed_default() {
        let engine = engine(vec![(5, "Page 5".to_string())]).await;
        engine.sync_model("page", true, false).await.unwrap();
        engine.reset_defaults(&page(5)).await.unwrap();

        let resolver = MetadataResolver::new(
            engine.store.clone(),
            engine.config.clone(),
            engine.registry.clone(),
        );
        let meta = resolver
            .resolve("/pages/5/", "en", None, &HashMap::new())
            .await
            .unwrap();
        assert_eq!(meta.title, "Page");
        // No description default is registered for pages, so the global
        // fallback padded the registered row.
        assert_eq!(meta.description, "Default Desc");
    }

    #[tokio::test]
    async fn remove_stale_drops_records_for_vanished_objects() {
        // Object 7 has records but is no longer known to the host model.
        let engine = engine(vec![(5, "Page 5".to_string())]).await;
        engine
            .store
            .insert(NewRecord {
                path: "/pages/7/".to_string(),
                lang_code: "en".to_string(),
                title: "Ghost".to_string(),
                description: String::new(),
                model_type: Some("page".to_string()),
                object_id: Some(7),
                is_default: true,
            })
            .await
            .unwrap();

        let report = engine.sync_model("page", true, true).await.unwrap();
        assert_eq!(report.removed, 1);
        assert!(engine.store.for_object("page", 7).await.unwrap().is_empty());
        assert!(!engine.store.for_object("page", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn auto_languages_scope_creation_end_to_end() {
        let engine = engine(vec![(5, "Page 5".to_string())]).await;
        let model = engine.registry.get("page").unwrap();
        engine.ensure_registered_defaults(model).await.unwrap();

        engine
            .sync_object(&page(5), &["en".to_string()])
            .await
            .unwrap();

        // One English record, seeded from the registered default; Spanish
        // was not in auto_languages, so nothing was created for it.
        let en = engine
            .store
            .for_object_lang("page", 5, "en")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(en.path, "/pages/5/");
        assert_eq!(en.title, "Page");
        assert!(
            engine
                .store
                .for_object_lang("page", 5, "es")
                .await
                .unwrap()
                .is_none()
        );

        let resolver = MetadataResolver::new(
            engine.store.clone(),
            engine.config.clone(),
            engine.registry.clone(),
        );
        let en_meta = resolver
            .resolve("/pages/5/", "en", None, &HashMap::new())
            .await
            .unwrap();
        assert_eq!(en_meta.title, "Page");
        assert_eq!(en_meta.description, "Default Desc");

        // The Spanish path has no record and no object context, so it
        // degrades all the way to the global fallback.
        let es_meta = resolver
            .resolve("/paginas/5/", "es", None, &HashMap::new())
            .await
            .unwrap();
        assert_eq!(es_meta.title, "Default Title");
        assert_eq!(es_meta.description, "Default Desc");
    }

    #[tokio::test]
    async fn sync_unknown_model_is_an_error() {
        let engine = engine(Vec::new()).await;
        let err = engine.sync_model("widget", true, false).await.unwrap_err();
        assert!(matches!(err, SeoError::UnknownModel(_)));
    }
}
