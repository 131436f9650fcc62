//! src/services/resolver.rs
//!
//! MetadataResolver — walks the fallback tiers for a (path, language)
//! request: exact literal record, then templated records, then registered
//! per-model defaults, then the global fallback from configuration. Absence
//! at any tier is steady-state, never an error. Whenever several candidates
//! are equally valid, a stable index derived from the path (or the object
//! id) picks one, so repeated calls return identical output.

use crate::config::SeoConfig;
use crate::errors::SeoResult;
use crate::interpolate::{Interpolation, interpolate};
use crate::models::Metadata;
use crate::models::domain::{ModelRegistry, SeoObject};
use crate::pattern::PathTemplate;
use crate::services::store::MetadataStore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct MetadataResolver {
    store: MetadataStore,
    config: Arc<SeoConfig>,
    registry: Arc<ModelRegistry>,
}

impl MetadataResolver {
    pub fn new(store: MetadataStore, config: Arc<SeoConfig>, registry: Arc<ModelRegistry>) -> Self {
        Self {
            store,
            config,
            registry,
        }
    }

    /// Resolve the metadata for one rendered page.
    ///
    /// `object` is the domain object the host routed the path to, if any;
    /// `context` is a caller-supplied map of extra interpolation values.
    pub async fn resolve(
        &self,
        path: &str,
        lang_code: &str,
        object: Option<&dyn SeoObject>,
        context: &HashMap<String, String>,
    ) -> SeoResult<Metadata> {
        let index = path_index(path);

        let mut raw: Option<Metadata> = None;
        let mut captures: Vec<String> = Vec::new();
        let mut named: HashMap<String, String> = HashMap::new();
        let mut record_ref: Option<(String, i64)> = None;

        // Tier 1: exact literal match.
        if let Some(record) = self.store.exact(path, lang_code).await? {
            record_ref = record.model_type.clone().zip(record.object_id);
            raw = Some(Metadata {
                title: record.title,
                description: record.description,
            });
        }

        // Tier 2: templated records.
        if raw.is_none() {
            let mut matched = Vec::new();
            for record in self.store.parameterized(lang_code).await? {
                let template = match PathTemplate::compile(&record.path) {
                    Ok(template) => template,
                    Err(err) => {
                        warn!("skipping stored template `{}`: {}", record.path, err);
                        continue;
                    }
                };
                if let Some(m) = template.matches(path) {
                    matched.push((record, m));
                }
            }
            if !matched.is_empty() {
                let (record, m) = matched.swap_remove(index as usize % matched.len());
                record_ref = record.model_type.clone().zip(record.object_id);
                captures = m.segments;
                named = m.named;
                raw = Some(Metadata {
                    title: record.title,
                    description: record.description,
                });
            }
        }

        // A record's own object wins over the caller's.
        let looked_up = record_ref
            .as_ref()
            .and_then(|(model, id)| self.registry.find_object(model, *id));
        let object = looked_up.as_deref().or(object);

        // Tier 3: registered per-model defaults.
        if raw.is_none() {
            if let Some(object) = object {
                let defaults = self
                    .store
                    .registered_defaults(object.model_type(), lang_code)
                    .await?;
                if !defaults.is_empty() {
                    let chosen = &defaults[object.id().unsigned_abs() as usize % defaults.len()];
                    raw = Some(Metadata {
                        title: chosen.title.clone(),
                        description: chosen.description.clone(),
                    });
                }
            }
        }

        // Tier 4: global fallback from configuration.
        let raw = match raw {
            Some(metadata) => metadata,
            None => fallback_metadata(&self.config, lang_code, index),
        };

        let mut merged = named;
        merged.extend(context.iter().map(|(k, v)| (k.clone(), v.clone())));

        let ctx = Interpolation {
            object,
            lang_code,
            captures: &captures,
            context: &merged,
            strict: self.config.strict_placeholders,
        };

        Ok(Metadata {
            title: interpolate(&raw.title, &ctx)?,
            description: interpolate(&raw.description, &ctx)?,
        })
    }
}

/// The last-resort tier: configured fallback strings, with list variants
/// selected by a path-derived index. Shared with the sync engine, which
/// seeds new records from the same source.
pub fn fallback_metadata(config: &SeoConfig, lang_code: &str, index: u64) -> Metadata {
    let titles = config
        .fallback_titles
        .for_lang(lang_code, &config.default_lang);
    let descriptions = config
        .fallback_descriptions
        .for_lang(lang_code, &config.default_lang);

    Metadata {
        title: pick(titles, index),
        description: pick(descriptions, index),
    }
}

fn pick(variants: &[String], index: u64) -> String {
    if variants.is_empty() {
        return String::new();
    }
    variants[index as usize % variants.len()].clone()
}

/// FNV-1a over the path bytes. Stable across processes, which keeps
/// candidate selection deterministic between restarts too.
pub fn path_index(path: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in path.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::FallbackText;
    use crate::models::domain::{AttrValue, SeoModel};
    use crate::services::store::{NewRecord, memory_store};

    pub(crate) struct TestPage {
        pub id: i64,
        pub name: String,
    }

    impl SeoObject for TestPage {
        fn id(&self) -> i64 {
            self.id
        }
        fn model_type(&self) -> &'static str {
            "page"
        }
        fn canonical_path(&self, lang: &str) -> Option<String> {
            match lang {
                "en" => Some(format!("/pages/{}/", self.id)),
                "es" => Some(format!("/paginas/{}/", self.id)),
                _ => None,
            }
        }
        fn attribute(&self, name: &str) -> Option<AttrValue<'_>> {
            match name {
                "name" => Some(AttrValue::Text(self.name.clone())),
                _ => None,
            }
        }
    }

    pub(crate) struct TestPageModel {
        pub pages: Vec<(i64, String)>,
    }

    impl SeoModel for TestPageModel {
        fn model_type(&self) -> &'static str {
            "page"
        }
        fn default_titles(&self, lang: &str) -> Vec<String> {
            match lang {
                "en" => vec!["Page".to_string()],
                "es" => vec!["Página".to_string()],
                _ => Vec::new(),
            }
        }
        fn default_descriptions(&self, _lang: &str) -> Vec<String> {
            Vec::new()
        }
        fn find(&self, id: i64) -> Option<Box<dyn SeoObject>> {
            self.pages.iter().find(|(pid, _)| *pid == id).map(|(pid, name)| {
                Box::new(TestPage {
                    id: *pid,
                    name: name.clone(),
                }) as Box<dyn SeoObject>
            })
        }
        fn instances(&self) -> Vec<Box<dyn SeoObject>> {
            self.pages
                .iter()
                .map(|(id, name)| {
                    Box::new(TestPage {
                        id: *id,
                        name: name.clone(),
                    }) as Box<dyn SeoObject>
                })
                .collect()
        }
    }

    pub(crate) fn test_config() -> Arc<SeoConfig> {
        Arc::new(SeoConfig {
            languages: vec!["en".to_string(), "es".to_string()],
            default_lang: "en".to_string(),
            fallback_titles: FallbackText::parse("Default Title", "en", "test").unwrap(),
            fallback_descriptions: FallbackText::parse("Default Desc", "en", "test").unwrap(),
            strict_placeholders: false,
            remove_stale: false,
        })
    }

    pub(crate) fn test_registry(pages: Vec<(i64, String)>) -> Arc<ModelRegistry> {
        let mut registry = ModelRegistry::new();
        registry.register(Box::new(TestPageModel { pages }));
        Arc::new(registry)
    }

    async fn resolver(pages: Vec<(i64, String)>) -> MetadataResolver {
        MetadataResolver::new(memory_store().await, test_config(), test_registry(pages))
    }

    fn no_context() -> HashMap<String, String> {
        HashMap::new()
    }

    #[tokio::test]
    async fn unmatched_path_returns_global_fallback() {
        let resolver = resolver(Vec::new()).await;
        let meta = resolver
            .resolve("/nowhere/", "en", None, &no_context())
            .await
            .unwrap();
        assert_eq!(meta.title, "Default Title");
        assert_eq!(meta.description, "Default Desc");
        // Unknown language degrades to the default language's fallback.
        let meta = resolver
            .resolve("/nowhere/", "fr", None, &no_context())
            .await
            .unwrap();
        assert_eq!(meta.title, "Default Title");
    }

    #[tokio::test]
    async fn exact_match_is_authoritative() {
        let resolver = resolver(Vec::new()).await;
        resolver
            .store
            .insert(NewRecord {
                path: "/about/".to_string(),
                lang_code: "en".to_string(),
                title: "About Us".to_string(),
                description: "Who we are".to_string(),
                model_type: None,
                object_id: None,
                is_default: false,
            })
            .await
            .unwrap();

        let meta = resolver
            .resolve("/about/", "en", None, &no_context())
            .await
            .unwrap();
        assert_eq!(meta.title, "About Us");
        // Other language still falls through.
        let meta = resolver
            .resolve("/about/", "es", None, &no_context())
            .await
            .unwrap();
        assert_eq!(meta.title, "Default Title");
    }

    #[tokio::test]
    async fn templated_match_interpolates_captures() {
        let resolver = resolver(Vec::new()).await;
        resolver
            .store
            .insert(NewRecord {
                path: "/items/{0}/detail".to_string(),
                lang_code: "en".to_string(),
                title: "Buy {0} online".to_string(),
                description: "All about {0}".to_string(),
                model_type: None,
                object_id: None,
                is_default: false,
            })
            .await
            .unwrap();

        let meta = resolver
            .resolve("/items/red-shoes/detail", "en", None, &no_context())
            .await
            .unwrap();
        assert_eq!(meta.title, "Buy Red Shoes online");
        assert_eq!(meta.description, "All about Red Shoes");
    }

    #[tokio::test]
    async fn ambiguous_templates_resolve_deterministically() {
        let resolver = resolver(Vec::new()).await;
        for title in ["First {0}", "Second {0}"] {
            resolver
                .store
                .insert(NewRecord {
                    path: "/items/{0}/".to_string(),
                    lang_code: "en".to_string(),
                    title: title.to_string(),
                    description: String::new(),
                    model_type: None,
                    object_id: None,
                    is_default: false,
                })
                .await
                .unwrap();
        }

        let first = resolver
            .resolve("/items/red-shoes/", "en", None, &no_context())
            .await
            .unwrap();
        let second = resolver
            .resolve("/items/red-shoes/", "en", None, &no_context())
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn model_defaults_apply_when_no_record_matches() {
        let resolver = resolver(vec![(5, "Home".to_string())]).await;
        resolver
            .store
            .insert_registered_default("page", "en", "A {name} Page", "Desc")
            .await
            .unwrap();

        let page = TestPage {
            id: 5,
            name: "Home".to_string(),
        };
        let meta = resolver
            .resolve("/pages/5/", "en", Some(&page), &no_context())
            .await
            .unwrap();
        assert_eq!(meta.title, "A Home Page");
    }

    #[tokio::test]
    async fn record_object_reference_wins_over_caller_object() {
        let resolver = resolver(vec![(5, "Stored Name".to_string())]).await;
        resolver
            .store
            .insert(NewRecord {
                path: "/pages/5/".to_string(),
                lang_code: "en".to_string(),
                title: "{name}".to_string(),
                description: String::new(),
                model_type: Some("page".to_string()),
                object_id: Some(5),
                is_default: true,
            })
            .await
            .unwrap();

        let caller = TestPage {
            id: 9,
            name: "Caller Name".to_string(),
        };
        let meta = resolver
            .resolve("/pages/5/", "en", Some(&caller), &no_context())
            .await
            .unwrap();
        assert_eq!(meta.title, "Stored Name");
    }

    #[tokio::test]
    async fn caller_context_feeds_interpolation() {
        let resolver = resolver(Vec::new()).await;
        resolver
            .store
            .insert(NewRecord {
                path: "/search/".to_string(),
                lang_code: "en".to_string(),
                title: "Results for {query}".to_string(),
                description: String::new(),
                model_type: None,
                object_id: None,
                is_default: false,
            })
            .await
            .unwrap();

        let mut context = HashMap::new();
        context.insert("query".to_string(), "winter-boots".to_string());
        let meta = resolver
            .resolve("/search/", "en", None, &context)
            .await
            .unwrap();
        assert_eq!(meta.title, "Results for Winter Boots");
    }
}
