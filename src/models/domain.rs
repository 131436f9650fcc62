//! Contracts the embedding host implements for its domain objects.
//!
//! The service never owns domain objects; records hold a weak
//! (model_type, object_id) reference and every lookup goes through the
//! [`ModelRegistry`]. Registration is explicit and happens once at startup,
//! which replaces any publish/subscribe signal machinery: the host calls the
//! sync engine directly (or via the HTTP hooks) on save/delete.

use std::collections::HashMap;

/// An attribute value a domain object exposes for placeholder interpolation.
///
/// `Nested` lets dotted tokens like `{category.name}` traverse relations.
pub enum AttrValue<'a> {
    Text(String),
    Nested(&'a dyn SeoObject),
}

/// A single domain object instance.
pub trait SeoObject: Send + Sync {
    /// Stable identifier within the model type.
    fn id(&self) -> i64;

    /// Type tag matching the registered model.
    fn model_type(&self) -> &'static str;

    /// The absolute URL path this object resolves to in `lang`, per host
    /// routing. `None` when the object is not routable in that language.
    fn canonical_path(&self, lang: &str) -> Option<String>;

    /// Attribute lookup for interpolation. `name` is a single segment, never
    /// a dotted path; traversal is the interpolator's job.
    fn attribute(&self, name: &str) -> Option<AttrValue<'_>> {
        let _ = name;
        None
    }
}

/// A registered model type: instance access plus class-level SEO defaults.
///
/// Returning a `Vec` covers both the scalar and the list form of configured
/// defaults; an empty vec means "no default registered for this language".
pub trait SeoModel: Send + Sync {
    /// Type tag used in stored records and HTTP paths.
    fn model_type(&self) -> &'static str;

    /// Class-level default titles for `lang`.
    fn default_titles(&self, lang: &str) -> Vec<String> {
        let _ = lang;
        Vec::new()
    }

    /// Class-level default descriptions for `lang`.
    fn default_descriptions(&self, lang: &str) -> Vec<String> {
        let _ = lang;
        Vec::new()
    }

    /// Look up a live instance by id. `None` means the object no longer
    /// exists in the host.
    fn find(&self, id: i64) -> Option<Box<dyn SeoObject>>;

    /// Enumerate all live instances, used by bulk sync and reset.
    fn instances(&self) -> Vec<Box<dyn SeoObject>>;
}

/// Explicit registration table mapping model type tags to their adapters.
#[derive(Default)]
pub struct ModelRegistry {
    models: HashMap<&'static str, Box<dyn SeoModel>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model type for SEO management. Idempotent: re-registering
    /// the same type tag replaces the previous adapter.
    pub fn register(&mut self, model: Box<dyn SeoModel>) {
        self.models.insert(model.model_type(), model);
    }

    pub fn get(&self, model_type: &str) -> Option<&dyn SeoModel> {
        self.models.get(model_type).map(|m| m.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn SeoModel> {
        self.models.values().map(|m| m.as_ref())
    }

    /// Resolve a weak (model_type, id) reference to a live object.
    pub fn find_object(&self, model_type: &str, id: i64) -> Option<Box<dyn SeoObject>> {
        self.get(model_type).and_then(|m| m.find(id))
    }
}
