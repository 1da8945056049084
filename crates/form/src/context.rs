//! Read-only environment shared by every form composed in a process.

use std::fmt;
use std::sync::Arc;

use crate::kinds::FieldRegistry;
use crate::model::ModelRef;
use crate::relation::RelationRegistry;
use crate::table::Table;

/// What a relation field may inherit from another registered config.
#[derive(Clone, Debug, PartialEq)]
pub struct RelatedConfig {
    pub key: String,
    /// Type name of the model the config is bound to, if any.
    pub model: Option<String>,
    pub route_prefix: String,
    pub index: Option<Table>,
}

/// String-keyed access to registered configs (`crud.post`, `form.pages.home`).
pub trait ConfigLookup: Send + Sync {
    fn lookup(&self, key: &str) -> Option<RelatedConfig>;

    fn exists(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }
}

/// Lookup without any registered config.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoConfigs;

impl ConfigLookup for NoConfigs {
    fn lookup(&self, _key: &str) -> Option<RelatedConfig> {
        None
    }
}

/// Field kinds, relation kinds, config lookup and locales.
///
/// Built once at start-up and shared through an `Arc`; composing a form
/// never mutates it.
pub struct FormContext {
    fields: FieldRegistry,
    relations: RelationRegistry,
    configs: Arc<dyn ConfigLookup>,
    locales: Vec<String>,
    url_prefix: String,
}

impl FormContext {
    pub fn builder() -> FormContextBuilder {
        FormContextBuilder::new()
    }

    /// Standard field and relation kinds, no configs, locale `en`.
    pub fn standard() -> Arc<Self> {
        Self::builder().build()
    }

    pub fn fields(&self) -> &FieldRegistry {
        &self.fields
    }

    pub fn relations(&self) -> &RelationRegistry {
        &self.relations
    }

    pub fn configs(&self) -> &Arc<dyn ConfigLookup> {
        &self.configs
    }

    pub fn locales(&self) -> &[String] {
        &self.locales
    }

    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }
}

impl fmt::Debug for FormContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormContext")
            .field("fields", &self.fields)
            .field("relations", &self.relations)
            .field("locales", &self.locales)
            .field("url_prefix", &self.url_prefix)
            .finish_non_exhaustive()
    }
}

/// Builder for [`FormContext`].
pub struct FormContextBuilder {
    fields: Option<FieldRegistry>,
    relations: Option<RelationRegistry>,
    configs: Option<Arc<dyn ConfigLookup>>,
    locales: Vec<String>,
    url_prefix: String,
}

impl FormContextBuilder {
    pub fn new() -> Self {
        Self {
            fields: None,
            relations: None,
            configs: None,
            locales: vec!["en".to_string()],
            url_prefix: "admin".to_string(),
        }
    }

    /// Replace the field kind catalogue.
    pub fn with_fields(mut self, fields: FieldRegistry) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn with_relations(mut self, relations: RelationRegistry) -> Self {
        self.relations = Some(relations);
        self
    }

    pub fn with_configs(mut self, configs: Arc<dyn ConfigLookup>) -> Self {
        self.configs = Some(configs);
        self
    }

    pub fn with_locales<I, S>(mut self, locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locales = locales.into_iter().map(Into::into).collect();
        self
    }

    /// Admin url prefix stripped from form route prefixes.
    pub fn with_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = prefix.into();
        self
    }

    pub fn build(self) -> Arc<FormContext> {
        Arc::new(FormContext {
            fields: self.fields.unwrap_or_else(FieldRegistry::standard),
            relations: self.relations.unwrap_or_else(RelationRegistry::standard),
            configs: self.configs.unwrap_or_else(|| Arc::new(NoConfigs)),
            locales: self.locales,
            url_prefix: self.url_prefix,
        })
    }
}

impl Default for FormContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a field kind needs to build a field for one registration.
pub struct FieldContext<'a> {
    pub id: &'a str,
    pub model: &'a ModelRef,
    pub route_prefix: &'a str,
    pub form: &'a Arc<FormContext>,
}
