//! Registered configs, keyed by their derived config key.
//!
//! The store is assembled once through [`ConfigStoreBuilder`] and is
//! immutable afterwards; relation fields look related configs up through
//! its [`ConfigLookup`] implementation.

use std::fmt;
use std::sync::Arc;

use form::model::FORM_MODEL;
use form::{BaseForm, ConfigLookup, FormContext, ModelRef, RelatedConfig, StaticModel, Table};
use indexmap::IndexMap;
use tracing::{debug, error};

use crate::config::{Authorizer, CrudConfig, FormConfig, Operation, Permissions};
use crate::error::{CrudError, Result};
use crate::identity::{ConfigIdentity, LogicalPath};

/// The config behind a store entry.
#[derive(Clone)]
pub enum ConfigHandle {
    Form {
        config: Arc<dyn FormConfig>,
        identity: ConfigIdentity,
    },
    Crud {
        config: Arc<dyn CrudConfig>,
        index: Table,
    },
}

/// One registered config with everything derived from it at start-up.
#[derive(Clone)]
pub struct ConfigEntry {
    key: String,
    path: LogicalPath,
    route_prefix: String,
    names: IndexMap<String, String>,
    handle: ConfigHandle,
}

impl ConfigEntry {
    fn form(config: Arc<dyn FormConfig>) -> Result<Self> {
        let path = LogicalPath::parse(config.logical_path());
        let identity = ConfigIdentity::derive(&path)?;
        Ok(Self {
            key: identity.config_key().to_string(),
            route_prefix: identity.route_prefix(),
            names: identity.names(),
            path,
            handle: ConfigHandle::Form { config, identity },
        })
    }

    fn crud(config: Arc<dyn CrudConfig>) -> Result<Self> {
        let path = LogicalPath::parse(config.logical_path());
        let mut index = Table::new();
        config.index(&mut index);
        Ok(Self {
            key: path.config_key()?,
            route_prefix: config.route_prefix(),
            names: config.names(),
            path,
            handle: ConfigHandle::Crud { config, index },
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn path(&self) -> &LogicalPath {
        &self.path
    }

    pub fn route_prefix(&self) -> &str {
        &self.route_prefix
    }

    pub fn names(&self) -> &IndexMap<String, String> {
        &self.names
    }

    pub fn handle(&self) -> &ConfigHandle {
        &self.handle
    }

    pub fn is_crud(&self) -> bool {
        matches!(self.handle, ConfigHandle::Crud { .. })
    }

    /// Form identity; `None` for crud configs.
    pub fn identity(&self) -> Option<&ConfigIdentity> {
        match &self.handle {
            ConfigHandle::Form { identity, .. } => Some(identity),
            ConfigHandle::Crud { .. } => None,
        }
    }

    pub fn index(&self) -> Option<&Table> {
        match &self.handle {
            ConfigHandle::Crud { index, .. } => Some(index),
            ConfigHandle::Form { .. } => None,
        }
    }

    /// Model the composed form is bound to.
    pub fn model(&self) -> ModelRef {
        match &self.handle {
            ConfigHandle::Form { .. } => StaticModel::form().into_ref(),
            ConfigHandle::Crud { config, .. } => config.model(),
        }
    }

    /// Compose and render-validate the config's form.
    pub fn compose(&self, context: &Arc<FormContext>) -> Result<BaseForm> {
        let mut form = BaseForm::new(Arc::clone(context), self.model(), self.route_prefix.clone());
        let outcome = match &self.handle {
            ConfigHandle::Form { config, .. } => config.show(&mut form),
            ConfigHandle::Crud { config, .. } => config.show(&mut form),
        }
        .and_then(|()| form.finish());

        match outcome {
            Ok(()) => {
                debug!("composed {} ({} fields)", self.key, form.registered_fields().len());
                Ok(form)
            }
            Err(source) => {
                error!("composing {} failed: {}", self.key, source);
                Err(CrudError::Composition {
                    key: self.key.clone(),
                    source,
                })
            }
        }
    }

    /// Permissions on the entry's collection (form configs) or route
    /// prefix (crud configs).
    pub fn permissions<U: ?Sized>(&self, authorizer: &dyn Authorizer<U>, user: &U) -> Permissions {
        match &self.handle {
            ConfigHandle::Form { identity, .. } => identity.permissions(authorizer, user),
            ConfigHandle::Crud { .. } => {
                let subject = self.route_prefix.trim_start_matches("crud/");
                Permissions {
                    read: authorizer.authorize(user, Operation::Read, subject),
                    update: authorizer.authorize(user, Operation::Update, subject),
                }
            }
        }
    }

    fn related(&self) -> RelatedConfig {
        let model = match &self.handle {
            ConfigHandle::Form { .. } => FORM_MODEL.to_string(),
            ConfigHandle::Crud { config, .. } => config.model().type_name().to_string(),
        };
        RelatedConfig {
            key: self.key.clone(),
            model: Some(model),
            route_prefix: self.route_prefix.clone(),
            index: self.index().cloned(),
        }
    }
}

/// Immutable, key-ordered config registry.
#[derive(Clone, Default)]
pub struct ConfigStore {
    entries: IndexMap<String, Arc<ConfigEntry>>,
}

impl ConfigStore {
    pub fn builder() -> ConfigStoreBuilder {
        ConfigStoreBuilder::new()
    }

    pub fn get(&self, key: &str) -> Option<&Arc<ConfigEntry>> {
        self.entries.get(key)
    }

    pub fn exists(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn entries(&self) -> impl Iterator<Item = &Arc<ConfigEntry>> {
        self.entries.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}

impl ConfigLookup for ConfigStore {
    fn lookup(&self, key: &str) -> Option<RelatedConfig> {
        self.entries.get(key).map(|entry| entry.related())
    }

    fn exists(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

/// Collects configs; identities are derived and checked in
/// [`ConfigStoreBuilder::build`].
#[derive(Default)]
pub struct ConfigStoreBuilder {
    pending: Vec<Pending>,
}

enum Pending {
    Form(Arc<dyn FormConfig>),
    Crud(Arc<dyn CrudConfig>),
}

impl ConfigStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_form<C: FormConfig>(mut self, config: C) -> Self {
        self.pending.push(Pending::Form(Arc::new(config)));
        self
    }

    pub fn with_crud<C: CrudConfig>(mut self, config: C) -> Self {
        self.pending.push(Pending::Crud(Arc::new(config)));
        self
    }

    pub fn build(self) -> Result<ConfigStore> {
        let mut entries = IndexMap::new();
        for pending in self.pending {
            let entry = match pending {
                Pending::Form(config) => ConfigEntry::form(config)?,
                Pending::Crud(config) => ConfigEntry::crud(config)?,
            };
            if entries.contains_key(entry.key()) {
                return Err(CrudError::DuplicateKey(entry.key().to_string()));
            }
            debug!("registered config {} at {}", entry.key(), entry.route_prefix());
            entries.insert(entry.key().to_string(), Arc::new(entry));
        }
        Ok(ConfigStore { entries })
    }
}
