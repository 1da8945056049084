//! Admin configs on top of the `form` crate.
//!
//! Applications implement [`FormConfig`] (standalone forms) and
//! [`CrudConfig`] (model-bound forms with an index). Configs are collected
//! into a [`ConfigStore`], where each one is keyed by what its logical path
//! says about it (`form.pages.home`, `crud.post`). [`Admin`] ties the store
//! to the [`CrudSettings`] and maps every config to a [`RouteGroup`].

pub mod config;
pub mod error;
pub mod identity;
pub mod routes;
pub mod settings;
pub mod store;

use std::path::Path;
use std::sync::Arc;

use form::{BaseForm, FormContext};

pub use config::{Authorizer, CrudConfig, FormConfig, Operation, Permissions};
pub use error::{CrudError, Result};
pub use identity::{ConfigIdentity, IdentityError, LogicalPath};
pub use routes::{map_routes, Method, Route, RouteGroup, RouteRegistrar};
pub use settings::{CrudSettings, SettingsError};
pub use store::{ConfigEntry, ConfigHandle, ConfigStore, ConfigStoreBuilder};

/// Settings, registered configs and the form context built from both.
#[derive(Debug)]
pub struct Admin {
    settings: CrudSettings,
    store: Arc<ConfigStore>,
    context: Arc<FormContext>,
}

impl Admin {
    pub fn new(settings: CrudSettings, store: ConfigStore) -> Result<Self> {
        settings.validate()?;
        let store = Arc::new(store);
        let context = settings.form_context(store.clone());
        Ok(Self {
            settings,
            store,
            context,
        })
    }

    /// Load settings from `path` (defaults when missing).
    pub fn load(path: impl AsRef<Path>, store: ConfigStore) -> Result<Self> {
        Self::new(CrudSettings::load(path)?, store)
    }

    pub fn settings(&self) -> &CrudSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    pub fn context(&self) -> &Arc<FormContext> {
        &self.context
    }

    /// Compose the form of the config stored under `key`.
    pub fn form(&self, key: &str) -> Result<BaseForm> {
        self.store
            .get(key)
            .ok_or_else(|| CrudError::UnknownConfig(key.to_string()))?
            .compose(&self.context)
    }

    pub fn routes(&self, registrar: &mut dyn RouteRegistrar) -> Result<usize> {
        map_routes(&self.store, &self.context, registrar)
    }

    pub fn permissions<U: ?Sized>(
        &self,
        key: &str,
        authorizer: &dyn Authorizer<U>,
        user: &U,
    ) -> Result<Permissions> {
        self.store
            .get(key)
            .map(|entry| entry.permissions(authorizer, user))
            .ok_or_else(|| CrudError::UnknownConfig(key.to_string()))
    }
}
