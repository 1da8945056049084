//! Admin settings stored as a single RON file.
//!
//! Missing keys fall back to their defaults, so the file only has to hold
//! deviations. A missing or empty file yields [`CrudSettings::default`].

use std::fs;
use std::path::Path;
use std::sync::Arc;

use form::{ConfigLookup, FormContext};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ron parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("ron serialize error: {0}")]
    RonSer(#[from] ron::Error),

    #[error("invalid settings: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrudSettings {
    /// Url segment the admin is mounted below, e.g. `admin`.
    pub url_prefix: String,
    /// Locales translatable fields are expanded into.
    pub locales: Vec<String>,
    pub default_locale: String,
}

impl Default for CrudSettings {
    fn default() -> Self {
        Self {
            url_prefix: "admin".into(),
            locales: vec!["en".into()],
            default_locale: "en".into(),
        }
    }
}

impl CrudSettings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("no settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let settings = if content.trim().is_empty() {
            Self::default()
        } else {
            Self::from_ron(&content)?
        };
        settings.validate()?;
        debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn from_ron(content: &str) -> Result<Self, SettingsError> {
        Ok(ron::from_str(content)?)
    }

    pub fn to_ron(&self) -> Result<String, SettingsError> {
        let pretty = ron::ser::PrettyConfig::default();
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Write through a temporary sibling file and rename it into place.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        self.validate()?;
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        let tmp = path.with_extension("tmp");
        fs::write(&tmp, self.to_ron()?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.locales.is_empty() {
            return Err(SettingsError::Invalid("at least one locale is required".into()));
        }
        if !self.locales.contains(&self.default_locale) {
            return Err(SettingsError::Invalid(format!(
                "default locale {} is not one of {}",
                self.default_locale,
                self.locales.join(", ")
            )));
        }
        if self.url_prefix.contains('/') {
            warn!("url prefix {} contains a slash", self.url_prefix);
        }
        Ok(())
    }

    /// Form context with the standard kinds, these locales and `configs`.
    pub fn form_context(&self, configs: Arc<dyn ConfigLookup>) -> Arc<FormContext> {
        FormContext::builder()
            .with_configs(configs)
            .with_locales(self.locales.iter().cloned())
            .with_url_prefix(self.url_prefix.clone())
            .build()
    }
}
