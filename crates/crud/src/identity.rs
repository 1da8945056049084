//! Naming conventions that turn a config's logical path into its identity.
//!
//! A form config living at `App::Config::Form::Pages::HomeConfig` belongs to
//! collection `pages`, is named `home`, is stored under the key
//! `form.pages.home` and is served below `form/pages/home`. All of this is
//! derived from the path alone.

use std::fmt;
use std::str::FromStr;

use form::inflect::{singular, snake, ucfirst};
use indexmap::IndexMap;
use thiserror::Error;

use crate::config::{Authorizer, Operation, Permissions};

/// Segment every config path contains.
pub const CONFIG_SEGMENT: &str = "Config";
/// Segment following [`CONFIG_SEGMENT`] in the path of form configs.
pub const FORM_SEGMENT: &str = "Form";
/// Suffix stripped from config type names.
pub const CONFIG_SUFFIX: &str = "Config";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("empty config path")]
    EmptyPath,

    #[error("config path {0} has no `Config` segment")]
    MissingConfigSegment(String),

    #[error("config path {0} has no `Config::Form` marker")]
    MissingFormMarker(String),

    #[error("config path {0} names no collection after the form marker")]
    MissingCollection(String),

    #[error("config type of {0} has no name besides the `Config` suffix")]
    EmptyTypeName(String),
}

/// Ordered segments of a fully qualified config type name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LogicalPath {
    segments: Vec<String>,
}

impl LogicalPath {
    /// Split on `::` or `\`; empty segments are dropped.
    pub fn parse(path: &str) -> Self {
        let segments = path
            .split(['\\', ':'])
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();
        Self { segments }
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The type's own short name.
    pub fn type_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Short name with the `Config` suffix removed.
    pub fn short_name(&self) -> Option<&str> {
        self.type_name()
            .map(|name| name.strip_suffix(CONFIG_SUFFIX).unwrap_or(name))
    }

    /// Store key: every segment after `Config`, lower-snake, dot-joined,
    /// with the suffix of the type name removed (`crud.blog_post`,
    /// `form.pages.home`).
    pub fn config_key(&self) -> Result<String, IdentityError> {
        let start = self
            .segments
            .iter()
            .position(|segment| segment == CONFIG_SEGMENT)
            .ok_or_else(|| IdentityError::MissingConfigSegment(self.to_string()))?;

        let rest = &self.segments[start + 1..];
        let Some((last, namespace)) = rest.split_last() else {
            return Err(IdentityError::MissingConfigSegment(self.to_string()));
        };
        let last = last.strip_suffix(CONFIG_SUFFIX).unwrap_or(last);
        if last.is_empty() {
            return Err(IdentityError::EmptyTypeName(self.to_string()));
        }

        let mut key: Vec<String> = namespace.iter().map(|segment| snake(segment)).collect();
        key.push(snake(last));
        Ok(key.join("."))
    }
}

impl fmt::Display for LogicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("::"))
    }
}

impl FromStr for LogicalPath {
    type Err = IdentityError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let parsed = Self::parse(path);
        if parsed.segments.is_empty() {
            return Err(IdentityError::EmptyPath);
        }
        Ok(parsed)
    }
}

/// Collection, form name and derived names of a form config.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigIdentity {
    path: LogicalPath,
    collection: String,
    form_name: String,
    config_key: String,
}

impl ConfigIdentity {
    pub fn derive(path: &LogicalPath) -> Result<Self, IdentityError> {
        let segments = path.segments();
        if segments.is_empty() {
            return Err(IdentityError::EmptyPath);
        }

        let marker = segments
            .windows(2)
            .position(|pair| pair[0] == CONFIG_SEGMENT && pair[1] == FORM_SEGMENT)
            .ok_or_else(|| IdentityError::MissingFormMarker(path.to_string()))?;

        // the collection must sit between the marker and the type name
        let head = marker + 2;
        if head + 1 >= segments.len() {
            return Err(IdentityError::MissingCollection(path.to_string()));
        }

        let short_name = path.short_name().unwrap_or_default();
        if short_name.is_empty() {
            return Err(IdentityError::EmptyTypeName(path.to_string()));
        }
        Ok(Self {
            path: path.clone(),
            collection: segments[head].to_lowercase(),
            form_name: snake(short_name),
            config_key: path.config_key()?,
        })
    }

    pub fn parse(path: &str) -> Result<Self, IdentityError> {
        Self::derive(&path.parse()?)
    }

    pub fn path(&self) -> &LogicalPath {
        &self.path
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn form_name(&self) -> &str {
        &self.form_name
    }

    pub fn route_prefix(&self) -> String {
        format!("form/{}/{}", self.collection, self.form_name)
    }

    /// Capitalized singular of the form name.
    pub fn title(&self) -> String {
        ucfirst(&singular(&self.form_name))
    }

    pub fn names(&self) -> IndexMap<String, String> {
        IndexMap::from([("singular".to_string(), self.title())])
    }

    pub fn config_key(&self) -> &str {
        &self.config_key
    }

    /// `read` / `update` as granted by `authorizer` for `user` on the
    /// collection.
    pub fn permissions<U: ?Sized>(&self, authorizer: &dyn Authorizer<U>, user: &U) -> Permissions {
        Permissions {
            read: authorizer.authorize(user, Operation::Read, &self.collection),
            update: authorizer.authorize(user, Operation::Update, &self.collection),
        }
    }
}
