//! Config traits implemented by the application.
//!
//! A [`FormConfig`] describes a standalone form (site settings, page
//! content) whose values are stored as plain form values. A [`CrudConfig`]
//! binds a form to a model and adds an index table.

use form::inflect::{basename, plural, snake, ucfirst};
use form::{BaseForm, ModelRef, Table};
use indexmap::IndexMap;
use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Operation a user asks permission for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

/// Outcome of asking an [`Authorizer`] about a config.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Permissions {
    pub read: bool,
    pub update: bool,
}

/// Authorization predicate: may `user` perform `operation` on `subject`?
pub trait Authorizer<U: ?Sized>: Send + Sync {
    fn authorize(&self, user: &U, operation: Operation, subject: &str) -> bool;
}

impl<U: ?Sized, F> Authorizer<U> for F
where
    F: Fn(&U, Operation, &str) -> bool + Send + Sync,
{
    fn authorize(&self, user: &U, operation: Operation, subject: &str) -> bool {
        self(user, operation, subject)
    }
}

/// A standalone form.
pub trait FormConfig: Send + Sync + 'static {
    /// Fully qualified path, e.g. `App::Config::Form::Pages::HomeConfig`.
    fn logical_path(&self) -> &str;

    /// Compose the form.
    fn show(&self, form: &mut BaseForm) -> form::Result<()>;
}

/// A form bound to a model, with an index listing.
pub trait CrudConfig: Send + Sync + 'static {
    /// Fully qualified path, e.g. `App::Config::Crud::PostConfig`.
    fn logical_path(&self) -> &str;

    fn model(&self) -> ModelRef;

    /// Defaults to `crud/<plural lower-snake model name>`.
    fn route_prefix(&self) -> String {
        let model = self.model();
        format!("crud/{}", snake(&plural(basename(model.type_name()))))
    }

    /// `singular` / `plural` display names derived from the model.
    fn names(&self) -> IndexMap<String, String> {
        let model = self.model();
        let singular = ucfirst(basename(model.type_name()));
        IndexMap::from([
            ("plural".to_string(), plural(&singular)),
            ("singular".to_string(), singular),
        ])
    }

    /// Columns of the index table.
    fn index(&self, _table: &mut Table) {}

    /// Compose the create / edit form.
    fn show(&self, form: &mut BaseForm) -> form::Result<()>;
}
