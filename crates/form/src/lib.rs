//! Declarative form composition for admin CRUD screens.
//!
//! A form is described by calling a small DSL on a [`BaseForm`]: field
//! kinds (`input`, `select`, `block`, ...), `relation` for relations
//! declared on the form's model, and layout wrappers (`group`, `col`,
//! `wrapper`). Rendering yields a tree of JSON field descriptors for a
//! client-side renderer plus the validation rules of every field.
//!
//! The read-only environment (field kinds, relation kinds, registered
//! configs, locales) lives in a shared [`FormContext`].

pub mod component;
pub mod context;
pub mod error;
pub mod field;
pub mod fields;
pub mod form;
pub mod inflect;
pub mod kinds;
pub mod model;
pub mod registrar;
pub mod relation;
pub mod table;

pub use component::{Component, FieldRef, Prop};
pub use context::{ConfigLookup, FieldContext, FormContext, FormContextBuilder, NoConfigs, RelatedConfig};
pub use error::{FormError, Result};
pub use field::{Field, FieldAttributes, FormField, RuleContext};
pub use fields::{BlockField, ComponentField, ModalField};
pub use form::{BaseForm, RenderedForm};
pub use kinds::{FieldKind, FieldRegistry, FormMacro, SimpleKind};
pub use model::{
    Direction, Model, ModelRef, OrderClause, Predicate, QueryScope, RelationDescriptor,
    RelationKind, StaticModel,
};
pub use registrar::Registrar;
pub use relation::{RelationFactory, RelationField, RelationRegistry, RelationSource};
pub use table::{Column, Table};

/// Everything a form builder usually needs in scope.
pub mod prelude {
    pub use crate::field::FieldAttributes;
    pub use crate::form::BaseForm;
    pub use crate::model::{Direction, QueryScope};
    pub use crate::table::Table;
    pub use crate::{FormError, Result};
}
