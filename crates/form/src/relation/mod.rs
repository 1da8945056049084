//! Relation fields and the relation kind registry.
//!
//! A relation field edits the link between the form's record and records
//! of a related type. Fields for relations declared on the model are built
//! through the [`RelationRegistry`]; `oneRelation` / `manyRelation` build
//! the same field for forms without relation support.

mod registry;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::context::{ConfigLookup, FieldContext};
use crate::error::{FormError, Result};
use crate::field::{Field, FieldAttributes, FormField};
use crate::form::BaseForm;
use crate::inflect::{basename, plural, snake, ucfirst};
use crate::model::{QueryScope, RelationDescriptor, RelationKind};
use crate::table::Table;

pub use registry::{RelationFactory, RelationRegistry};

/// Where a relation field's relation comes from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RelationSource {
    /// Declared on the model and resolved through the registry.
    Model(RelationKind),
    /// `oneRelation` / `manyRelation`.
    Form { many: bool },
}

pub struct RelationField {
    field: Field,
    source: RelationSource,
    related: Option<String>,
    query: Option<QueryScope>,
    related_config: Option<String>,
    configs: Arc<dyn ConfigLookup>,
}

/// Relation key attributes copied from the descriptor, per kind.
fn relation_keys(kind: RelationKind) -> &'static [&'static str] {
    match kind {
        RelationKind::BelongsTo => &["foreign_key", "owner_key"],
        RelationKind::HasOne | RelationKind::HasMany => &["foreign_key", "parent_key"],
        RelationKind::BelongsToMany => &["pivot_table", "foreign_pivot_key", "related_pivot_key"],
        RelationKind::MorphOne | RelationKind::MorphMany | RelationKind::MorphTo => {
            &["morph_type", "foreign_key"]
        }
        RelationKind::MorphToMany | RelationKind::MorphedByMany => &[
            "pivot_table",
            "morph_type",
            "foreign_pivot_key",
            "related_pivot_key",
        ],
        RelationKind::HasOneThrough | RelationKind::HasManyThrough => {
            &["first_key", "second_key"]
        }
    }
}

/// `{singular, plural}` derived from a model type name.
pub fn default_names(model: &str) -> Value {
    let name = ucfirst(basename(model));
    let mut names = Map::new();
    names.insert("singular".into(), Value::String(name.clone()));
    names.insert("plural".into(), Value::String(plural(&name)));
    Value::Object(names)
}

impl RelationField {
    fn base(cx: &FieldContext<'_>, kind: &str, source: RelationSource, many: bool) -> Self {
        let mut field = Field::new(kind, cx).with_component("field-relation");
        field
            .set_attribute("search", vec!["title"])
            .set_attribute("confirm", true)
            .set_attribute("small", false)
            .set_attribute("many", many);
        Self {
            field,
            source,
            related: None,
            query: None,
            related_config: None,
            configs: Arc::clone(cx.form.configs()),
        }
    }

    /// Field for a relation declared on the form's model.
    pub fn new(cx: &FieldContext<'_>, descriptor: RelationDescriptor) -> Result<Self> {
        let kind = descriptor.kind;
        let mut relation = Self::base(cx, kind.as_ref(), RelationSource::Model(kind), kind.is_many());
        relation.field.require("preview");

        for key in relation_keys(kind) {
            if let Some(column) = descriptor.keys.get(*key) {
                relation.field.set_attribute(*key, column.clone());
            }
        }

        if !descriptor.related.is_empty() {
            relation.set_related_model(&descriptor.related)?;
        }
        relation.set_order_defaults(&descriptor);
        Ok(relation)
    }

    /// Polymorphic `morphTo`: the target type is only known per record, so
    /// the field needs the list of possible types instead of a preview.
    pub fn morph_to(cx: &FieldContext<'_>, descriptor: RelationDescriptor) -> Result<Self> {
        let kind = descriptor.kind;
        let mut relation = Self::base(cx, kind.as_ref(), RelationSource::Model(kind), false);
        relation.field.require("morph_types");
        for key in relation_keys(kind) {
            if let Some(column) = descriptor.keys.get(*key) {
                relation.field.set_attribute(*key, column.clone());
            }
        }
        Ok(relation)
    }

    /// `oneRelation` / `manyRelation`; the related model is set later with
    /// [`RelationField::model`] or inherited through
    /// [`RelationField::use_config`].
    pub fn form_relation(cx: &FieldContext<'_>, many: bool) -> Result<Self> {
        let kind = if many { "manyRelation" } else { "oneRelation" };
        let mut relation = Self::base(cx, kind, RelationSource::Form { many }, many);
        relation.field.require("model").require("preview");
        Ok(relation)
    }

    fn set_related_model(&mut self, model: &str) -> Result<()> {
        self.related = Some(model.to_string());
        self.query = Some(QueryScope::new(model));
        self.field.set_attribute("model", model);

        let config_key = format!("crud.{}", snake(basename(model)));
        if self.related_config.is_none() && self.configs.exists(&config_key) {
            debug!("relation {} inherits config {}", self.field.id(), config_key);
            self.use_config(&config_key)?;
        }

        if !self.field.has_attribute("names") {
            self.field.set_attribute("names", default_names(model));
        }
        Ok(())
    }

    fn set_order_defaults(&mut self, descriptor: &RelationDescriptor) {
        let Some(order) = descriptor.orders.first() else {
            return;
        };
        let column = match &descriptor.table {
            Some(table) => order
                .column
                .strip_prefix(&format!("{table}."))
                .unwrap_or(&order.column)
                .to_string(),
            None => order.column.clone(),
        };
        self.field
            .set_attribute("orderColumn", column)
            .set_attribute("orderDirection", order.direction.to_string());
    }

    /// Inherit model, preview table and route prefix from a registered
    /// config.
    pub fn use_config(&mut self, key: &str) -> Result<&mut Self> {
        let config = self
            .configs
            .lookup(key)
            .ok_or_else(|| FormError::invalid(format!("couldn't find config {key}")))?;

        if let Some(related) = &self.related {
            if config.model.as_deref() != Some(related.as_str()) {
                return Err(FormError::invalid(format!(
                    "related config {key} must be using model {related}"
                )));
            }
        }

        self.related_config = Some(key.to_string());

        if let (RelationSource::Form { .. }, Some(model)) = (self.source, &config.model) {
            if self.related.as_deref() != Some(model.as_str()) {
                self.set_related_model(model)?;
            }
        }
        if let Some(index) = &config.index {
            let mut table = index.clone();
            table.disable_link();
            self.set_preview(&table)?;
        }
        self.route_prefix(config.route_prefix);
        Ok(self)
    }

    /// Related model of a form relation.
    pub fn model(&mut self, model: impl Into<String>) -> Result<&mut Self> {
        if let RelationSource::Model(kind) = self.source {
            return Err(FormError::invalid(format!(
                "the related model of {} relation {} is declared by the model",
                kind,
                self.field.id()
            )));
        }
        self.set_related_model(&model.into())?;
        Ok(self)
    }

    /// Build the preview table.
    pub fn preview<F>(&mut self, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Table),
    {
        let mut table = Table::new();
        build(&mut table);
        self.set_preview(&table)?;
        Ok(self)
    }

    fn set_preview(&mut self, table: &Table) -> Result<()> {
        self.field.set_attribute("preview", serde_json::to_value(table)?);
        Ok(())
    }

    /// Columns searched when linking records.
    pub fn search<I, S>(&mut self, keys: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        self.field.set_attribute("search", keys);
        self
    }

    /// Narrow the query related records are listed with.
    pub fn filter<F>(&mut self, scope: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut QueryScope),
    {
        let id = self.field.id().to_string();
        let query = self
            .query
            .as_mut()
            .ok_or_else(|| FormError::invalid(format!("relation {id} has no related model to filter")))?;
        scope(query);
        Ok(self)
    }

    pub fn small(&mut self, small: bool) -> &mut Self {
        self.field.set_attribute("small", small);
        self
    }

    /// Confirm unlinking in a modal.
    pub fn confirm(&mut self, confirm: bool) -> &mut Self {
        self.field.set_attribute("confirm", confirm);
        self
    }

    pub fn route_prefix(&mut self, prefix: impl Into<String>) -> &mut Self {
        self.field.set_attribute("related_route_prefix", prefix.into());
        self
    }

    /// Display names; both `singular` and `plural` must be given.
    pub fn names<I, K, V>(&mut self, names: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let names: Map<String, Value> = names
            .into_iter()
            .map(|(key, name)| (key.into(), Value::String(name.into())))
            .collect();
        if !names.contains_key("singular") || !names.contains_key("plural") {
            return Err(FormError::invalid("singular and plural name must be present"));
        }
        self.field.set_attribute("names", Value::Object(names));
        Ok(self)
    }

    /// Target types of a `morphTo` relation.
    pub fn types<I, S>(&mut self, types: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let types: Vec<String> = types.into_iter().map(Into::into).collect();
        self.field.set_attribute("morph_types", types);
        self
    }

    pub fn source(&self) -> RelationSource {
        self.source
    }

    pub fn relation_kind(&self) -> Option<RelationKind> {
        match self.source {
            RelationSource::Model(kind) => Some(kind),
            RelationSource::Form { .. } => None,
        }
    }

    pub fn query(&self) -> Option<&QueryScope> {
        self.query.as_ref()
    }

    pub fn related_model(&self) -> Option<&str> {
        self.related.as_deref()
    }

    pub fn related_config(&self) -> Option<&str> {
        self.related_config.as_deref()
    }

    pub fn field(&self) -> &Field {
        &self.field
    }
}

impl fmt::Debug for RelationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationField")
            .field("field", &self.field)
            .field("source", &self.source)
            .field("related", &self.related)
            .field("query", &self.query)
            .field("related_config", &self.related_config)
            .finish_non_exhaustive()
    }
}

impl FieldAttributes for RelationField {
    fn field_mut(&mut self) -> &mut Field {
        &mut self.field
    }
}

impl FormField for RelationField {
    fn id(&self) -> &str {
        self.field.id()
    }

    fn kind(&self) -> &str {
        self.field.kind()
    }

    fn descriptor(&self) -> Option<&Field> {
        Some(&self.field)
    }

    fn render(&self, _form: &BaseForm) -> Value {
        self.field.to_json()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{FormContext, RelatedConfig};
    use crate::error::FormError;
    use crate::model::{Direction, StaticModel};
    use indexmap::IndexMap;
    use serde_json::json;

    struct Configs(IndexMap<String, RelatedConfig>);

    impl ConfigLookup for Configs {
        fn lookup(&self, key: &str) -> Option<RelatedConfig> {
            self.0.get(key).cloned()
        }
    }

    fn context_with(configs: Vec<RelatedConfig>) -> Arc<FormContext> {
        let configs = configs.into_iter().map(|c| (c.key.clone(), c)).collect();
        FormContext::builder()
            .with_configs(Arc::new(Configs(configs)))
            .build()
    }

    fn build(
        form: &Arc<FormContext>,
        id: &str,
        descriptor: RelationDescriptor,
    ) -> Result<RelationField> {
        let model = StaticModel::new("App::Models::Post").into_ref();
        let cx = FieldContext {
            id,
            model: &model,
            route_prefix: "crud/posts",
            form,
        };
        RelationField::new(&cx, descriptor)
    }

    #[test]
    fn order_defaults_strip_the_table_prefix() {
        let form = context_with(vec![]);
        let descriptor = RelationDescriptor::new(RelationKind::HasMany, "App::Models::Comment")
            .table("comments")
            .order_by("comments.created_at", Direction::Desc)
            .key("foreign_key", "post_id");

        let relation = build(&form, "comments", descriptor).expect("relation");
        let field = relation.field();
        assert_eq!(field.attribute("orderColumn"), Some(&json!("created_at")));
        assert_eq!(field.attribute("orderDirection"), Some(&json!("desc")));
        assert_eq!(field.attribute("foreign_key"), Some(&json!("post_id")));
        assert_eq!(field.attribute("many"), Some(&json!(true)));
        assert_eq!(
            field.attribute("names"),
            Some(&json!({ "singular": "Comment", "plural": "Comments" }))
        );
    }

    #[test]
    fn sibling_crud_config_is_inherited() {
        let mut index = Table::new();
        index.col("Title").value("{title}");
        let form = context_with(vec![RelatedConfig {
            key: "crud.comment".into(),
            model: Some("App::Models::Comment".into()),
            route_prefix: "crud/comments".into(),
            index: Some(index),
        }]);

        let relation = build(
            &form,
            "comments",
            RelationDescriptor::new(RelationKind::HasMany, "App::Models::Comment"),
        )
        .expect("relation");

        assert_eq!(relation.related_config(), Some("crud.comment"));
        let field = relation.field();
        assert_eq!(field.attribute("related_route_prefix"), Some(&json!("crud/comments")));
        assert_eq!(field.attribute("preview").and_then(|p| p.get("link")), Some(&json!(false)));
        assert!(field.check_complete().is_ok());
    }

    #[test]
    fn names_requires_singular_and_plural() {
        let form = context_with(vec![]);
        let mut relation = build(
            &form,
            "tags",
            RelationDescriptor::new(RelationKind::BelongsToMany, "Tag"),
        )
        .expect("relation");

        assert!(matches!(
            relation.names([("singular", "Tag")]),
            Err(FormError::InvalidArgument(_))
        ));
        relation
            .names([("singular", "Label"), ("plural", "Labels")])
            .expect("names");
        assert_eq!(
            relation.field().attribute("names"),
            Some(&json!({ "singular": "Label", "plural": "Labels" }))
        );
    }

    #[test]
    fn filter_needs_a_related_model() {
        let form = context_with(vec![]);
        let model = StaticModel::form().into_ref();
        let cx = FieldContext {
            id: "author",
            model: &model,
            route_prefix: "form/pages/home",
            form: &form,
        };
        let mut relation = RelationField::form_relation(&cx, false).expect("relation");
        assert!(relation.filter(|q| {
            q.where_eq("active", true);
        })
        .is_err());

        relation.model("App::Models::User").expect("model");
        relation
            .filter(|q| {
                q.where_eq("active", true);
            })
            .expect("filter");
        assert_eq!(relation.query().map(|q| q.predicates().len()), Some(1));
    }
}
