//! Field descriptors and the capability interface every registered entry
//! implements.

use std::any::Any;
use std::fmt;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::context::FieldContext;
use crate::error::{FormError, Result};
use crate::form::BaseForm;

/// Kind of request validation rules are collected for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RuleContext {
    Create,
    Update,
}

/// Descriptor of one editable attribute.
///
/// Holds identity, kind-specific attributes (defaults merged with
/// overrides) and the checklist of attributes that must be set before the
/// next registration.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    id: String,
    kind: String,
    component: String,
    local_key: String,
    translatable: bool,
    model: String,
    route_prefix: String,
    attributes: IndexMap<String, Value>,
    required: Vec<String>,
    rules: Vec<String>,
    creation_rules: Vec<String>,
    update_rules: Vec<String>,
}

impl Field {
    pub fn new(kind: impl Into<String>, cx: &FieldContext<'_>) -> Self {
        let kind = kind.into();
        Self {
            id: cx.id.to_string(),
            component: format!("field-{kind}"),
            kind,
            local_key: cx.id.to_string(),
            translatable: false,
            model: cx.model.type_name().to_string(),
            route_prefix: cx.route_prefix.to_string(),
            attributes: IndexMap::new(),
            required: Vec::new(),
            rules: Vec::new(),
            creation_rules: Vec::new(),
            update_rules: Vec::new(),
        }
    }

    /// Client component rendering this field.
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = component.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn local_key(&self) -> &str {
        &self.local_key
    }

    pub fn is_translatable(&self) -> bool {
        self.translatable
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn route_prefix(&self) -> &str {
        &self.route_prefix
    }

    pub fn attributes(&self) -> &IndexMap<String, Value> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Set and non-null.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.get(name).is_some_and(|value| !value.is_null())
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Add `name` to the required-attribute checklist.
    pub fn require(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        if !self.required.contains(&name) {
            self.required.push(name);
        }
        self
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    pub(crate) fn set_translatable(&mut self, translatable: bool) {
        self.translatable = translatable;
    }

    pub(crate) fn set_local_key(&mut self, key: String) {
        self.local_key = key;
    }

    pub(crate) fn rules_mut(&mut self, request: Option<RuleContext>) -> &mut Vec<String> {
        match request {
            None => &mut self.rules,
            Some(RuleContext::Create) => &mut self.creation_rules,
            Some(RuleContext::Update) => &mut self.update_rules,
        }
    }

    /// Options of select-like fields, in display order.
    pub fn options<K, V>(&mut self, options: impl IntoIterator<Item = (K, V)>) -> &mut Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let options: Map<String, Value> = options
            .into_iter()
            .map(|(key, label)| (key.into(), label.into()))
            .collect();
        self.set_attribute("options", Value::Object(options))
    }

    pub fn check_complete(&self) -> Result<()> {
        match self.required.iter().find(|name| !self.has_attribute(name)) {
            Some(missing) => Err(FormError::IncompleteField {
                kind: self.kind.clone(),
                field: self.id.clone(),
                attribute: missing.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Base rules followed by the rules of the given request kind.
    pub fn rules_for(&self, request: RuleContext) -> Vec<String> {
        let specific = match request {
            RuleContext::Create => &self.creation_rules,
            RuleContext::Update => &self.update_rules,
        };
        self.rules.iter().chain(specific).cloned().collect()
    }

    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        out.insert("id".into(), Value::String(self.id.clone()));
        out.insert("local_key".into(), Value::String(self.local_key.clone()));
        out.insert("translatable".into(), Value::Bool(self.translatable));
        out.insert("component".into(), Value::String(self.component.clone()));
        out.insert("route_prefix".into(), Value::String(self.route_prefix.clone()));
        for (name, value) in &self.attributes {
            out.insert(name.clone(), value.clone());
        }
        Value::Object(out)
    }
}

/// Capability set of an entry in a form's registration sequence.
///
/// Fields, relation fields, block/modal fields and plain components all go
/// through the same registration pipeline; this trait is what the engine
/// sees of them.
pub trait FormField: Send + Sync + 'static {
    fn id(&self) -> &str;

    fn kind(&self) -> &str;

    /// The field descriptor, `None` for plain components.
    fn descriptor(&self) -> Option<&Field>;

    fn is_component(&self) -> bool {
        self.descriptor().is_none()
    }

    /// Fails with [`FormError::IncompleteField`] naming the first missing
    /// required attribute.
    fn check_complete(&self) -> Result<()> {
        self.descriptor().map_or(Ok(()), Field::check_complete)
    }

    /// Validation rules, `None` for entries that carry no value.
    fn validation_rules(&self, request: RuleContext) -> Option<Vec<String>> {
        self.descriptor().map(|field| field.rules_for(request))
    }

    /// Nested form owned by this field (modal-like fields).
    fn nested_form(&self) -> Option<&BaseForm> {
        None
    }

    /// Block fields own several named repeatable forms.
    fn is_block(&self) -> bool {
        false
    }

    fn repeatable(&self, _key: &str) -> Option<&BaseForm> {
        None
    }

    fn render(&self, form: &BaseForm) -> Value;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl fmt::Debug for dyn FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind(), self.id())
    }
}

impl FormField for Field {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> &str {
        &self.kind
    }

    fn descriptor(&self) -> Option<&Field> {
        Some(self)
    }

    fn render(&self, _form: &BaseForm) -> Value {
        self.to_json()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Fluent setters shared by every field type.
pub trait FieldAttributes {
    fn field_mut(&mut self) -> &mut Field;

    fn title(&mut self, title: impl Into<String>) -> &mut Self
    where
        Self: Sized,
    {
        self.field_mut().set_attribute("title", title.into());
        self
    }

    fn hint(&mut self, hint: impl Into<String>) -> &mut Self
    where
        Self: Sized,
    {
        self.field_mut().set_attribute("hint", hint.into());
        self
    }

    fn placeholder(&mut self, placeholder: impl Into<String>) -> &mut Self
    where
        Self: Sized,
    {
        self.field_mut().set_attribute("placeholder", placeholder.into());
        self
    }

    /// Width in grid columns (1-12).
    fn width(&mut self, cols: u8) -> &mut Self
    where
        Self: Sized,
    {
        self.field_mut().set_attribute("width", cols.clamp(1, 12));
        self
    }

    fn readonly(&mut self, readonly: bool) -> &mut Self
    where
        Self: Sized,
    {
        self.field_mut().set_attribute("readonly", readonly);
        self
    }

    fn translatable(&mut self, translatable: bool) -> &mut Self
    where
        Self: Sized,
    {
        self.field_mut().set_translatable(translatable);
        self
    }

    /// Storage key the value is written to; defaults to the field id.
    fn stored_as(&mut self, key: impl Into<String>) -> &mut Self
    where
        Self: Sized,
    {
        self.field_mut().set_local_key(key.into());
        self
    }

    fn attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self
    where
        Self: Sized,
    {
        self.field_mut().set_attribute(name, value);
        self
    }

    fn rules<I, S>(&mut self, rules: I) -> &mut Self
    where
        Self: Sized,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_mut()
            .rules_mut(None)
            .extend(rules.into_iter().map(Into::into));
        self
    }

    fn creation_rules<I, S>(&mut self, rules: I) -> &mut Self
    where
        Self: Sized,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_mut()
            .rules_mut(Some(RuleContext::Create))
            .extend(rules.into_iter().map(Into::into));
        self
    }

    fn update_rules<I, S>(&mut self, rules: I) -> &mut Self
    where
        Self: Sized,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_mut()
            .rules_mut(Some(RuleContext::Update))
            .extend(rules.into_iter().map(Into::into));
        self
    }
}

impl FieldAttributes for Field {
    fn field_mut(&mut self) -> &mut Field {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::FormContext;
    use crate::model::StaticModel;
    use serde_json::json;

    fn field(kind: &str, id: &str) -> Field {
        let model = StaticModel::new("Post").into_ref();
        let form = FormContext::standard();
        let cx = FieldContext {
            id,
            model: &model,
            route_prefix: "crud/posts",
            form: &form,
        };
        Field::new(kind, &cx)
    }

    #[test]
    fn check_complete_names_the_first_missing_attribute() {
        let mut select = field("select", "state");
        select.require("options").require("title");

        match select.check_complete() {
            Err(FormError::IncompleteField { attribute, field, .. }) => {
                assert_eq!(attribute, "options");
                assert_eq!(field, "state");
            }
            other => panic!("expected incomplete field, got {other:?}"),
        }

        select.options([("draft", "Draft")]).title("State");
        assert!(select.check_complete().is_ok());
    }

    #[test]
    fn null_attributes_count_as_missing() {
        let mut input = field("input", "title");
        input.require("title").set_attribute("title", Value::Null);
        assert!(input.check_complete().is_err());
    }

    #[test]
    fn rules_merge_base_and_request_specific() {
        let mut input = field("input", "slug");
        input
            .rules(["max:60"])
            .creation_rules(["required"])
            .update_rules(["sometimes"]);

        assert_eq!(input.rules_for(RuleContext::Create), vec!["max:60", "required"]);
        assert_eq!(input.rules_for(RuleContext::Update), vec!["max:60", "sometimes"]);
    }

    #[test]
    fn registered_entries_debug_as_kind_and_id() {
        let input = field("input", "title");
        let entry: &dyn FormField = &input;
        assert_eq!(format!("{entry:?}"), "input(title)");
    }

    #[test]
    fn to_json_flattens_attributes_after_identity() {
        let mut input = field("input", "title");
        input.title("Title").stored_as("post_title").width(20);

        assert_eq!(
            input.to_json(),
            json!({
                "id": "title",
                "local_key": "post_title",
                "translatable": false,
                "component": "field-input",
                "route_prefix": "crud/posts",
                "title": "Title",
                "width": 12
            })
        );
    }
}
