//! Generic, attribute-bearing nodes of the rendered form tree.
//!
//! A [`Component`] is either a purely presentational node or a layout
//! wrapper that owns further components. Fields are not stored inside the
//! tree; a wrapper points at them through [`FieldRef`] props that are
//! resolved when the owning form is rendered.

use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Component kind of the outer node every wrapper is built from.
pub const FIELD_WRAPPER: &str = "field-wrapper";
/// Component kind used by [`crate::BaseForm::group`].
pub const FIELD_WRAPPER_GROUP: &str = "field-wrapper-group";
/// Column layer of [`crate::BaseForm::col`].
pub const COL: &str = "col";
/// Row layer of [`crate::BaseForm::col`].
pub const ROW: &str = "row";
/// Leaf node wrapping a registered field inside a wrapper.
pub const FIELD: &str = "field";

/// Position of a registered entry in the flat registration sequence of a form.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldRef(pub(crate) usize);

impl FieldRef {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Value of a component prop.
#[derive(Debug, Clone, PartialEq)]
pub enum Prop {
    Value(Value),
    Component(Box<Component>),
    Field(FieldRef),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    kind: String,
    props: IndexMap<String, Prop>,
    children: Vec<Component>,
    wrapped: Option<Box<Component>>,
}

impl Component {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            props: IndexMap::new(),
            children: Vec::new(),
            wrapped: None,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Set a plain prop, replacing an earlier value with the same name in place.
    pub fn prop(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.set_prop(name, Prop::Value(value.into()))
    }

    pub fn set_prop(&mut self, name: impl Into<String>, prop: Prop) -> &mut Self {
        self.props.insert(name.into(), prop);
        self
    }

    /// By-value variant of [`Component::prop`] for building detached nodes.
    pub fn with_prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.prop(name, value);
        self
    }

    pub fn get_prop(&self, name: &str) -> Option<&Prop> {
        self.props.get(name)
    }

    pub fn props(&self) -> &IndexMap<String, Prop> {
        &self.props
    }

    /// Append a child and return it for further configuration.
    pub fn child(&mut self, component: Component) -> &mut Component {
        self.children.push(component);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    pub fn children(&self) -> &[Component] {
        &self.children
    }

    /// The component a layout wrapper was opened for (`group`, `col`, ...).
    pub fn wrapped(&self) -> Option<&Component> {
        self.wrapped.as_deref()
    }

    pub fn wrapped_mut(&mut self) -> Option<&mut Component> {
        self.wrapped.as_deref_mut()
    }

    pub(crate) fn wrapping(mut self, inner: Component) -> Self {
        self.wrapped = Some(Box::new(inner));
        self
    }

    /// Serialize the node; `resolve` renders referenced fields.
    pub fn render(&self, resolve: &dyn Fn(FieldRef) -> Value) -> Value {
        let mut props = Map::new();
        for (name, prop) in &self.props {
            let value = match prop {
                Prop::Value(value) => value.clone(),
                Prop::Component(component) => component.render(resolve),
                Prop::Field(field) => resolve(*field),
            };
            props.insert(name.clone(), value);
        }

        let mut out = Map::new();
        out.insert("component".into(), Value::String(self.kind.clone()));
        out.insert("props".into(), Value::Object(props));
        if let Some(wrapped) = &self.wrapped {
            out.insert("wrapper_component".into(), wrapped.render(resolve));
        }
        out.insert(
            "children".into(),
            Value::Array(self.children.iter().map(|c| c.render(resolve)).collect()),
        );
        Value::Object(out)
    }
}

impl From<&str> for Component {
    fn from(kind: &str) -> Self {
        Component::new(kind)
    }
}

impl From<String> for Component {
    fn from(kind: String) -> Self {
        Component::new(kind)
    }
}
