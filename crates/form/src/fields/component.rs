use std::any::Any;

use serde_json::Value;

use crate::component::Component;
use crate::field::{Field, FormField};
use crate::form::BaseForm;

/// A [`Component`] registered like a field.
///
/// Carries no value and no rules; `find_field` skips it.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentField {
    component: Component,
}

impl ComponentField {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            component: Component::new(kind),
        }
    }

    pub fn component(&self) -> &Component {
        &self.component
    }

    pub fn component_mut(&mut self) -> &mut Component {
        &mut self.component
    }

    pub(crate) fn set_component(&mut self, component: Component) {
        self.component = component;
    }
}

impl FormField for ComponentField {
    fn id(&self) -> &str {
        self.component.kind()
    }

    fn kind(&self) -> &str {
        "component"
    }

    fn descriptor(&self) -> Option<&Field> {
        None
    }

    fn render(&self, form: &BaseForm) -> Value {
        self.component.render(&|field| form.render_entry(field))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
