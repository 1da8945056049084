//! Field kind catalogue.
//!
//! Every DSL call a form accepts (`input`, `select`, `block`, ...) is a
//! named [`FieldKind`] in a [`FieldRegistry`]. The registry is assembled
//! once and shared read-only through [`crate::FormContext`].

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::context::FieldContext;
use crate::error::Result;
use crate::field::{Field, FormField};
use crate::fields::{BlockField, ComponentField, ModalField};
use crate::form::BaseForm;
use crate::relation::RelationField;

/// Factory for one named field kind.
pub trait FieldKind: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn build(&self, cx: &FieldContext<'_>) -> Result<Box<dyn FormField>>;
}

/// A kind that produces a plain [`Field`] with declared defaults.
#[derive(Clone, Copy)]
pub struct SimpleKind {
    pub name: &'static str,
    pub component: &'static str,
    pub translatable: bool,
    pub required: &'static [&'static str],
    pub defaults: fn(&mut Field),
}

impl SimpleKind {
    pub fn field(&self, cx: &FieldContext<'_>) -> Field {
        let mut field = Field::new(self.name, cx).with_component(self.component);
        field.set_translatable(self.translatable);
        for attribute in self.required {
            field.require(*attribute);
        }
        (self.defaults)(&mut field);
        field
    }
}

impl fmt::Debug for SimpleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleKind")
            .field("name", &self.name)
            .field("component", &self.component)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

impl FieldKind for SimpleKind {
    fn name(&self) -> &str {
        self.name
    }

    fn build(&self, cx: &FieldContext<'_>) -> Result<Box<dyn FormField>> {
        Ok(Box::new(self.field(cx)))
    }
}

fn no_defaults(_: &mut Field) {}

pub const INPUT: SimpleKind = SimpleKind {
    name: "input",
    component: "field-input",
    translatable: false,
    required: &[],
    defaults: |field| {
        field.set_attribute("type", "text");
    },
};

pub const TEXTAREA: SimpleKind = SimpleKind {
    name: "textarea",
    component: "field-textarea",
    translatable: false,
    required: &[],
    defaults: |field| {
        field.set_attribute("rows", 3);
    },
};

pub const WYSIWYG: SimpleKind = SimpleKind {
    name: "wysiwyg",
    component: "field-wysiwyg",
    translatable: true,
    required: &[],
    defaults: no_defaults,
};

pub const NUMBER: SimpleKind = SimpleKind {
    name: "number",
    component: "field-input",
    translatable: false,
    required: &[],
    defaults: |field| {
        field.set_attribute("type", "number");
    },
};

pub const BOOLEAN: SimpleKind = SimpleKind {
    name: "boolean",
    component: "field-boolean",
    translatable: false,
    required: &[],
    defaults: |field| {
        field.set_attribute("default", false);
    },
};

pub const DATE: SimpleKind = SimpleKind {
    name: "date",
    component: "field-date",
    translatable: false,
    required: &[],
    defaults: |field| {
        field.set_attribute("only_date", true);
    },
};

pub const SELECT: SimpleKind = SimpleKind {
    name: "select",
    component: "field-select",
    translatable: false,
    required: &["options"],
    defaults: no_defaults,
};

pub const CHECKBOXES: SimpleKind = SimpleKind {
    name: "checkboxes",
    component: "field-checkboxes",
    translatable: false,
    required: &["options"],
    defaults: no_defaults,
};

/// Plain presentational component; the registration id is its kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComponentKind;

impl FieldKind for ComponentKind {
    fn name(&self) -> &str {
        "component"
    }

    fn build(&self, cx: &FieldContext<'_>) -> Result<Box<dyn FormField>> {
        Ok(Box::new(ComponentField::new(cx.id)))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BlockKind;

impl FieldKind for BlockKind {
    fn name(&self) -> &str {
        "block"
    }

    fn build(&self, cx: &FieldContext<'_>) -> Result<Box<dyn FormField>> {
        Ok(Box::new(BlockField::new(cx)))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ModalKind;

impl FieldKind for ModalKind {
    fn name(&self) -> &str {
        "modal"
    }

    fn build(&self, cx: &FieldContext<'_>) -> Result<Box<dyn FormField>> {
        Ok(Box::new(ModalField::new(cx)))
    }
}

/// `oneRelation` / `manyRelation`: relations for forms whose model cannot
/// declare relations itself.
#[derive(Debug, Clone, Copy)]
pub struct FormRelationKind {
    pub many: bool,
}

impl FieldKind for FormRelationKind {
    fn name(&self) -> &str {
        if self.many {
            "manyRelation"
        } else {
            "oneRelation"
        }
    }

    fn build(&self, cx: &FieldContext<'_>) -> Result<Box<dyn FormField>> {
        Ok(Box::new(RelationField::form_relation(cx, self.many)?))
    }
}

/// Named extension invoked through [`BaseForm::call`].
pub type FormMacro = Arc<dyn Fn(&mut BaseForm, &[Value]) -> Result<()> + Send + Sync>;

/// Name → kind map plus registered macros, in registration order.
#[derive(Clone, Default)]
pub struct FieldRegistry {
    kinds: IndexMap<String, Arc<dyn FieldKind>>,
    macros: IndexMap<String, FormMacro>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in catalogue.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for kind in [INPUT, TEXTAREA, WYSIWYG, NUMBER, BOOLEAN, DATE, SELECT, CHECKBOXES] {
            registry.register(kind);
        }
        registry.register(ComponentKind);
        registry.register(BlockKind);
        registry.register(ModalKind);
        registry.register(FormRelationKind { many: false });
        registry.register(FormRelationKind { many: true });
        registry
    }

    /// Register a kind, replacing any kind with the same name.
    pub fn register<K: FieldKind>(&mut self, kind: K) -> &mut Self {
        self.kinds.insert(kind.name().to_string(), Arc::new(kind));
        self
    }

    pub fn register_macro<F>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: Fn(&mut BaseForm, &[Value]) -> Result<()> + Send + Sync + 'static,
    {
        self.macros.insert(name.into(), Arc::new(body));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn FieldKind>> {
        self.kinds.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.kinds.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }

    pub fn macro_(&self, name: &str) -> Option<&FormMacro> {
        self.macros.get(name)
    }
}

impl fmt::Debug for FieldRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRegistry")
            .field("kinds", &self.kinds.keys().collect::<Vec<_>>())
            .field("macros", &self.macros.keys().collect::<Vec<_>>())
            .finish()
    }
}
