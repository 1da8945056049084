//! The form composition engine.
//!
//! A [`BaseForm`] is composed by one builder run: field kind calls,
//! `relation`, `component` and the layout wrappers `wrapper` / `group` /
//! `col`. Every registration first validates the entry registered before
//! it, so a field missing a required attribute is reported as soon as the
//! next call is made (or at the latest by [`BaseForm::render`]).
//!
//! ```ignore
//! form.input("title")?.title("Title");
//! form.group(|form| {
//!     form.textarea("summary")?.hint("Shown in listings");
//!     form.relation("tags")?.preview(|table| {
//!         table.col("Name").value("{name}");
//!     })?;
//!     Ok(())
//! })?;
//! let rendered = form.render()?;
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::component::{Component, FieldRef, Prop, COL, FIELD, FIELD_WRAPPER, FIELD_WRAPPER_GROUP, ROW};
use crate::context::{FieldContext, FormContext};
use crate::error::{FormError, Result};
use crate::field::{Field, FormField, RuleContext};
use crate::fields::{BlockField, ComponentField, ModalField};
use crate::model::ModelRef;
use crate::registrar::Registrar;
use crate::relation::RelationField;

/// Output of [`BaseForm::render`].
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RenderedForm {
    pub fields: Vec<Value>,
}

impl RenderedForm {
    pub fn to_value(&self) -> Value {
        let mut out = serde_json::Map::new();
        out.insert("fields".into(), Value::Array(self.fields.clone()));
        Value::Object(out)
    }
}

/// A wrapper between open and close.
///
/// Top-level wrappers reserve a registered component slot when they open
/// and fill it when they close; nested wrappers are attached to their
/// parent on close.
#[derive(Debug)]
struct OpenWrapper {
    node: Component,
    slot: Option<FieldRef>,
}

pub struct BaseForm {
    context: Arc<FormContext>,
    model: ModelRef,
    route_prefix: String,
    registrar: Registrar,
    fields: Vec<Box<dyn FormField>>,
    top_level: Vec<FieldRef>,
    wrapper: Option<OpenWrapper>,
    wrapper_stack: Vec<OpenWrapper>,
    sealed: bool,
}

impl BaseForm {
    pub fn new(context: Arc<FormContext>, model: ModelRef, route_prefix: impl Into<String>) -> Self {
        let mut form = Self {
            context,
            model,
            route_prefix: String::new(),
            registrar: Registrar::Empty,
            fields: Vec::new(),
            top_level: Vec::new(),
            wrapper: None,
            wrapper_stack: Vec::new(),
            sealed: false,
        };
        form.set_route_prefix(route_prefix);
        form
    }

    pub fn context(&self) -> &Arc<FormContext> {
        &self.context
    }

    pub fn model(&self) -> &ModelRef {
        &self.model
    }

    pub fn route_prefix(&self) -> &str {
        &self.route_prefix
    }

    /// Set the prefix fields build their routes from; a leading admin url
    /// prefix is stripped.
    pub fn set_route_prefix(&mut self, prefix: impl Into<String>) {
        let prefix = prefix.into();
        let admin = format!("/{}/", self.context.url_prefix().trim_matches('/'));
        self.route_prefix = match prefix.strip_prefix(&admin) {
            Some(stripped) => stripped.to_string(),
            None => prefix,
        };
    }

    pub fn in_wrapper(&self) -> bool {
        self.wrapper.is_some()
    }

    /// Number of unclosed `wrapper` / `group` / `col` calls.
    pub fn wrapper_depth(&self) -> usize {
        self.wrapper_stack.len() + usize::from(self.wrapper.is_some())
    }

    /// `true` once the form was rendered; no further registration is
    /// accepted.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    fn ensure_open(&self, id: &str) -> Result<()> {
        if self.sealed {
            warn!("registration of {} after render of {}", id, self.route_prefix);
            return Err(FormError::invalid(format!(
                "cannot register {id}: form {} was already rendered",
                self.route_prefix
            )));
        }
        Ok(())
    }

    /// Run the registration protocol for one entry built by `build`.
    fn register_with<F>(&mut self, id: &str, build: F) -> Result<FieldRef>
    where
        F: FnOnce(&FieldContext<'_>) -> Result<Box<dyn FormField>>,
    {
        self.ensure_open(id)?;
        self.registrar.validate_and_clear(&self.fields)?;

        let entry = {
            let cx = FieldContext {
                id,
                model: &self.model,
                route_prefix: &self.route_prefix,
                form: &self.context,
            };
            build(&cx)?
        };
        if !entry.is_component() && self.find_field(entry.id()).is_some() {
            warn!("duplicate field `{}` on {}", entry.id(), self.route_prefix);
            return Err(FormError::invalid(format!(
                "field {} is already registered on {}",
                entry.id(),
                self.route_prefix
            )));
        }
        Ok(self.push(entry))
    }

    fn push(&mut self, entry: Box<dyn FormField>) -> FieldRef {
        let field = FieldRef(self.fields.len());
        debug!(
            "registered {} `{}` on {} (depth {})",
            entry.kind(),
            entry.id(),
            self.route_prefix,
            self.wrapper_depth()
        );
        self.fields.push(entry);
        self.registrar.hold(field);

        match self.wrapper.as_mut() {
            Some(open) => {
                open.node
                    .child(Component::new(FIELD))
                    .set_prop("field", Prop::Field(field));
            }
            None => self.top_level.push(field),
        }
        field
    }

    fn entry_as<T: FormField>(&mut self, field: FieldRef) -> Result<&mut T> {
        self.fields
            .get_mut(field.index())
            .and_then(|entry| entry.as_any_mut().downcast_mut::<T>())
            .ok_or_else(|| {
                FormError::invalid(format!(
                    "registered entry {} is not a {}",
                    field.index(),
                    std::any::type_name::<T>()
                ))
            })
    }

    fn method_not_found(&self, method: &str) -> FormError {
        let supported = std::iter::once("relation")
            .chain(self.context.fields().names())
            .map(str::to_string)
            .collect();
        FormError::MethodNotFound {
            method: method.to_string(),
            supported,
        }
    }

    /// Register a field built elsewhere.
    pub fn register_field<T: FormField>(&mut self, field: T) -> Result<&mut T> {
        let id = field.id().to_string();
        let registered = self.register_with(&id, move |_| Ok(Box::new(field) as Box<dyn FormField>))?;
        self.entry_as::<T>(registered)
    }

    /// Register a field of the named kind.
    pub fn field(&mut self, kind: &str, id: &str) -> Result<&mut dyn FormField> {
        let Some(factory) = self.context.fields().get(kind).cloned() else {
            return Err(self.method_not_found(kind));
        };
        let registered = self.register_with(id, |cx| factory.build(cx))?;
        Ok(&mut *self.fields[registered.index()])
    }

    /// Typed variant of [`BaseForm::field`].
    pub fn field_as<T: FormField>(&mut self, kind: &str, id: &str) -> Result<&mut T> {
        self.field(kind, id)?
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or_else(|| {
                FormError::invalid(format!(
                    "field kind {kind} does not build a {}",
                    std::any::type_name::<T>()
                ))
            })
    }

    /// Dynamic DSL dispatch: `relation`, then field kinds, then macros.
    ///
    /// `args[0]` is the id (or relation name) for registrations. Macros
    /// return `None`.
    pub fn call(&mut self, method: &str, args: &[Value]) -> Result<Option<&mut dyn FormField>> {
        let first = || {
            args.first()
                .and_then(Value::as_str)
                .ok_or_else(|| FormError::invalid(format!("{method} expects a string id")))
        };

        if method == "relation" {
            let name = first()?;
            let field: &mut dyn FormField = self.relation(name)?;
            return Ok(Some(field));
        }
        if self.context.fields().contains(method) {
            let id = first()?;
            return self.field(method, id).map(Some);
        }
        if let Some(body) = self.context.fields().macro_(method).cloned() {
            body(self, args)?;
            return Ok(None);
        }
        Err(self.method_not_found(method))
    }

    pub fn input(&mut self, id: &str) -> Result<&mut Field> {
        self.field_as("input", id)
    }

    pub fn textarea(&mut self, id: &str) -> Result<&mut Field> {
        self.field_as("textarea", id)
    }

    pub fn wysiwyg(&mut self, id: &str) -> Result<&mut Field> {
        self.field_as("wysiwyg", id)
    }

    pub fn number(&mut self, id: &str) -> Result<&mut Field> {
        self.field_as("number", id)
    }

    pub fn boolean(&mut self, id: &str) -> Result<&mut Field> {
        self.field_as("boolean", id)
    }

    pub fn date(&mut self, id: &str) -> Result<&mut Field> {
        self.field_as("date", id)
    }

    pub fn select(&mut self, id: &str) -> Result<&mut Field> {
        self.field_as("select", id)
    }

    pub fn checkboxes(&mut self, id: &str) -> Result<&mut Field> {
        self.field_as("checkboxes", id)
    }

    pub fn block(&mut self, id: &str) -> Result<&mut BlockField> {
        self.field_as("block", id)
    }

    pub fn modal(&mut self, id: &str) -> Result<&mut ModalField> {
        self.field_as("modal", id)
    }

    pub fn one_relation(&mut self, id: &str) -> Result<&mut RelationField> {
        self.field_as("oneRelation", id)
    }

    pub fn many_relation(&mut self, id: &str) -> Result<&mut RelationField> {
        self.field_as("manyRelation", id)
    }

    /// Register a field for the relation accessor `name` of the form's
    /// model.
    pub fn relation(&mut self, name: &str) -> Result<&mut RelationField> {
        if !self.model.supports_relations() {
            return Err(FormError::UnsupportedContext(format!(
                "relations are not available on {}; use oneRelation or manyRelation instead",
                self.model.type_name()
            )));
        }

        let descriptor = self.model.describe_relation(name).ok_or_else(|| {
            FormError::invalid(format!(
                "{} has no relation {name}",
                self.model.type_name()
            ))
        })?;
        let factory = self.context.relations().resolve(descriptor.kind)?;

        let registered = self.register_with(name, move |cx| {
            Ok(Box::new(factory(cx, descriptor)?) as Box<dyn FormField>)
        })?;
        self.entry_as::<RelationField>(registered)
    }

    /// Register a plain presentational component.
    pub fn component(&mut self, kind: impl Into<Component>) -> Result<&mut Component> {
        let component = kind.into();
        let id = component.kind().to_string();
        let registered = self.register_with(&id, move |_| {
            let mut field = ComponentField::new(component.kind());
            field.set_component(component);
            Ok(Box::new(field) as Box<dyn FormField>)
        })?;
        Ok(self.entry_as::<ComponentField>(registered)?.component_mut())
    }

    /// Open a wrapper around `component`, run `body` inside it and close it.
    ///
    /// The previous wrapper is restored whether `body` succeeds or not.
    /// Returns the wrapped component for further configuration.
    pub fn wrapper<F>(&mut self, component: impl Into<Component>, body: F) -> Result<&mut Component>
    where
        F: FnOnce(&mut BaseForm) -> Result<()>,
    {
        let node = Component::new(FIELD_WRAPPER).wrapping(component.into());
        let slot = if self.in_wrapper() {
            None
        } else {
            let reserved = self.register_with(FIELD_WRAPPER, |_| {
                Ok(Box::new(ComponentField::new(FIELD_WRAPPER)) as Box<dyn FormField>)
            })?;
            Some(reserved)
        };

        if let Some(parent) = self.wrapper.take() {
            self.wrapper_stack.push(parent);
        }
        self.wrapper = Some(OpenWrapper { node, slot });
        trace!("wrapper opened (depth {})", self.wrapper_depth());

        let outcome = body(self);

        let closed = self.wrapper.take();
        self.wrapper = self.wrapper_stack.pop();
        trace!("wrapper closed (depth {})", self.wrapper_depth());
        outcome?;

        let closed = closed.ok_or_else(|| FormError::invalid("wrapper closed twice"))?;
        if let Some(slot) = closed.slot {
            let entry = self.entry_as::<ComponentField>(slot)?;
            entry.set_component(closed.node);
            return entry
                .component_mut()
                .wrapped_mut()
                .ok_or_else(|| FormError::invalid("wrapper lost its component"));
        }

        let parent = self
            .wrapper
            .as_mut()
            .ok_or_else(|| FormError::invalid("nested wrapper without parent"))?;
        parent
            .node
            .child(closed.node)
            .wrapped_mut()
            .ok_or_else(|| FormError::invalid("wrapper lost its component"))
    }

    pub fn group<F>(&mut self, body: F) -> Result<&mut Component>
    where
        F: FnOnce(&mut BaseForm) -> Result<()>,
    {
        self.wrapper(FIELD_WRAPPER_GROUP, body)
    }

    /// Column of `cols` grid columns with a row inside.
    pub fn col<F>(&mut self, cols: u8, body: F) -> Result<&mut Component>
    where
        F: FnOnce(&mut BaseForm) -> Result<()>,
    {
        let col = self.wrapper(COL, |form| form.wrapper(ROW, body).map(|_| ()))?;
        col.prop("cols", cols);
        Ok(col)
    }

    /// Validate the pending entry and seal the form.
    pub fn finish(&mut self) -> Result<()> {
        if self.in_wrapper() {
            return Err(FormError::invalid("cannot render while a wrapper is open"));
        }
        self.registrar.validate_and_clear(&self.fields)?;
        self.sealed = true;
        Ok(())
    }

    /// Validate the pending entry and return the top-level entries.
    pub fn render(&mut self) -> Result<RenderedForm> {
        self.finish()?;
        Ok(self.view())
    }

    /// Serialize the current state without validation.
    pub fn view(&self) -> RenderedForm {
        RenderedForm {
            fields: self
                .top_level
                .iter()
                .map(|field| self.render_entry(*field))
                .collect(),
        }
    }

    pub fn render_entry(&self, field: FieldRef) -> Value {
        self.fields
            .get(field.index())
            .map_or(Value::Null, |entry| entry.render(self))
    }

    /// Every registered entry, nested wrapper content included, in
    /// registration order.
    pub fn registered_fields(&self) -> &[Box<dyn FormField>] {
        &self.fields
    }

    /// Entries rendered at the top level.
    pub fn top_level(&self) -> &[FieldRef] {
        &self.top_level
    }

    /// First registered field with the given id; components are skipped.
    pub fn find_field(&self, id: &str) -> Option<&dyn FormField> {
        self.fields
            .iter()
            .map(|entry| &**entry)
            .find(|entry| !entry.is_component() && entry.id() == id)
    }

    /// Mutable lookup while composing; `None` once the form was rendered.
    pub fn find_field_mut(&mut self, id: &str) -> Option<&mut dyn FormField> {
        if self.sealed {
            return None;
        }
        for entry in self.fields.iter_mut() {
            if !entry.is_component() && entry.id() == id {
                return Some(&mut **entry);
            }
        }
        None
    }

    pub fn has_field(&self, id: &str) -> bool {
        self.find_field(id).is_some()
    }

    /// Whether field `name` owns a form; block fields need a repeatable.
    pub fn has_form(&self, name: &str, repeatable: Option<&str>) -> bool {
        self.get_form(name, repeatable).is_some()
    }

    pub fn get_form(&self, name: &str, repeatable: Option<&str>) -> Option<&BaseForm> {
        let field = self.find_field(name)?;
        if !field.is_block() {
            return field.nested_form();
        }
        field.repeatable(repeatable?)
    }

    /// Validation rules keyed by storage key; translatable fields get one
    /// entry per locale (`{locale}.{local_key}`).
    pub fn get_rules(&self, request: RuleContext) -> IndexMap<String, Vec<String>> {
        let mut rules = IndexMap::new();
        for entry in &self.fields {
            let (Some(field), Some(field_rules)) =
                (entry.descriptor(), entry.validation_rules(request))
            else {
                continue;
            };
            if field.is_translatable() {
                for locale in self.context.locales() {
                    rules.insert(
                        format!("{locale}.{}", field.local_key()),
                        field_rules.clone(),
                    );
                }
            } else {
                rules.insert(field.local_key().to_string(), field_rules);
            }
        }
        rules
    }
}

impl fmt::Debug for BaseForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<&str> = self.fields.iter().map(|entry| entry.id()).collect();
        f.debug_struct("BaseForm")
            .field("model", &self.model)
            .field("route_prefix", &self.route_prefix)
            .field("fields", &ids)
            .field("registrar", &self.registrar)
            .field("wrapper_depth", &self.wrapper_depth())
            .field("sealed", &self.sealed)
            .finish()
    }
}
