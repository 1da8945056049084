use std::any::Any;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;

use crate::context::{FieldContext, FormContext};
use crate::error::{FormError, Result};
use crate::field::{Field, FieldAttributes, FormField, RuleContext};
use crate::form::BaseForm;
use crate::model::StaticModel;
use crate::model::REPEATABLE_MODEL;

/// Field holding a list of repeatable blocks, each with its own form.
#[derive(Debug)]
pub struct BlockField {
    field: Field,
    context: Arc<FormContext>,
    repeatables: IndexMap<String, BaseForm>,
}

impl BlockField {
    pub fn new(cx: &FieldContext<'_>) -> Self {
        let field = Field::new("block", cx).with_component("field-block");
        Self {
            field,
            context: Arc::clone(cx.form),
            repeatables: IndexMap::new(),
        }
    }

    /// Compose the repeatable `name`.
    ///
    /// The nested form is finished when `body` returns, so a missing
    /// attribute inside it fails here rather than at the outer render.
    pub fn repeatable<F>(&mut self, name: impl Into<String>, body: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut BaseForm) -> Result<()>,
    {
        let name = name.into();
        if self.repeatables.contains_key(&name) {
            return Err(FormError::InvalidArgument(format!(
                "repeatable {name} is already defined on block {}",
                self.field.id()
            )));
        }

        let prefix = format!(
            "{}/block/{}/{}",
            self.field.route_prefix(),
            self.field.id(),
            name
        );
        let mut form = BaseForm::new(
            Arc::clone(&self.context),
            StaticModel::plain(REPEATABLE_MODEL).into_ref(),
            prefix,
        );
        body(&mut form)?;
        form.finish()?;

        debug!("block {} gained repeatable {}", self.field.id(), name);
        self.repeatables.insert(name, form);
        Ok(self)
    }

    pub fn repeatables(&self) -> impl Iterator<Item = (&str, &BaseForm)> {
        self.repeatables.iter().map(|(name, form)| (name.as_str(), form))
    }

    pub fn has_repeatable(&self, name: &str) -> bool {
        self.repeatables.contains_key(name)
    }

    pub fn get_repeatable(&self, name: &str) -> Option<&BaseForm> {
        self.repeatables.get(name)
    }
}

impl FieldAttributes for BlockField {
    fn field_mut(&mut self) -> &mut Field {
        &mut self.field
    }
}

impl FormField for BlockField {
    fn id(&self) -> &str {
        self.field.id()
    }

    fn kind(&self) -> &str {
        self.field.kind()
    }

    fn descriptor(&self) -> Option<&Field> {
        Some(&self.field)
    }

    fn check_complete(&self) -> Result<()> {
        self.field.check_complete()?;
        if self.repeatables.is_empty() {
            return Err(FormError::IncompleteField {
                kind: self.field.kind().to_string(),
                field: self.field.id().to_string(),
                attribute: "repeatables".to_string(),
            });
        }
        Ok(())
    }

    /// Blocks are stored row by row through their repeatables.
    fn validation_rules(&self, _request: RuleContext) -> Option<Vec<String>> {
        None
    }

    fn is_block(&self) -> bool {
        true
    }

    fn repeatable(&self, key: &str) -> Option<&BaseForm> {
        self.get_repeatable(key)
    }

    fn render(&self, _form: &BaseForm) -> Value {
        let mut out = self.field.to_json();
        let repeatables: Map<String, Value> = self
            .repeatables
            .iter()
            .map(|(name, form)| (name.clone(), form.view().to_value()))
            .collect();
        if let Value::Object(map) = &mut out {
            map.insert("repeatables".into(), Value::Object(repeatables));
        }
        out
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
