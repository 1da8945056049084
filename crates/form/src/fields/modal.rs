use std::any::Any;
use std::sync::Arc;

use serde_json::Value;

use crate::context::{FieldContext, FormContext};
use crate::error::{FormError, Result};
use crate::field::{Field, FieldAttributes, FormField, RuleContext};
use crate::form::BaseForm;
use crate::model::ModelRef;

/// Button opening a modal with its own form on the parent's model.
#[derive(Debug)]
pub struct ModalField {
    field: Field,
    context: Arc<FormContext>,
    model: ModelRef,
    form: Option<BaseForm>,
}

impl ModalField {
    pub fn new(cx: &FieldContext<'_>) -> Self {
        let mut field = Field::new("modal", cx).with_component("field-modal");
        field.set_attribute("variant", "secondary");
        Self {
            field,
            context: Arc::clone(cx.form),
            model: Arc::clone(cx.model),
            form: None,
        }
    }

    /// Compose the modal form. The nested form is finished when `body`
    /// returns.
    pub fn form<F>(&mut self, body: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut BaseForm) -> Result<()>,
    {
        let mut form = BaseForm::new(
            Arc::clone(&self.context),
            Arc::clone(&self.model),
            self.field.route_prefix().to_string(),
        );
        body(&mut form)?;
        form.finish()?;
        self.form = Some(form);
        Ok(self)
    }

    pub fn confirm_with_password(&mut self) -> &mut Self {
        self.field.set_attribute("confirm_with_password", true);
        self
    }

    pub fn variant(&mut self, variant: impl Into<String>) -> &mut Self {
        self.field.set_attribute("variant", variant.into());
        self
    }
}

impl FieldAttributes for ModalField {
    fn field_mut(&mut self) -> &mut Field {
        &mut self.field
    }
}

impl FormField for ModalField {
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
        match self.form {
            Some(_) => Ok(()),
            None => Err(FormError::IncompleteField {
                kind: self.field.kind().to_string(),
                field: self.field.id().to_string(),
                attribute: "form".to_string(),
            }),
        }
    }

    /// The modal's own fields are validated through its nested form.
    fn validation_rules(&self, _request: RuleContext) -> Option<Vec<String>> {
        None
    }

    fn nested_form(&self) -> Option<&BaseForm> {
        self.form.as_ref()
    }

    fn render(&self, _form: &BaseForm) -> Value {
        let mut out = self.field.to_json();
        if let (Value::Object(map), Some(form)) = (&mut out, &self.form) {
            map.insert("form".into(), form.view().to_value());
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
