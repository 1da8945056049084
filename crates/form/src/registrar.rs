use crate::component::FieldRef;
use crate::error::Result;
use crate::field::FormField;

/// Slot holding the most recently registered entry until the next
/// registration (or render) validates it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Registrar {
    #[default]
    Empty,
    Pending(FieldRef),
}

impl Registrar {
    pub fn hold(&mut self, field: FieldRef) {
        *self = Registrar::Pending(field);
    }

    /// Check the pending entry's required attributes and empty the slot.
    ///
    /// On failure the entry stays pending so a retry reports it again.
    pub fn validate_and_clear(&mut self, fields: &[Box<dyn FormField>]) -> Result<()> {
        if let Registrar::Pending(field) = *self {
            if let Some(entry) = fields.get(field.index()) {
                entry.check_complete()?;
            }
        }
        *self = Registrar::Empty;
        Ok(())
    }
}
