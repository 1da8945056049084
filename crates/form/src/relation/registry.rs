use std::fmt;

use indexmap::IndexMap;

use super::RelationField;
use crate::context::FieldContext;
use crate::error::{FormError, Result};
use crate::model::{RelationDescriptor, RelationKind};

/// Builds the field for one relation kind.
pub type RelationFactory = fn(&FieldContext<'_>, RelationDescriptor) -> Result<RelationField>;

/// Relation kind → field factory.
#[derive(Clone)]
pub struct RelationRegistry {
    entries: IndexMap<RelationKind, RelationFactory>,
}

impl RelationRegistry {
    pub fn empty() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry
            .register(RelationKind::BelongsToMany, RelationField::new)
            .register(RelationKind::BelongsTo, RelationField::new)
            .register(RelationKind::MorphOne, RelationField::new)
            .register(RelationKind::MorphTo, RelationField::morph_to)
            .register(RelationKind::MorphToMany, RelationField::new)
            .register(RelationKind::MorphMany, RelationField::new)
            .register(RelationKind::HasMany, RelationField::new)
            .register(RelationKind::HasOne, RelationField::new);
        registry
    }

    pub fn register(&mut self, kind: RelationKind, factory: RelationFactory) -> &mut Self {
        self.entries.insert(kind, factory);
        self
    }

    /// Fails with [`FormError::UnsupportedRelation`] listing every
    /// supported kind.
    pub fn resolve(&self, kind: RelationKind) -> Result<RelationFactory> {
        self.entries
            .get(&kind)
            .copied()
            .ok_or_else(|| FormError::UnsupportedRelation {
                relation: kind.to_string(),
                supported: self.supported().map(str::to_string).collect(),
            })
    }

    pub fn supported(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().map(|kind| <&'static str>::from(*kind))
    }
}

impl Default for RelationRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for RelationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.supported()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_kind_lists_supported_names() {
        let registry = RelationRegistry::standard();
        match registry.resolve(RelationKind::HasManyThrough) {
            Err(FormError::UnsupportedRelation { relation, supported }) => {
                assert_eq!(relation, "hasManyThrough");
                assert_eq!(
                    supported,
                    vec![
                        "belongsToMany",
                        "belongsTo",
                        "morphOne",
                        "morphTo",
                        "morphToMany",
                        "morphMany",
                        "hasMany",
                        "hasOne",
                    ]
                );
            }
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("hasManyThrough must not resolve"),
        }
    }
}
