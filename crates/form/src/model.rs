//! Data-layer seam consumed by relation fields.
//!
//! The form engine never runs queries. It only needs to learn, per relation
//! name, which kind of relation a model declares, which type sits on the
//! other side and how the relation is ordered by default. A [`Model`]
//! answers exactly that through [`Model::describe_relation`].

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

/// Shared handle to a data-entity type.
pub type ModelRef = Arc<dyn Model>;

/// Association kinds a data layer can report for a relation accessor.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, Display, AsRefStr, IntoStaticStr, EnumIter, EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    HasOne,
    HasMany,
    BelongsTo,
    BelongsToMany,
    HasOneThrough,
    HasManyThrough,
    MorphOne,
    MorphMany,
    MorphTo,
    MorphToMany,
    MorphedByMany,
}

impl RelationKind {
    /// Whether the relation links to a collection of records.
    pub fn is_many(self) -> bool {
        matches!(
            self,
            RelationKind::HasMany
                | RelationKind::BelongsToMany
                | RelationKind::HasManyThrough
                | RelationKind::MorphMany
                | RelationKind::MorphToMany
                | RelationKind::MorphedByMany
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Display, AsRefStr, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

/// One `ORDER BY` clause declared on a relation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderClause {
    pub column: String,
    pub direction: Direction,
}

impl OrderClause {
    pub fn new(column: impl Into<String>, direction: Direction) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }
}

/// What a relation accessor reveals about itself without querying.
#[derive(Clone, Debug, PartialEq)]
pub struct RelationDescriptor {
    pub kind: RelationKind,
    /// Type name of the related model. Empty for `morphTo`, whose target is
    /// only known per record.
    pub related: String,
    /// Table the relation joins through (pivot or related table); used to
    /// strip qualified order columns.
    pub table: Option<String>,
    pub orders: Vec<OrderClause>,
    /// Key columns (`foreign_key`, `owner_key`, `pivot_table`, ...).
    pub keys: IndexMap<String, String>,
}

impl RelationDescriptor {
    pub fn new(kind: RelationKind, related: impl Into<String>) -> Self {
        Self {
            kind,
            related: related.into(),
            table: None,
            orders: Vec::new(),
            keys: IndexMap::new(),
        }
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.orders.push(OrderClause::new(column, direction));
        self
    }

    pub fn key(mut self, name: impl Into<String>, column: impl Into<String>) -> Self {
        self.keys.insert(name.into(), column.into());
        self
    }
}

/// A data-entity type as seen by the form engine.
pub trait Model: Send + Sync + 'static {
    /// Fully qualified type name, e.g. `App::Models::Post`.
    fn type_name(&self) -> &str;

    /// `false` for models that store plain form values and therefore cannot
    /// declare relations of their own.
    fn supports_relations(&self) -> bool {
        true
    }

    /// Describe the relation accessor `name`, or `None` if it does not exist.
    fn describe_relation(&self, name: &str) -> Option<RelationDescriptor>;
}

impl fmt::Debug for dyn Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Model({})", self.type_name())
    }
}

/// Table-driven [`Model`] for applications that declare their schema in code
/// and for tests.
#[derive(Clone, Debug, Default)]
pub struct StaticModel {
    name: String,
    relational: bool,
    relations: IndexMap<String, RelationDescriptor>,
}

/// Type name of the model backing standalone forms.
pub const FORM_MODEL: &str = "Form";
/// Type name of the model backing block repeatables.
pub const REPEATABLE_MODEL: &str = "FormBlock";

impl StaticModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            relational: true,
            relations: IndexMap::new(),
        }
    }

    /// Model storing plain form values; relation fields are not available.
    pub fn form() -> Self {
        Self::plain(FORM_MODEL)
    }

    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            relational: false,
            ..Self::new(name)
        }
    }

    pub fn relation(mut self, name: impl Into<String>, descriptor: RelationDescriptor) -> Self {
        self.relations.insert(name.into(), descriptor);
        self
    }

    pub fn into_ref(self) -> ModelRef {
        Arc::new(self)
    }
}

impl Model for StaticModel {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn supports_relations(&self) -> bool {
        self.relational
    }

    fn describe_relation(&self, name: &str) -> Option<RelationDescriptor> {
        self.relations.get(name).cloned()
    }
}

/// A `where`-style predicate on a relation query.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Predicate {
    Compare {
        column: String,
        operator: String,
        value: Value,
    },
    In {
        column: String,
        values: Vec<Value>,
    },
}

/// Query scope a relation field lists related records with.
///
/// Only the builder caller mutates it while composing; the rendered form
/// treats it as final.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueryScope {
    model: String,
    wheres: Vec<Predicate>,
    eager: Vec<String>,
    orders: Vec<OrderClause>,
}

impl QueryScope {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            wheres: Vec::new(),
            eager: Vec::new(),
            orders: Vec::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn where_eq(&mut self, column: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.where_op(column, "=", value)
    }

    pub fn where_op(
        &mut self,
        column: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.wheres.push(Predicate::Compare {
            column: column.into(),
            operator: operator.into(),
            value: value.into(),
        });
        self
    }

    pub fn where_in<V: Into<Value>>(
        &mut self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> &mut Self {
        self.wheres.push(Predicate::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Declare an eager-loaded relation.
    pub fn with(&mut self, relation: impl Into<String>) -> &mut Self {
        self.eager.push(relation.into());
        self
    }

    pub fn order_by(&mut self, column: impl Into<String>, direction: Direction) -> &mut Self {
        self.orders.push(OrderClause::new(column, direction));
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.wheres
    }

    pub fn eager_loads(&self) -> &[String] {
        &self.eager
    }

    pub fn orders(&self) -> &[OrderClause] {
        &self.orders
    }
}
