//! Index / preview table descriptors.
//!
//! Relation fields show related records in a small table. The table is
//! either built inline with [`crate::RelationField::preview`] or inherited
//! from the index table of the related crud config.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub columns: Vec<Column>,
    /// Rows link to the record's detail page.
    #[serde(default = "default_link")]
    pub link: bool,
}

fn default_link() -> bool {
    true
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub label: String,
    /// Template of the cell content, e.g. `{title}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub small: bool,
    #[serde(default = "default_link")]
    pub link: bool,
}

impl Table {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            link: true,
        }
    }

    /// Append a column and return it for configuration.
    pub fn col(&mut self, label: impl Into<String>) -> &mut Column {
        self.columns.push(Column {
            label: label.into(),
            link: self.link,
            ..Column::default()
        });
        let last = self.columns.len() - 1;
        &mut self.columns[last]
    }

    /// Rows and columns stop linking to detail pages.
    pub fn disable_link(&mut self) -> &mut Self {
        self.link = false;
        for column in &mut self.columns {
            column.link = false;
        }
        self
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

impl Column {
    pub fn value(&mut self, template: impl Into<String>) -> &mut Self {
        self.value = Some(template.into());
        self
    }

    pub fn sort_by(&mut self, column: impl Into<String>) -> &mut Self {
        self.sort_by = Some(column.into());
        self
    }

    pub fn small(&mut self) -> &mut Self {
        self.small = true;
        self
    }
}
