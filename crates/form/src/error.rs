use thiserror::Error;

/// Failures raised while composing a form.
///
/// All of them are construction-time errors: the composing code has to fix
/// its declarative call sequence and run the builder again.
#[derive(Error, Debug)]
pub enum FormError {
    #[error("field `{field}` ({kind}) is missing required attribute `{attribute}`")]
    IncompleteField {
        kind: String,
        field: String,
        attribute: String,
    },

    #[error("relation {relation} not supported. Supported relations: {}", .supported.join(", "))]
    UnsupportedRelation {
        relation: String,
        supported: Vec<String>,
    },

    #[error("unsupported context: {0}")]
    UnsupportedContext(String),

    #[error("the {method} method is not found for this form. Supported fields: {}.", .supported.join(", "))]
    MethodNotFound {
        method: String,
        supported: Vec<String>,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FormError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

pub type Result<T> = std::result::Result<T, FormError>;
