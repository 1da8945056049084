use form::FormError;
use thiserror::Error;

use crate::identity::IdentityError;
use crate::settings::SettingsError;

#[derive(Error, Debug)]
pub enum CrudError {
    #[error("form error: {0}")]
    Form(#[from] FormError),

    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("config key {0} is registered twice")]
    DuplicateKey(String),

    #[error("config {0} not found")]
    UnknownConfig(String),

    #[error("composing {key} failed: {source}")]
    Composition {
        key: String,
        #[source]
        source: FormError,
    },
}

pub type Result<T> = std::result::Result<T, CrudError>;
