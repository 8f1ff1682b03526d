use thiserror::Error;
use uuid::Uuid;

use crate::validation::ValidationErrors;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("{entity} not found: {id}")]
    NotFound {
        entity: &'static str,
        id: Uuid,
    },

    #[error("invalid input for {field}: {message}")]
    InvalidInput {
        field: &'static str,
        message: String,
    },

    #[error("calculation error: {message}")]
    CalculationError {
        message: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("storage error: {message}")]
    Storage {
        message: String,
    },
}

impl RegistryError {
    /// field errors carried by a validation failure
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            RegistryError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for RegistryError {
    fn from(errors: ValidationErrors) -> Self {
        RegistryError::Validation(errors)
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
