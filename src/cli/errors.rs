use thiserror::Error;

use crate::app::AppError;

/// Errors reported to the terminal by CLI commands
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Validation error: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("No saved entry with id {id}")]
    NotFound { id: String },

    #[error("{message}")]
    Failed { message: String },

    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Create a validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Error carried in a `{success: false, error}` response
    pub fn failed(message: Option<String>, fallback: &str) -> Self {
        Self::Failed {
            message: message.unwrap_or_else(|| fallback.to_string()),
        }
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::App(AppError::Serde(err))
    }
}
