use thiserror::Error;

use crate::registry::Category;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("duplicate {category} registration: {name}")]
    DuplicateName { category: Category, name: String },
    #[error("invalid resource template {template}: {reason}")]
    InvalidTemplate {
        template: String,
        reason: &'static str,
    },
    #[error("{category} not found: {name}")]
    NotFound { category: Category, name: String },
    #[error("no resource matches uri: {uri}")]
    NoMatch { uri: String },
    #[error("invalid arguments: {message}")]
    InvalidArguments { code: &'static str, message: String },
    #[error("handler execution failed: {message}")]
    HandlerExecution { message: String },
    #[error("internal error: {message}")]
    Internal { code: &'static str, message: String },
}

impl AppError {
    pub fn not_found(category: Category, name: impl Into<String>) -> Self {
        Self::NotFound {
            category,
            name: name.into(),
        }
    }

    pub fn invalid_arguments(code: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            code,
            message: message.into(),
        }
    }

    pub fn handler_execution(message: impl Into<String>) -> Self {
        Self::HandlerExecution {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            code: "internal_error",
            message: message.into(),
        }
    }

    /// Stable machine-readable code surfaced in JSON-RPC error data.
    pub fn code(&self) -> String {
        match self {
            Self::DuplicateName { .. } => "duplicate_name".to_string(),
            Self::InvalidTemplate { .. } => "invalid_template".to_string(),
            Self::NotFound { category, .. } => format!("{category}_not_found"),
            Self::NoMatch { .. } => "resource_not_found".to_string(),
            Self::InvalidArguments { code, .. } => (*code).to_string(),
            Self::HandlerExecution { .. } => "handler_execution_failed".to_string(),
            Self::Internal { code, .. } => (*code).to_string(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(format!("result serialization failed: {err}"))
    }
}
