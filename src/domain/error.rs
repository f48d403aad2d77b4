use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Backend error: {message}")]
    Backend { message: String },

    #[error("Cache error: {message}")]
    Cache { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Coarse error classes shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Network,
    Backend,
    Cache,
    Internal,
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns the bare message without the variant prefix
    pub fn message(&self) -> &str {
        match self {
            Self::Validation { message }
            | Self::Network { message }
            | Self::Backend { message }
            | Self::Cache { message }
            | Self::Configuration { message }
            | Self::Internal { message } => message,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::Network { .. } => ErrorCategory::Network,
            Self::Backend { .. } => ErrorCategory::Backend,
            Self::Cache { .. } => ErrorCategory::Cache,
            Self::Configuration { .. } | Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}
