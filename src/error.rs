use std::fmt;

use crate::db::dao::DaoLayerError;

type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced to HTTP clients. Each variant maps to one status code.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    /// A business rule rejected an otherwise well-formed request.
    Unprocessable(String),
    Internal {
        message: String,
        source: Option<BoxedSource>,
    },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::Unprocessable(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(message)
            | Self::Unauthorized(message)
            | Self::Forbidden(message)
            | Self::NotFound(message)
            | Self::Conflict(message)
            | Self::Unprocessable(message) => message.as_str(),
            Self::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn source_message(&self) -> Option<String> {
        match self {
            Self::Internal {
                source: Some(source),
                ..
            } => Some(source.to_string()),
            _ => None,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Internal {
                source: Some(source),
                ..
            } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<DaoLayerError> for AppError {
    fn from(err: DaoLayerError) -> Self {
        match err {
            DaoLayerError::NotFound { .. } => AppError::not_found(err.to_string()),
            DaoLayerError::InvalidPagination { .. } | DaoLayerError::InvalidAggregate(_) => {
                AppError::bad_request(err.to_string())
            }
            DaoLayerError::UniqueViolation(_) => AppError::conflict(err.to_string()),
            DaoLayerError::TransactionTimeout(_) => {
                AppError::internal_with_source("Transaction timed out", err)
            }
            DaoLayerError::Db(_) => AppError::internal_with_source("Database error", err),
        }
    }
}
