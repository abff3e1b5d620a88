//! Error handling module
//!
//! Provides the unified error type for profile resolution, credential lookup,
//! pool construction and dialect loading.

use thiserror::Error;

/// Connector-wide error type
#[derive(Error, Debug)]
pub enum ConnectorError {
    #[error("Configuration error: missing {field}")]
    MissingField { field: &'static str },

    #[error("Configuration error: invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Configuration error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Failed to resolve credentials from {url}: {source}")]
    CredentialResolution {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create data source: {0}")]
    DataSourceCreation(String),

    #[error("Packaging defect: dialect descriptor {resource} could not be loaded: {reason}")]
    FatalInitialization { resource: String, reason: String },
}

/// Coarse classification of a [`ConnectorError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    CredentialResolution,
    DataSourceCreation,
    FatalInitialization,
}

impl ConnectorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConnectorError::MissingField { .. }
            | ConnectorError::InvalidField { .. }
            | ConnectorError::Validation(_) => ErrorKind::Configuration,
            ConnectorError::CredentialResolution { .. } => ErrorKind::CredentialResolution,
            ConnectorError::DataSourceCreation(_) => ErrorKind::DataSourceCreation,
            ConnectorError::FatalInitialization { .. } => ErrorKind::FatalInitialization,
        }
    }

    /// The profile field a configuration error refers to, if it names exactly one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ConnectorError::MissingField { field } | ConnectorError::InvalidField { field, .. } => {
                Some(*field)
            }
            _ => None,
        }
    }
}

/// Result type alias used across the crate
pub type Result<T> = std::result::Result<T, ConnectorError>;

/// Helper function to create a missing-field error
pub fn missing_field(field: &'static str) -> ConnectorError {
    ConnectorError::MissingField { field }
}

/// Helper function to create an invalid-field error
pub fn invalid_field(field: &'static str, reason: impl Into<String>) -> ConnectorError {
    ConnectorError::InvalidField {
        field,
        reason: reason.into(),
    }
}

impl From<deadpool_postgres::CreatePoolError> for ConnectorError {
    fn from(err: deadpool_postgres::CreatePoolError) -> Self {
        ConnectorError::DataSourceCreation(err.to_string())
    }
}

impl From<deadpool_postgres::PoolError> for ConnectorError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        ConnectorError::DataSourceCreation(err.to_string())
    }
}

impl From<tokio_postgres::Error> for ConnectorError {
    fn from(err: tokio_postgres::Error) -> Self {
        ConnectorError::DataSourceCreation(err.to_string())
    }
}
