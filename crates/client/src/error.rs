//! Client error model.

use thiserror::Error;

use wms_core::DomainError;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Rejected before dispatch; never sent to the backend.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The backend rejected the credential (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("login failed: {0}")]
    Login(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<DomainError> for ClientError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => Self::Validation(msg),
            DomainError::InvalidId(msg) => Self::Validation(format!("invalid identifier: {msg}")),
        }
    }
}
