//! Application error taxonomy
//!
//! Every failure a screen can see is one of these. Lower-layer errors are
//! classified on conversion so the view layer never matches on client
//! internals.

use app_state::{MutationError, QueryError, SessionStateError};
use thiserror::Error;

use crate::validation::ValidationError;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Transport failure (connection, timeout, bad gateway)
    #[error("Network error: {0}")]
    Network(String),

    /// The server rejected the operation
    #[error("{0}")]
    Server(String),

    /// Local precondition failed; no request was made
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The session token was rejected
    #[error("Session expired: {0}")]
    Unauthenticated(String),

    /// The credential store failed
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for application operations
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Check if this is a transport failure
    pub fn is_network(&self) -> bool {
        matches!(self, AppError::Network(_))
    }

    /// Check if the session token was rejected
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, AppError::Unauthenticated(_))
    }

    /// Message shown to the user
    pub fn user_message(&self) -> String {
        match self {
            AppError::Server(message) | AppError::Unauthenticated(message) => message.clone(),
            AppError::Validation(e) => e.message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<api_client::Error> for AppError {
    fn from(err: api_client::Error) -> Self {
        match &err {
            api_client::Error::Unauthenticated(message) => AppError::Unauthenticated(message.clone()),
            api_client::Error::Credentials(e) => AppError::Storage(e.to_string()),
            e if e.is_network_error() => AppError::Network(e.to_string()),
            e => AppError::Server(e.to_string()),
        }
    }
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::FetchError(e) => e.into(),
        }
    }
}

impl From<MutationError> for AppError {
    fn from(err: MutationError) -> Self {
        match err {
            MutationError::ExecutionError(e) => e.into(),
        }
    }
}

impl From<SessionStateError> for AppError {
    fn from(err: SessionStateError) -> Self {
        match err {
            SessionStateError::Credentials(e) => AppError::Storage(e.to_string()),
            SessionStateError::EmptyToken => AppError::Server("Login returned an empty token".to_string()),
        }
    }
}
