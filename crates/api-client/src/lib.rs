//! GraphQL Client Library
//!
//! This crate provides the client side of the Telesosmed GraphQL API:
//! operation descriptions, a request link that attaches the session token,
//! a normalized response cache, and the HTTP transport tying them together.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod client;
pub mod link;
pub mod operation;

pub use cache::NormalizedCache;
pub use client::{ClientConfig, FetchPolicy, GraphQLClient, DEFAULT_ENDPOINT};
pub use link::{AuthLink, NoAuthLink, RequestLink};
pub use operation::{GraphQLError, GraphQLRequest, GraphQLResponse, Operation, OperationKind};

/// Result type for GraphQL client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for GraphQL client operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Connection failure, timeout or unreadable response body
    #[error("Network error: {0}")]
    Transport(String),

    /// Non-success HTTP status without a GraphQL error body
    #[error("HTTP error ({status}): {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// Errors reported by the GraphQL server
    #[error("{}", join_messages(.0))]
    GraphQL(Vec<GraphQLError>),

    /// The server rejected the session token
    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Response carried neither data nor errors
    #[error("Response contained no data")]
    MissingData,

    /// Reading the session token failed
    #[error("Credential error: {0}")]
    Credentials(#[from] storage::CredentialError),
}

impl Error {
    /// Check if this is a transport-class failure
    ///
    /// Statuses treated as network failures: 408, 425, 429, 500, 502, 503, 504, 522, 524
    pub fn is_network_error(&self) -> bool {
        match self {
            Error::Transport(_) | Error::Credentials(_) => true,
            Error::Http { status, .. } => {
                matches!(status, 408 | 425 | 429 | 500 | 502 | 503 | 504 | 522 | 524)
            }
            _ => false,
        }
    }

    /// Check if the server rejected the session
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Error::Unauthenticated(_))
    }
}

fn join_messages(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "Unknown GraphQL error".to_string();
    }
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graphql_error_message_joins() {
        let err = Error::GraphQL(vec![
            GraphQLError::new("Post not found"),
            GraphQLError::new("Try again"),
        ]);
        assert_eq!(err.to_string(), "Post not found; Try again");
        assert!(!err.is_network_error());
    }

    #[test]
    fn test_network_classification() {
        assert!(Error::Transport("refused".to_string()).is_network_error());
        assert!(Error::Http { status: 503, message: "down".to_string() }.is_network_error());
        assert!(!Error::Http { status: 400, message: "bad".to_string() }.is_network_error());
        assert!(!Error::MissingData.is_network_error());
    }

    #[test]
    fn test_unauthenticated() {
        let err = Error::Unauthenticated("Invalid token".to_string());
        assert!(err.is_unauthenticated());
        assert!(err.to_string().contains("Invalid token"));
    }
}
