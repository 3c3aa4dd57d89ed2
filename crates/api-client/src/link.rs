//! Request links
//!
//! A link contributes headers to every outgoing operation. The
//! [`AuthLink`] reads the session token from the credential store at
//! request time, so a login or logout takes effect on the very next
//! request without rebuilding the client.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use storage::{CredentialStore, ACCESS_TOKEN_KEY};

use crate::operation::Operation;
use crate::Result;

/// Per-request header provider
#[async_trait]
pub trait RequestLink: Send + Sync {
    /// Headers to attach to `operation`
    async fn headers(&self, operation: &Operation) -> Result<HashMap<String, String>>;
}

/// Link that attaches `authorization: Bearer <token>` when a token is stored
pub struct AuthLink {
    store: Arc<dyn CredentialStore>,
    token_name: String,
}

impl AuthLink {
    /// Create a link reading the token stored under `access_token`
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            token_name: ACCESS_TOKEN_KEY.to_string(),
        }
    }

    /// Read the token from a different credential name
    pub fn with_token_name(mut self, name: impl Into<String>) -> Self {
        self.token_name = name.into();
        self
    }
}

#[async_trait]
impl RequestLink for AuthLink {
    async fn headers(&self, operation: &Operation) -> Result<HashMap<String, String>> {
        let mut headers = HashMap::new();

        match self.store.read(&self.token_name).await? {
            Some(token) if !token.is_empty() => {
                headers.insert("authorization".to_string(), format!("Bearer {}", token));
            }
            _ => {
                tracing::debug!(operation = %operation.name, "no session token, sending unauthenticated");
            }
        }

        Ok(headers)
    }
}

/// Link that adds nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAuthLink;

#[async_trait]
impl RequestLink for NoAuthLink {
    async fn headers(&self, _operation: &Operation) -> Result<HashMap<String, String>> {
        Ok(HashMap::new())
    }
}
