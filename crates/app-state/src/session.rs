//! Session state
//!
//! The session is either signed in or signed out. [`SessionState`] is the
//! only writer: it persists or deletes the token and publishes the status
//! on a watch channel. Readers hold a [`SessionWatcher`].

use std::sync::Arc;
use storage::{CredentialError, CredentialStore, ACCESS_TOKEN_KEY};
use tokio::sync::watch;

use crate::query::QueryClient;

/// Session-related errors
#[derive(Debug, thiserror::Error)]
pub enum SessionStateError {
    /// Credential store failed
    #[error("Credential store error: {0}")]
    Credentials(#[from] CredentialError),

    /// Login returned an empty token
    #[error("Empty session token")]
    EmptyToken,
}

/// Result type for session state operations
pub type Result<T> = std::result::Result<T, SessionStateError>;

/// Authentication status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// No token stored
    #[default]
    SignedOut,
    /// A token is stored
    SignedIn,
}

impl SessionStatus {
    /// Check if signed in
    pub fn is_signed_in(&self) -> bool {
        matches!(self, SessionStatus::SignedIn)
    }
}

/// Owner of the session status
pub struct SessionState {
    store: Arc<dyn CredentialStore>,
    queries: QueryClient,
    tx: watch::Sender<SessionStatus>,
}

impl SessionState {
    /// Probe the credential store and start in the matching state
    ///
    /// A store that cannot be read is treated as holding no token.
    pub async fn bootstrap(store: Arc<dyn CredentialStore>, queries: QueryClient) -> Self {
        let status = match store.read(ACCESS_TOKEN_KEY).await {
            Ok(Some(token)) if !token.is_empty() => SessionStatus::SignedIn,
            Ok(_) => SessionStatus::SignedOut,
            Err(e) => {
                tracing::error!(backend = store.backend_name(), error = %e, "failed to read session token");
                SessionStatus::SignedOut
            }
        };

        tracing::info!(?status, "session bootstrapped");

        let (tx, _rx) = watch::channel(status);
        Self { store, queries, tx }
    }

    /// Current status
    pub fn status(&self) -> SessionStatus {
        *self.tx.borrow()
    }

    /// Check if signed in
    pub fn is_signed_in(&self) -> bool {
        self.status().is_signed_in()
    }

    /// Subscribe to status changes
    pub fn watch(&self) -> SessionWatcher {
        SessionWatcher { rx: self.tx.subscribe() }
    }

    /// Persist `token` and switch to signed in
    pub async fn sign_in(&self, token: &str) -> Result<()> {
        if token.is_empty() {
            return Err(SessionStateError::EmptyToken);
        }

        self.store.store(ACCESS_TOKEN_KEY, token).await?;
        self.tx.send_replace(SessionStatus::SignedIn);
        tracing::info!("signed in");
        Ok(())
    }

    /// Delete the token, clear cached data and switch to signed out
    ///
    /// If the token cannot be deleted the session stays signed in.
    pub async fn sign_out(&self) -> Result<()> {
        self.store.delete(ACCESS_TOKEN_KEY).await?;
        self.queries.clear().await;
        self.tx.send_replace(SessionStatus::SignedOut);
        tracing::info!("signed out");
        Ok(())
    }
}

/// Read-only view of the session status
#[derive(Debug, Clone)]
pub struct SessionWatcher {
    rx: watch::Receiver<SessionStatus>,
}

impl SessionWatcher {
    /// Current status
    pub fn status(&self) -> SessionStatus {
        *self.rx.borrow()
    }

    /// Whether the status changed since last observed
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Mark the current status as observed and return it
    pub fn observe(&mut self) -> SessionStatus {
        *self.rx.borrow_and_update()
    }

    /// Wait for the next status change
    ///
    /// Returns `None` once the session owner is dropped.
    pub async fn changed(&mut self) -> Option<SessionStatus> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }
}
