//! Mutation management
//!
//! A mutation runs once against the server. When it succeeds, every
//! operation in its refetch set is re-run from the network, in order, and
//! awaited before [`MutationClient::mutate`] returns. A failed mutation
//! refetches nothing.

use api_client::Operation;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::query::QueryClient;

/// Mutation errors
#[derive(Debug, Error)]
pub enum MutationError {
    /// Mutation execution failed
    #[error("Mutation failed: {0}")]
    ExecutionError(#[from] api_client::Error),
}

impl MutationError {
    /// Underlying client error
    pub fn client_error(&self) -> &api_client::Error {
        match self {
            MutationError::ExecutionError(e) => e,
        }
    }
}

/// Result type for mutation operations
pub type Result<T> = std::result::Result<T, MutationError>;

/// Mutation state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    /// Mutation is idle
    Idle,

    /// Mutation request is in flight (or its refetches are)
    Pending,

    /// Mutation succeeded
    Success,

    /// Mutation failed
    Error,
}

/// Mutation trait describing a typed GraphQL mutation
pub trait Mutation: Send + Sync {
    /// Input type for the mutation
    type Input: Send + Sync;

    /// Output type returned by the mutation
    type Output: DeserializeOwned + Send;

    /// Build the operation for `input`
    fn operation(&self, input: &Self::Input) -> Operation;

    /// Queries to re-run after a successful mutation
    fn refetch_queries(&self, _input: &Self::Input) -> Vec<Operation> {
        Vec::new()
    }
}

/// Mutation client for managing mutations
#[derive(Clone)]
pub struct MutationClient {
    query_client: QueryClient,
    state: Arc<RwLock<HashMap<String, MutationState>>>,
}

impl MutationClient {
    /// Create a new mutation client
    pub fn new(query_client: QueryClient) -> Self {
        Self {
            query_client,
            state: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Execute a mutation, then its refetch set
    ///
    /// A refetch that fails is logged and recorded on that query; the
    /// mutation itself is still reported as successful.
    pub async fn mutate<M: Mutation>(&self, mutation: &M, input: M::Input) -> Result<M::Output> {
        let operation = mutation.operation(&input);
        let id = operation.name.clone();

        self.set_state(&id, MutationState::Pending).await;

        let output = match self.query_client.graphql().mutate::<M::Output>(&operation).await {
            Ok(output) => output,
            Err(e) => {
                tracing::debug!(mutation = %id, error = %e, "mutation failed");
                self.set_state(&id, MutationState::Error).await;
                return Err(e.into());
            }
        };

        for refetch in mutation.refetch_queries(&input) {
            if let Err(e) = self.query_client.refetch(&refetch).await {
                tracing::warn!(
                    mutation = %id,
                    query = %refetch.name,
                    error = %e,
                    "refetch after mutation failed"
                );
            }
        }

        self.set_state(&id, MutationState::Success).await;
        Ok(output)
    }

    /// Get mutation state by operation name
    pub async fn state(&self, name: &str) -> MutationState {
        let state = self.state.read().await;
        state.get(name).copied().unwrap_or(MutationState::Idle)
    }

    /// Reset a mutation to idle
    pub async fn reset(&self, name: &str) {
        self.state.write().await.remove(name);
    }

    /// Get the query client refetches go through
    pub fn query_client(&self) -> &QueryClient {
        &self.query_client
    }

    async fn set_state(&self, name: &str, value: MutationState) {
        self.state.write().await.insert(name.to_string(), value);
    }
}
