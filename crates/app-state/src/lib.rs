//! Application state management for Telesosmed
//!
//! This crate provides the query/mutation layer over the GraphQL client,
//! with refetch-after-mutation sequencing, and the session state container.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod mutation;
pub mod query;
pub mod session;

pub use mutation::{Mutation, MutationClient, MutationError, MutationState};
pub use query::{
    LazyQuery, Query, QueryClient, QueryConfig, QueryError, QueryKey, QueryResult, QueryState,
    WatchedQuery,
};
pub use session::{SessionState, SessionStateError, SessionStatus, SessionWatcher};
