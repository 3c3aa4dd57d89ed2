//! Query management
//!
//! This module tracks the lifecycle of GraphQL queries on top of the
//! client's normalized cache: per-key fetch state, the last error, and
//! the handles screens hold for eager ([`WatchedQuery`]) and lazy
//! ([`LazyQuery`]) queries.

use api_client::{FetchPolicy, GraphQLClient, Operation};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;
use thiserror::Error;
use tokio::sync::RwLock;

/// Query errors
#[derive(Debug, Error)]
pub enum QueryError {
    /// Query fetch failed
    #[error("Query fetch failed: {0}")]
    FetchError(#[from] api_client::Error),
}

impl QueryError {
    /// Underlying client error
    pub fn client_error(&self) -> &api_client::Error {
        match self {
            QueryError::FetchError(e) => e,
        }
    }
}

/// Result type for query operations
pub type Result<T> = std::result::Result<T, QueryError>;

/// Query key identifying a query result (operation name plus variables)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    /// Operation name (e.g. "GetPosts")
    pub operation: String,
    /// Cache key including canonical variables
    cache_key: String,
}

impl QueryKey {
    /// Derive the key of an operation
    pub fn from_operation(operation: &Operation) -> Self {
        Self {
            operation: operation.name.clone(),
            cache_key: operation.cache_key(),
        }
    }

    /// Convert to cache key string
    pub fn to_cache_key(&self) -> &str {
        &self.cache_key
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cache_key)
    }
}

/// Query state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    /// Query has not run
    Idle,

    /// Query is fetching data
    Fetching,

    /// Query fetch succeeded
    Success,

    /// Query fetch failed
    Error,
}

/// Query metadata
#[derive(Debug, Clone)]
struct QueryMeta {
    state: QueryState,
    fetched_at: Option<SystemTime>,
    fetch_count: u32,
    last_error: Option<String>,
}

impl QueryMeta {
    fn new() -> Self {
        Self {
            state: QueryState::Idle,
            fetched_at: None,
            fetch_count: 0,
            last_error: None,
        }
    }
}

/// Query configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryConfig {
    /// Policy used by [`QueryClient::get`]
    pub fetch_policy: FetchPolicy,

    /// Store results in the cache (off for credential exchanges)
    pub cache_results: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            fetch_policy: FetchPolicy::CacheFirst,
            cache_results: true,
        }
    }
}

/// Query trait describing a typed GraphQL query
pub trait Query: Send + Sync {
    /// The type of data this query returns
    type Data: DeserializeOwned + Clone + Send + Sync;

    /// Build the operation to send
    fn operation(&self) -> Operation;

    /// Get the query key
    fn key(&self) -> QueryKey {
        QueryKey::from_operation(&self.operation())
    }

    /// Get the query configuration
    fn config(&self) -> QueryConfig {
        QueryConfig::default()
    }
}

/// Query client for managing queries
#[derive(Clone)]
pub struct QueryClient {
    graphql: Arc<GraphQLClient>,
    meta: Arc<RwLock<HashMap<String, QueryMeta>>>,
}

impl QueryClient {
    /// Create a new query client
    pub fn new(graphql: Arc<GraphQLClient>) -> Self {
        Self {
            graphql,
            meta: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get query data, using the cache if the query allows it
    pub async fn get<Q: Query>(&self, query: &Q) -> Result<Q::Data> {
        let config = query.config();
        if config.fetch_policy == FetchPolicy::CacheFirst && config.cache_results {
            if let Some(data) = self.read(query)? {
                return Ok(data);
            }
        }
        self.fetch(query).await
    }

    /// Fetch query data (always fetches, ignoring cache)
    pub async fn fetch<Q: Query>(&self, query: &Q) -> Result<Q::Data> {
        let policy = if query.config().cache_results {
            FetchPolicy::NetworkOnly
        } else {
            FetchPolicy::NoCache
        };
        let operation = query.operation();
        let cache_key = operation.cache_key();

        self.mark_fetching(&cache_key).await;
        let result = self.graphql.query::<Q::Data>(&operation, policy).await;
        self.mark_done(&cache_key, result.as_ref().err()).await;

        Ok(result?)
    }

    /// Re-run an operation from the network and refresh its cached result
    ///
    /// Used for refetch sets, where only the cache update matters.
    pub async fn refetch(&self, operation: &Operation) -> Result<()> {
        let cache_key = operation.cache_key();

        self.mark_fetching(&cache_key).await;
        let result = self
            .graphql
            .query_value(operation, FetchPolicy::NetworkOnly)
            .await;
        self.mark_done(&cache_key, result.as_ref().err()).await;

        result?;
        Ok(())
    }

    /// Read a query's cached data without fetching
    pub fn read<Q: Query>(&self, query: &Q) -> Result<Option<Q::Data>> {
        Ok(self.graphql.read_query(&query.operation())?)
    }

    /// Invalidate cached query data
    pub async fn invalidate(&self, key: &QueryKey) {
        self.graphql.cache().evict_query(key.to_cache_key());
        self.meta.write().await.remove(key.to_cache_key());
    }

    /// Get query state
    pub async fn state(&self, key: &QueryKey) -> QueryState {
        let meta = self.meta.read().await;
        meta.get(key.to_cache_key())
            .map(|m| m.state)
            .unwrap_or(QueryState::Idle)
    }

    /// Last error recorded for a query
    pub async fn last_error(&self, key: &QueryKey) -> Option<String> {
        let meta = self.meta.read().await;
        meta.get(key.to_cache_key()).and_then(|m| m.last_error.clone())
    }

    /// Number of network fetches issued for a query
    pub async fn fetch_count(&self, key: &QueryKey) -> u32 {
        let meta = self.meta.read().await;
        meta.get(key.to_cache_key()).map(|m| m.fetch_count).unwrap_or(0)
    }

    /// When the query last fetched successfully
    pub async fn fetched_at(&self, key: &QueryKey) -> Option<SystemTime> {
        let meta = self.meta.read().await;
        meta.get(key.to_cache_key()).and_then(|m| m.fetched_at)
    }

    /// Clear all cached queries
    pub async fn clear(&self) {
        self.graphql.clear_store();
        self.meta.write().await.clear();
    }

    /// Get the underlying GraphQL client
    pub fn graphql(&self) -> &Arc<GraphQLClient> {
        &self.graphql
    }

    async fn mark_fetching(&self, cache_key: &str) {
        let mut meta = self.meta.write().await;
        let query_meta = meta.entry(cache_key.to_string()).or_insert_with(QueryMeta::new);
        query_meta.state = QueryState::Fetching;
        query_meta.fetch_count += 1;
    }

    async fn mark_done(&self, cache_key: &str, error: Option<&api_client::Error>) {
        let mut meta = self.meta.write().await;
        if let Some(query_meta) = meta.get_mut(cache_key) {
            match error {
                None => {
                    query_meta.state = QueryState::Success;
                    query_meta.fetched_at = Some(SystemTime::now());
                    query_meta.last_error = None;
                }
                Some(e) => {
                    query_meta.state = QueryState::Error;
                    query_meta.last_error = Some(e.to_string());
                }
            }
        }
    }
}

// =============================================================================
// Query Handles
// =============================================================================

/// Snapshot of a query as seen by a screen
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<T> {
    /// Last successful data
    pub data: Option<T>,
    /// A request is in flight
    pub loading: bool,
    /// Message of the last failure, cleared on success
    pub error: Option<String>,
}

impl<T> Default for QueryResult<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

impl<T: Clone> QueryResult<T> {
    fn record(&mut self, result: &Result<T>) {
        self.loading = false;
        match result {
            Ok(data) => {
                self.data = Some(data.clone());
                self.error = None;
            }
            Err(e) => self.error = Some(e.client_error().to_string()),
        }
    }
}

/// Eager query: runs when started and again whenever its variables change
pub struct WatchedQuery<Q: Query> {
    client: QueryClient,
    query: Q,
    result: QueryResult<Q::Data>,
}

impl<Q: Query> WatchedQuery<Q> {
    /// Create a handle; nothing is fetched until [`start`](Self::start)
    pub fn new(client: QueryClient, query: Q) -> Self {
        Self {
            client,
            query,
            result: QueryResult::default(),
        }
    }

    /// Run the query with its configured policy
    pub async fn start(&mut self) -> Result<Q::Data> {
        self.result.loading = true;
        let result = self.client.get(&self.query).await;
        self.result.record(&result);
        result
    }

    /// Replace the query, re-running it only if its key changed
    pub async fn set_query(&mut self, query: Q) -> Option<Result<Q::Data>> {
        if query.key() == self.query.key() {
            return None;
        }
        self.query = query;
        self.result = QueryResult::default();
        Some(self.start().await)
    }

    /// Run the query from the network
    pub async fn refetch(&mut self) -> Result<Q::Data> {
        self.result.loading = true;
        let result = self.client.fetch(&self.query).await;
        self.result.record(&result);
        result
    }

    /// Pick up cache changes made by other operations
    pub fn sync(&mut self) -> Result<Option<Q::Data>> {
        let cached = self.client.read(&self.query)?;
        if let Some(data) = &cached {
            self.result.data = Some(data.clone());
            self.result.error = None;
        }
        Ok(cached)
    }

    /// Current snapshot
    pub fn result(&self) -> &QueryResult<Q::Data> {
        &self.result
    }

    /// Current query
    pub fn query(&self) -> &Q {
        &self.query
    }
}

/// Lazy query: runs only when triggered
pub struct LazyQuery<Q: Query> {
    client: QueryClient,
    last: Option<Q>,
    result: QueryResult<Q::Data>,
}

impl<Q: Query> LazyQuery<Q> {
    /// Create an idle handle
    pub fn new(client: QueryClient) -> Self {
        Self {
            client,
            last: None,
            result: QueryResult::default(),
        }
    }

    /// Run `query` from the network
    pub async fn trigger(&mut self, query: Q) -> Result<Q::Data> {
        self.result.loading = true;
        let result = self.client.fetch(&query).await;
        self.result.record(&result);
        self.last = Some(query);
        result
    }

    /// Whether the query has been triggered at least once
    pub fn called(&self) -> bool {
        self.last.is_some()
    }

    /// Last triggered query
    pub fn last_query(&self) -> Option<&Q> {
        self.last.as_ref()
    }

    /// Current snapshot
    pub fn result(&self) -> &QueryResult<Q::Data> {
        &self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_client::{ClientConfig, NoAuthLink};
    use serde::Deserialize;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Clone, Deserialize, PartialEq)]
    struct ItemData {
        item: Item,
    }

    #[derive(Debug, Clone, Deserialize, PartialEq)]
    struct Item {
        #[serde(rename = "_id")]
        id: String,
        value: String,
    }

    #[derive(Clone)]
    struct ItemQuery {
        id: String,
        cache: bool,
    }

    impl ItemQuery {
        fn new(id: &str) -> Self {
            Self { id: id.to_string(), cache: true }
        }
    }

    impl Query for ItemQuery {
        type Data = ItemData;

        fn operation(&self) -> Operation {
            Operation::query("GetItem", "query GetItem($id: ID) { item(id: $id) { __typename _id value } }")
                .variable("id", json!(self.id))
        }

        fn config(&self) -> QueryConfig {
            QueryConfig {
                cache_results: self.cache,
                ..QueryConfig::default()
            }
        }
    }

    fn item_body(id: &str, value: &str) -> serde_json::Value {
        json!({ "data": { "item": { "__typename": "Item", "_id": id, "value": value } } })
    }

    async fn setup() -> (MockServer, QueryClient) {
        let server = MockServer::start().await;
        let graphql = GraphQLClient::new(ClientConfig::new(server.uri()), Arc::new(NoAuthLink)).unwrap();
        (server, QueryClient::new(Arc::new(graphql)))
    }

    async fn mount_item(server: &MockServer, id: &str, value: &str) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "variables": { "id": id } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(item_body(id, value)))
            .mount(server)
            .await;
    }

    #[test]
    fn test_query_key_from_operation() {
        let key = ItemQuery::new("1").key();
        assert_eq!(key.operation, "GetItem");
        assert_eq!(key.to_cache_key(), r#"GetItem({"id":"1"})"#);
        assert_ne!(key, ItemQuery::new("2").key());
    }

    #[tokio::test]
    async fn test_query_client_fetch() {
        let (server, client) = setup().await;
        mount_item(&server, "1", "one").await;

        let query = ItemQuery::new("1");
        let data = client.fetch(&query).await.unwrap();

        assert_eq!(data.item.value, "one");
        assert_eq!(client.state(&query.key()).await, QueryState::Success);
        assert!(client.fetched_at(&query.key()).await.is_some());
    }

    #[tokio::test]
    async fn test_get_uses_cache() {
        let (server, client) = setup().await;
        mount_item(&server, "1", "one").await;

        let query = ItemQuery::new("1");
        client.get(&query).await.unwrap();
        client.get(&query).await.unwrap();

        assert_eq!(client.fetch_count(&query.key()).await, 1);
    }

    #[tokio::test]
    async fn test_uncached_query_always_fetches() {
        let (server, client) = setup().await;
        mount_item(&server, "1", "one").await;

        let query = ItemQuery { id: "1".to_string(), cache: false };
        client.get(&query).await.unwrap();
        client.get(&query).await.unwrap();

        assert_eq!(client.fetch_count(&query.key()).await, 2);
        assert!(client.read(&query).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_failure_records_error() {
        let (server, client) = setup().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": [{ "message": "Item not found" }]
            })))
            .mount(&server)
            .await;

        let query = ItemQuery::new("missing");
        assert!(client.fetch(&query).await.is_err());
        assert_eq!(client.state(&query.key()).await, QueryState::Error);
        assert_eq!(client.last_error(&query.key()).await.as_deref(), Some("Item not found"));
    }

    #[tokio::test]
    async fn test_refetch_updates_cache() {
        let (server, client) = setup().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(item_body("1", "old")))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        mount_item(&server, "1", "new").await;

        let query = ItemQuery::new("1");
        client.get(&query).await.unwrap();
        client.refetch(&query.operation()).await.unwrap();

        let cached = client.read(&query).unwrap().unwrap();
        assert_eq!(cached.item.value, "new");
        assert_eq!(client.fetch_count(&query.key()).await, 2);
    }

    #[tokio::test]
    async fn test_invalidation_and_clear() {
        let (server, client) = setup().await;
        mount_item(&server, "1", "one").await;
        mount_item(&server, "2", "two").await;

        let first = ItemQuery::new("1");
        let second = ItemQuery::new("2");
        client.fetch(&first).await.unwrap();
        client.fetch(&second).await.unwrap();

        client.invalidate(&first.key()).await;
        assert_eq!(client.state(&first.key()).await, QueryState::Idle);
        assert!(client.read(&first).unwrap().is_none());
        assert!(client.read(&second).unwrap().is_some());

        client.clear().await;
        assert_eq!(client.state(&second.key()).await, QueryState::Idle);
        assert!(client.read(&second).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_watched_query_refires_on_variable_change() {
        let (server, client) = setup().await;
        mount_item(&server, "1", "one").await;
        mount_item(&server, "2", "two").await;

        let mut watched = WatchedQuery::new(client.clone(), ItemQuery::new("1"));
        assert!(watched.result().data.is_none());

        watched.start().await.unwrap();
        assert_eq!(watched.result().data.as_ref().unwrap().item.value, "one");

        // Same variables: nothing happens
        assert!(watched.set_query(ItemQuery::new("1")).await.is_none());

        let changed = watched.set_query(ItemQuery::new("2")).await;
        assert_eq!(changed.unwrap().unwrap().item.value, "two");
        assert_eq!(watched.result().data.as_ref().unwrap().item.id, "2");
        assert!(!watched.result().loading);
    }

    #[tokio::test]
    async fn test_watched_query_sync_reads_cache() {
        let (server, client) = setup().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(item_body("1", "old")))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        mount_item(&server, "1", "new").await;

        let mut watched = WatchedQuery::new(client.clone(), ItemQuery::new("1"));
        watched.start().await.unwrap();

        client.refetch(&ItemQuery::new("1").operation()).await.unwrap();
        watched.sync().unwrap();

        assert_eq!(watched.result().data.as_ref().unwrap().item.value, "new");
    }

    #[tokio::test]
    async fn test_lazy_query_only_runs_on_trigger() {
        let (server, client) = setup().await;
        mount_item(&server, "1", "one").await;

        let mut lazy: LazyQuery<ItemQuery> = LazyQuery::new(client);
        assert!(!lazy.called());
        assert!(server.received_requests().await.unwrap().is_empty());

        let data = lazy.trigger(ItemQuery::new("1")).await.unwrap();
        assert_eq!(data.item.value, "one");
        assert!(lazy.called());
        assert_eq!(lazy.last_query().map(|q| q.id.as_str()), Some("1"));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_lazy_query_records_error() {
        let (server, client) = setup().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("down"))
            .mount(&server)
            .await;

        let mut lazy: LazyQuery<ItemQuery> = LazyQuery::new(client);
        assert!(lazy.trigger(ItemQuery::new("1")).await.is_err());
        assert!(lazy.result().error.is_some());
        assert!(lazy.result().data.is_none());
    }
}
