//! GraphQL HTTP client
//!
//! Operations are POSTed as JSON to a single endpoint. Headers come from
//! the configuration and from the request link; results are cached in a
//! [`NormalizedCache`] according to the requested [`FetchPolicy`].
//! Failed requests are never retried.

use reqwest::{Client as ReqwestClient, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::NormalizedCache;
use crate::link::RequestLink;
use crate::operation::{GraphQLResponse, Operation};
use crate::{Error, Result};

/// Production API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.andika.my.id";

// =============================================================================
// Client Configuration
// =============================================================================

/// Configuration for the GraphQL client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// GraphQL endpoint URL
    pub endpoint: String,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Headers included in all requests
    pub default_headers: HashMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: format!("Telesosmed/{}", env!("CARGO_PKG_VERSION")),
            default_headers: HashMap::new(),
        }
    }
}

impl ClientConfig {
    /// Create a new config with an endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Add a default header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }
}

/// How a query consults the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPolicy {
    /// Serve from cache when present, otherwise fetch and cache
    #[default]
    CacheFirst,
    /// Always fetch, then cache
    NetworkOnly,
    /// Always fetch, never cache
    NoCache,
}

// =============================================================================
// GraphQL Client Implementation
// =============================================================================

/// GraphQL client with a request link and a normalized cache
///
/// # Examples
/// ```no_run
/// use api_client::{ClientConfig, FetchPolicy, GraphQLClient, NoAuthLink, Operation};
/// use std::sync::Arc;
///
/// async fn example() -> api_client::Result<()> {
///     let client = GraphQLClient::new(ClientConfig::default(), Arc::new(NoAuthLink))?;
///
///     let op = Operation::query("GetPosts", "query GetPosts { getPosts { _id content } }");
///     let data: serde_json::Value = client.query(&op, FetchPolicy::CacheFirst).await?;
///
///     println!("{}", data["getPosts"]);
///     Ok(())
/// }
/// ```
pub struct GraphQLClient {
    http: ReqwestClient,
    config: ClientConfig,
    link: Arc<dyn RequestLink>,
    cache: NormalizedCache,
}

impl GraphQLClient {
    /// Create a new GraphQL client
    pub fn new(config: ClientConfig, link: Arc<dyn RequestLink>) -> Result<Self> {
        let http = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| Error::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config,
            link,
            cache: NormalizedCache::new(),
        })
    }

    /// Run a query and deserialize its data
    pub async fn query<T>(&self, operation: &Operation, policy: FetchPolicy) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let data = self.query_value(operation, policy).await?;
        Ok(serde_json::from_value(data)?)
    }

    /// Run a query and return its raw data
    pub async fn query_value(&self, operation: &Operation, policy: FetchPolicy) -> Result<Value> {
        let key = operation.cache_key();

        if policy == FetchPolicy::CacheFirst {
            if let Some(cached) = self.cache.read_query(&key) {
                tracing::debug!(operation = %operation.name, "cache hit");
                return Ok(cached);
            }
        }

        let generation = self.cache.generation();
        let data = self.execute(operation).await?;

        if policy != FetchPolicy::NoCache {
            self.cache.write_query_if_current(&key, &data, generation);
        }

        Ok(data)
    }

    /// Run a mutation and deserialize its data
    ///
    /// Entities in the payload are merged into the cache; no query result
    /// is stored for the mutation itself.
    pub async fn mutate<T>(&self, operation: &Operation) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let generation = self.cache.generation();
        let data = self.execute(operation).await?;
        self.cache.write_entities_if_current(&data, generation);
        Ok(serde_json::from_value(data)?)
    }

    /// Read a query result from the cache without touching the network
    pub fn read_query<T>(&self, operation: &Operation) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        match self.cache.read_query(&operation.cache_key()) {
            Some(data) => Ok(Some(serde_json::from_value(data)?)),
            None => Ok(None),
        }
    }

    /// Empty the response cache
    pub fn clear_store(&self) {
        self.cache.clear();
    }

    /// Get the response cache
    pub fn cache(&self) -> &NormalizedCache {
        &self.cache
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the endpoint URL
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Send an operation and return its `data`
    async fn execute(&self, operation: &Operation) -> Result<Value> {
        tracing::debug!(
            operation = %operation.name,
            kind = operation.kind.as_str(),
            "sending GraphQL operation"
        );

        let mut req = self.http.post(&self.config.endpoint).json(&operation.to_request());

        for (key, value) in &self.config.default_headers {
            req = req.header(key, value);
        }

        for (key, value) in self.link.headers(operation).await? {
            req = req.header(key, value);
        }

        let response = req
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(format!("Failed to read response: {}", e)))?;

        parse_response(status, &body)
    }
}

impl std::fmt::Debug for GraphQLClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphQLClient")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

/// Turn an HTTP status and body into the operation's data
fn parse_response(status: StatusCode, body: &str) -> Result<Value> {
    if status == StatusCode::UNAUTHORIZED {
        let message = serde_json::from_str::<GraphQLResponse>(body)
            .ok()
            .and_then(|r| r.errors.first().map(|e| e.message.clone()))
            .unwrap_or_else(|| "Unauthorized".to_string());
        return Err(Error::Unauthenticated(message));
    }

    let parsed = match serde_json::from_str::<GraphQLResponse>(body) {
        Ok(parsed) => parsed,
        Err(e) if status.is_success() => {
            return Err(Error::Transport(format!("Failed to parse response: {}", e)));
        }
        Err(_) => {
            return Err(Error::Http {
                status: status.as_u16(),
                message: body.to_string(),
            });
        }
    };

    if !parsed.errors.is_empty() {
        if let Some(err) = parsed.errors.iter().find(|e| e.code() == Some("UNAUTHENTICATED")) {
            return Err(Error::Unauthenticated(err.message.clone()));
        }
        return Err(Error::GraphQL(parsed.errors));
    }

    if !status.is_success() {
        return Err(Error::Http {
            status: status.as_u16(),
            message: status.canonical_reason().unwrap_or("Unknown").to_string(),
        });
    }

    match parsed.data {
        Some(data) if !data.is_null() => Ok(data),
        _ => Err(Error::MissingData),
    }
}
