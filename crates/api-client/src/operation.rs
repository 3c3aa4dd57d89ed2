//! GraphQL operations and wire types
//!
//! An [`Operation`] is a named query or mutation document plus its
//! variables. It converts into the JSON body POSTed to the endpoint
//! (`{operationName, query, variables}`); responses come back as
//! [`GraphQLResponse`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Operations
// =============================================================================

/// Whether an operation reads or writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Read-only query
    Query,
    /// Mutation with side effects on the server
    Mutation,
}

impl OperationKind {
    /// GraphQL keyword for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
        }
    }
}

/// A named GraphQL operation with its variables
///
/// # Examples
/// ```
/// use api_client::operation::{Operation, OperationKind};
/// use serde_json::json;
///
/// let op = Operation::query("GetPostById", "query GetPostById($postId: ID) { ... }")
///     .variable("postId", json!("p1"));
///
/// assert_eq!(op.kind, OperationKind::Query);
/// assert_eq!(op.cache_key(), r#"GetPostById({"postId":"p1"})"#);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// Query or mutation
    pub kind: OperationKind,
    /// Operation name (sent as `operationName`)
    pub name: String,
    /// GraphQL document text
    pub document: String,
    /// Operation variables
    pub variables: Map<String, Value>,
}

impl Operation {
    /// Create a new query operation
    pub fn query(name: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            kind: OperationKind::Query,
            name: name.into(),
            document: document.into(),
            variables: Map::new(),
        }
    }

    /// Create a new mutation operation
    pub fn mutation(name: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            kind: OperationKind::Mutation,
            name: name.into(),
            document: document.into(),
            variables: Map::new(),
        }
    }

    /// Add a variable
    pub fn variable(mut self, key: impl Into<String>, value: Value) -> Self {
        self.variables.insert(key.into(), value);
        self
    }

    /// Check if this operation is a mutation
    pub fn is_mutation(&self) -> bool {
        self.kind == OperationKind::Mutation
    }

    /// Key identifying this operation's result in the cache
    ///
    /// Variables are serialized with sorted keys so equal variable sets
    /// always produce the same key.
    pub fn cache_key(&self) -> String {
        if self.variables.is_empty() {
            return self.name.clone();
        }
        let vars = serde_json::to_string(&self.variables).unwrap_or_default();
        format!("{}({})", self.name, vars)
    }

    /// Build the request body for this operation
    pub fn to_request(&self) -> GraphQLRequest {
        GraphQLRequest {
            operation_name: self.name.clone(),
            query: self.document.clone(),
            variables: self.variables.clone(),
        }
    }
}

// =============================================================================
// Wire Format
// =============================================================================

/// JSON body of a GraphQL HTTP request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLRequest {
    /// Operation name
    pub operation_name: String,
    /// Document text
    pub query: String,
    /// Variables
    pub variables: Map<String, Value>,
}

/// JSON body of a GraphQL HTTP response
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GraphQLResponse {
    /// Result data, absent or null when execution failed
    #[serde(default)]
    pub data: Option<Value>,
    /// Errors reported by the server
    #[serde(default)]
    pub errors: Vec<GraphQLError>,
}

/// A single server-reported GraphQL error
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphQLError {
    /// Human-readable message
    pub message: String,
    /// Response path the error applies to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<Value>,
    /// Server-specific extensions (e.g. `code`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
}

impl GraphQLError {
    /// Create an error with only a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: Vec::new(),
            extensions: None,
        }
    }

    /// Error code from `extensions.code`, if any
    pub fn code(&self) -> Option<&str> {
        self.extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .and_then(Value::as_str)
    }
}
