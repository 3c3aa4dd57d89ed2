//! User search

use app_state::Query;
use api_client::Operation;
use serde::Deserialize;
use serde_json::json;

use crate::models::UserSummary;
use crate::validation::has_content;

const SEARCH_USERS_DOCUMENT: &str = r#"query SearchUsers($query: String) {
  searchUsers(query: $query) {
    __typename
    _id
    name
    username
    email
  }
}"#;

/// Search response data
#[derive(Debug, Clone, Deserialize)]
pub struct SearchData {
    /// Matching users
    #[serde(rename = "searchUsers")]
    pub users: Vec<UserSummary>,
}

/// Search users by name or username
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchUsersQuery {
    query: String,
}

impl SearchUsersQuery {
    /// Build a search for `input`, or `None` if it is blank
    ///
    /// The text is sent as typed.
    pub fn new(input: &str) -> Option<Self> {
        has_content(input).then(|| Self { query: input.to_string() })
    }

    /// Search text
    pub fn text(&self) -> &str {
        &self.query
    }
}

impl Query for SearchUsersQuery {
    type Data = SearchData;

    fn operation(&self) -> Operation {
        Operation::query("SearchUsers", SEARCH_USERS_DOCUMENT).variable("query", json!(self.query))
    }
}
