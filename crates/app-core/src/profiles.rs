//! Profiles and follows
//!
//! The signed-in user's own profile comes from `GetProfile`; other users
//! are loaded by id. Following a user refetches that user's profile so the
//! follower count is current when the call returns.

use app_state::{Mutation, MutationClient, Query, QueryClient};
use api_client::Operation;
use serde::Deserialize;
use serde_json::json;

use crate::error::Result;
use crate::models::{FollowResult, User};

const GET_PROFILE_DOCUMENT: &str = r#"query GetProfile {
  getProfile {
    __typename
    _id
    name
    username
    email
    following { __typename _id }
    follower { __typename _id }
  }
}"#;

const GET_USER_BY_ID_DOCUMENT: &str = r#"query GetUserById($userId: ID) {
  getUserById(id: $userId) {
    __typename
    _id
    name
    username
    email
    following { __typename _id name username email }
    follower { __typename _id name username email }
  }
}"#;

const FOLLOW_DOCUMENT: &str = r#"mutation Follow($input: FollowInput) {
  follow(input: $input) {
    status
    data {
      _id
    }
  }
}"#;

/// Own profile response data
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileData {
    /// The signed-in user
    #[serde(rename = "getProfile")]
    pub profile: User,
}

/// The signed-in user's profile
#[derive(Debug, Clone, Copy, Default)]
pub struct GetProfileQuery;

impl Query for GetProfileQuery {
    type Data = ProfileData;

    fn operation(&self) -> Operation {
        Operation::query("GetProfile", GET_PROFILE_DOCUMENT)
    }
}

/// Other user's profile response data
#[derive(Debug, Clone, Deserialize)]
pub struct UserData {
    /// The requested user
    #[serde(rename = "getUserById")]
    pub user: User,
}

/// Another user's profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetUserByIdQuery {
    /// User id
    pub user_id: String,
}

impl GetUserByIdQuery {
    /// Create a profile query
    pub fn new(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into() }
    }
}

impl Query for GetUserByIdQuery {
    type Data = UserData;

    fn operation(&self) -> Operation {
        Operation::query("GetUserById", GET_USER_BY_ID_DOCUMENT)
            .variable("userId", json!(self.user_id))
    }
}

/// `Follow` response data
#[derive(Debug, Clone, Deserialize)]
pub struct FollowData {
    /// Follow outcome
    pub follow: FollowResult,
}

/// Follow a user, then refetch their profile
#[derive(Debug, Clone, Copy, Default)]
pub struct FollowMutation;

impl Mutation for FollowMutation {
    type Input = String;
    type Output = FollowData;

    fn operation(&self, user_id: &String) -> Operation {
        Operation::mutation("Follow", FOLLOW_DOCUMENT).variable("input", json!({ "userId": user_id }))
    }

    fn refetch_queries(&self, user_id: &String) -> Vec<Operation> {
        vec![GetUserByIdQuery::new(user_id.clone()).operation()]
    }
}

/// Profile operations
#[derive(Clone)]
pub struct ProfileService {
    queries: QueryClient,
    mutations: MutationClient,
}

impl ProfileService {
    /// Create a profile service
    pub fn new(mutations: MutationClient) -> Self {
        Self {
            queries: mutations.query_client().clone(),
            mutations,
        }
    }

    /// Signed-in user's profile (cache first)
    pub async fn own_profile(&self) -> Result<User> {
        Ok(self.queries.get(&GetProfileQuery).await?.profile)
    }

    /// Another user's profile (cache first)
    pub async fn user(&self, user_id: &str) -> Result<User> {
        Ok(self.queries.get(&GetUserByIdQuery::new(user_id)).await?.user)
    }

    /// Follow a user; their profile is refetched before this returns
    pub async fn follow(&self, user_id: &str) -> Result<FollowResult> {
        let data = self
            .mutations
            .mutate(&FollowMutation, user_id.to_string())
            .await?;
        Ok(data.follow)
    }
}
