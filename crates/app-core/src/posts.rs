//! Posts: feed, detail, creation, likes and comments
//!
//! Creating a post refetches the feed and liking a post refetches its
//! detail, both before the call returns. Commenting is a plain mutation;
//! the caller refetches the post explicitly afterwards.

use app_state::{Mutation, MutationClient, Query, QueryClient};
use api_client::Operation;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::Result;
use crate::models::{EntityId, Post};
use crate::validation::{has_content, require_trimmed, ValidationError};

const GET_POSTS_DOCUMENT: &str = r#"query GetPosts {
  getPosts {
    __typename
    _id
    content
    tags
    imgUrl
    authorId
    comments { content username createdAt updatedAt }
    likes { username createdAt updatedAt }
    createdAt
    updatedAt
    author { __typename _id name username email }
  }
}"#;

const GET_POST_BY_ID_DOCUMENT: &str = r#"query GetPostById($postId: ID) {
  getPostById(id: $postId) {
    __typename
    _id
    content
    tags
    imgUrl
    authorId
    comments { content username createdAt updatedAt }
    likes { username createdAt updatedAt }
    createdAt
    updatedAt
    author { __typename _id name username email }
  }
}"#;

const ADD_POST_DOCUMENT: &str = r#"mutation AddPost($input: PostInput) {
  addPost(input: $input) {
    __typename
    _id
    content
    tags
    imgUrl
  }
}"#;

const LIKE_POST_DOCUMENT: &str = r#"mutation LikePost($input: LikeInput) {
  likePost(input: $input) {
    _id
  }
}"#;

const COMMENT_POST_DOCUMENT: &str = r#"mutation CommentPost($input: CommentInput) {
  commentPost(input: $input) {
    _id
  }
}"#;

/// Shown when a post is submitted without content
pub const CONTENT_REQUIRED_MESSAGE: &str = "Content is required";

// =============================================================================
// Queries
// =============================================================================

/// Feed response data
#[derive(Debug, Clone, Deserialize)]
pub struct PostsData {
    /// All posts, newest first
    #[serde(rename = "getPosts")]
    pub posts: Vec<Post>,
}

/// The home feed
#[derive(Debug, Clone, Copy, Default)]
pub struct GetPostsQuery;

impl Query for GetPostsQuery {
    type Data = PostsData;

    fn operation(&self) -> Operation {
        Operation::query("GetPosts", GET_POSTS_DOCUMENT)
    }
}

/// Post detail response data
#[derive(Debug, Clone, Deserialize)]
pub struct PostData {
    /// The post
    #[serde(rename = "getPostById")]
    pub post: Post,
}

/// A single post with comments and likes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetPostByIdQuery {
    /// Post id
    pub post_id: String,
}

impl GetPostByIdQuery {
    /// Create a detail query
    pub fn new(post_id: impl Into<String>) -> Self {
        Self { post_id: post_id.into() }
    }
}

impl Query for GetPostByIdQuery {
    type Data = PostData;

    fn operation(&self) -> Operation {
        Operation::query("GetPostById", GET_POST_BY_ID_DOCUMENT)
            .variable("postId", json!(self.post_id))
    }
}

// =============================================================================
// Post Creation
// =============================================================================

/// Post being composed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostDraft {
    /// Post text
    pub content: String,
    /// Image URL, empty for none
    pub img_url: String,
    /// Tags in insertion order, without duplicates
    tags: Vec<String>,
}

impl PostDraft {
    /// Create an empty draft
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag; blank or duplicate tags are ignored
    ///
    /// Returns whether the tag was added.
    pub fn add_tag(&mut self, input: &str) -> bool {
        let tag = input.trim();
        if tag.is_empty() || self.tags.iter().any(|t| t == tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    /// Remove a tag, returning whether it was present
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        self.tags.len() != before
    }

    /// Current tags
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Build the mutation input; content must have non-whitespace text
    pub fn to_input(&self) -> std::result::Result<NewPost, ValidationError> {
        let content = require_trimmed("content", &self.content, CONTENT_REQUIRED_MESSAGE)?;
        Ok(NewPost {
            content: content.to_string(),
            img_url: self.img_url.trim().to_string(),
            tags: self.tags.clone(),
        })
    }
}

/// `AddPost` input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    /// Post text
    pub content: String,
    /// Image URL, `""` for none
    pub img_url: String,
    /// Tags
    pub tags: Vec<String>,
}

/// Post returned by `AddPost`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedPost {
    /// Post id
    #[serde(rename = "_id")]
    pub id: String,
    /// Post text
    pub content: String,
    /// Tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Image URL
    #[serde(default)]
    pub img_url: Option<String>,
}

/// `AddPost` response data
#[derive(Debug, Clone, Deserialize)]
pub struct AddPostData {
    /// The created post
    #[serde(rename = "addPost")]
    pub post: CreatedPost,
}

/// Create a post, then refetch the feed
#[derive(Debug, Clone, Copy, Default)]
pub struct AddPostMutation;

impl Mutation for AddPostMutation {
    type Input = NewPost;
    type Output = AddPostData;

    fn operation(&self, input: &NewPost) -> Operation {
        Operation::mutation("AddPost", ADD_POST_DOCUMENT).variable(
            "input",
            json!({ "content": input.content, "imgUrl": input.img_url, "tags": input.tags }),
        )
    }

    fn refetch_queries(&self, _input: &NewPost) -> Vec<Operation> {
        vec![GetPostsQuery.operation()]
    }
}

// =============================================================================
// Likes and Comments
// =============================================================================

/// `LikePost` response data
#[derive(Debug, Clone, Deserialize)]
pub struct LikePostData {
    /// The liked post
    #[serde(rename = "likePost")]
    pub like: EntityId,
}

/// Like a post, then refetch its detail
#[derive(Debug, Clone, Copy, Default)]
pub struct LikePostMutation;

impl Mutation for LikePostMutation {
    type Input = String;
    type Output = LikePostData;

    fn operation(&self, post_id: &String) -> Operation {
        Operation::mutation("LikePost", LIKE_POST_DOCUMENT)
            .variable("input", json!({ "postId": post_id }))
    }

    fn refetch_queries(&self, post_id: &String) -> Vec<Operation> {
        vec![GetPostByIdQuery::new(post_id.clone()).operation()]
    }
}

/// `CommentPost` input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    /// Post being commented on
    pub post_id: String,
    /// Comment text, sent as typed
    pub content: String,
}

/// `CommentPost` response data
#[derive(Debug, Clone, Deserialize)]
pub struct CommentPostData {
    /// The commented post
    #[serde(rename = "commentPost")]
    pub comment: EntityId,
}

/// Comment on a post
#[derive(Debug, Clone, Copy, Default)]
pub struct CommentPostMutation;

impl Mutation for CommentPostMutation {
    type Input = NewComment;
    type Output = CommentPostData;

    fn operation(&self, input: &NewComment) -> Operation {
        Operation::mutation("CommentPost", COMMENT_POST_DOCUMENT).variable(
            "input",
            json!({ "content": input.content, "postId": input.post_id }),
        )
    }
}

// =============================================================================
// Service
// =============================================================================

/// Post operations
#[derive(Clone)]
pub struct PostService {
    queries: QueryClient,
    mutations: MutationClient,
}

impl PostService {
    /// Create a post service
    pub fn new(mutations: MutationClient) -> Self {
        Self {
            queries: mutations.query_client().clone(),
            mutations,
        }
    }

    /// Home feed (cache first)
    pub async fn feed(&self) -> Result<Vec<Post>> {
        Ok(self.queries.get(&GetPostsQuery).await?.posts)
    }

    /// Post detail (cache first)
    pub async fn post(&self, post_id: &str) -> Result<Post> {
        Ok(self.queries.get(&GetPostByIdQuery::new(post_id)).await?.post)
    }

    /// Publish a draft; the feed is refetched before this returns
    pub async fn create(&self, draft: &PostDraft) -> Result<CreatedPost> {
        let input = draft.to_input()?;
        let data = self.mutations.mutate(&AddPostMutation, input).await?;
        tracing::debug!(post_id = %data.post.id, "post created");
        Ok(data.post)
    }

    /// Like a post; its detail is refetched before this returns
    pub async fn like(&self, post_id: &str) -> Result<()> {
        self.mutations
            .mutate(&LikePostMutation, post_id.to_string())
            .await?;
        Ok(())
    }

    /// Comment on a post
    ///
    /// Blank comments are skipped and return `Ok(false)` without a request.
    pub async fn comment(&self, post_id: &str, content: &str) -> Result<bool> {
        if !has_content(content) {
            return Ok(false);
        }
        let input = NewComment {
            post_id: post_id.to_string(),
            content: content.to_string(),
        };
        self.mutations.mutate(&CommentPostMutation, input).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_client::{ClientConfig, GraphQLClient, NoAuthLink};
    use std::sync::Arc;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn post_json(id: &str, likes: &[&str]) -> serde_json::Value {
        let likes: Vec<_> = likes
            .iter()
            .map(|u| json!({ "username": u, "createdAt": "1700000000000", "updatedAt": "1700000000000" }))
            .collect();
        json!({
            "__typename": "Post", "_id": id, "content": "hello", "tags": [], "imgUrl": "",
            "authorId": "u1", "comments": [], "likes": likes,
            "createdAt": "1700000000000", "updatedAt": "1700000000000",
            "author": { "__typename": "User", "_id": "u1", "name": "Alice", "username": "alice", "email": "a@x.id" }
        })
    }

    async fn service(server: &MockServer) -> PostService {
        let graphql = GraphQLClient::new(ClientConfig::new(server.uri()), Arc::new(NoAuthLink)).unwrap();
        PostService::new(MutationClient::new(QueryClient::new(Arc::new(graphql))))
    }

    #[test]
    fn test_draft_tags() {
        let mut draft = PostDraft::new();
        assert!(draft.add_tag("  rust "));
        assert!(!draft.add_tag("rust"));
        assert!(!draft.add_tag("   "));
        assert!(draft.add_tag("graphql"));
        assert_eq!(draft.tags(), &["rust".to_string(), "graphql".to_string()]);

        assert!(draft.remove_tag("rust"));
        assert!(!draft.remove_tag("rust"));
        assert_eq!(draft.tags().len(), 1);
    }

    #[test]
    fn test_draft_to_input() {
        let mut draft = PostDraft::new();
        draft.content = "  hello  ".to_string();
        let input = draft.to_input().unwrap();
        assert_eq!(input.content, "hello");
        assert_eq!(input.img_url, "");
        assert!(input.tags.is_empty());

        draft.content = " ".to_string();
        assert_eq!(draft.to_input().unwrap_err().message, CONTENT_REQUIRED_MESSAGE);
    }

    #[test]
    fn test_operations() {
        let input = NewPost { content: "hi".to_string(), img_url: String::new(), tags: vec!["a".to_string()] };
        let op = AddPostMutation.operation(&input);
        assert_eq!(op.variables["input"]["imgUrl"], "");
        assert_eq!(AddPostMutation.refetch_queries(&input)[0].name, "GetPosts");

        let like = LikePostMutation.refetch_queries(&"p1".to_string());
        assert_eq!(like[0].variables["postId"], "p1");

        assert!(CommentPostMutation
            .refetch_queries(&NewComment { post_id: "p1".to_string(), content: "x".to_string() })
            .is_empty());
    }

    #[tokio::test]
    async fn test_like_refetches_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "operationName": "GetPostById" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "getPostById": post_json("p1", &[]) } })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "operationName": "GetPostById" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "getPostById": post_json("p1", &["bob"]) } })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "operationName": "LikePost", "variables": { "input": { "postId": "p1" } } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "likePost": { "_id": "p1" } } })))
            .expect(1)
            .mount(&server)
            .await;

        let posts = service(&server).await;
        assert_eq!(posts.post("p1").await.unwrap().like_count(), 0);

        posts.like("p1").await.unwrap();

        // cache-first read sees the refetched detail
        assert_eq!(posts.post("p1").await.unwrap().like_count(), 1);
    }

    #[tokio::test]
    async fn test_create_sends_trimmed_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "operationName": "AddPost",
                "variables": { "input": { "content": "hello", "imgUrl": "", "tags": [] } }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "addPost": { "__typename": "Post", "_id": "p9", "content": "hello", "tags": [], "imgUrl": "" } }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "operationName": "GetPosts" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "getPosts": [post_json("p9", &[])] } })))
            .expect(1)
            .mount(&server)
            .await;

        let posts = service(&server).await;
        let mut draft = PostDraft::new();
        draft.content = " hello ".to_string();

        let created = posts.create(&draft).await.unwrap();
        assert_eq!(created.id, "p9");
        assert_eq!(created.content, "hello");
    }

    #[tokio::test]
    async fn test_blank_comment_sends_nothing() {
        let server = MockServer::start().await;
        let posts = service(&server).await;

        assert!(!posts.comment("p1", "   ").await.unwrap());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_comment_sent_as_typed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "operationName": "CommentPost",
                "variables": { "input": { "content": " nice ", "postId": "p1" } }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "commentPost": { "_id": "p1" } } })))
            .expect(1)
            .mount(&server)
            .await;

        let posts = service(&server).await;
        assert!(posts.comment("p1", " nice ").await.unwrap());
    }
}
