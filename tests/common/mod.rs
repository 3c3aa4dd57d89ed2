//! Stateful fake GraphQL backend for end-to-end tests
//!
//! Dispatches on `operationName` and keeps users, posts and tokens in
//! memory, so mutations are visible to later queries.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const EPOCH_MS: i64 = 1_700_000_000_000;

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub followers: Vec<String>,
    pub following: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PostRecord {
    pub id: String,
    pub content: String,
    pub tags: Vec<String>,
    pub img_url: String,
    pub author_id: String,
    /// (username, content, created_at)
    pub comments: Vec<(String, String, i64)>,
    /// (username, created_at)
    pub likes: Vec<(String, i64)>,
    pub created_at: i64,
}

#[derive(Default)]
struct State {
    users: Vec<UserRecord>,
    posts: Vec<PostRecord>,
    tokens: HashMap<String, String>,
    log: Vec<String>,
    clock: i64,
    next_id: u32,
}

impl State {
    fn tick(&mut self) -> i64 {
        self.clock += 1000;
        EPOCH_MS + self.clock
    }

    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{}", prefix, self.next_id)
    }

    fn user(&self, id: &str) -> Option<&UserRecord> {
        self.users.iter().find(|u| u.id == id)
    }

    fn user_summary(&self, id: &str) -> Value {
        match self.user(id) {
            Some(u) => json!({ "__typename": "User", "_id": u.id, "name": u.name, "username": u.username, "email": u.email }),
            None => json!({ "__typename": "User", "_id": id }),
        }
    }

    fn user_json(&self, user: &UserRecord) -> Value {
        json!({
            "__typename": "User",
            "_id": user.id,
            "name": user.name,
            "username": user.username,
            "email": user.email,
            "follower": user.followers.iter().map(|id| self.user_summary(id)).collect::<Vec<_>>(),
            "following": user.following.iter().map(|id| self.user_summary(id)).collect::<Vec<_>>(),
        })
    }

    fn post_json(&self, post: &PostRecord) -> Value {
        json!({
            "__typename": "Post",
            "_id": post.id,
            "content": post.content,
            "tags": post.tags,
            "imgUrl": post.img_url,
            "authorId": post.author_id,
            "comments": post.comments.iter().map(|(username, content, at)| json!({
                "content": content, "username": username,
                "createdAt": at.to_string(), "updatedAt": at.to_string()
            })).collect::<Vec<_>>(),
            "likes": post.likes.iter().map(|(username, at)| json!({
                "username": username, "createdAt": at.to_string(), "updatedAt": at.to_string()
            })).collect::<Vec<_>>(),
            "createdAt": post.created_at.to_string(),
            "updatedAt": post.created_at.to_string(),
            "author": self.user_summary(&post.author_id),
        })
    }
}

fn data(value: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "data": value }))
}

fn error(message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "data": null, "errors": [{ "message": message }] }))
}

fn unauthenticated() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "data": null,
        "errors": [{ "message": "Invalid token", "extensions": { "code": "UNAUTHENTICATED" } }]
    }))
}

struct Responder {
    state: Arc<Mutex<State>>,
}

impl Respond for Responder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let Ok(body) = serde_json::from_slice::<Value>(&request.body) else {
            return ResponseTemplate::new(400).set_body_string("bad request");
        };
        let operation = body["operationName"].as_str().unwrap_or_default().to_string();
        let vars = &body["variables"];
        let token = request
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_string);

        let mut state = self.state.lock().unwrap();
        state.log.push(operation.clone());

        match operation.as_str() {
            "Login" => {
                let input = &vars["input"];
                let found = state
                    .users
                    .iter()
                    .find(|u| u.username == input["username"] && u.password == input["password"])
                    .map(|u| u.id.clone());
                match found {
                    Some(user_id) => {
                        let token = format!("token-{}-{}", user_id, state.tick());
                        state.tokens.insert(token.clone(), user_id);
                        data(json!({ "login": { "access_token": token } }))
                    }
                    None => error("Invalid username/password"),
                }
            }
            "Register" => {
                let input = &vars["input"];
                let username = input["username"].as_str().unwrap_or_default().to_string();
                if state.users.iter().any(|u| u.username == username) {
                    return error("Username already exists");
                }
                let id = state.id("u");
                state.users.push(UserRecord {
                    id: id.clone(),
                    name: input["name"].as_str().unwrap_or_default().to_string(),
                    username,
                    email: input["email"].as_str().unwrap_or_default().to_string(),
                    password: input["password"].as_str().unwrap_or_default().to_string(),
                    followers: Vec::new(),
                    following: Vec::new(),
                });
                let summary = state.user_summary(&id);
                data(json!({ "register": summary }))
            }
            _ => {
                let Some(viewer) = token.and_then(|t| state.tokens.get(&t).cloned()) else {
                    return unauthenticated();
                };
                authenticated(&mut state, &operation, vars, &viewer)
            }
        }
    }
}

fn authenticated(state: &mut State, operation: &str, vars: &Value, viewer: &str) -> ResponseTemplate {
    match operation {
        "GetPosts" => {
            let posts: Vec<Value> = state.posts.iter().rev().map(|p| state.post_json(p)).collect();
            data(json!({ "getPosts": posts }))
        }
        "GetPostById" => {
            let id = vars["postId"].as_str().unwrap_or_default();
            match state.posts.iter().find(|p| p.id == id) {
                Some(post) => data(json!({ "getPostById": state.post_json(post) })),
                None => error("Post not found"),
            }
        }
        "AddPost" => {
            let input = &vars["input"];
            let id = state.id("p");
            let created_at = state.tick();
            let post = PostRecord {
                id: id.clone(),
                content: input["content"].as_str().unwrap_or_default().to_string(),
                tags: serde_json::from_value(input["tags"].clone()).unwrap_or_default(),
                img_url: input["imgUrl"].as_str().unwrap_or_default().to_string(),
                author_id: viewer.to_string(),
                comments: Vec::new(),
                likes: Vec::new(),
                created_at,
            };
            let payload = json!({
                "__typename": "Post", "_id": id, "content": post.content, "tags": post.tags, "imgUrl": post.img_url
            });
            state.posts.push(post);
            data(json!({ "addPost": payload }))
        }
        "LikePost" | "CommentPost" => {
            let input = &vars["input"];
            let id = input["postId"].as_str().unwrap_or_default().to_string();
            let username = state.user(viewer).map(|u| u.username.clone()).unwrap_or_default();
            let at = state.tick();
            let Some(post) = state.posts.iter_mut().find(|p| p.id == id) else {
                return error("Post not found");
            };
            if operation == "LikePost" {
                post.likes.push((username, at));
                data(json!({ "likePost": { "_id": id } }))
            } else {
                let content = input["content"].as_str().unwrap_or_default().to_string();
                post.comments.push((username, content, at));
                data(json!({ "commentPost": { "_id": id } }))
            }
        }
        "SearchUsers" => {
            let query = vars["query"].as_str().unwrap_or_default().to_lowercase();
            let users: Vec<Value> = state
                .users
                .iter()
                .filter(|u| u.name.to_lowercase().contains(&query) || u.username.to_lowercase().contains(&query))
                .map(|u| state.user_summary(&u.id))
                .collect();
            data(json!({ "searchUsers": users }))
        }
        "GetProfile" => match state.user(viewer) {
            Some(user) => data(json!({ "getProfile": state.user_json(user) })),
            None => error("User not found"),
        },
        "GetUserById" => {
            let id = vars["userId"].as_str().unwrap_or_default();
            match state.user(id) {
                Some(user) => data(json!({ "getUserById": state.user_json(user) })),
                None => error("User not found"),
            }
        }
        "Follow" => {
            let target = vars["input"]["userId"].as_str().unwrap_or_default().to_string();
            if state.user(&target).is_none() {
                return error("User not found");
            }
            let follow_id = state.id("f");
            for user in state.users.iter_mut() {
                if user.id == target && !user.followers.iter().any(|f| f == viewer) {
                    user.followers.push(viewer.to_string());
                }
                if user.id == viewer && !user.following.contains(&target) {
                    user.following.push(target.clone());
                }
            }
            data(json!({ "follow": { "status": "success", "data": { "_id": follow_id } } }))
        }
        other => error(&format!("Unknown operation {}", other)),
    }
}

/// Fake backend behind a mock server
pub struct Backend {
    server: MockServer,
    state: Arc<Mutex<State>>,
}

impl Backend {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let state = Arc::new(Mutex::new(State::default()));
        Mock::given(method("POST"))
            .respond_with(Responder { state: state.clone() })
            .mount(&server)
            .await;
        Self { server, state }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Register a user directly, returning the id
    pub fn add_user(&self, name: &str, username: &str, password: &str) -> String {
        let mut state = self.state.lock().unwrap();
        let id = state.id("u");
        state.users.push(UserRecord {
            id: id.clone(),
            name: name.to_string(),
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password: password.to_string(),
            followers: Vec::new(),
            following: Vec::new(),
        });
        id
    }

    /// Create a post directly, returning the id
    pub fn add_post(&self, author_id: &str, content: &str) -> String {
        let mut state = self.state.lock().unwrap();
        let id = state.id("p");
        let created_at = state.tick();
        state.posts.push(PostRecord {
            id: id.clone(),
            content: content.to_string(),
            tags: Vec::new(),
            img_url: String::new(),
            author_id: author_id.to_string(),
            comments: Vec::new(),
            likes: Vec::new(),
            created_at,
        });
        id
    }

    /// Issue a valid token for a user without a login request
    pub fn issue_token(&self, user_id: &str) -> String {
        let mut state = self.state.lock().unwrap();
        let token = format!("token-{}-{}", user_id, state.tick());
        state.tokens.insert(token.clone(), user_id.to_string());
        token
    }

    /// Invalidate every issued token
    pub fn revoke_tokens(&self) {
        self.state.lock().unwrap().tokens.clear();
    }

    pub fn posts(&self) -> Vec<PostRecord> {
        self.state.lock().unwrap().posts.clone()
    }

    pub fn user(&self, id: &str) -> Option<UserRecord> {
        self.state.lock().unwrap().user(id).cloned()
    }

    /// Operation names received so far, in order
    pub fn log(&self) -> Vec<String> {
        self.state.lock().unwrap().log.clone()
    }

    /// Number of requests for one operation
    pub fn count(&self, operation: &str) -> usize {
        self.log().iter().filter(|op| *op == operation).count()
    }
}
