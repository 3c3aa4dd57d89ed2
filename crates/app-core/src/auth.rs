//! Authentication service
//!
//! Login is a GraphQL *query* that exchanges a username and password for
//! an access token; the token is then handed to the session state, which
//! persists it. Registration is a mutation and does not sign the user in.

use app_state::{Mutation, MutationClient, Query, QueryClient, QueryConfig, SessionState};
use api_client::Operation;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::error::Result;
use crate::models::{LoginPayload, UserSummary};
use crate::validation::{require, ValidationError};

const LOGIN_DOCUMENT: &str = r#"query Login($input: LoginInput) {
  login(input: $input) {
    access_token
  }
}"#;

const REGISTER_DOCUMENT: &str = r#"mutation Register($input: RegisterInput) {
  register(input: $input) {
    __typename
    _id
    email
    name
    username
  }
}"#;

/// Shown when login is attempted with an empty field
pub const LOGIN_REQUIRED_MESSAGE: &str = "Username and password are required";

/// Shown when registration is attempted with an empty field
pub const REGISTER_REQUIRED_MESSAGE: &str = "All fields are required";

// =============================================================================
// Login
// =============================================================================

/// Login parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginParams {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

impl LoginParams {
    /// Create login parameters
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Both fields must be non-empty
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        require("username", &self.username, LOGIN_REQUIRED_MESSAGE)?;
        require("password", &self.password, LOGIN_REQUIRED_MESSAGE)
    }
}

/// Login response data
#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    /// Token payload
    pub login: LoginPayload,
}

/// Credential exchange; never cached
#[derive(Debug, Clone)]
pub struct LoginQuery {
    params: LoginParams,
}

impl LoginQuery {
    /// Create a login query
    pub fn new(params: LoginParams) -> Self {
        Self { params }
    }
}

impl Query for LoginQuery {
    type Data = LoginData;

    fn operation(&self) -> Operation {
        Operation::query("Login", LOGIN_DOCUMENT).variable(
            "input",
            json!({ "username": self.params.username, "password": self.params.password }),
        )
    }

    fn config(&self) -> QueryConfig {
        QueryConfig {
            cache_results: false,
            ..QueryConfig::default()
        }
    }
}

// =============================================================================
// Registration
// =============================================================================

/// Create account parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterParams {
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

impl RegisterParams {
    /// Every field must be non-empty
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        require("name", &self.name, REGISTER_REQUIRED_MESSAGE)?;
        require("email", &self.email, REGISTER_REQUIRED_MESSAGE)?;
        require("username", &self.username, REGISTER_REQUIRED_MESSAGE)?;
        require("password", &self.password, REGISTER_REQUIRED_MESSAGE)
    }
}

/// Registration response data
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterData {
    /// The created account
    pub register: UserSummary,
}

/// Account creation
#[derive(Debug, Clone, Copy, Default)]
pub struct RegisterMutation;

impl Mutation for RegisterMutation {
    type Input = RegisterParams;
    type Output = RegisterData;

    fn operation(&self, input: &RegisterParams) -> Operation {
        Operation::mutation("Register", REGISTER_DOCUMENT).variable(
            "input",
            json!({
                "name": input.name,
                "email": input.email,
                "username": input.username,
                "password": input.password,
            }),
        )
    }
}

// =============================================================================
// Service
// =============================================================================

/// Authentication service
///
/// # Example
///
/// ```rust,no_run
/// use app_core::auth::{AuthService, LoginParams};
///
/// async fn sign_in(auth: &AuthService) -> app_core::Result<()> {
///     auth.login(&LoginParams::new("alice", "secret")).await?;
///     assert!(auth.session().is_signed_in());
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct AuthService {
    queries: QueryClient,
    mutations: MutationClient,
    session: Arc<SessionState>,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(mutations: MutationClient, session: Arc<SessionState>) -> Self {
        Self {
            queries: mutations.query_client().clone(),
            mutations,
            session,
        }
    }

    /// Exchange credentials for a token and sign in
    ///
    /// On any failure the session stays signed out.
    pub async fn login(&self, params: &LoginParams) -> Result<()> {
        params.validate()?;

        let data = self.queries.fetch(&LoginQuery::new(params.clone())).await?;
        self.session.sign_in(&data.login.access_token).await?;

        tracing::debug!(username = %params.username, "login succeeded");
        Ok(())
    }

    /// Create an account
    pub async fn register(&self, params: RegisterParams) -> Result<UserSummary> {
        params.validate()?;
        let data = self.mutations.mutate(&RegisterMutation, params).await?;
        Ok(data.register)
    }

    /// Sign out, deleting the token and cached data
    pub async fn logout(&self) -> Result<()> {
        self.session.sign_out().await?;
        Ok(())
    }

    /// Session state this service writes to
    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use api_client::{AuthLink, ClientConfig, GraphQLClient};
    use storage::{CredentialStore, MemoryCredentialStore, ACCESS_TOKEN_KEY};
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup(server: &MockServer) -> (Arc<MemoryCredentialStore>, AuthService) {
        let store = Arc::new(MemoryCredentialStore::new());
        let graphql = GraphQLClient::new(
            ClientConfig::new(server.uri()),
            Arc::new(AuthLink::new(store.clone())),
        )
        .unwrap();
        let queries = QueryClient::new(Arc::new(graphql));
        let session = Arc::new(SessionState::bootstrap(store.clone(), queries.clone()).await);
        (store, AuthService::new(MutationClient::new(queries), session))
    }

    #[test]
    fn test_login_validation() {
        assert!(LoginParams::new("alice", "pw").validate().is_ok());
        let err = LoginParams::new("", "pw").validate().unwrap_err();
        assert_eq!(err.message, LOGIN_REQUIRED_MESSAGE);
        assert!(LoginParams::new("alice", "").validate().is_err());
    }

    #[test]
    fn test_register_validation() {
        let mut params = RegisterParams {
            name: "Alice".to_string(),
            email: "a@x.id".to_string(),
            username: "alice".to_string(),
            password: "pw".to_string(),
        };
        assert!(params.validate().is_ok());
        params.email.clear();
        assert_eq!(params.validate().unwrap_err().field, "email");
    }

    #[test]
    fn test_login_operation_shape() {
        let op = LoginQuery::new(LoginParams::new("alice", "pw")).operation();
        assert_eq!(op.name, "Login");
        assert!(!op.is_mutation());
        assert_eq!(op.variables["input"]["username"], "alice");
        assert!(!LoginQuery::new(LoginParams::default()).config().cache_results);
    }

    #[tokio::test]
    async fn test_login_success_signs_in() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "operationName": "Login",
                "variables": { "input": { "username": "alice", "password": "pw" } }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "login": { "access_token": "tok-1" } }
            })))
            .mount(&server)
            .await;

        let (store, auth) = setup(&server).await;
        auth.login(&LoginParams::new("alice", "pw")).await.unwrap();

        assert!(auth.session().is_signed_in());
        assert_eq!(store.read(ACCESS_TOKEN_KEY).await.unwrap().as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn test_login_empty_field_sends_nothing() {
        let server = MockServer::start().await;
        let (_store, auth) = setup(&server).await;

        let err = auth.login(&LoginParams::new("alice", "")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_login_rejected_stays_signed_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": [{ "message": "Invalid username/password" }]
            })))
            .mount(&server)
            .await;

        let (store, auth) = setup(&server).await;
        let err = auth.login(&LoginParams::new("alice", "wrong")).await.unwrap_err();

        assert_eq!(err.user_message(), "Invalid username/password");
        assert!(!auth.session().is_signed_in());
        assert!(store.read(ACCESS_TOKEN_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_register_returns_account() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "operationName": "Register" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "register": {
                    "__typename": "User", "_id": "u1", "email": "a@x.id", "name": "Alice", "username": "alice"
                } }
            })))
            .mount(&server)
            .await;

        let (_store, auth) = setup(&server).await;
        let user = auth
            .register(RegisterParams {
                name: "Alice".to_string(),
                email: "a@x.id".to_string(),
                username: "alice".to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(user.name, "Alice");
        // Registering does not sign in
        assert!(!auth.session().is_signed_in());
    }

    #[tokio::test]
    async fn test_logout() {
        let server = MockServer::start().await;
        let (store, auth) = setup(&server).await;
        auth.session().sign_in("tok").await.unwrap();

        auth.logout().await.unwrap();

        assert!(!auth.session().is_signed_in());
        assert!(store.read(ACCESS_TOKEN_KEY).await.unwrap().is_none());
    }
}
