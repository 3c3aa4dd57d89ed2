//! Application context
//!
//! [`App`] wires the credential store, GraphQL client, query and mutation
//! clients and session state together, owns the navigation tree and builds
//! screens bound to the shared clients.

use api_client::{AuthLink, GraphQLClient};
use app_core::auth::AuthService;
use app_core::AppError;
use app_state::{MutationClient, QueryClient, SessionState, SessionStatus, SessionWatcher};
use app_ui::navigation::{NavigationTree, Route, Router};
use app_ui::screens::{
    CreatePostScreen, HomeScreen, LoginScreen, PostDetailScreen, ProfileScreen, RegisterScreen,
    Screen, ScreenOutcome, SearchUserScreen, UserProfileScreen,
};
use app_ui::Alert;
use std::sync::Arc;
use storage::{CredentialStore, KvCredentialStore, KvStore};

use crate::config::AppConfig;
use crate::{logging, Result};

/// Shown when the server rejects the session token
pub const SESSION_EXPIRED_TITLE: &str = "Session expired";

/// Running application
pub struct App {
    config: AppConfig,
    mutations: MutationClient,
    auth: AuthService,
    watcher: SessionWatcher,
    navigation: NavigationTree,
    router: Router,
}

impl App {
    /// Install logging, open the credential database under the configured
    /// data directory and start
    ///
    /// Logging is set up from [`AppConfig::logging_config`]; a subscriber
    /// installed earlier by the host is kept.
    pub async fn start(config: AppConfig) -> Result<Self> {
        if !logging::init(&config.logging_config()) {
            tracing::debug!("tracing subscriber already installed");
        }
        std::fs::create_dir_all(&config.data_dir)?;
        let kv = KvStore::new(config.kv_config())?;
        Self::with_store(config, Arc::new(KvCredentialStore::new(kv))).await
    }

    /// Start with the given credential store
    pub async fn with_store(config: AppConfig, store: Arc<dyn CredentialStore>) -> Result<Self> {
        let link = AuthLink::new(store.clone());
        let graphql = GraphQLClient::new(config.client_config(), Arc::new(link))?;
        let queries = QueryClient::new(Arc::new(graphql));
        let session = Arc::new(SessionState::bootstrap(store, queries.clone()).await);

        let mut watcher = session.watch();
        let navigation = NavigationTree::for_status(watcher.observe());
        let mutations = MutationClient::new(queries);
        let auth = AuthService::new(mutations.clone(), session);

        tracing::info!(endpoint = %config.endpoint, signed_in = navigation.is_authenticated(), "app started");

        Ok(Self {
            config,
            mutations,
            auth,
            watcher,
            navigation,
            router: Router::new(),
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Session state
    pub fn session(&self) -> &Arc<SessionState> {
        self.auth.session()
    }

    /// Current session status
    pub fn status(&self) -> SessionStatus {
        self.session().status()
    }

    /// Query client shared by all screens
    pub fn queries(&self) -> &QueryClient {
        self.mutations.query_client()
    }

    /// Mutation client shared by all screens
    pub fn mutations(&self) -> &MutationClient {
        &self.mutations
    }

    /// Authentication service
    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    /// Navigation tree
    pub fn navigation(&self) -> &NavigationTree {
        &self.navigation
    }

    /// Mutable navigation tree
    pub fn navigation_mut(&mut self) -> &mut NavigationTree {
        &mut self.navigation
    }

    /// Rebuild the navigation tree if the session status changed
    ///
    /// Returns whether the tree was replaced.
    pub fn sync_navigation(&mut self) -> bool {
        let status = self.watcher.observe();
        if self.navigation.matches(status) {
            return false;
        }
        tracing::info!(?status, "session changed, rebuilding navigation");
        self.navigation = NavigationTree::for_status(status);
        true
    }

    /// Sign out and show the login stack
    pub async fn logout(&mut self) -> app_core::Result<()> {
        self.auth.logout().await?;
        self.sync_navigation();
        Ok(())
    }

    /// React to a failure surfaced by a screen
    ///
    /// A rejected token while signed in forces a logout and returns the
    /// alert to show instead of the screen's own.
    pub async fn report_error(&mut self, error: &AppError) -> Option<Alert> {
        if !error.is_unauthenticated() || !self.session().is_signed_in() {
            return None;
        }

        tracing::warn!(error = %error, "token rejected, signing out");
        if let Err(e) = self.logout().await {
            tracing::error!(error = %e, "forced logout failed");
        }
        Some(Alert::new(SESSION_EXPIRED_TITLE, "Please log in again."))
    }

    /// Apply a screen outcome and return the alert to show
    pub async fn handle(&mut self, outcome: ScreenOutcome) -> Option<Alert> {
        if let Some(error) = &outcome.error {
            if let Some(alert) = self.report_error(error).await {
                return Some(alert);
            }
        }

        self.sync_navigation();
        if let Some(request) = outcome.navigation {
            self.navigation.apply(request);
        }
        outcome.alert
    }

    /// Follow a deep link
    pub fn open_path(&mut self, path: &str) -> bool {
        let route = self.router.match_path(path);
        self.navigation.open(route)
    }

    /// Screen for the visible route
    pub fn current_screen(&self) -> Option<Screen> {
        self.screen_for(self.navigation.current_route())
    }

    /// Build the screen for `route`, or `None` for an unknown route
    pub fn screen_for(&self, route: &Route) -> Option<Screen> {
        let screen = match route {
            Route::Login => Screen::Login(self.login_screen()),
            Route::Register => Screen::Register(self.register_screen()),
            Route::Home => Screen::Home(self.home_screen()),
            Route::PostDetail { post_id } => Screen::PostDetail(self.post_detail_screen(post_id)),
            Route::CreatePost => Screen::CreatePost(self.create_post_screen()),
            Route::SearchUser => Screen::SearchUser(self.search_user_screen()),
            Route::Profile => Screen::Profile(self.profile_screen()),
            Route::UserProfile { user_id } => Screen::UserProfile(self.user_profile_screen(user_id)),
            Route::NotFound => return None,
        };
        Some(screen)
    }

    /// Login screen
    pub fn login_screen(&self) -> LoginScreen {
        LoginScreen::new(self.auth.clone())
    }

    /// Registration screen
    pub fn register_screen(&self) -> RegisterScreen {
        RegisterScreen::new(self.auth.clone())
    }

    /// Feed screen
    pub fn home_screen(&self) -> HomeScreen {
        HomeScreen::new(&self.mutations)
    }

    /// Post detail screen
    pub fn post_detail_screen(&self, post_id: &str) -> PostDetailScreen {
        PostDetailScreen::new(&self.mutations, post_id)
    }

    /// Composer screen
    pub fn create_post_screen(&self) -> CreatePostScreen {
        CreatePostScreen::new(&self.mutations)
    }

    /// User search screen
    pub fn search_user_screen(&self) -> SearchUserScreen {
        SearchUserScreen::new(&self.mutations)
    }

    /// Own profile screen
    pub fn profile_screen(&self) -> ProfileScreen {
        ProfileScreen::new(&self.mutations, self.auth.clone())
    }

    /// Other user's profile screen
    pub fn user_profile_screen(&self, user_id: &str) -> UserProfileScreen {
        UserProfileScreen::new(&self.mutations, user_id)
    }
}
