//! Application screens
//!
//! Each screen is a controller: it owns its form state and a [`ViewState`]
//! for whatever it loads, and exposes async actions that return a
//! [`ScreenOutcome`]. Rendering is left to the host.
//!
//! Every screen carries a [`MountFlag`]. Once [`MountFlag::unmount`] is
//! called, results that arrive afterwards are dropped instead of being
//! written to the screen.

use app_core::AppError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::navigation::{NavigationRequest, Route};

pub mod create_post;
pub mod home;
pub mod login;
pub mod post_detail;
pub mod profile;
pub mod register;
pub mod search_user;
pub mod user_profile;

pub use create_post::CreatePostScreen;
pub use home::{format_timestamp, HomeScreen, PostCard};
pub use login::LoginScreen;
pub use post_detail::{CommentRow, PostDetailScreen, PostDetailView};
pub use profile::{ProfileScreen, ProfileView};
pub use register::RegisterScreen;
pub use search_user::{SearchUserScreen, NO_RESULTS_MESSAGE};
pub use user_profile::UserProfileScreen;

/// Title of alerts for local failures and generic errors
pub const ERROR_TITLE: &str = "Error";

// =============================================================================
// View State
// =============================================================================

/// Loaded content of a screen
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    /// Waiting for the first result
    Loading,
    /// Load failed with this message
    Failed(String),
    /// Content available
    Ready(T),
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        ViewState::Loading
    }
}

impl<T> ViewState<T> {
    /// Check if still loading
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    /// Content, if ready
    pub fn data(&self) -> Option<&T> {
        match self {
            ViewState::Ready(data) => Some(data),
            _ => None,
        }
    }

    /// Failure message, if failed
    pub fn error(&self) -> Option<&str> {
        match self {
            ViewState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// Blocking message box
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// Title
    pub title: String,
    /// Body
    pub message: String,
}

impl Alert {
    /// Create an alert
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Result of a screen action
///
/// `error` keeps the failure that produced `alert` so the host can react
/// to it (an expired session forces a logout).
#[derive(Debug, Default)]
pub struct ScreenOutcome {
    /// Navigation to perform
    pub navigation: Option<NavigationRequest>,
    /// Alert to show
    pub alert: Option<Alert>,
    /// Failure behind the alert
    pub error: Option<AppError>,
}

impl ScreenOutcome {
    /// Nothing to do
    pub fn none() -> Self {
        Self::default()
    }

    /// Navigate
    pub fn navigate(request: NavigationRequest) -> Self {
        Self {
            navigation: Some(request),
            ..Self::default()
        }
    }

    /// Push a route
    pub fn push(route: Route) -> Self {
        Self::navigate(NavigationRequest::Push(route))
    }

    /// Show an alert
    pub fn alert(alert: Alert) -> Self {
        Self {
            alert: Some(alert),
            ..Self::default()
        }
    }

    /// Show a failure under `title`
    pub fn failed(title: &str, error: AppError) -> Self {
        let mut message = error.user_message();
        if message.trim().is_empty() {
            message = "Try again later".to_string();
        }
        Self {
            navigation: None,
            alert: Some(Alert::new(title, message)),
            error: Some(error),
        }
    }

    /// Add a navigation request
    pub fn with_navigation(mut self, request: NavigationRequest) -> Self {
        self.navigation = Some(request);
        self
    }

    /// Check if the outcome carries nothing
    pub fn is_empty(&self) -> bool {
        self.navigation.is_none() && self.alert.is_none() && self.error.is_none()
    }
}

// =============================================================================
// Mount Flag
// =============================================================================

/// Shared mounted/unmounted flag
///
/// Clones observe the same flag, so a host can unmount a screen while one
/// of its actions is still running.
#[derive(Debug, Clone)]
pub struct MountFlag(Arc<AtomicBool>);

impl Default for MountFlag {
    fn default() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }
}

impl MountFlag {
    /// Create a mounted flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the screen is still mounted
    pub fn is_mounted(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Mark the screen unmounted
    pub fn unmount(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Outcome for a result that arrived after unmount
fn discarded(screen: &'static str, action: &'static str) -> ScreenOutcome {
    tracing::debug!(screen, action, "result arrived after unmount, discarded");
    ScreenOutcome::none()
}

// =============================================================================
// Screen
// =============================================================================

/// Any screen, as opened for a route
pub enum Screen {
    /// Sign in
    Login(LoginScreen),
    /// Create account
    Register(RegisterScreen),
    /// Feed
    Home(HomeScreen),
    /// Post detail
    PostDetail(PostDetailScreen),
    /// Composer
    CreatePost(CreatePostScreen),
    /// User search
    SearchUser(SearchUserScreen),
    /// Own profile
    Profile(ProfileScreen),
    /// Other user's profile
    UserProfile(UserProfileScreen),
}

impl Screen {
    /// Mount flag of the wrapped screen
    pub fn mount_flag(&self) -> &MountFlag {
        match self {
            Screen::Login(s) => s.mount_flag(),
            Screen::Register(s) => s.mount_flag(),
            Screen::Home(s) => s.mount_flag(),
            Screen::PostDetail(s) => s.mount_flag(),
            Screen::CreatePost(s) => s.mount_flag(),
            Screen::SearchUser(s) => s.mount_flag(),
            Screen::Profile(s) => s.mount_flag(),
            Screen::UserProfile(s) => s.mount_flag(),
        }
    }

    /// Run the screen's initial load; screens without one do nothing
    pub async fn load(&mut self) -> ScreenOutcome {
        match self {
            Screen::Home(s) => s.load().await,
            Screen::PostDetail(s) => s.load().await,
            Screen::Profile(s) => s.load().await,
            Screen::UserProfile(s) => s.load().await,
            Screen::Login(_) | Screen::Register(_) | Screen::CreatePost(_) | Screen::SearchUser(_) => {
                ScreenOutcome::none()
            }
        }
    }

    /// Unmount the wrapped screen
    pub fn unmount(&self) {
        self.mount_flag().unmount();
    }
}
