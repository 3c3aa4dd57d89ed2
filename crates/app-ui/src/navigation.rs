//! Navigation system for Telesosmed
//!
//! This module provides a type-safe navigation framework with:
//! - Navigation stack management
//! - Tab navigation with one independent stack per tab
//! - Route definitions with deep linking support
//! - A navigation tree derived from the session status
//!
//! Routes carry only ids. Screens load everything else themselves.

use app_state::SessionStatus;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Route Parameters
// =============================================================================

/// Parameters for a route
pub type RouteParams = HashMap<String, String>;

// =============================================================================
// Route Definitions
// =============================================================================

/// All possible routes in the application
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "route", content = "params")]
pub enum Route {
    // Unauthenticated stack
    /// Sign in
    Login,
    /// Create account
    Register,

    // Home tab
    /// Post feed
    Home,
    /// A single post with its comments
    PostDetail {
        /// Post id
        post_id: String,
    },

    // Create tab
    /// Post composer
    CreatePost,

    // Search tab
    /// User search
    SearchUser,
    /// Another user's profile
    UserProfile {
        /// User id
        user_id: String,
    },

    // Profile tab
    /// The signed-in user's own profile
    Profile,

    /// Unknown path
    NotFound,
}

impl Default for Route {
    fn default() -> Self {
        Route::Login
    }
}

impl Route {
    /// Get the URL path for this route
    pub fn to_path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::Home => "/".to_string(),
            Route::PostDetail { post_id } => format!("/post/{}", urlencoding::encode(post_id)),
            Route::CreatePost => "/create".to_string(),
            Route::SearchUser => "/search".to_string(),
            Route::UserProfile { user_id } => format!("/user/{}", urlencoding::encode(user_id)),
            Route::Profile => "/profile".to_string(),
            Route::NotFound => "/not-found".to_string(),
        }
    }

    /// Check if this route needs a signed-in session
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Route::Login | Route::Register | Route::NotFound)
    }

    /// Get a display title for this route
    pub fn title(&self) -> &'static str {
        match self {
            Route::Login => "LoginScreen",
            Route::Register => "RegisterScreen",
            Route::Home => "Home",
            Route::PostDetail { .. } => "Detail Post",
            Route::CreatePost => "Create Post",
            Route::SearchUser => "Search User",
            Route::UserProfile { .. } => "Profile",
            Route::Profile => "Profile",
            Route::NotFound => "Not Found",
        }
    }

    /// The tab whose stack this route lives in
    pub fn tab(&self) -> Option<NavigationTab> {
        match self {
            Route::Home | Route::PostDetail { .. } => Some(NavigationTab::Home),
            Route::CreatePost => Some(NavigationTab::CreatePost),
            Route::SearchUser | Route::UserProfile { .. } => Some(NavigationTab::Search),
            Route::Profile => Some(NavigationTab::Profile),
            Route::Login | Route::Register | Route::NotFound => None,
        }
    }
}

// =============================================================================
// Navigation Tabs
// =============================================================================

/// Main navigation tabs, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NavigationTab {
    /// Feed and post detail
    #[default]
    Home,
    /// Post composer
    CreatePost,
    /// User search and other users' profiles
    Search,
    /// Own profile
    Profile,
}

impl NavigationTab {
    /// Get the root route for this tab
    pub fn root_route(&self) -> Route {
        match self {
            NavigationTab::Home => Route::Home,
            NavigationTab::CreatePost => Route::CreatePost,
            NavigationTab::Search => Route::SearchUser,
            NavigationTab::Profile => Route::Profile,
        }
    }

    /// Get icon name for this tab; unfocused tabs use the outline variant
    pub fn icon(&self, focused: bool) -> &'static str {
        match (self, focused) {
            (NavigationTab::Home, true) => "home",
            (NavigationTab::Home, false) => "home-outline",
            (NavigationTab::CreatePost, true) => "add-circle",
            (NavigationTab::CreatePost, false) => "add-circle-outline",
            (NavigationTab::Search, true) => "search",
            (NavigationTab::Search, false) => "search-outline",
            (NavigationTab::Profile, true) => "person",
            (NavigationTab::Profile, false) => "person-outline",
        }
    }

    /// Get label for this tab
    pub fn label(&self) -> &'static str {
        match self {
            NavigationTab::Home => "Home",
            NavigationTab::CreatePost => "Create Post",
            NavigationTab::Search => "Search",
            NavigationTab::Profile => "Profile",
        }
    }

    /// Get all tabs in order
    pub fn all() -> [NavigationTab; 4] {
        [
            NavigationTab::Home,
            NavigationTab::CreatePost,
            NavigationTab::Search,
            NavigationTab::Profile,
        ]
    }

    fn index(&self) -> usize {
        match self {
            NavigationTab::Home => 0,
            NavigationTab::CreatePost => 1,
            NavigationTab::Search => 2,
            NavigationTab::Profile => 3,
        }
    }
}

// =============================================================================
// Navigation Stack
// =============================================================================

/// A navigation stack entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackEntry {
    /// The route
    pub route: Route,
    /// Unique key for this entry
    pub key: String,
}

impl StackEntry {
    /// Create a new stack entry
    pub fn new(route: Route) -> Self {
        Self {
            route,
            key: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// Navigation stack; the root entry is always present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationStack {
    root: StackEntry,
    /// Entries above the root (bottom to top)
    above: Vec<StackEntry>,
}

impl NavigationStack {
    /// Create a new navigation stack with a root route
    pub fn new(root: Route) -> Self {
        Self {
            root: StackEntry::new(root),
            above: Vec::new(),
        }
    }

    /// Push a route onto the stack
    pub fn push(&mut self, route: Route) {
        self.above.push(StackEntry::new(route));
    }

    /// Pop the top route (returns true if popped, false if at root)
    pub fn pop(&mut self) -> bool {
        self.above.pop().is_some()
    }

    /// Pop to root
    pub fn pop_to_root(&mut self) {
        self.above.clear();
    }

    /// Replace the top route
    pub fn replace(&mut self, route: Route) {
        match self.above.last_mut() {
            Some(last) => *last = StackEntry::new(route),
            None => self.root = StackEntry::new(route),
        }
    }

    /// Get the current (top) route
    pub fn current(&self) -> &Route {
        &self.current_entry().route
    }

    /// Get the current stack entry
    pub fn current_entry(&self) -> &StackEntry {
        self.above.last().unwrap_or(&self.root)
    }

    /// Get the root route
    pub fn root(&self) -> &Route {
        &self.root.route
    }

    /// Check if we can go back
    pub fn can_go_back(&self) -> bool {
        !self.above.is_empty()
    }

    /// Get stack depth
    pub fn depth(&self) -> usize {
        self.above.len() + 1
    }

    /// Routes bottom to top
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        std::iter::once(&self.root).chain(&self.above).map(|e| &e.route)
    }

    /// Reset to a new root
    pub fn reset(&mut self, route: Route) {
        *self = Self::new(route);
    }
}

// =============================================================================
// Navigation State
// =============================================================================

/// Tab navigation state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationState {
    /// Current active tab
    pub active_tab: NavigationTab,
    /// Stacks for each tab, in [`NavigationTab::all`] order
    tab_stacks: [NavigationStack; 4],
}

impl Default for NavigationState {
    fn default() -> Self {
        Self {
            active_tab: NavigationTab::Home,
            tab_stacks: NavigationTab::all().map(|tab| NavigationStack::new(tab.root_route())),
        }
    }
}

impl NavigationState {
    /// Create a new navigation state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the stack for a tab
    pub fn stack(&self, tab: NavigationTab) -> &NavigationStack {
        &self.tab_stacks[tab.index()]
    }

    /// Get the current stack for the active tab
    pub fn current_stack(&self) -> &NavigationStack {
        self.stack(self.active_tab)
    }

    /// Get mutable current stack
    pub fn current_stack_mut(&mut self) -> &mut NavigationStack {
        &mut self.tab_stacks[self.active_tab.index()]
    }

    /// Get the current route
    pub fn current_route(&self) -> &Route {
        self.current_stack().current()
    }

    /// Navigate to a route on the active tab
    pub fn navigate(&mut self, route: Route) {
        self.current_stack_mut().push(route);
    }

    /// Go back on the active tab
    ///
    /// At the root of any tab other than Home, going back returns to Home.
    pub fn go_back(&mut self) -> bool {
        if self.current_stack_mut().pop() {
            return true;
        }
        if self.active_tab != NavigationTab::Home {
            self.active_tab = NavigationTab::Home;
            return true;
        }
        false
    }

    /// Switch to a tab, keeping its stack
    pub fn switch_tab(&mut self, tab: NavigationTab) {
        self.active_tab = tab;
    }

    /// Reset to tab root
    pub fn reset_to_tab(&mut self, tab: NavigationTab) {
        self.tab_stacks[tab.index()].pop_to_root();
        self.active_tab = tab;
    }

    /// Check if we can go back
    pub fn can_go_back(&self) -> bool {
        self.current_stack().can_go_back() || self.active_tab != NavigationTab::Home
    }

    /// Reset entire navigation state
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// =============================================================================
// Navigation Tree
// =============================================================================

/// Navigation requested by a screen action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationRequest {
    /// Push a route on the current stack
    Push(Route),
    /// Replace the current route
    Replace(Route),
    /// Pop the current route
    GoBack,
}

/// Everything the user can reach, as a function of the session status
///
/// Signed out, only the Login/Register stack exists; signed in, only the
/// tabs do. Rebuilding on a status change discards the other side's
/// history.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationTree {
    /// Login stack
    Unauthenticated(NavigationStack),
    /// Tab set
    Authenticated(NavigationState),
}

impl NavigationTree {
    /// Build the tree for a session status
    pub fn for_status(status: SessionStatus) -> Self {
        match status {
            SessionStatus::SignedOut => NavigationTree::Unauthenticated(NavigationStack::new(Route::Login)),
            SessionStatus::SignedIn => NavigationTree::Authenticated(NavigationState::new()),
        }
    }

    /// Check if this is the tab set
    pub fn is_authenticated(&self) -> bool {
        matches!(self, NavigationTree::Authenticated(_))
    }

    /// Whether the tree matches a session status
    pub fn matches(&self, status: SessionStatus) -> bool {
        self.is_authenticated() == status.is_signed_in()
    }

    /// Get the visible route
    pub fn current_route(&self) -> &Route {
        match self {
            NavigationTree::Unauthenticated(stack) => stack.current(),
            NavigationTree::Authenticated(state) => state.current_route(),
        }
    }

    /// Tab state, when signed in
    pub fn tabs(&self) -> Option<&NavigationState> {
        match self {
            NavigationTree::Authenticated(state) => Some(state),
            NavigationTree::Unauthenticated(_) => None,
        }
    }

    /// Mutable tab state, when signed in
    pub fn tabs_mut(&mut self) -> Option<&mut NavigationState> {
        match self {
            NavigationTree::Authenticated(state) => Some(state),
            NavigationTree::Unauthenticated(_) => None,
        }
    }

    /// The stack currently shown
    pub fn current_stack(&self) -> &NavigationStack {
        match self {
            NavigationTree::Unauthenticated(stack) => stack,
            NavigationTree::Authenticated(state) => state.current_stack(),
        }
    }

    fn current_stack_mut(&mut self) -> &mut NavigationStack {
        match self {
            NavigationTree::Unauthenticated(stack) => stack,
            NavigationTree::Authenticated(state) => state.current_stack_mut(),
        }
    }

    /// Apply a screen's navigation request
    ///
    /// Routes from the other side of the auth boundary are refused.
    /// Returns whether the tree changed.
    pub fn apply(&mut self, request: NavigationRequest) -> bool {
        match request {
            NavigationRequest::Push(route) => {
                if !self.accepts(&route) {
                    tracing::debug!(route = ?route, "navigation refused");
                    return false;
                }
                self.current_stack_mut().push(route);
                true
            }
            NavigationRequest::Replace(route) => {
                if !self.accepts(&route) {
                    tracing::debug!(route = ?route, "navigation refused");
                    return false;
                }
                self.current_stack_mut().replace(route);
                true
            }
            NavigationRequest::GoBack => match self {
                NavigationTree::Unauthenticated(stack) => stack.pop(),
                NavigationTree::Authenticated(state) => state.go_back(),
            },
        }
    }

    /// Open a deep link
    ///
    /// Signed in, the route's tab is activated and the route pushed onto
    /// it unless it is the tab root.
    pub fn open(&mut self, route: Route) -> bool {
        if !self.accepts(&route) {
            return false;
        }
        match self {
            NavigationTree::Unauthenticated(stack) => {
                if stack.current() != &route {
                    stack.push(route);
                }
            }
            NavigationTree::Authenticated(state) => {
                let Some(tab) = route.tab() else {
                    return false;
                };
                if route == tab.root_route() {
                    state.reset_to_tab(tab);
                } else {
                    state.switch_tab(tab);
                    state.navigate(route);
                }
            }
        }
        true
    }

    fn accepts(&self, route: &Route) -> bool {
        *route != Route::NotFound && route.requires_auth() == self.is_authenticated()
    }
}

// =============================================================================
// Router
// =============================================================================

/// Route pattern for matching
struct RoutePattern {
    /// Pattern segments
    segments: Vec<PatternSegment>,
    /// Route builder
    builder: fn(RouteParams) -> Option<Route>,
}

/// Segment type in a pattern
#[derive(Debug, Clone)]
enum PatternSegment {
    /// Literal segment
    Literal(String),
    /// Parameter segment
    Param(String),
}

/// URL Router for parsing paths to routes
pub struct Router {
    /// Route patterns
    patterns: Vec<RoutePattern>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Create a new router with all routes
    pub fn new() -> Self {
        let mut router = Self {
            patterns: Vec::new(),
        };

        router.add_route("/login", |_| Some(Route::Login));
        router.add_route("/register", |_| Some(Route::Register));
        router.add_route("/", |_| Some(Route::Home));
        router.add_route("/post/:id", |params| {
            Some(Route::PostDetail {
                post_id: params.get("id")?.clone(),
            })
        });
        router.add_route("/create", |_| Some(Route::CreatePost));
        router.add_route("/search", |_| Some(Route::SearchUser));
        router.add_route("/user/:id", |params| {
            Some(Route::UserProfile {
                user_id: params.get("id")?.clone(),
            })
        });
        router.add_route("/profile", |_| Some(Route::Profile));

        router
    }

    /// Add a route pattern
    fn add_route(&mut self, pattern: &str, builder: fn(RouteParams) -> Option<Route>) {
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix(':') {
                Some(name) => PatternSegment::Param(name.to_string()),
                None => PatternSegment::Literal(s.to_string()),
            })
            .collect();

        self.patterns.push(RoutePattern { segments, builder });
    }

    /// Match a path to a route
    pub fn match_path(&self, path: &str) -> Route {
        let pathname = path.split(['?', '#']).next().unwrap_or_default();
        let path_segments: Vec<&str> = pathname.split('/').filter(|s| !s.is_empty()).collect();

        for pattern in &self.patterns {
            if let Some(params) = Self::match_pattern(&pattern.segments, &path_segments) {
                if let Some(route) = (pattern.builder)(params) {
                    return route;
                }
            }
        }

        Route::NotFound
    }

    /// Match a pattern against path segments
    fn match_pattern(pattern: &[PatternSegment], path: &[&str]) -> Option<RouteParams> {
        if pattern.len() != path.len() {
            return None;
        }

        let mut params = RouteParams::new();
        for (segment, actual) in pattern.iter().zip(path.iter()) {
            match segment {
                PatternSegment::Literal(expected) => {
                    if expected != actual {
                        return None;
                    }
                }
                PatternSegment::Param(name) => {
                    let value = urlencoding::decode(actual).ok()?.into_owned();
                    if value.is_empty() {
                        return None;
                    }
                    params.insert(name.clone(), value);
                }
            }
        }

        Some(params)
    }
}

// =============================================================================
// Tests
// =============================================================================
