//! User interface layer for Telesosmed
//!
//! This crate holds the navigation model and the screen controllers. It
//! renders nothing: hosts read each screen's state, call its actions and
//! apply the returned [`screens::ScreenOutcome`].
//!
//! # Modules
//!
//! - [`navigation`] - Routes, tabs, stacks and the session-derived tree
//! - [`screens`] - Screen controllers
//!
//! # Example
//!
//! ```rust
//! use app_state::SessionStatus;
//! use app_ui::navigation::{NavigationRequest, NavigationTree, Route};
//!
//! let mut tree = NavigationTree::for_status(SessionStatus::SignedOut);
//! assert_eq!(*tree.current_route(), Route::Login);
//!
//! tree.apply(NavigationRequest::Push(Route::Register));
//! assert_eq!(tree.current_route().title(), "RegisterScreen");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod navigation;
pub mod screens;

pub use navigation::{
    NavigationRequest, NavigationStack, NavigationState, NavigationTab, NavigationTree, Route,
    RouteParams, Router, StackEntry,
};

pub use screens::{Alert, MountFlag, Screen, ScreenOutcome, ViewState};
