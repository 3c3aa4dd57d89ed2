//! Core application logic for Telesosmed
//!
//! This crate contains the domain models and the typed GraphQL operations
//! for authentication, posts, profiles and search, plus the services that
//! run them through the query and mutation clients.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
pub mod error;
pub mod models;
pub mod posts;
pub mod profiles;
pub mod search;
pub mod validation;

pub use error::{AppError, Result};
pub use models::{Comment, FollowResult, Like, Post, Timestamp, User, UserRef, UserSummary};
