//! Telesosmed client
//!
//! Headless client for the Telesosmed social network. The workspace is
//! layered bottom-up:
//!
//! - `storage` - credential persistence
//! - `api-client` - GraphQL transport, auth link and normalized cache
//! - `app-state` - queries, mutations with refetch, session state
//! - `app-core` - domain models and operations
//! - `app-ui` - navigation and screen controllers
//!
//! This crate adds configuration, logging setup and the [`App`] context
//! that ties them together.
//!
//! # Example
//!
//! ```rust,no_run
//! use telesosmed::{App, AppConfig};
//!
//! # async fn run() -> telesosmed::Result<()> {
//! // Installs logging from the config, then opens the credential store
//! let app = App::start(AppConfig::from_env()).await?;
//! println!("{}", app.navigation().current_route().title());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod app;
pub mod config;
pub mod logging;

pub use app::App;
pub use config::AppConfig;

use thiserror::Error;

/// Startup error types
#[derive(Debug, Error)]
pub enum Error {
    /// Data directory could not be created
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Credential database could not be opened
    #[error("Storage error: {0}")]
    Storage(#[from] storage::KvError),

    /// GraphQL client could not be built
    #[error("Client error: {0}")]
    Client(#[from] api_client::Error),
}

/// Result type for application startup
pub type Result<T> = std::result::Result<T, Error>;
