//! Storage layer for Telesosmed
//!
//! This crate provides the on-device key-value store and the credential
//! store that keeps the session token across restarts.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod credentials;
pub mod kv;

pub use credentials::{
    CredentialError, CredentialStore, KvCredentialStore, MemoryCredentialStore, ACCESS_TOKEN_KEY,
};
pub use kv::{KvConfig, KvError, KvStore};
