//! # Simvec Accounts
//!
//! Account records for Simvec user management: the persisted account shape,
//! the password policy every password write must pass, and the storage
//! contract that assigns identities and keeps user names and emails unique.
//!
//! ## Module Organization
//!
//! - `models`: the `Account` record and its sqlx queries
//! - `auth`: password policy, Argon2id hashing, verification tokens
//! - `store`: `AccountStore` trait with PostgreSQL and in-memory backends
//! - `service`: registration, email verification and credential workflows
//! - `db`: connection pool and migrations
//! - `config`: settings from the environment
//! - `error`: the `AccountError` taxonomy

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod service;
pub mod store;

pub use error::{AccountError, AccountResult};

/// Current version of the Simvec accounts library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
