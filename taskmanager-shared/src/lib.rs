//! # TaskManager Shared Library
//!
//! Domain types, persistence and business services used by the TaskManager
//! API server.
//!
//! ## Module Organization
//!
//! - `auth`: password hashing, JWTs, bearer extraction and ownership checks
//! - `db`: connection pool, migrations and startup seed
//! - `models`: database rows and their queries
//! - `services`: task, project, label, user and auth workflows
//! - `attachments`: task attachments behind their own storage and lookup ports
//! - `notifier`, `cache`, `clock`: collaborators injected into services

pub mod attachments;
pub mod auth;
pub mod cache;
pub mod clock;
pub mod db;
pub mod models;
pub mod notifier;
pub mod services;

/// Current version of the TaskManager shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
