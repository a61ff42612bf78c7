//! # Task Manager API Server Library
//!
//! HTTP surface of the task manager: configuration, router, middleware and
//! handlers. Business rules live in `taskmanager-shared`.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Security headers and request logging
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
