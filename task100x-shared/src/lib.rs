//! # Task 100x Shared Library
//!
//! This crate contains shared types, utilities, and business logic used across
//! the Task 100x API server and notification worker.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `auth`: Authentication and authorization utilities
//! - `db`: Connection pool and migrations
//! - `progress`: Streak engine, weekly progress, leaderboard and dashboard metrics
//! - `scoring`: Quiz attempt scoring and feedback
//! - `engagement`: Build-in-public post analytics
//! - `import`: Bulk learner ingestion rows
//! - `llm`: Chat-completion client and response parsing

pub mod auth;
pub mod db;
pub mod engagement;
pub mod import;
pub mod llm;
pub mod models;
pub mod progress;
pub mod scoring;

/// Current version of the Task 100x shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
