//! # Task 100x API Server Library
//!
//! HTTP API of the Task 100x cohort platform: instructors manage cohorts,
//! weekly resources, quizzes and live sessions; learners follow plans,
//! complete tasks, take quizzes and keep streaks.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Security headers
//! - `response`: Success envelope
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod response;
pub mod routes;
