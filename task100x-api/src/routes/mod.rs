/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Signup, login, token refresh and profile
/// - `cohorts`: Cohorts and the instructor dashboard
/// - `resources`: Weekly learning content
/// - `plans`: Learner plans and task completion
/// - `progress`: Streaks, weekly progress and the leaderboard
/// - `quizzes`: Quizzes, generation and attempts
/// - `sessions`: Live sessions and reminder notifications
/// - `learners`: Bulk learner import and user lookup
/// - `build_in_public`: Post engagement analytics

pub mod auth;
pub mod build_in_public;
pub mod cohorts;
pub mod health;
pub mod learners;
pub mod plans;
pub mod progress;
pub mod quizzes;
pub mod resources;
pub mod sessions;
