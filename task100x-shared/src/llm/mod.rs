/// LLM integration
///
/// A small client for OpenAI-compatible chat-completion endpoints, used to
/// write session reminders and to draft quizzes from session transcriptions.
/// Model output is free text, so everything it returns goes through
/// [`parse`] before it is trusted.

pub mod client;
pub mod parse;

pub use client::{LlmClient, LlmConfig, LlmError, ReminderContext};
pub use parse::ReminderPointers;
