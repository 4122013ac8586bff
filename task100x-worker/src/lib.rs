//! # Task 100x Worker Library
//!
//! Background processing of live-session reminders.
//!
//! ## Modules
//!
//! - `config`: Worker settings from the environment
//! - `queue`: Claiming and updating due notifications
//! - `generator`: LLM-written reminders with a template fallback
//! - `channels`: Delivery providers (AiSensy WhatsApp, mock)
//! - `retry`: Exponential backoff with jitter
//! - `orchestrator`: Poll loop and per-notification jobs
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use task100x_worker::channels::{MockChannel, NotificationChannel};
//! use task100x_worker::config::WorkerSettings;
//! use task100x_worker::generator::MessageGenerator;
//! use task100x_worker::orchestrator::{Dispatcher, WorkerOrchestrator};
//! use task100x_worker::queue::NotificationQueue;
//! use task100x_worker::retry::RetryPolicy;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example(pool: sqlx::PgPool) -> anyhow::Result<()> {
//! let settings = WorkerSettings::default();
//! let queue = NotificationQueue::new(pool, settings.lease());
//! let channel: Arc<dyn NotificationChannel> = Arc::new(MockChannel::new());
//! let dispatcher = Dispatcher::new(
//!     queue.clone(),
//!     MessageGenerator::template_only(),
//!     Some(channel),
//!     RetryPolicy::from_settings(&settings),
//! );
//!
//! WorkerOrchestrator::new(queue, dispatcher, settings)
//!     .run(CancellationToken::new())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod channels;
pub mod config;
pub mod generator;
pub mod orchestrator;
pub mod queue;
pub mod retry;
