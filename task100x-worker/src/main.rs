//! # Task 100x Worker
//!
//! Drafts and delivers live-session reminders.
//!
//! PENDING notifications get a message (LLM or template) and become DRAFT.
//! Once an instructor approves them they are QUEUED, and the worker delivers
//! them over WhatsApp with retries. Without AiSensy credentials the worker
//! only drafts.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://... AISENSY_API_KEY=... AISENSY_CAMPAIGN_NAME=... \
//!     cargo run -p task100x-worker
//! ```

use std::sync::Arc;
use std::time::Duration;

use task100x_shared::db::pool::{close_pool, connect_with_retry, DatabaseConfig};
use task100x_shared::llm::LlmClient;
use task100x_worker::channels::{AiSensyChannel, NotificationChannel};
use task100x_worker::config::Config;
use task100x_worker::generator::MessageGenerator;
use task100x_worker::orchestrator::{Dispatcher, WorkerOrchestrator};
use task100x_worker::queue::NotificationQueue;
use task100x_worker::retry::RetryPolicy;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DB_CONNECT_ATTEMPTS: u32 = 5;
const DB_RETRY_DELAY: Duration = Duration::from_secs(5);

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "task100x_worker=debug".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|f| f.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!(
        "Task 100x Worker v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let db_config = DatabaseConfig {
        url: config.database_url.clone(),
        max_connections: config.database_max_connections,
        ..DatabaseConfig::default()
    };
    let pool = connect_with_retry(db_config, DB_CONNECT_ATTEMPTS, DB_RETRY_DELAY).await?;

    let llm = match config.llm.clone() {
        Some(llm_config) => Some(LlmClient::new(llm_config)?),
        None => {
            tracing::warn!("LLM_API_KEY not set, reminders use the template");
            None
        }
    };

    let channel: Option<Arc<dyn NotificationChannel>> = if config.aisensy.is_configured() {
        Some(Arc::new(AiSensyChannel::new(&config.aisensy)?))
    } else {
        tracing::warn!("AiSensy is not configured, queued reminders will not be delivered");
        None
    };

    let queue = NotificationQueue::new(pool.clone(), config.worker.lease());
    let dispatcher = Dispatcher::new(
        queue.clone(),
        MessageGenerator::new(llm),
        channel,
        RetryPolicy::from_settings(&config.worker),
    );
    let orchestrator = WorkerOrchestrator::new(queue, dispatcher, config.worker.clone());

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            return;
        }
        tracing::info!("Shutdown signal received");
        signal_token.cancel();
    });

    orchestrator.run(shutdown).await?;

    close_pool(pool).await;
    tracing::info!("Worker stopped");

    Ok(())
}
