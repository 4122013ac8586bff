/// Delivery channels for session reminders
///
/// A channel takes a fully rendered [`OutboundMessage`] and hands it to a
/// provider. The orchestrator only sees the [`NotificationChannel`] trait, so
/// tests run against [`MockChannel`] and production against
/// [`AiSensyChannel`].
///
/// # Template Parameters
///
/// The WhatsApp campaign template takes five positional parameters:
///
/// ```text
/// [session title, user name, message, remaining time, status]
/// ```

pub mod aisensy;
pub mod mock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use task100x_shared::models::notification::NotificationContext;
use thiserror::Error;

pub use aisensy::AiSensyChannel;
pub use mock::MockChannel;

/// Minutes before the start at which a session counts as starting soon
const STARTING_SOON_MINUTES: i64 = 30;

/// Minutes after the start during which a session counts as live
pub const LIVE_WINDOW_MINUTES: i64 = 120;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Channel is not configured: {0}")]
    NotConfigured(String),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider rejected the message with {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid destination: {0}")]
    InvalidDestination(String),
}

impl ChannelError {
    /// Whether sending the same message again may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ChannelError::Http(_) => true,
            ChannelError::Rejected { status, .. } => *status == 429 || *status >= 500,
            ChannelError::NotConfigured(_) | ChannelError::InvalidDestination(_) => false,
        }
    }
}

/// A reminder ready to be delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Phone number in international format
    pub destination: String,
    pub user_name: String,
    pub session_title: String,
    pub body: String,
    pub remaining_time: String,
    pub status: String,
}

impl OutboundMessage {
    /// Renders a notification for delivery at `now`
    ///
    /// Returns None when the learner has no phone number.
    pub fn from_context(
        ctx: &NotificationContext,
        body: &str,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let destination = ctx
            .phone_number
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())?;

        let (remaining_time, status) = session_timing(ctx.scheduled_at, now);

        Some(Self {
            destination: destination.to_string(),
            user_name: ctx.learner_display_name().to_string(),
            session_title: ctx.session_title.clone(),
            body: body.to_string(),
            remaining_time,
            status: status.to_string(),
        })
    }

    pub fn template_params(&self) -> [&str; 5] {
        [
            self.session_title.as_str(),
            self.user_name.as_str(),
            self.body.as_str(),
            self.remaining_time.as_str(),
            self.status.as_str(),
        ]
    }
}

/// Human-readable time left before the session and its status label
pub fn session_timing(
    scheduled_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> (String, &'static str) {
    let Some(start) = scheduled_at else {
        return ("soon".to_string(), "Upcoming");
    };

    let minutes = (start - now).num_minutes();
    if minutes <= 0 {
        return ("now".to_string(), "Live now");
    }

    let remaining = match (minutes / 60, minutes % 60) {
        (0, m) => plural(m, "minute"),
        (h, 0) => plural(h, "hour"),
        (h, m) => format!("{} {}", plural(h, "hour"), plural(m, "minute")),
    };

    let status = if minutes <= STARTING_SOON_MINUTES {
        "Starting soon"
    } else {
        "Upcoming"
    };

    (remaining, status)
}

/// Whether a scheduled session is already over
///
/// Unscheduled sessions never end.
pub fn session_has_ended(scheduled_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    scheduled_at.is_some_and(|start| (now - start).num_minutes() > LIVE_WINDOW_MINUTES)
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

/// A provider that delivers reminders
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Channel name for logging
    fn name(&self) -> &str;

    async fn send(&self, message: &OutboundMessage) -> Result<(), ChannelError>;
}
