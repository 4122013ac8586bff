/// In-memory channel for tests and dry runs
///
/// Records every message it accepts. It can be told to reject messages with
/// a given HTTP status, either always or for the first N sends, to exercise
/// the retry path.
///
/// # Example
///
/// ```
/// use task100x_worker::channels::{MockChannel, NotificationChannel, OutboundMessage};
///
/// # async fn example() {
/// let channel = MockChannel::failing_first(1, 503);
/// let message = OutboundMessage {
///     destination: "+919800000000".to_string(),
///     user_name: "Asha".to_string(),
///     session_title: "System design".to_string(),
///     body: "See you there".to_string(),
///     remaining_time: "soon".to_string(),
///     status: "Upcoming".to_string(),
/// };
///
/// assert!(channel.send(&message).await.is_err());
/// assert!(channel.send(&message).await.is_ok());
/// assert_eq!(channel.sent().len(), 1);
/// # }
/// ```

use std::sync::Mutex;

use async_trait::async_trait;

use super::{ChannelError, NotificationChannel, OutboundMessage};

#[derive(Debug, Default)]
struct MockState {
    sent: Vec<OutboundMessage>,
    attempts: usize,
}

#[derive(Debug, Default)]
pub struct MockChannel {
    state: Mutex<MockState>,

    /// Status to reject with, if any
    fail_status: Option<u16>,

    /// Number of sends to reject; None rejects every send
    fail_count: Option<usize>,
}

impl MockChannel {
    /// Channel that accepts everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Channel that rejects every send with `status`
    pub fn failing(status: u16) -> Self {
        Self {
            fail_status: Some(status),
            ..Self::default()
        }
    }

    /// Channel that rejects the first `count` sends with `status`
    pub fn failing_first(count: usize, status: u16) -> Self {
        Self {
            fail_status: Some(status),
            fail_count: Some(count),
            ..Self::default()
        }
    }

    /// Messages accepted so far
    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.lock().sent.clone()
    }

    /// Sends attempted so far, accepted or not
    pub fn attempts(&self) -> usize {
        self.lock().attempts
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the recorded messages
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl NotificationChannel for MockChannel {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send(&self, message: &OutboundMessage) -> Result<(), ChannelError> {
        let mut state = self.lock();
        state.attempts += 1;

        if let Some(status) = self.fail_status {
            let rejecting = self.fail_count.map_or(true, |n| state.attempts <= n);
            if rejecting {
                return Err(ChannelError::Rejected {
                    status,
                    body: format!("Simulated failure on attempt {}", state.attempts),
                });
            }
        }

        state.sent.push(message.clone());
        Ok(())
    }
}
