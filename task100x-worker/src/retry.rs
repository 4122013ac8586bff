/// Retry policy for failed deliveries
///
/// The delay before attempt `n + 1` is `base * 2^(n - 1)`, capped, plus up to
/// 10% random jitter so notifications that failed together do not retry in
/// lockstep.
///
/// ```
/// use std::time::Duration;
/// use task100x_worker::retry::RetryPolicy;
///
/// let policy = RetryPolicy::new(Duration::from_secs(30), Duration::from_secs(600), 5);
/// assert_eq!(policy.backoff(1), Duration::from_secs(30));
/// assert_eq!(policy.backoff(3), Duration::from_secs(120));
/// assert_eq!(policy.backoff(10), Duration::from_secs(600));
/// ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::config::WorkerSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    base: Duration,
    cap: Duration,
    max_attempts: i32,
}

/// What to do with a notification after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAction {
    /// Try again at the given time
    Retry { at: DateTime<Utc> },

    /// Give up and mark the notification FAILED
    GiveUp,
}

impl RetryPolicy {
    pub fn new(base: Duration, cap: Duration, max_attempts: i32) -> Self {
        Self {
            base,
            cap: cap.max(base),
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn from_settings(settings: &WorkerSettings) -> Self {
        Self::new(
            Duration::from_secs(settings.backoff_base_secs),
            Duration::from_secs(settings.backoff_cap_secs),
            settings.max_attempts,
        )
    }

    pub fn max_attempts(&self) -> i32 {
        self.max_attempts
    }

    /// Delay after the `attempts`-th failure, without jitter
    pub fn backoff(&self, attempts: i32) -> Duration {
        let exponent = attempts.saturating_sub(1).clamp(0, 31) as u32;
        self.base
            .checked_mul(2u32.saturating_pow(exponent))
            .map_or(self.cap, |d| d.min(self.cap))
    }

    /// Decides the next step once `attempts` attempts have failed
    pub fn on_failure(&self, attempts: i32, permanent: bool, now: DateTime<Utc>) -> FailureAction {
        if permanent || attempts >= self.max_attempts {
            return FailureAction::GiveUp;
        }

        let delay = jittered(self.backoff(attempts));
        let delay = chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::days(365));
        FailureAction::Retry {
            at: now.checked_add_signed(delay).unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }
}

fn jittered(delay: Duration) -> Duration {
    let max_jitter = delay.as_millis() as u64 / 10;
    if max_jitter == 0 {
        return delay;
    }
    delay + Duration::from_millis(rand::thread_rng().gen_range(0..=max_jitter))
}
