//! Bounded, cancellable polling of a picker session.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::auth::TokenManager;
use crate::config::PollSettings;
use crate::error::{PickerError, Result};

use super::client::SessionClient;
use super::types::{PickerSession, SessionSnapshot};

/// Result of one poll attempt.
#[derive(Debug)]
pub enum PollStatus<T> {
    Ready(T),
    Pending,
}

/// Polling policy: fixed attempt budget, interval growth and a ceiling.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    pub interval: Duration,
    pub max_interval: Duration,
    /// Interval multiplier applied after each pending attempt.
    pub multiplier: f64,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from(&PollSettings::default())
    }
}

impl From<&PollSettings> for PollPolicy {
    fn from(settings: &PollSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            interval: settings.interval,
            max_interval: settings.max_interval,
            multiplier: settings.multiplier,
        }
    }
}

impl PollPolicy {
    /// Prefer the interval the session advertises, capped at `max_interval`.
    pub fn with_server_interval(mut self, session: &PickerSession) -> Self {
        if let Some(interval) = session
            .polling_config
            .as_ref()
            .and_then(|config| config.poll_interval())
            .filter(|interval| !interval.is_zero())
        {
            self.interval = interval.min(self.max_interval);
        }
        self
    }

    /// Run `attempt` until it reports ready, fails hard, the budget runs out,
    /// or `cancel` fires.
    ///
    /// Retryable errors count as a pending attempt.
    pub async fn run<F, Fut, T>(&self, cancel: &CancellationToken, mut attempt: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<PollStatus<T>>>,
    {
        let mut interval = self.interval;

        for n in 1..=self.max_attempts {
            if cancel.is_cancelled() {
                return Err(PickerError::Cancelled);
            }
            let outcome = tokio::select! {
                _ = cancel.cancelled() => return Err(PickerError::Cancelled),
                outcome = attempt(n) => outcome,
            };
            match outcome {
                Ok(PollStatus::Ready(value)) => return Ok(value),
                Ok(PollStatus::Pending) => {
                    tracing::debug!(attempt = n, max_attempts = self.max_attempts, "still waiting");
                }
                Err(e) if e.is_retryable() => {
                    tracing::warn!(attempt = n, error = %e, "poll attempt failed, retrying");
                }
                Err(e) => return Err(e),
            }
            if n == self.max_attempts {
                break;
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(PickerError::Cancelled),
                _ = tokio::time::sleep(interval) => {}
            }
            interval = Duration::try_from_secs_f64(
                (interval.as_secs_f64() * self.multiplier).min(self.max_interval.as_secs_f64()),
            )
            .unwrap_or(self.max_interval);
        }

        Err(PickerError::Timeout(self.max_attempts))
    }
}

/// Poll `session` until the user has picked items, then return them.
///
/// The access token is fetched per attempt so long waits survive a refresh.
pub async fn wait_for_selection(
    client: &SessionClient,
    tokens: &TokenManager,
    session: &PickerSession,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<SessionSnapshot> {
    let policy = policy.clone().with_server_interval(session);
    tracing::info!(
        session_id = %session.id,
        interval_ms = policy.interval.as_millis() as u64,
        max_attempts = policy.max_attempts,
        "waiting for selection"
    );
    let session_id = session.id.as_str();
    policy
        .run(cancel, move |_| async move {
            let token = tokens.access_token().await?;
            let snapshot = client.get_session_items(session_id, &token).await?;
            Ok(if snapshot.is_ready() {
                PollStatus::Ready(snapshot)
            } else {
                PollStatus::Pending
            })
        })
        .await
}
