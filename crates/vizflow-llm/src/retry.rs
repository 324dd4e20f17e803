use crate::LlmError;
use reqwest::StatusCode;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Bounded retry for a briefly overloaded upstream.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub backoff: Duration,
    /// The only status that earns another attempt.
    pub retry_status: StatusCode,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff: Duration::from_secs(1),
            retry_status: StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Status and body of one upstream HTTP exchange.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub body: String,
}

/// Run `attempt` until it yields a status other than the retry status or the
/// attempt budget is spent. Transport errors end the loop immediately.
///
/// The closure receives the 1-based attempt number. The last reply is
/// returned whatever its status; classifying it is the caller's job.
pub async fn send_with_retry<F, Fut>(
    policy: &RetryPolicy,
    mut attempt: F,
) -> Result<UpstreamReply, LlmError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<UpstreamReply, LlmError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut n = 1;

    loop {
        let reply = attempt(n).await?;

        if reply.status != policy.retry_status || n >= max_attempts {
            return Ok(reply);
        }

        warn!(
            attempt = n,
            max_attempts,
            status = reply.status.as_u16(),
            "Upstream overloaded, retrying in {:?}",
            policy.backoff
        );
        tokio::time::sleep(policy.backoff).await;
        n += 1;
    }
}
