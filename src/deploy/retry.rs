use std::future::Future;
use std::time::Duration;

use crate::error::DeployResult;

const MAX_ATTEMPTS: u32 = 4;
const BASE_DELAY: Duration = Duration::from_millis(500);

/// Run a remote call with bounded exponential backoff. Only transient
/// failures (rate limit, 5xx) are retried; auth, validation, and not-found
/// errors propagate immediately. Retries are invisible to the caller except
/// as latency.
pub async fn with_retry<T, F, Fut>(what: &str, mut op: F) -> DeployResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = DeployResult<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < MAX_ATTEMPTS => {
                let delay = BASE_DELAY * 2u32.pow(attempt - 1);
                tracing::warn!(
                    error = %e,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "transient failure during {}, will retry",
                    what
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
