use crate::domain::ports::PageFetcher;
use crate::utils::error::{AppError, Result};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

/// Reloads `url` until `ready` accepts the HTML or `policy.timeout` passes.
///
/// Each fetch only gets the time left in the budget, so a slow response is cut
/// off at the bound too. A timeout is fatal; fetch errors are returned at once
/// without retry.
pub async fn wait_for_page<F, R>(
    fetcher: &F,
    url: &str,
    markers: &str,
    policy: WaitPolicy,
    ready: R,
) -> Result<String>
where
    F: PageFetcher,
    R: Fn(&str) -> bool,
{
    let started = Instant::now();
    let timed_out = |waited: Duration| AppError::PageTimeout {
        url: url.to_string(),
        markers: markers.to_string(),
        waited,
    };

    loop {
        let remaining = policy.timeout.saturating_sub(started.elapsed());
        let html = tokio::time::timeout(remaining, fetcher.fetch(url))
            .await
            .map_err(|_| timed_out(started.elapsed()))??;
        if ready(&html) {
            return Ok(html);
        }

        let waited = started.elapsed();
        if waited >= policy.timeout {
            return Err(timed_out(waited));
        }

        tracing::debug!("{} not ready after {:?}, waiting for {}", url, waited, markers);
        tokio::time::sleep(policy.poll_interval.min(policy.timeout - waited)).await;
    }
}
