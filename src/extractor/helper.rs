// Reachability probe for the loopback PO-token provider.
//
// The provider is consulted by yt-dlp itself; the proxy only ever asks
// "is it up?" so exhaustion errors can tell an operator whether the
// helper was part of the problem. The probe never fails a resolution.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Bounded retry for the probe. Tests inject a zero-delay policy.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            delay: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HelperStatus {
    NotConfigured,
    Reachable,
    Unreachable,
}

impl fmt::Display for HelperStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "not configured"),
            Self::Reachable => write!(f, "reachable"),
            Self::Unreachable => write!(f, "unreachable"),
        }
    }
}

pub struct PotHelper {
    base_url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl PotHelper {
    pub fn new(base_url: String, retry: RetryPolicy) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Best-effort: any HTTP response at all means the process is alive.
    pub async fn probe(&self) -> HelperStatus {
        let url = format!("{}/ping", self.base_url);
        for attempt in 1..=self.retry.max_attempts {
            if attempt > 1 && !self.retry.delay.is_zero() {
                tokio::time::sleep(self.retry.delay).await;
            }
            match self.client.get(&url).send().await {
                Ok(resp) => {
                    tracing::debug!(status = %resp.status(), "pot helper responded");
                    return HelperStatus::Reachable;
                }
                Err(e) => {
                    tracing::debug!(attempt, error = %e, "pot helper probe failed");
                }
            }
        }
        HelperStatus::Unreachable
    }
}
