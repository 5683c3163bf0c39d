// Service configuration, read once from the environment at startup and
// injected into the components that need it.

use std::net::SocketAddr;
use std::time::Duration;

use crate::extractor::strategy::StrategyOrder;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
const DEFAULT_EXTRACT_TIMEOUT_SECS: u32 = 30;
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server listens on.
    pub bind_addr: SocketAddr,
    /// How long a resolved audio URL is trusted before re-resolution.
    /// Must stay below the platform's own URL validity window.
    pub cache_ttl: Duration,
    /// Socket timeout passed to yt-dlp, and the hard cap on one attempt.
    pub extract_timeout_secs: u32,
    /// Timeout for the upstream media fetch. Sized for large transfers,
    /// not API calls.
    pub upstream_timeout: Duration,
    /// Whether strategies are tried in their fixed order or shuffled
    /// per resolution.
    pub strategy_order: StrategyOrder,
    /// Optional cookies.txt used by the web-client strategy.
    pub cookies_path: Option<String>,
    /// Optional outbound proxy passed through to yt-dlp.
    pub outbound_proxy: Option<String>,
    /// Base URL of the loopback PO-token provider, when deployed.
    pub pot_helper_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.parse().unwrap(),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            extract_timeout_secs: DEFAULT_EXTRACT_TIMEOUT_SECS,
            upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
            strategy_order: StrategyOrder::Fixed,
            cookies_path: None,
            outbound_proxy: None,
            pot_helper_url: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(addr) = env_parsed::<SocketAddr>("PROXY_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(secs) = env_parsed::<u64>("CACHE_TTL_SECS") {
            config.cache_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parsed::<u32>("EXTRACT_TIMEOUT_SECS") {
            config.extract_timeout_secs = secs;
        }
        if let Some(secs) = env_parsed::<u64>("UPSTREAM_TIMEOUT_SECS") {
            config.upstream_timeout = Duration::from_secs(secs);
        }
        if let Some(order) = env_parsed::<StrategyOrder>("STRATEGY_ORDER") {
            config.strategy_order = order;
        }
        config.cookies_path = non_empty_env("COOKIES_PATH");
        config.outbound_proxy = non_empty_env("OUTBOUND_PROXY");
        config.pot_helper_url = non_empty_env("POT_HELPER_URL");

        config
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = non_empty_env(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(%key, %raw, "ignoring unparsable environment value");
            None
        }
    }
}
