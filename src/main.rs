use std::sync::Arc;

use audio_stream_proxy::extractor::{strategy, PotHelper, RetryPolicy, StrategyRunner};
use audio_stream_proxy::{AppState, Config, Relay, ResolutionCache, YtdlpExtractor};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("audio_stream_proxy=info,info")),
        )
        .init();

    let config = Config::from_env();

    let extractor = Arc::new(YtdlpExtractor::new(
        config.extract_timeout_secs,
        config.outbound_proxy.clone(),
        config.pot_helper_url.clone(),
    ));

    let helper = match &config.pot_helper_url {
        Some(url) => Some(PotHelper::new(url.clone(), RetryPolicy::default())?),
        None => None,
    };

    let runner = Arc::new(StrategyRunner::new(
        extractor,
        strategy::build_strategies(config.cookies_path.as_deref()),
        config.strategy_order,
        helper,
    ));

    let cache = Arc::new(ResolutionCache::new(config.cache_ttl));
    let relay = Relay::new(config.upstream_timeout, config.cache_ttl.as_secs())?;

    let state = AppState {
        cache,
        runner: runner.clone(),
        relay,
    };

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        addr = %config.bind_addr,
        ttl_secs = config.cache_ttl.as_secs(),
        strategies = runner.strategy_count(),
        order = ?config.strategy_order,
        "audio stream proxy listening"
    );

    axum::serve(listener, audio_stream_proxy::server::router(state)).await?;
    Ok(())
}
