// Strategy runner - the resolution loop.
//
// Tries every configured strategy in order. Each attempt produces a
// tagged outcome; recoverable and fatal failures alike move on to the
// next strategy, and only full exhaustion is surfaced to the caller.

use std::sync::Arc;

use super::diagnostics::BlockReason;
use super::helper::{HelperStatus, PotHelper};
use super::selection;
use super::strategy::{self, StrategyConfig, StrategyOrder};
use super::traits::MediaExtractor;
use crate::errors::{ExtractError, ResolveError};

/// A successful resolution: the identifier, the audio URL it maps to,
/// and which strategy got through.
#[derive(Debug, Clone)]
pub struct ResolvedMedia {
    pub video_id: String,
    pub audio_url: String,
    pub strategy: &'static str,
}

enum AttemptOutcome {
    Success(String),
    Recoverable { reason: BlockReason, detail: String },
    /// The identifier itself is unusable; still counted as an attempt.
    BadInput { detail: String },
    Fatal { detail: String },
}

pub struct StrategyRunner {
    extractor: Arc<dyn MediaExtractor>,
    strategies: Vec<StrategyConfig>,
    order: StrategyOrder,
    helper: Option<PotHelper>,
}

impl StrategyRunner {
    pub fn new(
        extractor: Arc<dyn MediaExtractor>,
        strategies: Vec<StrategyConfig>,
        order: StrategyOrder,
        helper: Option<PotHelper>,
    ) -> Self {
        Self {
            extractor,
            strategies,
            order,
            helper,
        }
    }

    pub fn strategy_count(&self) -> usize {
        self.strategies.len()
    }

    /// Reachability of the PO-token helper, for diagnostics and /health.
    pub async fn probe_helper(&self) -> HelperStatus {
        match &self.helper {
            Some(helper) => helper.probe().await,
            None => HelperStatus::NotConfigured,
        }
    }

    /// Resolve an identifier to a direct audio URL, trying every strategy
    /// before giving up.
    pub async fn resolve(&self, video_id: &str) -> Result<ResolvedMedia, ResolveError> {
        if !self.extractor.is_available() {
            return Err(ResolveError::ToolNotFound(format!(
                "{} is not installed",
                self.extractor.name()
            )));
        }

        let plan = strategy::plan(&self.strategies, self.order);
        let mut attempts = 0usize;
        let mut bad_input_attempts = 0usize;
        let mut last_detail = String::new();

        for config in &plan {
            attempts += 1;
            match self.attempt(video_id, config).await {
                AttemptOutcome::Success(audio_url) => {
                    tracing::info!(
                        %video_id,
                        strategy = config.name,
                        attempt = attempts,
                        "resolved audio url"
                    );
                    return Ok(ResolvedMedia {
                        video_id: video_id.to_string(),
                        audio_url,
                        strategy: config.name,
                    });
                }
                AttemptOutcome::Recoverable { reason, detail } => {
                    if reason.another_strategy_might_help() {
                        tracing::warn!(
                            %video_id,
                            strategy = config.name,
                            %reason,
                            detail = detail.as_str(),
                            "strategy blocked, trying next"
                        );
                    } else {
                        tracing::warn!(
                            %video_id,
                            strategy = config.name,
                            %reason,
                            detail = detail.as_str(),
                            "content-level failure, trying next anyway"
                        );
                    }
                    last_detail = detail;
                }
                AttemptOutcome::BadInput { detail } => {
                    tracing::warn!(
                        %video_id,
                        strategy = config.name,
                        detail = detail.as_str(),
                        "extractor rejected the identifier"
                    );
                    bad_input_attempts += 1;
                    last_detail = detail;
                }
                AttemptOutcome::Fatal { detail } => {
                    // Unexpected faults also move on: a later strategy may
                    // still succeed, and exhaustion reporting stays uniform.
                    tracing::error!(
                        %video_id,
                        strategy = config.name,
                        detail = detail.as_str(),
                        "strategy hit an unexpected fault, trying next"
                    );
                    last_detail = detail;
                }
            }
        }

        if attempts > 0 && bad_input_attempts == attempts {
            return Err(ResolveError::InvalidInput(last_detail));
        }

        let helper = self.probe_helper().await;
        tracing::warn!(%video_id, attempts, %helper, "all strategies exhausted");
        Err(ResolveError::AllStrategiesExhausted {
            video_id: video_id.to_string(),
            attempts,
            helper,
        })
    }

    async fn attempt(&self, video_id: &str, config: &StrategyConfig) -> AttemptOutcome {
        match self.extractor.extract(video_id, config).await {
            Ok(info) => match selection::select_audio_url(&info) {
                Some(url) => AttemptOutcome::Success(url),
                None => AttemptOutcome::Recoverable {
                    reason: BlockReason::Unknown,
                    detail: "no audio-only format with a usable url".to_string(),
                },
            },
            Err(ExtractError::Denied { reason, detail }) => {
                AttemptOutcome::Recoverable { reason, detail }
            }
            Err(ExtractError::Timeout) => AttemptOutcome::Recoverable {
                reason: BlockReason::Unknown,
                detail: "extraction timed out".to_string(),
            },
            Err(ExtractError::BadInput(detail)) => AttemptOutcome::BadInput { detail },
            Err(err @ ExtractError::ToolNotFound(_))
            | Err(err @ ExtractError::Parse(_))
            | Err(err @ ExtractError::Execution(_)) => AttemptOutcome::Fatal {
                detail: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::strategy::build_strategies;
    use crate::extractor::traits::{ExtractedInfo, MediaFormat};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Plays back a fixed script of per-attempt results.
    struct ScriptedExtractor {
        script: Mutex<VecDeque<Result<ExtractedInfo, ExtractError>>>,
        calls: AtomicUsize,
        available: bool,
    }

    impl ScriptedExtractor {
        fn new(script: Vec<Result<ExtractedInfo, ExtractError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
                available: true,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MediaExtractor for ScriptedExtractor {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn is_available(&self) -> bool {
            self.available
        }

        async fn extract(
            &self,
            _video_id: &str,
            _strategy: &StrategyConfig,
        ) -> Result<ExtractedInfo, ExtractError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ExtractError::Execution("script exhausted".to_string())))
        }
    }

    fn success_info(url: &str) -> ExtractedInfo {
        ExtractedInfo {
            id: "abc123".to_string(),
            title: "t".to_string(),
            direct_url: None,
            formats: vec![MediaFormat {
                format_id: "140".to_string(),
                ext: "m4a".to_string(),
                acodec: Some("mp4a.40.2".to_string()),
                vcodec: Some("none".to_string()),
                abr: Some(128.0),
                tbr: None,
                url: Some(url.to_string()),
                audio_only: true,
            }],
        }
    }

    fn denied(detail: &str) -> ExtractError {
        ExtractError::Denied {
            reason: BlockReason::Forbidden,
            detail: detail.to_string(),
        }
    }

    fn runner(extractor: Arc<ScriptedExtractor>) -> StrategyRunner {
        StrategyRunner::new(
            extractor,
            build_strategies(None),
            StrategyOrder::Fixed,
            None,
        )
    }

    #[tokio::test]
    async fn first_failure_falls_through_to_next_strategy() {
        let extractor = Arc::new(ScriptedExtractor::new(vec![
            Err(denied("HTTP Error 403")),
            Ok(success_info("https://media.example/abc123.m4a")),
        ]));
        let runner = runner(extractor.clone());

        let resolved = runner.resolve("abc123").await.unwrap();
        assert_eq!(resolved.audio_url, "https://media.example/abc123.m4a");
        assert_eq!(resolved.strategy, "android");
        assert_eq!(extractor.calls(), 2);
    }

    #[tokio::test]
    async fn exhaustion_counts_every_configured_strategy() {
        let strategies = build_strategies(None);
        let script: Vec<_> = (0..strategies.len())
            .map(|_| Err(denied("HTTP Error 403: Forbidden")))
            .collect();
        let extractor = Arc::new(ScriptedExtractor::new(script));
        let runner = runner(extractor.clone());

        let err = runner.resolve("abc123").await.unwrap_err();
        match err {
            ResolveError::AllStrategiesExhausted {
                video_id,
                attempts,
                helper,
            } => {
                assert_eq!(video_id, "abc123");
                assert_eq!(attempts, strategies.len());
                assert_eq!(helper, HelperStatus::NotConfigured);
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
        assert_eq!(extractor.calls(), strategies.len());
    }

    #[tokio::test]
    async fn fatal_fault_does_not_abort_the_run() {
        let extractor = Arc::new(ScriptedExtractor::new(vec![
            Err(ExtractError::Parse("invalid JSON from yt-dlp".to_string())),
            Ok(success_info("https://media.example/abc123.m4a")),
        ]));
        let runner = runner(extractor.clone());

        assert!(runner.resolve("abc123").await.is_ok());
        assert_eq!(extractor.calls(), 2);
    }

    #[tokio::test]
    async fn result_without_audio_counts_as_a_failed_attempt() {
        let no_audio = ExtractedInfo {
            id: "abc123".to_string(),
            title: "t".to_string(),
            direct_url: None,
            formats: Vec::new(),
        };
        let extractor = Arc::new(ScriptedExtractor::new(vec![
            Ok(no_audio),
            Ok(success_info("https://media.example/abc123.m4a")),
        ]));
        let runner = runner(extractor.clone());

        let resolved = runner.resolve("abc123").await.unwrap();
        assert_eq!(resolved.strategy, "android");
    }

    #[tokio::test]
    async fn uniformly_bad_input_surfaces_as_invalid_input() {
        let strategies = build_strategies(None);
        let script: Vec<_> = (0..strategies.len())
            .map(|_| {
                Err(ExtractError::BadInput(
                    "ERROR: Unsupported URL".to_string(),
                ))
            })
            .collect();
        let extractor = Arc::new(ScriptedExtractor::new(script));
        let runner = runner(extractor.clone());

        let err = runner.resolve("%%%").await.unwrap_err();
        assert!(matches!(err, ResolveError::InvalidInput(_)));
        // Still no early abort
        assert_eq!(extractor.calls(), strategies.len());
    }

    #[tokio::test]
    async fn missing_tool_short_circuits() {
        let mut extractor = ScriptedExtractor::new(vec![]);
        extractor.available = false;
        let extractor = Arc::new(extractor);
        let runner = runner(extractor.clone());

        let err = runner.resolve("abc123").await.unwrap_err();
        assert!(matches!(err, ResolveError::ToolNotFound(_)));
        assert_eq!(extractor.calls(), 0);
    }
}
