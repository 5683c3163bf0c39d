// yt-dlp extractor - runs the native binary in simulate mode and parses
// its JSON dump. One invocation per strategy attempt; the strategy decides
// the player client, spoofed identity, and credential source.

use async_trait::async_trait;
use std::process::Command as StdCommand;

use super::process::{run_output_with_timeout, RunError};
use super::strategy::{CookieSource, StrategyConfig};
use super::traits::{ExtractedInfo, MediaExtractor, MediaFormat};
use crate::errors::ExtractError;

pub struct YtdlpExtractor {
    ytdlp_path: String,
    socket_timeout_secs: u32,
    outbound_proxy: Option<String>,
    pot_helper_url: Option<String>,
    /// Probed once at construction so resolve never blocks on a
    /// child-process spawn just to check availability.
    available: bool,
}

impl YtdlpExtractor {
    pub fn new(
        socket_timeout_secs: u32,
        outbound_proxy: Option<String>,
        pot_helper_url: Option<String>,
    ) -> Self {
        let ytdlp_path = Self::find_ytdlp();
        let available = Self::probe_version(&ytdlp_path);
        if !available {
            tracing::warn!(path = %ytdlp_path, "yt-dlp did not answer --version");
        }
        Self {
            ytdlp_path,
            socket_timeout_secs,
            outbound_proxy,
            pot_helper_url,
            available,
        }
    }

    fn probe_version(path: &str) -> bool {
        match StdCommand::new(path).arg("--version").output() {
            Ok(out) => out.status.success(),
            Err(_) => false,
        }
    }

    /// Find the yt-dlp binary, preferring an explicit override.
    fn find_ytdlp() -> String {
        if let Ok(custom) = std::env::var("YTDLP_PATH") {
            return custom;
        }

        let common_paths = [
            "/opt/homebrew/bin/yt-dlp",
            "/usr/local/bin/yt-dlp",
            "/usr/bin/yt-dlp",
        ];

        for path in common_paths {
            if std::path::Path::new(path).exists() {
                return path.to_string();
            }
        }

        if let Ok(output) = StdCommand::new("which").arg("yt-dlp").output() {
            if output.status.success() {
                if let Ok(path) = String::from_utf8(output.stdout) {
                    let trimmed = path.trim();
                    if !trimmed.is_empty() {
                        return trimmed.to_string();
                    }
                }
            }
        }

        "yt-dlp".to_string()
    }

    fn watch_url(video_id: &str) -> String {
        format!("https://youtube.com/watch?v={}", video_id)
    }

    /// Build the argument list for one attempt.
    fn build_args(&self, video_id: &str, strategy: &StrategyConfig) -> Vec<String> {
        let mut args = vec![
            "--dump-json".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--socket-timeout".to_string(),
            self.socket_timeout_secs.to_string(),
            "--retries".to_string(),
            "2".to_string(),
            "--user-agent".to_string(),
            strategy.user_agent.to_string(),
            "--referer".to_string(),
            strategy.referer.to_string(),
            "--extractor-args".to_string(),
            format!("youtube:player_client={}", strategy.player_client),
        ];

        match &strategy.cookies {
            CookieSource::File(path) => {
                args.push("--cookies".to_string());
                args.push(path.clone());
            }
            CookieSource::Browser(browser) => {
                args.push("--cookies-from-browser".to_string());
                args.push(browser.to_string());
            }
            CookieSource::None => {}
        }

        if strategy.use_po_token {
            if let Some(base_url) = &self.pot_helper_url {
                args.push("--extractor-args".to_string());
                args.push(format!("youtubepot-bgutilhttp:base_url={}", base_url));
            }
        }

        if let Some(proxy) = &self.outbound_proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }

        args.push(Self::watch_url(video_id));
        args
    }

    fn parse_json(stdout: &[u8]) -> Result<ExtractedInfo, ExtractError> {
        let json_str = String::from_utf8_lossy(stdout);
        let json: serde_json::Value = serde_json::from_str(&json_str)
            .map_err(|e| ExtractError::Parse(format!("invalid JSON from yt-dlp: {}", e)))?;

        Ok(ExtractedInfo {
            id: json["id"].as_str().unwrap_or("unknown").to_string(),
            title: json["title"].as_str().unwrap_or("Unknown").to_string(),
            direct_url: json["url"].as_str().map(|s| s.to_string()),
            formats: Self::parse_formats(&json),
        })
    }

    fn parse_formats(json: &serde_json::Value) -> Vec<MediaFormat> {
        // A missing formats array is not an error: single-format dumps put
        // everything at the top level and rely on direct_url.
        let Some(formats_array) = json["formats"].as_array() else {
            return Vec::new();
        };

        let mut formats = Vec::new();
        for f in formats_array {
            let acodec = f["acodec"].as_str().map(|s| s.to_string());
            let vcodec = f["vcodec"].as_str().map(|s| s.to_string());

            // A missing vcodec key means muxed or unknown, not audio-only;
            // only an explicit "none" qualifies.
            let audio_only = acodec.as_ref().map_or(false, |a| a != "none")
                && vcodec.as_ref().map_or(false, |v| v == "none");

            formats.push(MediaFormat {
                format_id: f["format_id"].as_str().unwrap_or("").to_string(),
                ext: f["ext"].as_str().unwrap_or("").to_string(),
                acodec,
                vcodec,
                abr: f["abr"].as_f64().map(|a| a as f32),
                tbr: f["tbr"].as_f64().map(|t| t as f32),
                url: f["url"].as_str().map(|s| s.to_string()),
                audio_only,
            });
        }
        formats
    }
}

#[async_trait]
impl MediaExtractor for YtdlpExtractor {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn extract(
        &self,
        video_id: &str,
        strategy: &StrategyConfig,
    ) -> Result<ExtractedInfo, ExtractError> {
        let args = self.build_args(video_id, strategy);
        tracing::debug!(
            strategy = strategy.name,
            %video_id,
            "running {} {}",
            self.ytdlp_path,
            args.join(" ")
        );

        // Give the process a little headroom over the socket timeout so
        // yt-dlp's own retries get to finish.
        let budget = u64::from(self.socket_timeout_secs) * 2;
        let output = run_output_with_timeout(&self.ytdlp_path, args, budget).await;

        match output {
            Ok(out) if out.status.success() => Self::parse_json(&out.stdout),
            Ok(out) => {
                let stderr = String::from_utf8_lossy(&out.stderr).to_string();
                Err(ExtractError::from(stderr))
            }
            Err(RunError::Timeout(secs)) => {
                tracing::warn!(strategy = strategy.name, %video_id, budget_secs = secs, "yt-dlp run timed out");
                Err(ExtractError::Timeout)
            }
            Err(RunError::Failed(detail)) => Err(ExtractError::Execution(detail)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> YtdlpExtractor {
        YtdlpExtractor {
            ytdlp_path: "yt-dlp".to_string(),
            socket_timeout_secs: 30,
            outbound_proxy: None,
            pot_helper_url: None,
            available: true,
        }
    }

    #[test]
    fn availability_is_probed_once_at_construction() {
        std::env::set_var("YTDLP_PATH", "/nonexistent/yt-dlp");
        let extractor = YtdlpExtractor::new(30, None, None);
        std::env::remove_var("YTDLP_PATH");

        // The cached answer is a field read; no process spawn per call.
        assert!(!extractor.is_available());
        assert!(!extractor.is_available());
    }

    #[test]
    fn args_carry_the_strategy_identity() {
        let args = extractor().build_args("abc123", &StrategyConfig::ios());

        assert!(args.contains(&"youtube:player_client=ios".to_string()));
        assert!(args.iter().any(|a| a.contains("iPhone")));
        assert!(args.contains(&"https://youtube.com/watch?v=abc123".to_string()));
        assert!(args.contains(&"--dump-json".to_string()));
        assert!(!args.contains(&"--cookies".to_string()));
    }

    #[test]
    fn cookie_file_becomes_cookies_flag() {
        let strategy = StrategyConfig::web(CookieSource::File("/tmp/c.txt".to_string()));
        let args = extractor().build_args("abc123", &strategy);

        let idx = args.iter().position(|a| a == "--cookies").unwrap();
        assert_eq!(args[idx + 1], "/tmp/c.txt");
    }

    #[test]
    fn pot_helper_args_only_when_configured() {
        let strategy = StrategyConfig::web(CookieSource::None);
        assert!(strategy.use_po_token);

        let without = extractor().build_args("abc123", &strategy);
        assert!(!without.iter().any(|a| a.contains("youtubepot")));

        let mut with_helper = extractor();
        with_helper.pot_helper_url = Some("http://127.0.0.1:4416".to_string());
        let with = with_helper.build_args("abc123", &strategy);
        assert!(with
            .contains(&"youtubepot-bgutilhttp:base_url=http://127.0.0.1:4416".to_string()));
    }

    #[test]
    fn parse_formats_derives_audio_only() {
        let json: serde_json::Value = serde_json::json!({
            "id": "abc123",
            "title": "t",
            "formats": [
                {"format_id": "137", "ext": "mp4", "acodec": "none", "vcodec": "avc1", "tbr": 4400.0, "url": "http://v"},
                {"format_id": "140", "ext": "m4a", "acodec": "mp4a.40.2", "vcodec": "none", "abr": 128.0, "url": "http://a"},
                {"format_id": "18", "ext": "mp4", "acodec": "mp4a.40.2", "vcodec": "avc1", "tbr": 500.0, "url": "http://muxed"}
            ]
        });

        let formats = YtdlpExtractor::parse_formats(&json);
        assert_eq!(formats.len(), 3);
        assert!(!formats[0].audio_only);
        assert!(formats[1].audio_only);
        assert!(!formats[2].audio_only);
    }

    #[test]
    fn missing_vcodec_is_not_audio_only() {
        // Muxed/unknown streams often omit the vcodec key; a loud one
        // must not beat a genuine audio-only candidate.
        let json: serde_json::Value = serde_json::json!({
            "id": "abc123",
            "title": "t",
            "formats": [
                {"format_id": "nokey", "ext": "mp4", "acodec": "mp4a.40.2", "abr": 512.0, "url": "http://muxed"},
                {"format_id": "140", "ext": "m4a", "acodec": "mp4a.40.2", "vcodec": "none", "abr": 128.0, "url": "http://a"}
            ]
        });

        let formats = YtdlpExtractor::parse_formats(&json);
        assert!(!formats[0].audio_only);
        assert!(formats[1].audio_only);

        let info = ExtractedInfo {
            id: "abc123".to_string(),
            title: "t".to_string(),
            direct_url: None,
            formats,
        };
        assert_eq!(
            crate::extractor::selection::select_audio_url(&info).as_deref(),
            Some("http://a")
        );
    }

    #[test]
    fn parse_json_reads_direct_url() {
        let raw = serde_json::json!({
            "id": "abc123",
            "title": "t",
            "url": "https://media.example/direct.m4a"
        })
        .to_string();

        let info = YtdlpExtractor::parse_json(raw.as_bytes()).unwrap();
        assert_eq!(
            info.direct_url.as_deref(),
            Some("https://media.example/direct.m4a")
        );
        assert!(info.formats.is_empty());
    }

    #[test]
    fn garbage_output_is_a_parse_error() {
        let err = YtdlpExtractor::parse_json(b"not json at all").unwrap_err();
        assert!(matches!(err, ExtractError::Parse(_)));
    }
}
