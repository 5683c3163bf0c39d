// MediaExtractor trait and the format model parsed from yt-dlp output

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::strategy::StrategyConfig;
use crate::errors::ExtractError;

/// One candidate format as reported by the extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaFormat {
    /// Format ID (e.g. "140", "251")
    pub format_id: String,
    /// Container extension (m4a, webm, mp4)
    pub ext: String,
    /// Audio codec, "none" when absent
    pub acodec: Option<String>,
    /// Video codec, "none" when absent
    pub vcodec: Option<String>,
    /// Average audio bitrate in kbps
    pub abr: Option<f32>,
    /// Total bitrate in kbps
    pub tbr: Option<f32>,
    /// Direct media URL for this format
    pub url: Option<String>,
    /// Carries audio and no video track
    pub audio_only: bool,
}

/// Extraction result for one identifier: either a directly resolved URL,
/// a candidate format list, or both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedInfo {
    pub id: String,
    pub title: String,
    /// Top-level URL when the extractor already resolved one
    pub direct_url: Option<String>,
    pub formats: Vec<MediaFormat>,
}

/// The external extraction collaborator. The production implementation
/// shells out to yt-dlp; tests script their own.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Name of the extractor (for logging)
    fn name(&self) -> &'static str;

    /// Whether the underlying tool is installed at all
    fn is_available(&self) -> bool;

    /// Run one extraction attempt for `video_id` under the given strategy.
    async fn extract(
        &self,
        video_id: &str,
        strategy: &StrategyConfig,
    ) -> Result<ExtractedInfo, ExtractError>;
}
