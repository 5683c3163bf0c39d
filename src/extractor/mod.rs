// Extraction layer - drives an external yt-dlp process through an ordered
// (or shuffled) sequence of strategy presets until one yields an
// audio-only URL.

pub mod diagnostics;
pub mod helper;
mod process;
pub mod runner;
pub mod selection;
pub mod strategy;
pub mod traits;
mod ytdlp;

pub use helper::{HelperStatus, PotHelper, RetryPolicy};
pub use runner::{ResolvedMedia, StrategyRunner};
pub use strategy::{CookieSource, StrategyConfig, StrategyOrder};
pub use traits::{ExtractedInfo, MediaExtractor, MediaFormat};
pub use ytdlp::YtdlpExtractor;
