// Audio stream proxy - resolves a video ID to a direct, time-limited audio
// URL through yt-dlp extraction strategies, caches the resolution, and
// relays the audio bytes to the caller without buffering.

pub mod cache;
pub mod config;
pub mod errors;
pub mod extractor;
pub mod relay;
pub mod server;

pub use cache::{CacheStats, ResolutionCache};
pub use config::Config;
pub use errors::{ExtractError, ResolveError};
pub use extractor::{MediaExtractor, StrategyRunner, YtdlpExtractor};
pub use relay::{Relay, RelayError};
pub use server::AppState;
