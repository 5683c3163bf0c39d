// Failure diagnostics - classifies yt-dlp stderr into blocking reasons.
//
// The runner uses the classification to pick log levels and to decide
// whether a failure looked like platform blocking or a property of the
// content itself. Classification never stops the strategy loop.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Why the platform refused an extraction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    /// HTTP 403 - general access denied
    Forbidden,
    /// 429 or equivalent throttling
    RateLimited,
    /// "Sign in to confirm you're not a bot" and friends
    BotDetection,
    /// Needs a logged-in adult account
    AgeRestricted,
    /// Not available in the requesting region
    GeoBlocked,
    /// Private video
    Private,
    /// Deleted or removed
    Unavailable,
    Unknown,
}

impl BlockReason {
    /// Whether a different strategy config plausibly gets past this.
    pub fn another_strategy_might_help(&self) -> bool {
        matches!(
            self,
            Self::Forbidden | Self::RateLimited | Self::BotDetection | Self::AgeRestricted
        )
    }
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Forbidden => "forbidden",
            Self::RateLimited => "rate_limited",
            Self::BotDetection => "bot_detection",
            Self::AgeRestricted => "age_restricted",
            Self::GeoBlocked => "geo_blocked",
            Self::Private => "private",
            Self::Unavailable => "unavailable",
            Self::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

lazy_static! {
    static ref FORBIDDEN_RE: Regex = Regex::new(r"(?i)HTTP Error 403|403: Forbidden").unwrap();
    static ref RATE_LIMIT_RE: Regex =
        Regex::new(r"(?i)HTTP Error 429|rate.?limit|too many requests").unwrap();
    static ref BOT_RE: Regex =
        Regex::new(r"(?i)sign in to confirm|not a bot|bot detection|po.?token").unwrap();
    static ref AGE_RE: Regex =
        Regex::new(r"(?i)age.restricted|confirm your age|inappropriate for some users").unwrap();
    static ref GEO_RE: Regex =
        Regex::new(r"(?i)not available in your country|geo.?restricted|blocked it in your country")
            .unwrap();
    static ref PRIVATE_RE: Regex = Regex::new(r"(?i)private video").unwrap();
    static ref UNAVAILABLE_RE: Regex =
        Regex::new(r"(?i)video unavailable|has been removed|no longer available").unwrap();
    static ref BAD_INPUT_RE: Regex =
        Regex::new(r"(?i)unsupported url|is not a valid url|incomplete youtube id|invalid video id")
            .unwrap();
}

/// Map raw error text to a blocking reason. Order matters: the specific
/// restriction messages often arrive wrapped in a 403.
pub fn classify(text: &str) -> BlockReason {
    if BOT_RE.is_match(text) {
        BlockReason::BotDetection
    } else if AGE_RE.is_match(text) {
        BlockReason::AgeRestricted
    } else if GEO_RE.is_match(text) {
        BlockReason::GeoBlocked
    } else if PRIVATE_RE.is_match(text) {
        BlockReason::Private
    } else if UNAVAILABLE_RE.is_match(text) {
        BlockReason::Unavailable
    } else if RATE_LIMIT_RE.is_match(text) {
        BlockReason::RateLimited
    } else if FORBIDDEN_RE.is_match(text) {
        BlockReason::Forbidden
    } else {
        BlockReason::Unknown
    }
}

/// The identifier itself is unusable; no strategy will change that.
pub fn is_bad_input(text: &str) -> bool {
    BAD_INPUT_RE.is_match(text)
}
