// Error types for extraction and resolution

use std::fmt;

use crate::extractor::diagnostics;
use crate::extractor::helper::HelperStatus;

/// Failure of a single extraction attempt (one strategy, one yt-dlp run).
#[derive(Debug, Clone)]
pub enum ExtractError {
    /// yt-dlp (or its interpreter) is not installed
    ToolNotFound(String),

    /// The attempt exceeded its time budget
    Timeout,

    /// The platform refused the request (403, rate limit, bot check,
    /// restriction). Carries the classified reason and the raw detail.
    Denied {
        reason: diagnostics::BlockReason,
        detail: String,
    },

    /// The identifier itself is unusable (unsupported/malformed)
    BadInput(String),

    /// Failed to parse yt-dlp JSON output
    Parse(String),

    /// yt-dlp could not be run or crashed
    Execution(String),
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToolNotFound(tool) => write!(f, "tool not found: {}", tool),
            Self::Timeout => write!(f, "extraction timed out"),
            Self::Denied { reason, detail } => {
                write!(f, "platform denied request ({}): {}", reason, detail)
            }
            Self::BadInput(detail) => write!(f, "bad input: {}", detail),
            Self::Parse(detail) => write!(f, "parse error: {}", detail),
            Self::Execution(detail) => write!(f, "execution error: {}", detail),
        }
    }
}

impl std::error::Error for ExtractError {}

// Classify raw yt-dlp stderr into a tagged error
impl From<String> for ExtractError {
    fn from(s: String) -> Self {
        if diagnostics::is_bad_input(&s) {
            return Self::BadInput(s);
        }

        let reason = diagnostics::classify(&s);
        if reason != diagnostics::BlockReason::Unknown {
            return Self::Denied { reason, detail: s };
        }

        if s.contains("timed out") || s.contains("timeout") {
            return Self::Timeout;
        }

        if s.contains("not found") || s.contains("No such file") {
            return Self::ToolNotFound(s);
        }

        Self::Execution(s)
    }
}

/// User-visible failure of a whole resolution, after the strategy runner
/// has had its say. Carries enough structure for operator diagnosis
/// without log access.
#[derive(Debug, Clone)]
pub enum ResolveError {
    /// Every configured strategy failed
    AllStrategiesExhausted {
        video_id: String,
        attempts: usize,
        helper: HelperStatus,
    },

    /// The identifier is not something the extractor can work with
    InvalidInput(String),

    /// yt-dlp is missing entirely; no strategy can ever succeed
    ToolNotFound(String),

    /// Unexpected fault in the extraction collaborator
    Internal(String),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllStrategiesExhausted {
                video_id,
                attempts,
                helper,
            } => write!(
                f,
                "all {} strategies failed for '{}' (pot helper: {})",
                attempts, video_id, helper
            ),
            Self::InvalidInput(detail) => write!(f, "invalid input: {}", detail),
            Self::ToolNotFound(tool) => write!(f, "tool not found: {}", tool),
            Self::Internal(detail) => write!(f, "internal error: {}", detail),
        }
    }
}

impl std::error::Error for ResolveError {}
