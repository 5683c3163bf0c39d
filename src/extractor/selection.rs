// Audio format selection.
//
// Priority: the known-good AAC itag, then the loudest explicitly
// audio-only candidate, then whatever URL the extractor already resolved.

use super::traits::{ExtractedInfo, MediaFormat};

/// itag 140: 128 kbps AAC in m4a. Plays everywhere, including iOS.
pub const PREFERRED_AUDIO_ITAG: &str = "140";

/// Pick the audio URL from one extraction result. Returns None when the
/// result has no audio-only candidate and no direct URL.
pub fn select_audio_url(info: &ExtractedInfo) -> Option<String> {
    if let Some(format) = info
        .formats
        .iter()
        .find(|f| f.audio_only && f.format_id == PREFERRED_AUDIO_ITAG && f.url.is_some())
    {
        return format.url.clone();
    }

    if let Some(format) = best_audio_only(&info.formats) {
        return format.url.clone();
    }

    info.direct_url.clone()
}

/// Highest-bitrate audio-only candidate. The metric is abr; when no
/// candidate declares abr, tbr stands in. Ties keep the first
/// encountered, so selection is stable across identical dumps.
fn best_audio_only(formats: &[MediaFormat]) -> Option<&MediaFormat> {
    let candidates: Vec<&MediaFormat> = formats
        .iter()
        .filter(|f| f.audio_only && f.url.is_some())
        .collect();

    let any_abr = candidates.iter().any(|f| f.abr.is_some());
    let metric = |f: &MediaFormat| {
        if any_abr {
            f.abr.unwrap_or(0.0)
        } else {
            f.tbr.unwrap_or(0.0)
        }
    };

    let mut best: Option<&MediaFormat> = None;
    for format in candidates {
        match best {
            Some(current) if metric(format) <= metric(current) => {}
            _ => best = Some(format),
        }
    }
    best
}
