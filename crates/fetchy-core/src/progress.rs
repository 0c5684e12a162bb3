//! Progress parsing for fetch tool output.
//!
//! The tool prints free-form text; a line carries progress when it contains a
//! percentage token. The phase is inferred from fixed keywords in the same line.

use serde::{Deserialize, Serialize};

/// Coarse phase of a running fetch, inferred from tool output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Analyzing,
    Merging,
    Fetching,
    Processing,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Analyzing => "Analyzing",
            Phase::Merging => "Merging",
            Phase::Fetching => "Fetching",
            Phase::Processing => "Processing",
        }
    }

    /// Classify a chunk of output. Keywords are checked in priority order; first match wins.
    pub fn classify(chunk: &str) -> Phase {
        let lower = chunk.to_ascii_lowercase();
        if lower.contains("extracting") || lower.contains("webpage") {
            Phase::Analyzing
        } else if lower.contains("merging") {
            Phase::Merging
        } else if lower.contains("download") {
            Phase::Fetching
        } else {
            Phase::Processing
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structured progress update parsed from tool output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressEvent {
    /// Fraction complete in [0.0, 1.0].
    pub fraction: f64,
    pub phase: Phase,
}

/// Parse a chunk of tool output. Returns None when the chunk has no percentage.
pub fn parse_progress(chunk: &str) -> Option<ProgressEvent> {
    let percent = find_percent(chunk)?;
    Some(ProgressEvent {
        fraction: (percent / 100.0).clamp(0.0, 1.0),
        phase: Phase::classify(chunk),
    })
}

/// First `<digits>[.<digits>]%` token in `s`, as a number.
fn find_percent(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i + 1 < bytes.len() && bytes[i] == b'.' && bytes[i + 1].is_ascii_digit() {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
        }
        if i < bytes.len() && bytes[i] == b'%' {
            return s[start..i].parse().ok();
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn download_line_is_fetching() {
        let ev = parse_progress("download  45.2% of 10MiB").unwrap();
        assert!(approx(ev.fraction, 0.452));
        assert_eq!(ev.phase, Phase::Fetching);
        assert_eq!(ev.phase.as_str(), "Fetching");
    }

    #[test]
    fn yt_dlp_download_line() {
        let ev = parse_progress("[download]  12.0% of ~ 87.43MiB at  2.10MiB/s ETA 00:37").unwrap();
        assert!(approx(ev.fraction, 0.12));
        assert_eq!(ev.phase, Phase::Fetching);
    }

    #[test]
    fn no_percentage_is_no_event() {
        assert!(parse_progress("[ExtractAudio] Destination: clip.m4a").is_none());
        assert!(parse_progress("").is_none());
        assert!(parse_progress("100 percent done").is_none());
    }

    #[test]
    fn merging_wins_over_download() {
        let ev = parse_progress("[Merger] Merging formats into \"x.mp4\" after download 100%").unwrap();
        assert_eq!(ev.phase, Phase::Merging);
        assert!(approx(ev.fraction, 1.0));
    }

    #[test]
    fn analyzing_has_highest_priority() {
        let ev = parse_progress("[youtube] abc: Downloading webpage 3%").unwrap();
        assert_eq!(ev.phase, Phase::Analyzing);
        let ev = parse_progress("EXTRACTING URL 50%").unwrap();
        assert_eq!(ev.phase, Phase::Analyzing);
    }

    #[test]
    fn unknown_text_is_processing() {
        let ev = parse_progress("[FixupM3u8] 7%").unwrap();
        assert_eq!(ev.phase, Phase::Processing);
        assert!(approx(ev.fraction, 0.07));
    }

    #[test]
    fn integer_and_trailing_dot_percentages() {
        assert!(approx(parse_progress("at 100% now").unwrap().fraction, 1.0));
        // "5.%" is not a valid decimal; the token is skipped.
        assert!(parse_progress("5.%").is_none());
        assert!(approx(parse_progress("v1.2 then 30%").unwrap().fraction, 0.3));
    }

    #[test]
    fn fraction_is_clamped() {
        assert!(approx(parse_progress("overshoot 150%").unwrap().fraction, 1.0));
    }
}
