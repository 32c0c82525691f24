//! Interval text parsing
//!
//! Accepts the grammar `<decimal>[s|m|h|d]` (e.g. `2s`, `1.5m`, `0.5h`,
//! `1d`), case-insensitive, with no surrounding whitespace.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

static INTERVAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d*\.?\d+)([smhd])$").expect("interval regex is valid"));

/// Parse an interval token into a duration.
///
/// Returns `None` for anything outside the grammar. Zero-valued inputs
/// (`0s`, `0.0m`) are rejected as well: a zero interval would turn the
/// repeat loop into a busy loop.
pub fn parse_interval(text: &str) -> Option<Duration> {
    let captures = INTERVAL_RE.captures(text)?;

    let value: f64 = captures.get(1)?.as_str().parse().ok()?;
    let multiplier = match captures
        .get(2)?
        .as_str()
        .to_ascii_lowercase()
        .as_str()
    {
        "s" => 1.0,
        "m" => 60.0,
        "h" => 3600.0,
        "d" => 86400.0,
        _ => return None,
    };

    let seconds = value * multiplier;
    if seconds <= 0.0 {
        return None;
    }

    // Also rejects values too large to represent as a Duration
    Duration::try_from_secs_f64(seconds).ok()
}
