//! Conversion between profiler timestamps and elapsed seconds.
//!
//! The profiler writes wall-clock positions as `H:MM:SS.ss` (hours are not
//! bounded). Charts use elapsed seconds on the x axis and label ticks as
//! `MM:SS`, where minutes keep counting past the hour.

use crate::error::{Result, StatsError};
use regex::Regex;
use std::sync::OnceLock;

fn timestamp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([0-9]+):([0-9]{2}):([0-9]+(?:\.[0-9]*)?)$")
            .expect("timestamp pattern is a valid regex")
    })
}

/// Parse an `H:MM:SS.ss` timestamp into elapsed seconds.
pub fn parse_timestamp(s: &str) -> Result<f64> {
    let caps = timestamp_pattern()
        .captures(s.trim())
        .ok_or_else(|| StatsError::format("timestamp", s))?;

    let hours: f64 = caps[1]
        .parse()
        .map_err(|_| StatsError::format("timestamp", s))?;
    let minutes: f64 = caps[2]
        .parse()
        .map_err(|_| StatsError::format("timestamp", s))?;
    let seconds: f64 = caps[3]
        .parse()
        .map_err(|_| StatsError::format("timestamp", s))?;

    let total = (hours * 60.0 + minutes) * 60.0 + seconds;
    if !total.is_finite() {
        return Err(StatsError::format("timestamp", s));
    }
    Ok(total)
}

/// Format elapsed seconds as `MM:SS`, or `MM:SS.ss` when the value rounded
/// to hundredths is not a whole second.
pub fn format_seconds(sec: f64) -> String {
    let hundredths = (sec * 100.0).round() as i64;
    let minutes = hundredths.div_euclid(6000);
    let rest = hundredths.rem_euclid(6000);
    let (whole, frac) = (rest / 100, rest % 100);

    if frac == 0 {
        format!("{:02}:{:02}", minutes, whole)
    } else {
        format!("{:02}:{:02}.{:02}", minutes, whole, frac)
    }
}
