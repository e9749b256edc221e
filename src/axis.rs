//! Axis rules shared by the image and terminal backends: tick placement on
//! the time axis and tick labels on the value axis.

use serde::Serialize;

/// Unit of a statistic column; decides how its value axis is labelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Bytes,
    Counts,
    Seconds,
}

impl Unit {
    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Bytes => "bytes",
            Unit::Counts => "counts",
            Unit::Seconds => "seconds",
        }
    }
}

/// Decimal byte scale picked once per panel from its maximum value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteScale {
    Raw,
    Kilo,
    Mega,
    Giga,
}

impl ByteScale {
    pub fn for_max(max: f64) -> Self {
        if max > 1e9 {
            ByteScale::Giga
        } else if max > 1e6 {
            ByteScale::Mega
        } else if max > 1e3 {
            ByteScale::Kilo
        } else {
            ByteScale::Raw
        }
    }

    pub fn divisor(self) -> f64 {
        match self {
            ByteScale::Raw => 1.0,
            ByteScale::Kilo => 1e3,
            ByteScale::Mega => 1e6,
            ByteScale::Giga => 1e9,
        }
    }

    pub fn suffix(self) -> Option<&'static str> {
        match self {
            ByteScale::Raw => None,
            ByteScale::Kilo => Some("kB"),
            ByteScale::Mega => Some("MB"),
            ByteScale::Giga => Some("GB"),
        }
    }

    /// Truncated value in this scale, at least three digits wide.
    pub fn format(self, bytes: f64) -> String {
        let digits = zero_pad(bytes / self.divisor());
        match self.suffix() {
            Some(suffix) => format!("{} {}", digits, suffix),
            None => digits,
        }
    }
}

/// Integer part of `value`, zero-padded to at least three digits.
pub fn zero_pad(value: f64) -> String {
    format!("{:03}", value.trunc() as i64)
}

/// Value-axis label formatter for one panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickFormat {
    Bytes(ByteScale),
    ZeroPad,
    Plain,
}

impl TickFormat {
    pub fn for_unit(unit: Unit, max: f64) -> Self {
        match unit {
            Unit::Bytes => TickFormat::Bytes(ByteScale::for_max(max)),
            Unit::Counts => TickFormat::ZeroPad,
            Unit::Seconds => TickFormat::Plain,
        }
    }

    pub fn format(&self, value: f64) -> String {
        match self {
            TickFormat::Bytes(scale) => scale.format(value),
            TickFormat::ZeroPad => zero_pad(value),
            TickFormat::Plain => plain(value),
        }
    }
}

// Shortest decimal form, capped at three decimals: 0.05, 0.1, 0.25, 2
fn plain(value: f64) -> String {
    let s = format!("{:.3}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Tick spacing on the time axis, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSpacing {
    pub major: u32,
    pub minor: u32,
}

impl TickSpacing {
    /// Minor ticks split a major interval of a minute or more into fifths;
    /// shorter intervals are halved, never below one second.
    pub fn from_interval(major: u32) -> Self {
        let minor = if major >= 60 {
            major / 5
        } else {
            (major / 2).max(1)
        };
        Self { major, minor }
    }

    pub fn major_ticks(&self, lo: f64, hi: f64) -> Vec<f64> {
        multiples_within(self.major, lo, hi)
    }

    /// Minor tick positions, leaving out those that fall on a major tick.
    pub fn minor_ticks(&self, lo: f64, hi: f64) -> Vec<f64> {
        let major = self.major as u64;
        multiples_within(self.minor, lo, hi)
            .into_iter()
            .filter(|t| major == 0 || (*t as u64) % major != 0)
            .collect()
    }
}

/// Multiples of `step` inside `[lo, hi]`.
fn multiples_within(step: u32, lo: f64, hi: f64) -> Vec<f64> {
    if step == 0 || !(lo <= hi) {
        return Vec::new();
    }
    let step = step as f64;
    let first = (lo / step).ceil() as i64;
    let last = (hi / step).floor() as i64;
    (first..=last).map(|k| k as f64 * step).collect()
}
