//! Human-readable size and duration values.
//!
//! # Grammar
//! ```text
//! size     := <digits> ("B" | "KB" | "MB")     case-insensitive
//! duration := <digits> "S"                     case-insensitive
//! ```
//!
//! # Design Decisions
//! - No whitespace, decimals or other units are accepted
//! - KB = 1024 B, MB = 1024 KB
//! - Config values may also be plain numbers (bytes / seconds)
//! - Parsed once at startup; the request path only sees `u64` / `Duration`

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const KB: u64 = 1024;
const MB: u64 = 1024 * 1024;

/// Errors produced by the size/duration codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    /// The input does not match the expected grammar.
    #[error("invalid {kind} format {input:?}, expected e.g. {example}")]
    InvalidFormat {
        kind: &'static str,
        input: String,
        example: &'static str,
    },
}

impl UnitError {
    fn size(input: &str) -> Self {
        UnitError::InvalidFormat {
            kind: "size",
            input: input.to_string(),
            example: "\"8MB\", \"1024KB\" or \"1048576B\"",
        }
    }

    fn duration(input: &str) -> Self {
        UnitError::InvalidFormat {
            kind: "duration",
            input: input.to_string(),
            example: "\"86400S\"",
        }
    }
}

/// Split `input` into its leading ASCII digits and the remaining suffix.
/// Returns `None` when there are no digits at all.
fn split_digits(input: &str) -> Option<(u64, &str)> {
    let end = input
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(input.len());
    if end == 0 {
        return None;
    }
    let value = input[..end].parse::<u64>().ok()?;
    Some((value, &input[end..]))
}

/// Parse a size string such as `"8MB"` into a byte count.
pub fn parse_size(input: &str) -> Result<u64, UnitError> {
    let (value, unit) = split_digits(input).ok_or_else(|| UnitError::size(input))?;
    let multiplier = match unit.to_ascii_uppercase().as_str() {
        "B" => 1,
        "KB" => KB,
        "MB" => MB,
        _ => return Err(UnitError::size(input)),
    };
    value
        .checked_mul(multiplier)
        .ok_or_else(|| UnitError::size(input))
}

/// Parse a duration string such as `"86400S"`.
pub fn parse_duration(input: &str) -> Result<Duration, UnitError> {
    parse_duration_secs(input).map(Duration::from_secs)
}

/// Parse a duration string such as `"86400S"` into whole seconds.
pub fn parse_duration_secs(input: &str) -> Result<u64, UnitError> {
    match split_digits(input) {
        Some((secs, unit)) if unit.eq_ignore_ascii_case("s") => Ok(secs),
        _ => Err(UnitError::duration(input)),
    }
}

/// Render a byte count for diagnostics, e.g. `2.00MB`.
///
/// Stops at GB regardless of magnitude. Not meant to round-trip through
/// [`parse_size`].
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.2}{}", size, UNITS[unit])
}

/// A size as written in configuration: raw bytes or a size string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SizeValue {
    Bytes(u64),
    Text(String),
}

impl SizeValue {
    /// Resolve to a byte count.
    pub fn bytes(&self) -> Result<u64, UnitError> {
        match self {
            SizeValue::Bytes(n) => Ok(*n),
            SizeValue::Text(s) => parse_size(s),
        }
    }
}

impl From<&str> for SizeValue {
    fn from(s: &str) -> Self {
        SizeValue::Text(s.to_string())
    }
}

impl fmt::Display for SizeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeValue::Bytes(n) => write!(f, "{}B", n),
            SizeValue::Text(s) => f.write_str(s),
        }
    }
}

/// A duration as written in configuration: raw seconds or a duration string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    /// Resolve to whole seconds.
    pub fn secs(&self) -> Result<u64, UnitError> {
        match self {
            DurationValue::Seconds(n) => Ok(*n),
            DurationValue::Text(s) => parse_duration_secs(s),
        }
    }

    /// Resolve to a [`Duration`].
    pub fn duration(&self) -> Result<Duration, UnitError> {
        self.secs().map(Duration::from_secs)
    }
}

impl From<&str> for DurationValue {
    fn from(s: &str) -> Self {
        DurationValue::Text(s.to_string())
    }
}

impl fmt::Display for DurationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurationValue::Seconds(n) => write!(f, "{}S", n),
            DurationValue::Text(s) => f.write_str(s),
        }
    }
}
