// Utility helpers for key normalization, parsing and number formatting.
//
// This module centralizes all the "dirty" spreadsheet/string handling so the
// rest of the code can assume clean, typed values and join keys that line up.
use num_format::{Locale, ToFormattedString};

/// Canonical region key used to join spreadsheet rows with boundary features.
///
/// - Removes the first `"Kab. "` and the first `"Kota "` (case-sensitive).
/// - Trims surrounding whitespace.
/// - Upper-cases what is left.
///
/// Both loaders and the region filter go through this function; any other
/// path to a region key would make regions silently vanish from the map.
pub fn normalize_region(name: &str) -> String {
    name.replacen("Kab. ", "", 1)
        .replacen("Kota ", "", 1)
        .trim()
        .to_uppercase()
}

/// Account kinds are compared lower-cased and trimmed (`" Guru"` -> `"guru"`).
pub fn normalize_kind(kind: &str) -> String {
    kind.trim().to_lowercase()
}

/// Outcome of parsing one counter cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Count {
    Value(u64),
    /// Blank cell, counted as zero.
    Blank,
}

/// Parse a counter cell while being forgiving about spreadsheet formatting.
///
/// - Accepts `Option<&str>` so callers can pass through missing cells.
/// - Blank cells are reported as [`Count::Blank`].
/// - Strips thousands separators like `","` before parsing.
/// - Accepts integral floats such as `"10.0"` (spreadsheets store numbers
///   as floats).
/// - Returns `None` for negative, fractional or non-numeric values.
pub fn parse_count_safe(s: Option<&str>) -> Option<Count> {
    let Some(s) = s.map(str::trim).filter(|s| !s.is_empty()) else {
        return Some(Count::Blank);
    };
    let s = s.replace(',', "");
    if let Ok(v) = s.parse::<u64>() {
        return Some(Count::Value(v));
    }
    let f = s.parse::<f64>().ok()?;
    if !f.is_finite() || f < 0.0 || f.fract() != 0.0 || f > u64::MAX as f64 {
        return None;
    }
    Some(Count::Value(f as u64))
}

/// Login rate in percent. Defined as `0.0` when nothing is registered so a
/// group with no denominator never produces NaN or infinity.
pub fn percentage(logged_in: u64, registered: u64) -> f64 {
    if registered == 0 {
        return 0.0;
    }
    logged_in as f64 / registered as f64 * 100.0
}

pub fn format_percent(p: f64) -> String {
    format!("{:.2}%", p)
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for counts shown to the user
    // (e.g., `12,345` logged-in accounts).
    n.to_formatted_string(&Locale::en)
}
