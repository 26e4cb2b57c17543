//! Field parsers for Investing.com-style historical price exports.
//!
//! Rows look like:
//! `11/11/2024,"1,364.25",365.62,365.71,362.50,253.29K,-0.18%`
//!
//! Each parser returns a `RecordError` without line information; the ingest
//! layer attaches the line via [`RecordError::at_line`].

use chrono::NaiveDate;

use super::ingest::RecordError;

/// Date formats accepted, tried in order.
const DATE_FORMATS: [&str; 2] = ["%m/%d/%Y", "%Y-%m-%d"];

/// Decimal places daily changes and sweep thresholds are snapped to.
pub const FRACTION_DECIMALS: i32 = 12;

/// Round a fraction to [`FRACTION_DECIMALS`] places, mapping `-0.0` to `0.0`.
///
/// Both sides of a threshold comparison go through this, so a change of
/// `"-1.85%"` and a grid point `-0.02 + 15 * 0.0001` are the same `f64`.
pub fn snap_fraction(v: f64) -> f64 {
    let scale = 10f64.powi(FRACTION_DECIMALS);
    let snapped = (v * scale).round() / scale;
    if snapped == 0.0 {
        0.0
    } else {
        snapped
    }
}

/// Parse a percentage string such as `"0.10%"` or `"-0.18%"` into a fraction.
///
/// The trailing `%` is optional; the number is always read in percent units,
/// so `"0.10"` also yields `0.001`.
pub fn parse_change_percent(raw: &str) -> Result<f64, RecordError> {
    let trimmed = raw.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
    let cleaned = number.replace(',', "");
    match cleaned.parse::<f64>() {
        Ok(pct) if pct.is_finite() => Ok(snap_fraction(pct / 100.0)),
        _ => Err(RecordError::InvalidChange {
            line: None,
            value: raw.to_string(),
        }),
    }
}

/// Parse a price, tolerating thousands separators (`"1,234.56"`).
pub fn parse_price(raw: &str) -> Result<f64, RecordError> {
    let cleaned = raw.trim().replace(',', "");
    match cleaned.parse::<f64>() {
        Ok(price) if price.is_finite() && price > 0.0 => Ok(price),
        _ => Err(RecordError::InvalidPrice {
            line: None,
            value: raw.to_string(),
        }),
    }
}

/// Parse a `MM/DD/YYYY` or ISO date.
pub fn parse_date(raw: &str) -> Result<NaiveDate, RecordError> {
    let trimmed = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| RecordError::InvalidDate {
            line: None,
            value: raw.to_string(),
        })
}
