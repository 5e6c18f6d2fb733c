// Utility helpers for parsing and number formatting.
//
// This module centralizes all the "dirty" CSV/number/date handling so the
// rest of the code can assume clean, typed values.
use chrono::{Datelike, NaiveDate};
use num_format::{Locale, ToFormattedString};

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in CSV exports (commas, spaces, text).
///
/// - Accepts `Option<&str>` so callers can pass through optional fields.
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters.
/// - Strips thousands separators like `","` before parsing.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(",", "");
    s.parse::<f64>().ok()
}

/// Parse an impact measure (count or damage magnitude).
///
/// A blank cell means "nothing recorded" and reads as zero. Anything else
/// must be a finite, non-negative number or the row is rejected.
pub fn parse_measure(s: Option<&str>) -> Option<f64> {
    match s.map(str::trim) {
        None | Some("") => Some(0.0),
        Some(v) => parse_f64_safe(Some(v)).filter(|n| n.is_finite() && *n >= 0.0),
    }
}

/// Parse a non-negative count. Exports sometimes write counts as `3.00`,
/// so integral decimals are accepted; fractional counts are rejected.
pub fn parse_count(s: Option<&str>) -> Option<u64> {
    let v = parse_measure(s)?;
    if v.fract() != 0.0 {
        return None;
    }
    Some(v as u64)
}

/// Year of a `BGN_DATE` style value such as `4/18/1950 0:00:00`.
///
/// The time part is ignored; ISO `YYYY-MM-DD` dates are accepted too.
pub fn parse_year_safe(s: Option<&str>) -> Option<i32> {
    let s = s?.trim();
    let date_part = s.split_whitespace().next()?;
    NaiveDate::parse_from_str(date_part, "%m/%d/%Y")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%Y-%m-%d"))
        .ok()
        .map(|d| d.year())
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - locale-aware thousands separators (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    // `u64` keeps national-scale dollar totals intact.
    let int_val: u64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    } else if decimals > 0 {
        res.push('.');
        res.push_str(&"0".repeat(decimals));
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for integer-like values. This is used
    // for counts in console messages (e.g., `902,297 rows loaded`).
    n.to_formatted_string(&Locale::en)
}

/// Render an amount held in cents as `1,234,567.89`.
pub fn format_cents(cents: u64) -> String {
    format!("{}.{:02}", format_int(cents / 100), cents % 100)
}
