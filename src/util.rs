// Utility helpers for parsing and number formatting.
//
// All the forgiving "dirty JSON" handling lives here so the aggregation code
// can work with plain `Option`s.
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use num_format::{Locale, ToFormattedString};

/// Timestamp layouts without an offset. These are read as wall-clock time in
/// the target zone.
const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Coerce an amount string to a number.
///
/// - Trims whitespace.
/// - Empty strings are not numeric.
/// - Rejects anything that is not a finite decimal (`"abc"`, `"NaN"`, `"Infinity"`).
pub fn parse_amount(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn parse_timestamp_text<Tz: TimeZone>(s: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(tz));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return tz.from_local_datetime(&naive).earliest();
        }
    }
    // Date-only strings mean UTC midnight.
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight).with_timezone(tz))
}

pub fn parse_timestamp_millis<Tz: TimeZone>(ms: i64, tz: &Tz) -> Option<DateTime<Tz>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .map(|dt| dt.with_timezone(tz))
}

/// `"Mar 2024"` style label for the month grouping.
pub fn month_label<Tz: TimeZone>(dt: &DateTime<Tz>) -> String {
    dt.naive_local().format("%b %Y").to_string()
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus thousands separators, e.g. `1,234,567.89`.
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    // Past u128 range the digits are printed without separators.
    let mut res = match int_part.parse::<u128>() {
        Ok(v) => v.to_formatted_string(&Locale::en),
        Err(_) => int_part.to_string(),
    };
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
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
    n.to_formatted_string(&Locale::en)
}
