//! Defensive coercion of loosely-typed worksheet cells.
//!
//! Spreadsheet cells arrive as free text: dates may be ISO strings, day-first
//! strings, datetimes, or serial day numbers; amounts may carry currency
//! marks and either thousands convention. Every function here is total: a
//! cell that cannot be understood becomes `None` instead of an error.

use crate::entry::{EntryKind, canonical_category};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    static ref NUMBER_REGEX: Regex =
        Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").unwrap();
    static ref SERIAL_REGEX: Regex = Regex::new(r"^\d+(\.\d+)?$").unwrap();
    static ref COMPACT_DATE_REGEX: Regex = Regex::new(r"^\d{8}$").unwrap();
    static ref SHORT_YEAR_REGEX: Regex = Regex::new(r"^\d{1,2}[/-]\d{1,2}[/-]\d{2}$").unwrap();
    static ref CURRENCY_REGEX: Regex = Regex::new(r"(?i)(mxn|usd|eur|\$|€)").unwrap();
}

/// Largest id accepted from a cell: 2^53, past which the grid's JSON
/// numbers stop representing every integer.
pub const MAX_ID: u64 = 1 << 53;

/// Largest serial day number a spreadsheet can hold (9999-12-31).
const MAX_SERIAL_DAY: f64 = 2_958_465.0;

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

// Year-first forms are tried before day-first ones.
const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%Y.%m.%d",
];

/// True for the markers pandas and spreadsheets use for an empty cell
fn is_missing(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "" | "nan" | "nat" | "none" | "null"
    )
}

/// Strips a UTF-8 byte order mark and surrounding whitespace from a header.
pub fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_string()
}

/// Trimmed text, or `None` for blank and missing markers.
pub fn parse_text(raw: &str) -> Option<String> {
    if is_missing(raw) {
        None
    } else {
        Some(raw.trim().to_string())
    }
}

/// Parses a calendar date out of whatever the worksheet holds.
///
/// Ambiguous numeric dates such as `03/04/2024` are read day-first.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    if is_missing(raw) {
        return None;
    }
    let s = raw.trim();

    if COMPACT_DATE_REGEX.is_match(s) {
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y%m%d") {
            return Some(date);
        }
    }

    if SERIAL_REGEX.is_match(s) {
        return s.parse::<f64>().ok().and_then(date_from_serial);
    }

    if SHORT_YEAR_REGEX.is_match(s) {
        let normalized = s.replace('-', "/");
        return NaiveDate::parse_from_str(&normalized, "%d/%m/%y").ok();
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    for format in DATETIME_FORMATS.iter() {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.date());
        }
    }

    for format in DATE_FORMATS.iter() {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }

    None
}

/// Converts a spreadsheet serial day number (days since 1899-12-30).
///
/// Fractions carry the time of day and are dropped.
pub fn date_from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_SERIAL_DAY).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

/// Parses a money amount.
///
/// Handles currency marks, both thousands conventions, accounting
/// parentheses and a trailing minus. Non-finite results are rejected.
pub fn parse_amount(raw: &str) -> Option<f64> {
    if is_missing(raw) {
        return None;
    }

    let mut s: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    s = CURRENCY_REGEX.replace_all(&s, "").to_string();

    let mut negative = false;
    if s.starts_with('(') && s.ends_with(')') && s.len() >= 2 {
        negative = true;
        s = s[1..s.len() - 1].to_string();
    }
    if s.ends_with('-') && s.len() > 1 {
        if negative || s.starts_with(['-', '+']) {
            return None;
        }
        negative = true;
        s.pop();
    }

    let s = normalize_separators(&s);
    if !NUMBER_REGEX.is_match(&s) {
        return None;
    }

    let value: f64 = s.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negative { -value } else { value })
}

// Rewrites `1.234,56` / `1,234.56` / `12,5` into a plain `1234.56` form.
fn normalize_separators(s: &str) -> String {
    let last_comma = s.rfind(',');
    let last_dot = s.rfind('.');

    match (last_comma, last_dot) {
        (Some(c), Some(d)) if c > d => s.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => s.replace(',', ""),
        (Some(c), None) => {
            let fraction = s.len() - c - 1;
            if s.matches(',').count() == 1 && (fraction == 1 || fraction == 2) {
                s.replace(',', ".")
            } else {
                s.replace(',', "")
            }
        }
        (None, Some(_)) if s.matches('.').count() > 1 => s.replace('.', ""),
        _ => s.to_string(),
    }
}

/// Parses a row identifier; integral floats such as `"12.0"` are accepted.
pub fn parse_id(raw: &str) -> Option<u64> {
    if is_missing(raw) {
        return None;
    }
    let s = raw.trim();
    if let Ok(id) = s.parse::<u64>() {
        return (id <= MAX_ID).then_some(id);
    }
    s.parse::<f64>().ok().and_then(id_from_f64)
}

fn id_from_f64(value: f64) -> Option<u64> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= MAX_ID as f64 {
        Some(value as u64)
    } else {
        None
    }
}

pub fn parse_kind(raw: &str) -> Option<EntryKind> {
    EntryKind::from_label(raw)
}

pub fn parse_category(raw: &str) -> Option<String> {
    parse_text(raw).and_then(|c| canonical_category(&c))
}

// Values posted by the editable grid are JSON; strings go through the text
// parsers above, numbers are taken at face value.

pub fn text_from_json(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => parse_text(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn date_from_json(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => parse_date(s),
        Value::Number(n) => n.as_f64().and_then(date_from_serial),
        _ => None,
    }
}

pub fn amount_from_json(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => parse_amount(s),
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        _ => None,
    }
}

pub fn id_from_json(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => parse_id(s),
        Value::Number(n) => match n.as_u64() {
            Some(id) => (id <= MAX_ID).then_some(id),
            None => n.as_f64().and_then(id_from_f64),
        },
        _ => None,
    }
}

pub fn kind_from_json(value: &Value) -> Option<EntryKind> {
    match value {
        Value::String(s) => parse_kind(s),
        _ => None,
    }
}
