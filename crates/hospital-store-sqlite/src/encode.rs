//! Coercions from raw source text to the types stored in SQLite columns.
//!
//! SQLite will store almost anything in any column, so the checks a typed
//! SQL store would make on the way in are made here instead. A failed
//! coercion rejects the write it belongs to, never the batch.

use chrono::NaiveDate;
use thiserror::Error;

/// The only date layout the store accepts.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
#[error("invalid {column} value {value:?}")]
pub struct Coercion {
  pub column: &'static str,
  pub value:  String,
}

impl Coercion {
  fn new(column: &'static str, value: &str) -> Self {
    Self { column, value: value.to_owned() }
  }
}

// ─── Dates ───────────────────────────────────────────────────────────────────

/// Parse a `YYYY-MM-DD` date and re-encode it canonically.
///
/// A missing date passes through as `None`; the NOT NULL constraint on the
/// column decides what happens next.
pub fn encode_date(column: &'static str, raw: Option<&str>) -> Result<Option<String>, Coercion> {
  raw
    .map(|s| {
      NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map(|d| d.format(DATE_FORMAT).to_string())
        .map_err(|_| Coercion::new(column, s))
    })
    .transpose()
}

// ─── Flags ───────────────────────────────────────────────────────────────────

/// Accept the usual boolean spellings, case-insensitively.
pub fn encode_flag(column: &'static str, raw: Option<&str>) -> Result<Option<bool>, Coercion> {
  raw
    .map(|s| match s.trim().to_ascii_lowercase().as_str() {
      "yes" | "y" | "true" | "t" | "1" => Ok(true),
      "no" | "n" | "false" | "f" | "0" => Ok(false),
      _ => Err(Coercion::new(column, s)),
    })
    .transpose()
}

// ─── Ratings ─────────────────────────────────────────────────────────────────

pub fn encode_rating(raw: Option<&str>) -> Result<Option<f64>, Coercion> {
  raw
    .map(|s| {
      s.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Coercion::new("rating", s))
    })
    .transpose()
}
