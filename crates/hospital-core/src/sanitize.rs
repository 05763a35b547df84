//! Pure cell normalisers applied before anything reaches the store.

use crate::{Error, Result, row::CapacityRow};

/// Sentinel the quality source uses in place of a rating.
pub const RATING_NOT_AVAILABLE: &str = "Not Available";

/// `None` for missing, NaN or strictly negative values; otherwise unchanged.
pub fn sanitize_numeric(value: Option<f64>) -> Option<f64> {
  value.filter(|v| !v.is_nan() && *v >= 0.0)
}

/// Null out every invalid measure in the batch.
///
/// Runs as a pre-pass over all rows, before any row is classified.
pub fn sanitize_capacity_batch(rows: &mut [CapacityRow]) {
  for row in rows {
    row.metrics.sanitize();
  }
}

/// `None` iff the value is the [`RATING_NOT_AVAILABLE`] sentinel.
pub fn sanitize_rating(value: Option<String>) -> Option<String> {
  value.filter(|v| v != RATING_NOT_AVAILABLE)
}

/// Parse a `POINT (<lon> <lat>)` geocode into `(latitude, longitude)`.
///
/// Note the order: the source lists longitude first, the result puts
/// latitude first. A missing or blank value yields `(None, None)`.
///
/// At most one delimiter is stripped from each side of the pair: a leading
/// character on the longitude and a trailing one on the latitude, and only
/// when it is not a digit, `-`, `+` or `.`. So `(-79.95` and `40.44)` are
/// accepted while `((-79.95` or `+(-79.95` are malformed.
pub fn parse_geocode(value: Option<&str>) -> Result<(Option<f64>, Option<f64>)> {
  let Some(raw) = value.map(str::trim).filter(|s| !s.is_empty()) else {
    return Ok((None, None));
  };
  let malformed = || Error::MalformedGeocode(raw.to_owned());

  let tokens: Vec<&str> = raw.split_whitespace().collect();
  let (lon_token, lat_token) = match tokens.as_slice() {
    [_, lon, lat] | [lon, lat] => (*lon, *lat),
    _ => return Err(malformed()),
  };

  let lon = parse_coordinate(strip_leading_delimiter(lon_token)).ok_or_else(malformed)?;
  let lat = parse_coordinate(strip_trailing_delimiter(lat_token)).ok_or_else(malformed)?;

  Ok((Some(lat), Some(lon)))
}

fn is_numeric_char(c: char) -> bool {
  c.is_ascii_digit() || matches!(c, '-' | '+' | '.')
}

fn strip_leading_delimiter(token: &str) -> &str {
  match token.chars().next() {
    Some(c) if !is_numeric_char(c) => &token[c.len_utf8()..],
    _ => token,
  }
}

fn strip_trailing_delimiter(token: &str) -> &str {
  match token.chars().next_back() {
    Some(c) if !is_numeric_char(c) => &token[..token.len() - c.len_utf8()],
    _ => token,
  }
}

fn parse_coordinate(token: &str) -> Option<f64> {
  token.parse::<f64>().ok().filter(|v| v.is_finite())
}
