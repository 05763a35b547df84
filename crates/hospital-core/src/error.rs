//! Error types for `hospital-core`.

use thiserror::Error;

use crate::row::MalformedCell;

#[derive(Debug, Error)]
pub enum Error {
  /// The geocode cell was present but not a `POINT (<lon> <lat>)` pair.
  #[error("malformed geocode: {0:?}")]
  MalformedGeocode(String),

  /// One or more measure cells were not numbers.
  #[error("non-numeric measure: {}", join_cells(.0))]
  MalformedMeasures(Vec<MalformedCell>),

  #[error("missing facility id")]
  MissingFacilityId,
}

fn join_cells(cells: &[MalformedCell]) -> String {
  cells
    .iter()
    .map(ToString::to_string)
    .collect::<Vec<_>>()
    .join(", ")
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
