//! Error types for the hospital-csv codec.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The header row lacks columns the loader depends on.
  #[error("input is missing required columns: {}", .0.join(", "))]
  MissingColumns(Vec<String>),

  /// A data row could not be decoded into its record.
  #[error("malformed record at line {line}: {source}")]
  Record {
    line:   u64,
    #[source]
    source: csv::Error,
  },

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
