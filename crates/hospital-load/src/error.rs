//! Error types for the batch driver.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The input file could not be decoded, or the error report could not
  /// be written.
  #[error("csv error: {0}")]
  Csv(#[from] hospital_csv::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
