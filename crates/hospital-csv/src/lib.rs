//! CSV codec for the hospital loaders.
//!
//! Decodes HHS capacity and CMS quality files into [`hospital_core`] row
//! records and writes the error report for rows the engine could not load.
//! Pure synchronous; no database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! let file = std::fs::File::open("data/hhs/2022-09-23.csv").unwrap();
//! let batch = hospital_csv::read_capacity(file).unwrap();
//! println!("{} rows", batch.rows.len());
//! ```

pub mod error;
mod record;

use std::io;

use csv::StringRecord;
use hospital_core::{
  engine::RowFailure,
  row::{CapacityRow, QualityRow},
};
use serde::de::DeserializeOwned;

pub use error::{Error, Result};
pub use record::{CAPACITY_COLUMNS, QUALITY_COLUMNS};

use record::{CapacityRecord, QualityRecord};

/// Trailing columns of the error report, after the source projection.
pub const REPORT_COLUMNS: [&str; 2] = ["failed_steps", "errors"];

// ─── Public types ────────────────────────────────────────────────────────────

/// A decoded source file.
pub struct Batch<T> {
  /// One record per data row, in file order.
  pub rows:       Vec<T>,
  /// The same rows as raw text, restricted to the loader's columns.
  pub projection: Projection,
}

/// The loader's columns of every source row, kept as raw text so failed
/// rows can be written back out exactly as they arrived.
#[derive(Debug, Clone)]
pub struct Projection {
  columns: &'static [&'static str],
  records: Vec<StringRecord>,
}

impl Projection {
  pub fn columns(&self) -> &'static [&'static str] { self.columns }

  /// Raw fields of the data row at `index`.
  pub fn get(&self, index: usize) -> Option<&StringRecord> { self.records.get(index) }

  /// Write one line per failed row: its projected fields, then the failed
  /// step names and messages, each joined with `"; "`.
  ///
  /// The header is always written, so a run without failures still leaves
  /// a (header-only) report. Extra columns are ignored on read, so the
  /// report can be fed back through the same loader.
  pub fn write_error_report<W: io::Write>(
    &self,
    writer: W,
    failures: &[RowFailure],
  ) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(self.columns.iter().copied().chain(REPORT_COLUMNS))?;

    for failure in failures {
      let Some(record) = self.get(failure.index) else {
        continue;
      };
      let steps = failure
        .steps
        .iter()
        .map(|s| s.step.as_str())
        .collect::<Vec<_>>()
        .join("; ");
      let errors = failure
        .steps
        .iter()
        .map(|s| s.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");
      writer.write_record(record.iter().chain([steps.as_str(), errors.as_str()]))?;
    }

    writer.flush()?;
    Ok(())
  }
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Decode an HHS weekly capacity file.
///
/// Fails before returning any row if a required column is missing or a
/// record is unreadable. Cell values are never a reason to fail here:
/// measures that are not numbers are listed on their row for the engine.
pub fn read_capacity<R: io::Read>(reader: R) -> Result<Batch<CapacityRow>> {
  read_batch::<R, CapacityRecord, CapacityRow>(reader, CAPACITY_COLUMNS)
}

/// Decode a CMS hospital quality-rating file.
pub fn read_quality<R: io::Read>(reader: R) -> Result<Batch<QualityRow>> {
  read_batch::<R, QualityRecord, QualityRow>(reader, QUALITY_COLUMNS)
}

// ─── Internals ───────────────────────────────────────────────────────────────

fn read_batch<R, Rec, Row>(reader: R, columns: &'static [&'static str]) -> Result<Batch<Row>>
where
  R: io::Read,
  Rec: DeserializeOwned + Into<Row>,
{
  let mut reader = csv::ReaderBuilder::new()
    .trim(csv::Trim::All)
    .from_reader(reader);
  let headers = reader.headers()?.clone();
  let positions = locate_columns(&headers, columns)?;

  let mut rows = Vec::new();
  let mut records = Vec::new();

  for result in reader.records() {
    let record = result?;
    let line = record.position().map_or(0, |p| p.line());
    let decoded: Rec = record
      .deserialize(Some(&headers))
      .map_err(|source| Error::Record { line, source })?;

    rows.push(decoded.into());
    records.push(
      positions
        .iter()
        .map(|&i| record.get(i).unwrap_or(""))
        .collect::<StringRecord>(),
    );
  }

  Ok(Batch { rows, projection: Projection { columns, records } })
}

/// Index of each required column in `headers`, or every missing name.
fn locate_columns(headers: &StringRecord, columns: &[&str]) -> Result<Vec<usize>> {
  let mut positions = Vec::with_capacity(columns.len());
  let mut missing = Vec::new();

  for &column in columns {
    match headers.iter().position(|h| h == column) {
      Some(i) => positions.push(i),
      None => missing.push(column.to_owned()),
    }
  }

  if missing.is_empty() {
    Ok(positions)
  } else {
    Err(Error::MissingColumns(missing))
  }
}
