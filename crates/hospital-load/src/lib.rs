//! Batch driver for the hospital loaders.
//!
//! Ties the CSV codec to any [`FacilityStore`]: decode the whole file, take
//! the facility snapshot and run the batch. The caller then prints the
//! [`Summary`] and writes the error report from the returned [`Loaded`]. The
//! `hospital-load` binary is a thin shell over [`run_capacity`] and
//! [`run_quality`].

pub mod error;

pub use error::{Error, Result};

use std::{
  fmt, io,
  path::{Path, PathBuf},
};

use hospital_core::{engine::LoadReport, store::FacilityStore};
use hospital_csv::Projection;
use serde::Deserialize;
use tracing::info;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `config.toml` and `HOSPITAL_*`
/// environment variables. Every field has a default.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LoaderConfig {
  #[serde(default = "default_store_path")]
  pub store_path:   PathBuf,
  #[serde(default = "default_capacity_dir")]
  pub capacity_dir: PathBuf,
  #[serde(default = "default_quality_dir")]
  pub quality_dir:  PathBuf,
  #[serde(default = "default_error_report")]
  pub error_report: PathBuf,
}

fn default_store_path() -> PathBuf { PathBuf::from("hospital.db") }
fn default_capacity_dir() -> PathBuf { PathBuf::from("data/hhs") }
fn default_quality_dir() -> PathBuf { PathBuf::from("data/quality") }
fn default_error_report() -> PathBuf { PathBuf::from("error_rows.csv") }

impl Default for LoaderConfig {
  fn default() -> Self {
    Self {
      store_path:   default_store_path(),
      capacity_dir: default_capacity_dir(),
      quality_dir:  default_quality_dir(),
      error_report: default_error_report(),
    }
  }
}

impl LoaderConfig {
  /// Resolve an input file for `source`. Relative paths are taken from the
  /// source's data directory; absolute paths are used as given.
  pub fn input_path(&self, source: Source, file: &Path) -> PathBuf {
    if file.is_absolute() {
      return file.to_path_buf();
    }
    let dir = match source {
      Source::Capacity => &self.capacity_dir,
      Source::Quality => &self.quality_dir,
    };
    dir.join(file)
  }
}

// ─── Sources ──────────────────────────────────────────────────────────────────

/// The two kinds of input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
  Capacity,
  Quality,
}

impl Source {
  /// The fact table this source appends to.
  pub fn fact_table(self) -> &'static str {
    match self {
      Source::Capacity => "facility_reports",
      Source::Quality => "quality_ratings",
    }
  }
}

// ─── Summary ──────────────────────────────────────────────────────────────────

/// The end-of-run counters, one per line.
pub struct Summary<'a> {
  pub source: Source,
  pub report: &'a LoadReport,
}

impl fmt::Display for Summary<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(
      f,
      "Number of rows inserted into facility_information: {}",
      self.report.facilities_inserted
    )?;
    writeln!(
      f,
      "Number of rows updated in facility_information: {}",
      self.report.facilities_updated
    )?;
    write!(
      f,
      "Number of rows inserted into {}: {}",
      self.source.fact_table(),
      self.report.facts_inserted
    )
  }
}

// ─── Driver ───────────────────────────────────────────────────────────────────

/// A committed batch and the raw rows needed to report its failures.
pub struct Loaded {
  pub source: Source,
  pub report: LoadReport,
  projection: Projection,
}

impl Loaded {
  pub fn summary(&self) -> Summary<'_> {
    Summary { source: self.source, report: &self.report }
  }

  /// Write one line per failed row to `writer`.
  ///
  /// The batch is already committed when this runs; an error here loses
  /// only the report, never the counters in [`Loaded::report`].
  pub fn write_error_report<W: io::Write>(&self, writer: W) -> Result<()> {
    self.projection.write_error_report(writer, &self.report.failures)?;
    Ok(())
  }
}

/// Load an HHS capacity file from `input` into `store`.
///
/// Nothing is written to `store` if the file cannot be decoded.
pub async fn run_capacity<S, R>(store: &S, input: R) -> Result<Loaded>
where
  S: FacilityStore,
  R: io::Read,
{
  let batch = hospital_csv::read_capacity(input)?;
  info!(rows = batch.rows.len(), "capacity batch decoded");

  let existing = store.existing_facility_ids().await.map_err(Error::store)?;
  let report = store
    .load_capacity(batch.rows, existing)
    .await
    .map_err(Error::store)?;

  log_finished(Source::Capacity, &report);
  Ok(Loaded { source: Source::Capacity, report, projection: batch.projection })
}

/// Load a CMS quality file from `input` into `store`, stamping every rating
/// with `rating_date`.
pub async fn run_quality<S, R>(store: &S, rating_date: &str, input: R) -> Result<Loaded>
where
  S: FacilityStore,
  R: io::Read,
{
  let batch = hospital_csv::read_quality(input)?;
  info!(rows = batch.rows.len(), rating_date, "quality batch decoded");

  let existing = store.existing_facility_ids().await.map_err(Error::store)?;
  let report = store
    .load_quality(rating_date.to_owned(), batch.rows, existing)
    .await
    .map_err(Error::store)?;

  log_finished(Source::Quality, &report);
  Ok(Loaded { source: Source::Quality, report, projection: batch.projection })
}

fn log_finished(source: Source, report: &LoadReport) {
  info!(
    fact_table = source.fact_table(),
    facilities_inserted = report.facilities_inserted,
    facilities_updated = report.facilities_updated,
    facts_inserted = report.facts_inserted,
    failed_rows = report.failures.len(),
    "batch committed"
  );
}
