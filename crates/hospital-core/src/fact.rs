//! Append-only fact rows.
//!
//! Facts are never updated or deduplicated; every load appends.

use crate::row::CapacityMetrics;

/// A weekly capacity report for one hospital.
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityReport {
  pub hospital_pk: String,
  /// `YYYY-MM-DD`; parsed by the store, not here.
  pub report_date: Option<String>,
  pub metrics:     CapacityMetrics,
}

/// A quality rating for one facility, dated by the batch it arrived in.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityRating {
  pub facility_id: String,
  /// `YYYY-MM-DD`; one value for the whole batch.
  pub rating_date: String,
  pub rating:      Option<String>,
}

/// A fact row, tagged by its destination table.
#[derive(Debug, Clone, PartialEq)]
pub enum Fact {
  Capacity(CapacityReport),
  Quality(QualityRating),
}

impl Fact {
  pub fn facility_id(&self) -> &str {
    match self {
      Self::Capacity(r) => &r.hospital_pk,
      Self::Quality(r) => &r.facility_id,
    }
  }
}
