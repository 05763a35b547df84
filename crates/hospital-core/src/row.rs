//! Named-field source rows, built once when a CSV file is decoded.
//!
//! Every cell is optional: an empty cell in the source file is `None`. The
//! engine decides what a missing value means for each column.

use std::fmt;

use crate::sanitize::sanitize_numeric;

// ─── Capacity ────────────────────────────────────────────────────────────────

/// The eight utilization measures carried by a weekly capacity report.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CapacityMetrics {
  pub total_adult_hospital_beds:              Option<f64>,
  pub total_pediatric_hospital_beds:          Option<f64>,
  pub total_adult_hospital_beds_occupied:     Option<f64>,
  pub total_pediatric_hospital_beds_occupied: Option<f64>,
  pub total_icu_beds:                         Option<f64>,
  pub total_icu_beds_occupied:                Option<f64>,
  pub inpatient_beds_occupied_covid:          Option<f64>,
  pub adult_icu_patients_confirmed_covid:     Option<f64>,
}

impl CapacityMetrics {
  /// Null out every measure that is NaN or negative.
  pub fn sanitize(&mut self) {
    for value in self.values_mut() {
      *value = sanitize_numeric(*value);
    }
  }

  /// The measures in store column order.
  pub fn values(&self) -> [Option<f64>; 8] {
    [
      self.total_adult_hospital_beds,
      self.total_pediatric_hospital_beds,
      self.total_adult_hospital_beds_occupied,
      self.total_pediatric_hospital_beds_occupied,
      self.total_icu_beds,
      self.total_icu_beds_occupied,
      self.inpatient_beds_occupied_covid,
      self.adult_icu_patients_confirmed_covid,
    ]
  }

  fn values_mut(&mut self) -> [&mut Option<f64>; 8] {
    [
      &mut self.total_adult_hospital_beds,
      &mut self.total_pediatric_hospital_beds,
      &mut self.total_adult_hospital_beds_occupied,
      &mut self.total_pediatric_hospital_beds_occupied,
      &mut self.total_icu_beds,
      &mut self.total_icu_beds_occupied,
      &mut self.inpatient_beds_occupied_covid,
      &mut self.adult_icu_patients_confirmed_covid,
    ]
  }
}

/// A measure cell that held text where a number was expected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedCell {
  /// Source column name.
  pub column: &'static str,
  pub value:  String,
}

impl fmt::Display for MalformedCell {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} = {:?}", self.column, self.value)
  }
}

/// One row of an HHS weekly capacity file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapacityRow {
  pub hospital_pk:               Option<String>,
  pub collection_week:           Option<String>,
  pub state:                     Option<String>,
  pub hospital_name:             Option<String>,
  pub address:                   Option<String>,
  pub city:                      Option<String>,
  pub zip:                       Option<String>,
  pub fips_code:                 Option<String>,
  /// Raw `POINT (<lon> <lat>)` string; parsed per row by the engine.
  pub geocoded_hospital_address: Option<String>,
  pub metrics:                   CapacityMetrics,
  /// Measure cells that did not parse; the matching metric is `None`. A
  /// non-empty list rejects the row's report.
  pub malformed_measures:        Vec<MalformedCell>,
}

// ─── Quality ─────────────────────────────────────────────────────────────────

/// One row of a CMS hospital quality-rating file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QualityRow {
  pub facility_id:        Option<String>,
  pub facility_name:      Option<String>,
  pub hospital_type:      Option<String>,
  pub emergency_services: Option<String>,
  pub address:            Option<String>,
  pub city:               Option<String>,
  pub state:              Option<String>,
  pub zip_code:           Option<String>,
  pub county_name:        Option<String>,
  /// Overall star rating, or the `"Not Available"` sentinel.
  pub overall_rating:     Option<String>,
}
