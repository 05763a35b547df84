//! Serde views of the two source files.
//!
//! Column names are part of the source contract; rows are matched to fields
//! by header name, never by position. Every cell is read as text, so a bad
//! value is a problem of its row and never of the file.

use hospital_core::row::{CapacityMetrics, CapacityRow, MalformedCell, QualityRow};
use serde::Deserialize;

// ─── HHS capacity ────────────────────────────────────────────────────────────

/// Every column the capacity loader reads: the identity/location columns
/// followed by the eight measures.
pub const CAPACITY_COLUMNS: &[&str] = &[
  "hospital_pk",
  "collection_week",
  "state",
  "hospital_name",
  "address",
  "city",
  "zip",
  "fips_code",
  "geocoded_hospital_address",
  "all_adult_hospital_beds_7_day_avg",
  "all_pediatric_inpatient_beds_7_day_avg",
  "all_adult_hospital_inpatient_bed_occupied_7_day_avg",
  "all_pediatric_inpatient_bed_occupied_7_day_avg",
  "total_icu_beds_7_day_avg",
  "icu_beds_used_7_day_avg",
  "inpatient_beds_used_covid_7_day_avg",
  "staffed_icu_adult_patients_confirmed_covid_7_day_avg",
];

#[derive(Debug, Deserialize)]
pub(crate) struct CapacityRecord {
  hospital_pk:                                          Option<String>,
  collection_week:                                      Option<String>,
  state:                                                Option<String>,
  hospital_name:                                        Option<String>,
  address:                                              Option<String>,
  city:                                                 Option<String>,
  zip:                                                  Option<String>,
  fips_code:                                            Option<String>,
  geocoded_hospital_address:                            Option<String>,
  all_adult_hospital_beds_7_day_avg:                    Option<String>,
  all_pediatric_inpatient_beds_7_day_avg:               Option<String>,
  all_adult_hospital_inpatient_bed_occupied_7_day_avg:  Option<String>,
  all_pediatric_inpatient_bed_occupied_7_day_avg:       Option<String>,
  total_icu_beds_7_day_avg:                             Option<String>,
  icu_beds_used_7_day_avg:                              Option<String>,
  inpatient_beds_used_covid_7_day_avg:                  Option<String>,
  staffed_icu_adult_patients_confirmed_covid_7_day_avg: Option<String>,
}

impl From<CapacityRecord> for CapacityRow {
  fn from(r: CapacityRecord) -> Self {
    let mut malformed = Vec::new();
    let mut measure = |column: &'static str, raw: Option<String>| {
      parse_measure(column, raw, &mut malformed)
    };

    let metrics = CapacityMetrics {
      total_adult_hospital_beds:              measure(
        "all_adult_hospital_beds_7_day_avg",
        r.all_adult_hospital_beds_7_day_avg,
      ),
      total_pediatric_hospital_beds:          measure(
        "all_pediatric_inpatient_beds_7_day_avg",
        r.all_pediatric_inpatient_beds_7_day_avg,
      ),
      total_adult_hospital_beds_occupied:     measure(
        "all_adult_hospital_inpatient_bed_occupied_7_day_avg",
        r.all_adult_hospital_inpatient_bed_occupied_7_day_avg,
      ),
      total_pediatric_hospital_beds_occupied: measure(
        "all_pediatric_inpatient_bed_occupied_7_day_avg",
        r.all_pediatric_inpatient_bed_occupied_7_day_avg,
      ),
      total_icu_beds:                         measure(
        "total_icu_beds_7_day_avg",
        r.total_icu_beds_7_day_avg,
      ),
      total_icu_beds_occupied:                measure(
        "icu_beds_used_7_day_avg",
        r.icu_beds_used_7_day_avg,
      ),
      inpatient_beds_occupied_covid:          measure(
        "inpatient_beds_used_covid_7_day_avg",
        r.inpatient_beds_used_covid_7_day_avg,
      ),
      adult_icu_patients_confirmed_covid:     measure(
        "staffed_icu_adult_patients_confirmed_covid_7_day_avg",
        r.staffed_icu_adult_patients_confirmed_covid_7_day_avg,
      ),
    };

    Self {
      hospital_pk:               r.hospital_pk,
      collection_week:           r.collection_week,
      state:                     r.state,
      hospital_name:             r.hospital_name,
      address:                   r.address,
      city:                      r.city,
      zip:                       r.zip,
      fips_code:                 r.fips_code,
      geocoded_hospital_address: r.geocoded_hospital_address,
      metrics,
      malformed_measures:        malformed,
    }
  }
}

/// Parse one measure cell. Text that is not a number is recorded in
/// `malformed` and read as `None`.
fn parse_measure(
  column: &'static str,
  raw: Option<String>,
  malformed: &mut Vec<MalformedCell>,
) -> Option<f64> {
  let raw = raw?;
  match raw.parse::<f64>() {
    Ok(value) => Some(value),
    Err(_) => {
      malformed.push(MalformedCell { column, value: raw });
      None
    }
  }
}

// ─── CMS quality ─────────────────────────────────────────────────────────────

pub const QUALITY_COLUMNS: &[&str] = &[
  "Facility ID",
  "Facility Name",
  "Hospital Type",
  "Emergency Services",
  "Address",
  "City",
  "State",
  "ZIP Code",
  "County Name",
  "Hospital overall rating",
];

#[derive(Debug, Deserialize)]
pub(crate) struct QualityRecord {
  #[serde(rename = "Facility ID")]
  facility_id:        Option<String>,
  #[serde(rename = "Facility Name")]
  facility_name:      Option<String>,
  #[serde(rename = "Hospital Type")]
  hospital_type:      Option<String>,
  #[serde(rename = "Emergency Services")]
  emergency_services: Option<String>,
  #[serde(rename = "Address")]
  address:            Option<String>,
  #[serde(rename = "City")]
  city:               Option<String>,
  #[serde(rename = "State")]
  state:              Option<String>,
  #[serde(rename = "ZIP Code")]
  zip_code:           Option<String>,
  #[serde(rename = "County Name")]
  county_name:        Option<String>,
  #[serde(rename = "Hospital overall rating")]
  overall_rating:     Option<String>,
}

impl From<QualityRecord> for QualityRow {
  fn from(r: QualityRecord) -> Self {
    Self {
      facility_id:        r.facility_id,
      facility_name:      r.facility_name,
      hospital_type:      r.hospital_type,
      emergency_services: r.emergency_services,
      address:            r.address,
      city:               r.city,
      state:              r.state,
      zip_code:           r.zip_code,
      county_name:        r.county_name,
      overall_rating:     r.overall_rating,
    }
  }
}
