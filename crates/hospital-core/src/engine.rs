//! The reconciliation and load engine.
//!
//! Per row, in source order:
//!
//!   row record
//!     └─ plan()              → facility column group + fact row
//!          └─ classify       → insert (key not in snapshot) | update
//!               ├─ Write::InsertFacility / Write::UpdateFacility  (savepoint)
//!               └─ Write::AppendFact                              (savepoint)
//!
//! The fact write is attempted whatever happened to the facility write. A
//! column group or fact that cannot be built from the row (bad geocode,
//! non-numeric measure) fails its step without reaching the store. A
//! rejected write is logged, recorded against the row, and the batch moves
//! on; only a fatal session error stops it.
//!
//! The snapshot of existing ids is taken once, before the batch, and is not
//! updated as rows are inserted. Two rows in one batch carrying the same new
//! id both attempt an INSERT and the second is rejected by the store.

use std::{collections::HashSet, fmt};

use tracing::warn;

use crate::{
  Error,
  fact::{CapacityReport, Fact, QualityRating},
  facility::{CapacityFacility, Facility, QualityFacility},
  row::{CapacityRow, QualityRow},
  sanitize::{parse_geocode, sanitize_capacity_batch, sanitize_rating},
  session::{Attempt, LoadSession, Write},
};

// ─── Report ──────────────────────────────────────────────────────────────────

/// The step of the per-row state machine at which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
  /// The row could not be turned into writes (no natural key).
  Extract,
  InsertFacility,
  UpdateFacility,
  AppendFact,
}

impl Step {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Extract => "extract",
      Self::InsertFacility => "insert_facility",
      Self::UpdateFacility => "update_facility",
      Self::AppendFact => "append_fact",
    }
  }
}

impl fmt::Display for Step {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
  pub step:    Step,
  pub message: String,
}

/// Every failed step of one source row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
  /// Zero-based position of the row among the data rows of the file.
  pub index:       usize,
  pub facility_id: Option<String>,
  pub steps:       Vec<StepFailure>,
}

/// Counters and failures of one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
  pub facilities_inserted: usize,
  pub facilities_updated:  usize,
  pub facts_inserted:      usize,
  /// One entry per row that failed at least one step, in row order.
  pub failures:            Vec<RowFailure>,
}

// ─── Entry points ────────────────────────────────────────────────────────────

/// Load a batch of capacity rows.
///
/// Measures are sanitized over the whole batch before the first row is
/// classified; geocodes are parsed per row.
pub fn load_capacity<S: LoadSession>(
  session:  &mut S,
  existing: &HashSet<String>,
  mut rows: Vec<CapacityRow>,
) -> Result<LoadReport, S::Error> {
  sanitize_capacity_batch(&mut rows);

  let mut engine = Engine::new(session, existing);
  for (index, row) in rows.into_iter().enumerate() {
    engine.reconcile(index, plan_capacity(row))?;
  }
  Ok(engine.report)
}

/// Load a batch of quality rows, all dated `rating_date`.
pub fn load_quality<S: LoadSession>(
  session:     &mut S,
  existing:    &HashSet<String>,
  rating_date: &str,
  rows:        Vec<QualityRow>,
) -> Result<LoadReport, S::Error> {
  let mut engine = Engine::new(session, existing);
  for (index, row) in rows.into_iter().enumerate() {
    engine.reconcile(index, plan_quality(row, rating_date))?;
  }
  Ok(engine.report)
}

// ─── Planning ────────────────────────────────────────────────────────────────

/// The writes derived from one row.
struct Plan {
  facility_id: String,
  /// `Err` when the owned columns could not be derived (bad geocode); the
  /// facility step then fails without reaching the store.
  facility:    Result<Facility, Error>,
  /// `Err` when the fact could not be built (non-numeric measure).
  fact:        Result<Fact, Error>,
  fact_table:  &'static str,
}

fn natural_key(raw: Option<String>) -> Result<String, Error> {
  raw
    .map(|id| id.trim().to_owned())
    .filter(|id| !id.is_empty())
    .ok_or(Error::MissingFacilityId)
}

fn plan_capacity(row: CapacityRow) -> Result<Plan, Error> {
  let facility_id = natural_key(row.hospital_pk)?;

  let facility = parse_geocode(row.geocoded_hospital_address.as_deref()).map(|(lat, lon)| {
    Facility::Capacity(CapacityFacility {
      facility_id: facility_id.clone(),
      facility_name: row.hospital_name,
      lat,
      lon,
      address: row.address,
      city: row.city,
      state: row.state,
      zipcode: row.zip,
      fipscode: row.fips_code,
    })
  });

  let fact = if row.malformed_measures.is_empty() {
    Ok(Fact::Capacity(CapacityReport {
      hospital_pk: facility_id.clone(),
      report_date: row.collection_week,
      metrics:     row.metrics,
    }))
  } else {
    Err(Error::MalformedMeasures(row.malformed_measures))
  };

  Ok(Plan { facility_id, facility, fact, fact_table: "facility_reports" })
}

fn plan_quality(row: QualityRow, rating_date: &str) -> Result<Plan, Error> {
  let facility_id = natural_key(row.facility_id)?;

  let facility = Facility::Quality(QualityFacility {
    facility_id:       facility_id.clone(),
    facility_name:     row.facility_name,
    facility_type:     row.hospital_type,
    emergency_service: row.emergency_services,
    address:           row.address,
    city:              row.city,
    state:             row.state,
    zipcode:           row.zip_code,
    county:            row.county_name,
  });

  let fact = Fact::Quality(QualityRating {
    facility_id: facility_id.clone(),
    rating_date: rating_date.to_owned(),
    rating:      sanitize_rating(row.overall_rating),
  });

  Ok(Plan {
    facility_id,
    facility: Ok(facility),
    fact: Ok(fact),
    fact_table: "quality_ratings",
  })
}

// ─── Engine ──────────────────────────────────────────────────────────────────

struct Engine<'a, S> {
  session:  &'a mut S,
  existing: &'a HashSet<String>,
  report:   LoadReport,
}

impl<'a, S: LoadSession> Engine<'a, S> {
  fn new(session: &'a mut S, existing: &'a HashSet<String>) -> Self {
    Self { session, existing, report: LoadReport::default() }
  }

  fn reconcile(&mut self, index: usize, planned: Result<Plan, Error>) -> Result<(), S::Error> {
    let plan = match planned {
      Ok(plan) => plan,
      Err(e) => {
        warn!(row = index, step = %Step::Extract, error = %e, "row skipped");
        self.report.failures.push(RowFailure {
          index,
          facility_id: None,
          steps: vec![StepFailure { step: Step::Extract, message: e.to_string() }],
        });
        return Ok(());
      }
    };

    let mut failed = Vec::new();

    // Classify against the batch-start snapshot.
    let is_new = !self.existing.contains(&plan.facility_id);
    let step = if is_new { Step::InsertFacility } else { Step::UpdateFacility };

    let attempt = match &plan.facility {
      Ok(facility) => {
        let write = if is_new {
          Write::InsertFacility(facility)
        } else {
          Write::UpdateFacility(facility)
        };
        self.session.apply(write)?
      }
      Err(e) => Attempt::Rejected(e.to_string()),
    };
    match attempt {
      Attempt::Applied if is_new => self.report.facilities_inserted += 1,
      Attempt::Applied => self.report.facilities_updated += 1,
      Attempt::Rejected(message) => {
        warn!(
          row = index,
          step = %step,
          facility_id = %plan.facility_id,
          error = %message,
          "facility_information write failed"
        );
        failed.push(StepFailure { step, message });
      }
    }

    let attempt = match &plan.fact {
      Ok(fact) => self.session.apply(Write::AppendFact(fact))?,
      Err(e) => Attempt::Rejected(e.to_string()),
    };
    match attempt {
      Attempt::Applied => self.report.facts_inserted += 1,
      Attempt::Rejected(message) => {
        warn!(
          row = index,
          step = %Step::AppendFact,
          facility_id = %plan.facility_id,
          error = %message,
          "{} write failed",
          plan.fact_table
        );
        failed.push(StepFailure { step: Step::AppendFact, message });
      }
    }

    if !failed.is_empty() {
      self.report.failures.push(RowFailure {
        index,
        facility_id: Some(plan.facility_id),
        steps: failed,
      });
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    row::{CapacityMetrics, MalformedCell},
    testing::{Call, MemorySession},
  };

  fn capacity_row(id: &str, geocode: Option<&str>) -> CapacityRow {
    CapacityRow {
      hospital_pk:               Some(id.into()),
      collection_week:           Some("2022-09-23".into()),
      state:                     Some("PA".into()),
      hospital_name:             Some(format!("Hospital {id}")),
      address:                   Some("1 Main St".into()),
      city:                      Some("Pittsburgh".into()),
      zip:                       Some("15213".into()),
      fips_code:                 Some("42003".into()),
      geocoded_hospital_address: geocode.map(str::to_owned),
      metrics:                   CapacityMetrics {
        total_adult_hospital_beds:              Some(100.0),
        total_pediatric_hospital_beds:          Some(10.0),
        total_adult_hospital_beds_occupied:     Some(80.0),
        total_pediatric_hospital_beds_occupied: Some(5.0),
        total_icu_beds:                         Some(20.0),
        total_icu_beds_occupied:                Some(15.0),
        inpatient_beds_occupied_covid:          Some(7.0),
        adult_icu_patients_confirmed_covid:     Some(3.0),
      },
      malformed_measures:        Vec::new(),
    }
  }

  fn quality_row(id: &str, rating: &str) -> QualityRow {
    QualityRow {
      facility_id:        Some(id.into()),
      facility_name:      Some(format!("Hospital {id}")),
      hospital_type:      Some("Acute Care Hospitals".into()),
      emergency_services: Some("Yes".into()),
      address:            Some("1 Main St".into()),
      city:               Some("Dothan".into()),
      state:              Some("AL".into()),
      zip_code:           Some("36301".into()),
      county_name:        Some("HOUSTON".into()),
      overall_rating:     Some(rating.into()),
    }
  }

  fn ids(list: &[&str]) -> HashSet<String> {
    list.iter().map(|s| s.to_string()).collect()
  }

  // ── Scenario ────────────────────────────────────────────────────────────────

  #[test]
  fn three_row_capacity_scenario() {
    let mut session = MemorySession::with_facilities(&["B"]);

    let mut row_b = capacity_row("B", Some("POINT (-80.0 40.0)"));
    row_b.metrics.total_icu_beds = Some(-999_999.0);

    let rows = vec![
      capacity_row("A", Some("POINT (-79.95 40.44)")),
      row_b,
      capacity_row("C", None),
    ];

    let report = load_capacity(&mut session, &ids(&["B"]), rows).unwrap();

    assert_eq!(report.facilities_inserted, 2);
    assert_eq!(report.facilities_updated, 1);
    assert_eq!(report.facts_inserted, 3);
    assert!(report.failures.is_empty());

    let Facility::Capacity(a) = &session.facilities["A"] else { panic!() };
    assert_eq!((a.lat, a.lon), (Some(40.44), Some(-79.95)));

    let Facility::Capacity(c) = &session.facilities["C"] else { panic!() };
    assert_eq!((c.lat, c.lon), (None, None));

    let Fact::Capacity(b_report) = &session.facts[1] else { panic!() };
    assert_eq!(b_report.hospital_pk, "B");
    assert_eq!(b_report.metrics.total_icu_beds, None);
    assert_eq!(b_report.metrics.total_icu_beds_occupied, Some(15.0));
    assert_eq!(b_report.metrics.total_adult_hospital_beds, Some(100.0));
  }

  // ── Classification ──────────────────────────────────────────────────────────

  #[test]
  fn every_keyed_row_gets_one_facility_and_one_fact_attempt() {
    let mut session = MemorySession::with_facilities(&["K"]);

    let rows = vec![
      capacity_row("K", None),
      capacity_row("N", None),
      capacity_row("Z", Some("POINT (oops)")),
    ];

    load_capacity(&mut session, &ids(&["K"]), rows).unwrap();

    assert_eq!(
      session.calls,
      vec![
        Call::Update("K".into()),
        Call::Append("K".into()),
        Call::Insert("N".into()),
        Call::Append("N".into()),
        // The bad geocode fails the facility step before the store; the
        // fact is still attempted (and rejected, "Z" was never inserted).
        Call::Append("Z".into()),
      ]
    );
  }

  #[test]
  fn malformed_geocode_fails_dimension_step_only() {
    let mut session = MemorySession::with_facilities(&["G"]);
    let rows = vec![capacity_row("G", Some("POINT (-79.95)"))];

    let report = load_capacity(&mut session, &ids(&["G"]), rows).unwrap();

    assert_eq!(report.facilities_updated, 0);
    assert_eq!(report.facts_inserted, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].steps.len(), 1);
    assert_eq!(report.failures[0].steps[0].step, Step::UpdateFacility);
    assert!(report.failures[0].steps[0].message.contains("malformed geocode"));
  }

  // ── Isolation ───────────────────────────────────────────────────────────────

  #[test]
  fn blank_key_is_isolated() {
    let mut session = MemorySession::default();
    let rows = vec![
      capacity_row("A", None),
      capacity_row("B", None),
      capacity_row("", None),
      capacity_row("D", None),
    ];

    let report = load_capacity(&mut session, &HashSet::new(), rows).unwrap();

    assert_eq!(report.facilities_inserted, 3);
    assert_eq!(report.facts_inserted, 3);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 2);
    assert_eq!(report.failures[0].facility_id, None);
    assert_eq!(report.failures[0].steps[0].step, Step::Extract);
    // Nothing was sent to the store for the blank row.
    assert_eq!(session.calls.len(), 6);
  }

  #[test]
  fn missing_key_is_isolated_for_quality() {
    let mut session = MemorySession::default();
    let mut keyless = quality_row("x", "3");
    keyless.facility_id = None;
    let rows = vec![quality_row("010001", "3"), keyless];

    let report = load_quality(&mut session, &HashSet::new(), "2022-01-01", rows).unwrap();

    assert_eq!(report.facilities_inserted, 1);
    assert_eq!(report.facts_inserted, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 1);
  }

  #[test]
  fn duplicate_new_key_in_one_batch() {
    let mut session = MemorySession::default();
    let rows = vec![capacity_row("DUP", None), capacity_row("DUP", None)];

    let report = load_capacity(&mut session, &HashSet::new(), rows).unwrap();

    assert_eq!(report.facilities_inserted, 1);
    assert_eq!(report.facilities_updated, 0);
    assert_eq!(report.facts_inserted, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 1);
    assert_eq!(report.failures[0].steps[0].step, Step::InsertFacility);
    assert_eq!(
      session.calls,
      vec![
        Call::Insert("DUP".into()),
        Call::Append("DUP".into()),
        Call::Insert("DUP".into()),
        Call::Append("DUP".into()),
      ]
    );
  }

  #[test]
  fn failed_steps_of_one_row_are_reported_once() {
    let mut session = MemorySession::default();
    let rows = vec![capacity_row("X", Some("garbage"))];

    let report = load_capacity(&mut session, &HashSet::new(), rows).unwrap();

    assert_eq!(report.failures.len(), 1);
    let steps: Vec<Step> = report.failures[0].steps.iter().map(|s| s.step).collect();
    assert_eq!(steps, vec![Step::InsertFacility, Step::AppendFact]);
  }

  #[test]
  fn non_numeric_measure_rejects_only_that_report() {
    let mut session = MemorySession::default();
    let mut bad = capacity_row("B", None);
    bad.metrics.total_adult_hospital_beds = None;
    bad.malformed_measures = vec![MalformedCell {
      column: "all_adult_hospital_beds_7_day_avg",
      value:  "N/A".into(),
    }];
    let rows = vec![capacity_row("A", None), bad, capacity_row("C", None)];

    let report = load_capacity(&mut session, &HashSet::new(), rows).unwrap();

    assert_eq!(report.facilities_inserted, 3);
    assert_eq!(report.facts_inserted, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 1);
    assert_eq!(report.failures[0].steps.len(), 1);
    assert_eq!(report.failures[0].steps[0].step, Step::AppendFact);
    assert!(report.failures[0].steps[0].message.contains("all_adult_hospital_beds_7_day_avg"));
    // The report never reached the store.
    assert!(!session.calls.contains(&Call::Append("B".into())));
  }

  #[test]
  fn fatal_session_error_aborts_the_batch() {
    let mut session = MemorySession::default();
    session.fail_after(1);
    let rows = vec![capacity_row("A", None), capacity_row("B", None)];

    let result = load_capacity(&mut session, &HashSet::new(), rows);

    assert!(result.is_err());
    assert_eq!(session.calls.len(), 1);
  }

  // ── Quality ─────────────────────────────────────────────────────────────────

  #[test]
  fn duplicate_new_quality_key_in_one_batch() {
    let mut session = MemorySession::default();
    let rows = vec![quality_row("010001", "3"), quality_row("010001", "4")];

    let report = load_quality(&mut session, &HashSet::new(), "2022-03-01", rows).unwrap();

    assert_eq!(report.facilities_inserted, 1);
    assert_eq!(report.facilities_updated, 0);
    assert_eq!(report.facts_inserted, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 1);
    assert_eq!(report.failures[0].steps[0].step, Step::InsertFacility);
    assert_eq!(
      session.calls,
      vec![
        Call::Insert("010001".into()),
        Call::Append("010001".into()),
        Call::Insert("010001".into()),
        Call::Append("010001".into()),
      ]
    );
  }

  #[test]
  fn quality_rows_carry_batch_date_and_sanitized_rating() {
    let mut session = MemorySession::with_facilities(&["010001"]);
    let rows = vec![
      quality_row("010001", "Not Available"),
      quality_row("010005", "4"),
    ];

    let report =
      load_quality(&mut session, &ids(&["010001"]), "2022-03-01", rows).unwrap();

    assert_eq!(report.facilities_inserted, 1);
    assert_eq!(report.facilities_updated, 1);
    assert_eq!(report.facts_inserted, 2);

    let ratings: Vec<_> = session
      .facts
      .iter()
      .map(|f| match f {
        Fact::Quality(r) => (r.rating_date.as_str(), r.rating.clone()),
        Fact::Capacity(_) => panic!("unexpected capacity fact"),
      })
      .collect();
    assert_eq!(
      ratings,
      vec![("2022-03-01", None), ("2022-03-01", Some("4".to_string()))]
    );
  }
}
