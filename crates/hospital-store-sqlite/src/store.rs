//! [`SqliteStore`]: the SQLite implementation of [`FacilityStore`].

use std::{collections::HashSet, path::Path};

use hospital_core::{
  engine::{self, LoadReport},
  row::{CapacityMetrics, CapacityRow, QualityRow},
  store::FacilityStore,
};
use rusqlite::OptionalExtension as _;
use tracing::debug;

use crate::{Result, schema::SCHEMA, session::SqliteSession};

// ─── Read models ─────────────────────────────────────────────────────────────

/// A full `facility_information` row, as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFacility {
  pub facility_id:       String,
  pub facility_name:     Option<String>,
  pub lat:               Option<f64>,
  pub lon:               Option<f64>,
  pub address:           Option<String>,
  pub city:              Option<String>,
  pub state:             Option<String>,
  pub zipcode:           Option<String>,
  pub fipscode:          Option<String>,
  pub facility_type:     Option<String>,
  pub emergency_service: Option<bool>,
  pub county:            Option<String>,
}

/// A `facility_reports` row.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredReport {
  pub hospital_pk: String,
  pub report_date: String,
  pub metrics:     CapacityMetrics,
}

/// A `quality_ratings` row.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRating {
  pub facility_id: String,
  pub rating_date: String,
  pub rating:      Option<f64>,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A facility store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// Fetch one facility by natural key.
  pub async fn facility(&self, facility_id: &str) -> Result<Option<StoredFacility>> {
    let id = facility_id.to_owned();

    let facility = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT facility_id, facility_name, lat, lon, address, city, state,
                      zipcode, fipscode, facility_type, emergency_service, county
               FROM facility_information WHERE facility_id = ?1",
              rusqlite::params![id],
              |row| {
                Ok(StoredFacility {
                  facility_id:       row.get(0)?,
                  facility_name:     row.get(1)?,
                  lat:               row.get(2)?,
                  lon:               row.get(3)?,
                  address:           row.get(4)?,
                  city:              row.get(5)?,
                  state:             row.get(6)?,
                  zipcode:           row.get(7)?,
                  fipscode:          row.get(8)?,
                  facility_type:     row.get(9)?,
                  emergency_service: row.get(10)?,
                  county:            row.get(11)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    Ok(facility)
  }

  /// Every capacity report for a hospital, in insertion order.
  pub async fn capacity_reports(&self, hospital_pk: &str) -> Result<Vec<StoredReport>> {
    let id = hospital_pk.to_owned();

    let reports = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT hospital_pk, report_date,
                  total_adult_hospital_beds, total_pediatric_hospital_beds,
                  total_adult_hospital_beds_occupied, total_pediatric_hospital_beds_occupied,
                  total_icu_beds, total_icu_beds_occupied,
                  inpatient_beds_occupied_covid, adult_icu_patients_confirmed_covid
           FROM facility_reports WHERE hospital_pk = ?1 ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id], |row| {
            Ok(StoredReport {
              hospital_pk: row.get(0)?,
              report_date: row.get(1)?,
              metrics:     CapacityMetrics {
                total_adult_hospital_beds:              row.get(2)?,
                total_pediatric_hospital_beds:          row.get(3)?,
                total_adult_hospital_beds_occupied:     row.get(4)?,
                total_pediatric_hospital_beds_occupied: row.get(5)?,
                total_icu_beds:                         row.get(6)?,
                total_icu_beds_occupied:                row.get(7)?,
                inpatient_beds_occupied_covid:          row.get(8)?,
                adult_icu_patients_confirmed_covid:     row.get(9)?,
              },
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(reports)
  }

  /// Every quality rating for a facility, in insertion order.
  pub async fn quality_ratings(&self, facility_id: &str) -> Result<Vec<StoredRating>> {
    let id = facility_id.to_owned();

    let ratings = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT facility_id, rating_date, rating
           FROM quality_ratings WHERE facility_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id], |row| {
            Ok(StoredRating {
              facility_id: row.get(0)?,
              rating_date: row.get(1)?,
              rating:      row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(ratings)
  }
}

// ─── FacilityStore impl ──────────────────────────────────────────────────────

impl FacilityStore for SqliteStore {
  type Error = crate::Error;

  async fn existing_facility_ids(&self) -> Result<HashSet<String>> {
    let ids: HashSet<String> = self
      .conn
      .call(|conn| {
        // Own read transaction, committed before any batch begins.
        let tx = conn.transaction()?;
        let ids = {
          let mut stmt = tx.prepare("SELECT facility_id FROM facility_information")?;
          stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<HashSet<_>>>()?
        };
        tx.commit()?;
        Ok(ids)
      })
      .await?;

    debug!(count = ids.len(), "existing facility snapshot");
    Ok(ids)
  }

  async fn load_capacity(
    &self,
    rows:     Vec<CapacityRow>,
    existing: HashSet<String>,
  ) -> Result<LoadReport> {
    let report = self
      .conn
      .call(move |conn| {
        let mut session = SqliteSession::begin(conn)?;
        let report = engine::load_capacity(&mut session, &existing, rows)?;
        session.commit()?;
        Ok(report)
      })
      .await?;
    Ok(report)
  }

  async fn load_quality(
    &self,
    rating_date: String,
    rows:        Vec<QualityRow>,
    existing:    HashSet<String>,
  ) -> Result<LoadReport> {
    let report = self
      .conn
      .call(move |conn| {
        let mut session = SqliteSession::begin(conn)?;
        let report = engine::load_quality(&mut session, &existing, &rating_date, rows)?;
        session.commit()?;
        Ok(report)
      })
      .await?;
    Ok(report)
  }
}
