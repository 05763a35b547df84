//! [`SqliteSession`]: one batch transaction with a savepoint per write.

use hospital_core::{
  fact::Fact,
  facility::Facility,
  session::{Attempt, LoadSession, Write},
};
use rusqlite::{Connection, ErrorCode, Transaction};
use tracing::trace;

use crate::encode::{Coercion, encode_date, encode_flag, encode_rating};

/// The outer transaction of a batch.
///
/// Dropping the session without calling [`SqliteSession::commit`] rolls the
/// whole batch back.
pub struct SqliteSession<'conn> {
  tx: Transaction<'conn>,
}

impl<'conn> SqliteSession<'conn> {
  pub fn begin(conn: &'conn mut Connection) -> rusqlite::Result<Self> {
    Ok(Self { tx: conn.transaction()? })
  }

  pub fn commit(self) -> rusqlite::Result<()> { self.tx.commit() }
}

impl LoadSession for SqliteSession<'_> {
  type Error = rusqlite::Error;

  fn apply(&mut self, write: Write<'_>) -> rusqlite::Result<Attempt> {
    let savepoint = self.tx.savepoint()?;

    match execute(&savepoint, write) {
      Ok(()) => {
        savepoint.commit()?;
        trace!(table = write.table(), "write applied");
        Ok(Attempt::Applied)
      }
      Err(WriteFailure::Coercion(e)) => {
        savepoint.finish()?;
        Ok(Attempt::Rejected(e.to_string()))
      }
      Err(WriteFailure::Sql(e)) if is_row_level(&e) => {
        savepoint.finish()?;
        Ok(Attempt::Rejected(e.to_string()))
      }
      Err(WriteFailure::Sql(e)) => Err(e),
    }
  }
}

// ─── Statements ──────────────────────────────────────────────────────────────

enum WriteFailure {
  Coercion(Coercion),
  Sql(rusqlite::Error),
}

impl From<Coercion> for WriteFailure {
  fn from(e: Coercion) -> Self { Self::Coercion(e) }
}

impl From<rusqlite::Error> for WriteFailure {
  fn from(e: rusqlite::Error) -> Self { Self::Sql(e) }
}

/// Failures caused by the row's own values rather than the connection.
fn is_row_level(e: &rusqlite::Error) -> bool {
  match e {
    rusqlite::Error::SqliteFailure(err, _) => matches!(
      err.code,
      ErrorCode::ConstraintViolation | ErrorCode::TypeMismatch | ErrorCode::TooBig
    ),
    rusqlite::Error::ToSqlConversionFailure(_) => true,
    _ => false,
  }
}

fn execute(conn: &Connection, write: Write<'_>) -> Result<(), WriteFailure> {
  match write {
    Write::InsertFacility(Facility::Capacity(f)) => conn.execute(
      "INSERT INTO facility_information (
         facility_id, facility_name, lat, lon,
         address, city, state, zipcode, fipscode
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
      rusqlite::params![
        f.facility_id,
        f.facility_name,
        f.lat,
        f.lon,
        f.address,
        f.city,
        f.state,
        f.zipcode,
        f.fipscode,
      ],
    )?,

    Write::UpdateFacility(Facility::Capacity(f)) => conn.execute(
      "UPDATE facility_information
       SET lat = ?1, lon = ?2, fipscode = ?3
       WHERE facility_id = ?4",
      rusqlite::params![f.lat, f.lon, f.fipscode, f.facility_id],
    )?,

    Write::InsertFacility(Facility::Quality(f)) => {
      let emergency = encode_flag("emergency_service", f.emergency_service.as_deref())?;
      conn.execute(
        "INSERT INTO facility_information (
           facility_id, facility_name, facility_type, emergency_service,
           address, city, state, zipcode, county
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
          f.facility_id,
          f.facility_name,
          f.facility_type,
          emergency,
          f.address,
          f.city,
          f.state,
          f.zipcode,
          f.county,
        ],
      )?
    }

    Write::UpdateFacility(Facility::Quality(f)) => {
      let emergency = encode_flag("emergency_service", f.emergency_service.as_deref())?;
      conn.execute(
        "UPDATE facility_information
         SET facility_type = ?1, emergency_service = ?2, state = ?3, county = ?4
         WHERE facility_id = ?5",
        rusqlite::params![f.facility_type, emergency, f.state, f.county, f.facility_id],
      )?
    }

    Write::AppendFact(Fact::Capacity(r)) => {
      let report_date = encode_date("report_date", r.report_date.as_deref())?;
      let [adult, pediatric, adult_occupied, pediatric_occupied, icu, icu_occupied, covid, icu_covid] =
        r.metrics.values();
      conn.execute(
        "INSERT INTO facility_reports (
           hospital_pk, report_date,
           total_adult_hospital_beds, total_pediatric_hospital_beds,
           total_adult_hospital_beds_occupied, total_pediatric_hospital_beds_occupied,
           total_icu_beds, total_icu_beds_occupied,
           inpatient_beds_occupied_covid, adult_icu_patients_confirmed_covid
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        rusqlite::params![
          r.hospital_pk,
          report_date,
          adult,
          pediatric,
          adult_occupied,
          pediatric_occupied,
          icu,
          icu_occupied,
          covid,
          icu_covid,
        ],
      )?
    }

    Write::AppendFact(Fact::Quality(r)) => {
      let rating_date = encode_date("rating_date", Some(r.rating_date.as_str()))?;
      let rating = encode_rating(r.rating.as_deref())?;
      conn.execute(
        "INSERT INTO quality_ratings (facility_id, rating_date, rating)
         VALUES (?1, ?2, ?3)",
        rusqlite::params![r.facility_id, rating_date, rating],
      )?
    }
  };
  Ok(())
}
