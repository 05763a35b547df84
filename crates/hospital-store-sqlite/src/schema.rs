//! SQL schema for the hospital SQLite store.
//!
//! Executed once at connection startup. The loaders never alter it.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Slowly-changing dimension. Columns are split between the two loaders:
-- capacity owns lat/lon/fipscode, quality owns facility_type,
-- emergency_service and county; both may set state.
CREATE TABLE IF NOT EXISTS facility_information (
    facility_id       TEXT PRIMARY KEY,
    facility_name     TEXT,
    lat               REAL,
    lon               REAL,
    address           TEXT,
    city              TEXT,
    state             TEXT,
    zipcode           TEXT,
    fipscode          TEXT,
    facility_type     TEXT,
    emergency_service INTEGER,         -- 0 | 1 | NULL
    county            TEXT
);

-- Facts are append-only; reloading a week appends again.
CREATE TABLE IF NOT EXISTS facility_reports (
    hospital_pk                            TEXT NOT NULL
                                             REFERENCES facility_information(facility_id),
    report_date                            TEXT NOT NULL,   -- YYYY-MM-DD
    total_adult_hospital_beds              REAL,
    total_pediatric_hospital_beds          REAL,
    total_adult_hospital_beds_occupied     REAL,
    total_pediatric_hospital_beds_occupied REAL,
    total_icu_beds                         REAL,
    total_icu_beds_occupied                REAL,
    inpatient_beds_occupied_covid          REAL,
    adult_icu_patients_confirmed_covid     REAL
);

CREATE TABLE IF NOT EXISTS quality_ratings (
    facility_id TEXT NOT NULL REFERENCES facility_information(facility_id),
    rating_date TEXT NOT NULL,   -- YYYY-MM-DD
    rating      REAL
);

CREATE INDEX IF NOT EXISTS facility_reports_hospital_idx ON facility_reports(hospital_pk);
CREATE INDEX IF NOT EXISTS quality_ratings_facility_idx  ON quality_ratings(facility_id);
";
