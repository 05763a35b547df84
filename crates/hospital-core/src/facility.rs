//! Facility dimension column groups.
//!
//! Each loader owns a different slice of `facility_information`. A loader
//! inserts its whole group for a new facility but, for a known facility,
//! updates only the columns listed on its type below, so neither loader
//! clobbers the other's data.

/// Columns written by the capacity loader.
///
/// INSERT writes every field; UPDATE writes only `lat`, `lon` and
/// `fipscode`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapacityFacility {
  pub facility_id:   String,
  pub facility_name: Option<String>,
  pub lat:           Option<f64>,
  pub lon:           Option<f64>,
  pub address:       Option<String>,
  pub city:          Option<String>,
  pub state:         Option<String>,
  pub zipcode:       Option<String>,
  pub fipscode:      Option<String>,
}

/// Columns written by the quality loader.
///
/// INSERT writes every field; UPDATE writes only `facility_type`,
/// `emergency_service`, `state` and `county`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QualityFacility {
  pub facility_id:       String,
  pub facility_name:     Option<String>,
  pub facility_type:     Option<String>,
  /// Raw yes/no flag; the store coerces it to a boolean.
  pub emergency_service: Option<String>,
  pub address:           Option<String>,
  pub city:              Option<String>,
  pub state:             Option<String>,
  pub zipcode:           Option<String>,
  pub county:            Option<String>,
}

/// A facility column group, tagged by the loader that owns it.
#[derive(Debug, Clone, PartialEq)]
pub enum Facility {
  Capacity(CapacityFacility),
  Quality(QualityFacility),
}

impl Facility {
  pub fn facility_id(&self) -> &str {
    match self {
      Self::Capacity(f) => &f.facility_id,
      Self::Quality(f) => &f.facility_id,
    }
  }
}
