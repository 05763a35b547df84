//! The `FacilityStore` trait.
//!
//! Implemented by storage backends (e.g. `hospital-store-sqlite`). The batch
//! driver in `hospital-load` depends on this abstraction, not on any
//! concrete backend.

use std::{collections::HashSet, future::Future};

use crate::{
  engine::LoadReport,
  row::{CapacityRow, QualityRow},
};

/// Abstraction over a facility store backend.
///
/// A run takes the id snapshot first, then hands the whole batch to one of
/// the `load_*` methods, which open the outer transaction, drive the engine
/// through a savepoint-per-write session and commit.
pub trait FacilityStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Every `facility_id` currently in the facility table.
  ///
  /// The read runs in its own transaction, committed before this returns,
  /// so no lock is held into the batch. Empty table → empty set.
  fn existing_facility_ids(
    &self,
  ) -> impl Future<Output = Result<HashSet<String>, Self::Error>> + Send + '_;

  /// Run the capacity loader over `rows` in one outer transaction.
  fn load_capacity(
    &self,
    rows: Vec<CapacityRow>,
    existing: HashSet<String>,
  ) -> impl Future<Output = Result<LoadReport, Self::Error>> + Send + '_;

  /// Run the quality loader over `rows`, all dated `rating_date`, in one
  /// outer transaction.
  fn load_quality(
    &self,
    rating_date: String,
    rows: Vec<QualityRow>,
    existing: HashSet<String>,
  ) -> impl Future<Output = Result<LoadReport, Self::Error>> + Send + '_;
}
