//! The `LoadSession` trait: one open batch transaction.
//!
//! The engine never issues SQL itself. It hands each [`Write`] to the
//! session, which must run it inside its own savepoint so that a failed
//! write rolls back only itself and leaves earlier writes in the batch
//! intact.

use crate::{fact::Fact, facility::Facility};

/// A single isolated write the engine asks the session to apply.
#[derive(Debug, Clone, Copy)]
pub enum Write<'a> {
  /// INSERT the full column group of a facility not in the snapshot.
  InsertFacility(&'a Facility),
  /// UPDATE only the owned columns of a known facility, by natural key.
  UpdateFacility(&'a Facility),
  /// INSERT into the fact table matching the variant.
  AppendFact(&'a Fact),
}

impl Write<'_> {
  /// The table the write targets.
  pub fn table(&self) -> &'static str {
    match self {
      Self::InsertFacility(_) | Self::UpdateFacility(_) => "facility_information",
      Self::AppendFact(Fact::Capacity(_)) => "facility_reports",
      Self::AppendFact(Fact::Quality(_)) => "quality_ratings",
    }
  }
}

/// Outcome of one savepoint-wrapped write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
  /// The write succeeded and its savepoint was released.
  Applied,
  /// The write failed and its savepoint was rolled back. Carries the
  /// store's message (constraint violation, coercion failure, ...).
  Rejected(String),
}

/// An open batch transaction against the facility store.
///
/// `apply` returns `Err` only for failures that must abort the run (lost
/// connection, I/O). Anything attributable to the row itself comes back as
/// [`Attempt::Rejected`].
pub trait LoadSession {
  type Error: std::error::Error + Send + Sync + 'static;

  fn apply(&mut self, write: Write<'_>) -> Result<Attempt, Self::Error>;
}
