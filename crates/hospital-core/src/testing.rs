//! In-memory `LoadSession` used by the engine tests.
//!
//! Mimics the store constraints the engine relies on: a unique facility id
//! and a foreign key from facts to facilities.

use std::collections::HashMap;

use thiserror::Error;

use crate::{
  fact::Fact,
  facility::{CapacityFacility, Facility},
  session::{Attempt, LoadSession, Write},
};

#[derive(Debug, Error)]
#[error("connection lost")]
pub struct ConnectionLost;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
  Insert(String),
  Update(String),
  Append(String),
}

#[derive(Default)]
pub struct MemorySession {
  pub facilities: HashMap<String, Facility>,
  pub facts:      Vec<Fact>,
  pub calls:      Vec<Call>,
  fail_after:     Option<usize>,
}

impl MemorySession {
  pub fn with_facilities(ids: &[&str]) -> Self {
    let facilities = ids
      .iter()
      .map(|id| {
        let facility = Facility::Capacity(CapacityFacility {
          facility_id: id.to_string(),
          ..CapacityFacility::default()
        });
        (id.to_string(), facility)
      })
      .collect();
    Self { facilities, ..Self::default() }
  }

  /// Every `apply` after the first `calls` ones fails fatally.
  pub fn fail_after(&mut self, calls: usize) { self.fail_after = Some(calls); }
}

impl LoadSession for MemorySession {
  type Error = ConnectionLost;

  fn apply(&mut self, write: Write<'_>) -> Result<Attempt, ConnectionLost> {
    if self.fail_after.is_some_and(|limit| self.calls.len() >= limit) {
      return Err(ConnectionLost);
    }

    let attempt = match write {
      Write::InsertFacility(facility) => {
        let id = facility.facility_id().to_owned();
        self.calls.push(Call::Insert(id.clone()));
        if self.facilities.contains_key(&id) {
          Attempt::Rejected(format!("duplicate facility_id {id}"))
        } else {
          self.facilities.insert(id, facility.clone());
          Attempt::Applied
        }
      }
      Write::UpdateFacility(facility) => {
        let id = facility.facility_id().to_owned();
        self.calls.push(Call::Update(id.clone()));
        if let Some(existing) = self.facilities.get_mut(&id) {
          *existing = facility.clone();
        }
        Attempt::Applied
      }
      Write::AppendFact(fact) => {
        let id = fact.facility_id().to_owned();
        self.calls.push(Call::Append(id.clone()));
        if self.facilities.contains_key(&id) {
          self.facts.push(fact.clone());
          Attempt::Applied
        } else {
          Attempt::Rejected(format!("unknown facility_id {id}"))
        }
      }
    };
    Ok(attempt)
  }
}
