//! Core types and the reconciliation engine for the hospital data loaders.
//!
//! No CSV or database dependencies live here. The codec (`hospital-csv`)
//! produces the row records defined here, and storage backends (e.g.
//! `hospital-store-sqlite`) implement [`session::LoadSession`] and
//! [`store::FacilityStore`].

pub mod engine;
pub mod error;
pub mod fact;
pub mod facility;
pub mod row;
pub mod sanitize;
pub mod session;
pub mod store;

pub use error::{Error, Result};

#[cfg(test)]
mod testing;
