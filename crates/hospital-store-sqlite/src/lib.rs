//! SQLite backend for the hospital facility store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. A batch runs entirely inside
//! one `Connection::call`, in one outer transaction, with a savepoint per
//! write.

mod encode;
mod schema;
mod session;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{SqliteStore, StoredFacility, StoredRating, StoredReport};
