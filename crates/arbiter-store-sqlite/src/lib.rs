//! SQLite-backed ledger for Arbiter.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. The database is a single key/value
//! table; it knows nothing about cases.

mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteLedger;
