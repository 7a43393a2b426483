//! [`SqliteLedger`] — the SQLite implementation of [`Ledger`].

use std::path::Path;

use arbiter_core::ledger::Ledger;
use bytes::Bytes;
use rusqlite::OptionalExtension as _;

use crate::{Error, Result, schema::SCHEMA};

/// A ledger backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteLedger {
  conn: tokio_rusqlite::Connection,
}

impl SqliteLedger {
  /// Open (or create) a ledger at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let ledger = Self { conn };
    ledger.init_schema().await?;
    Ok(ledger)
  }

  /// Open an in-memory ledger — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let ledger = Self { conn };
    ledger.init_schema().await?;
    Ok(ledger)
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
}

// ─── Ledger impl ─────────────────────────────────────────────────────────────

impl Ledger for SqliteLedger {
  type Error = Error;

  async fn get(&self, key: &str) -> Result<Bytes> {
    let key = key.to_owned();
    let value: Option<Vec<u8>> = self
      .conn
      .call(move |conn| {
        let value = conn
          .query_row(
            "SELECT value FROM slots WHERE key = ?1",
            rusqlite::params![key],
            |r| r.get(0),
          )
          .optional()?;
        Ok(value)
      })
      .await?;
    Ok(value.map(Bytes::from).unwrap_or_default())
  }

  async fn set(&self, key: &str, value: Bytes) -> Result<()> {
    let key = key.to_owned();
    let value = value.to_vec();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO slots (key, value, updated_at)
           VALUES (?1, ?2, CAST(strftime('%s', 'now') AS INTEGER))
           ON CONFLICT (key) DO UPDATE
             SET value = excluded.value, updated_at = excluded.updated_at",
          rusqlite::params![key, value],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn is_available(&self) -> bool {
    let probe = self
      .conn
      .call(|conn| {
        let one: i64 = conn.query_row("SELECT 1", [], |r| r.get(0))?;
        Ok(one)
      })
      .await;
    match probe {
      Ok(_) => true,
      Err(e) => {
        tracing::warn!(error = %e, "sqlite ledger probe failed");
        false
      }
    }
  }
}
