//! An in-process [`Ledger`] — useful for testing and for embedding.

use std::{
  collections::HashMap,
  sync::{
    PoisonError, RwLock,
    atomic::{AtomicBool, Ordering},
  },
};

use arbiter_core::ledger::Ledger;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MemoryLedgerError {
  #[error("ledger is offline")]
  Offline,

  #[error("write to {0:?} rejected")]
  WriteRejected(String),
}

/// A map of slots behind a lock, with switches to simulate outages.
///
/// Every get and set yields to the scheduler once, so concurrent callers
/// interleave the way they would against a remote store.
#[derive(Debug, Default)]
pub struct MemoryLedger {
  slots:       RwLock<HashMap<String, Bytes>>,
  offline:     AtomicBool,
  fail_writes: AtomicBool,
  fail_prefix: RwLock<Option<String>>,
}

impl MemoryLedger {
  pub fn new() -> Self { Self::default() }

  /// While offline, the probe reports `false` and every call fails.
  pub fn set_offline(&self, offline: bool) {
    self.offline.store(offline, Ordering::SeqCst);
  }

  /// While set, reads succeed but every write fails.
  pub fn set_fail_writes(&self, fail: bool) {
    self.fail_writes.store(fail, Ordering::SeqCst);
  }

  /// While set, writes to keys starting with `prefix` fail.
  pub fn fail_writes_to(&self, prefix: Option<&str>) {
    *self.fail_prefix.write().unwrap_or_else(PoisonError::into_inner) =
      prefix.map(str::to_owned);
  }

  fn rejects_write(&self, key: &str) -> bool {
    self.fail_writes.load(Ordering::SeqCst)
      || self
        .fail_prefix
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .as_deref()
        .is_some_and(|prefix| key.starts_with(prefix))
  }

  /// Read a slot directly, bypassing the outage switches.
  pub fn peek(&self, key: &str) -> Option<Bytes> {
    self
      .slots
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .get(key)
      .cloned()
  }

  /// Every key currently holding a value, in no particular order.
  pub fn keys(&self) -> Vec<String> {
    self
      .slots
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .keys()
      .cloned()
      .collect()
  }

  /// Write a slot directly, bypassing the outage switches.
  pub fn poke(&self, key: impl Into<String>, value: impl Into<Bytes>) {
    self
      .slots
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(key.into(), value.into());
  }

  fn is_offline(&self) -> bool { self.offline.load(Ordering::SeqCst) }
}

impl Ledger for MemoryLedger {
  type Error = MemoryLedgerError;

  async fn get(&self, key: &str) -> Result<Bytes, Self::Error> {
    tokio::task::yield_now().await;
    if self.is_offline() {
      return Err(MemoryLedgerError::Offline);
    }
    Ok(self.peek(key).unwrap_or_default())
  }

  async fn set(&self, key: &str, value: Bytes) -> Result<(), Self::Error> {
    tokio::task::yield_now().await;
    if self.is_offline() {
      return Err(MemoryLedgerError::Offline);
    }
    if self.rejects_write(key) {
      return Err(MemoryLedgerError::WriteRejected(key.to_owned()));
    }
    self.poke(key, value);
    Ok(())
  }

  async fn is_available(&self) -> bool { !self.is_offline() }
}
