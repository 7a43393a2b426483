//! [`CaseLedger`] — maps cases onto the slots of a [`Ledger`].

use std::sync::Arc;

use arbiter_core::{
  Error, Result,
  case::{ArbitratorId, Case, CaseId},
  ledger::Ledger,
};
use bytes::Bytes;
use tokio::sync::Mutex;

use crate::record::{
  INDEX_KEY, ballots_key, case_key, decode_ballots, decode_case, decode_index,
  encode_ballots, encode_case, encode_index,
};

/// Case persistence over an opaque key-value ledger.
///
/// Every call goes straight to the ledger; nothing is cached. Index appends
/// from this adapter are serialised, but other adapters (or processes)
/// writing the same ledger are not coordinated with.
pub struct CaseLedger<L> {
  ledger:     Arc<L>,
  index_lock: Mutex<()>,
}

impl<L: Ledger> CaseLedger<L> {
  pub fn new(ledger: Arc<L>) -> Self {
    Self { ledger, index_lock: Mutex::new(()) }
  }

  pub fn ledger(&self) -> &Arc<L> { &self.ledger }

  async fn read(&self, key: &str) -> Result<Bytes> {
    self.ledger.get(key).await.map_err(Error::ledger)
  }

  async fn write(&self, key: &str, value: Bytes) -> Result<()> {
    self.ledger.set(key, value).await.map_err(Error::ledger)
  }

  async fn ensure_available(&self) -> Result<()> {
    if self.ledger.is_available().await {
      Ok(())
    } else {
      Err(Error::LedgerUnavailable("availability probe failed".into()))
    }
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// Every readable case, newest first.
  ///
  /// An offline ledger or a missing/corrupt index lists as empty. Records
  /// that are missing, unreadable or malformed are skipped.
  pub async fn load_all(&self) -> Result<Vec<Case>> {
    if !self.ledger.is_available().await {
      tracing::warn!("ledger availability probe failed; listing no cases");
      return Ok(Vec::new());
    }

    let ids = match decode_index(&self.read(INDEX_KEY).await?) {
      Ok(ids) => ids,
      Err(e) => {
        tracing::warn!(error = %e, "case index unreadable; listing no cases");
        return Ok(Vec::new());
      }
    };

    let mut cases = Vec::with_capacity(ids.len());
    for id in ids {
      let key = case_key(&id);
      let bytes = match self.read(&key).await {
        Ok(bytes) => bytes,
        Err(e) => {
          tracing::warn!(%key, error = %e, "skipping unreadable case");
          continue;
        }
      };
      if bytes.is_empty() {
        tracing::warn!(%key, "index references a missing case; skipping");
        continue;
      }
      match decode_case(id, &bytes) {
        Ok(case) => cases.push(case),
        Err(e) => tracing::warn!(%key, error = %e, "skipping malformed case"),
      }
    }

    cases.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(cases)
  }

  /// A single case, or `None` if its slot is empty.
  pub async fn load(&self, id: &CaseId) -> Result<Option<Case>> {
    self.ensure_available().await?;
    let bytes = self.read(&case_key(id)).await?;
    if bytes.is_empty() {
      return Ok(None);
    }
    decode_case(id.clone(), &bytes).map(Some)
  }

  pub async fn exists(&self, id: &CaseId) -> Result<bool> {
    Ok(!self.read(&case_key(id)).await?.is_empty())
  }

  pub async fn load_ballots(&self, id: &CaseId) -> Result<Vec<ArbitratorId>> {
    decode_ballots(id, &self.read(&ballots_key(id)).await?)
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  /// Persist a new case and append its id to the index.
  ///
  /// The index is read and validated before anything is written. The two
  /// writes are still not atomic: if the index write fails the case slot
  /// stays unindexed.
  pub async fn create(&self, case: &Case) -> Result<()> {
    self.ensure_available().await?;
    let record = encode_case(case)?;

    let _guard = self.index_lock.lock().await;
    let mut ids = decode_index(&self.read(INDEX_KEY).await?)?;
    self.write(&case_key(&case.id), record).await?;
    if !ids.contains(&case.id) {
      ids.push(case.id.clone());
    }
    self.write(INDEX_KEY, encode_index(&ids)?).await
  }

  /// Replace the whole stored record for `case`.
  pub async fn save(&self, case: &Case) -> Result<()> {
    self.write(&case_key(&case.id), encode_case(case)?).await
  }

  pub async fn save_ballots(
    &self,
    id: &CaseId,
    ballots: &[ArbitratorId],
  ) -> Result<()> {
    self.write(&ballots_key(id), encode_ballots(ballots)?).await
  }
}
