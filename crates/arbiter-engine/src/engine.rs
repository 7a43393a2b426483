//! [`Arbitration`] — case creation, voting and resolution.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::OwnedMutexGuard;

use arbiter_core::{
  Error, Result,
  case::{ArbitratorId, Case, CaseId, CaseStats, CaseStatus, NewCase},
  codec::{FieldCodec, StubCodec},
  ledger::Ledger,
};
use chrono::Utc;

use crate::{adapter::CaseLedger, record::revision};

const MAX_ID_ATTEMPTS: usize = 8;

type CaseLocks = Mutex<HashMap<CaseId, Arc<tokio::sync::Mutex<()>>>>;

/// Holds one case's mutex. On drop the map entry is removed once nobody else
/// holds or waits on it.
struct CaseGuard<'a> {
  locks: &'a CaseLocks,
  id:    CaseId,
  held:  Option<OwnedMutexGuard<()>>,
}

impl Drop for CaseGuard<'_> {
  fn drop(&mut self) {
    self.held.take();
    let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(lock) = locks.get(&self.id)
      && Arc::strong_count(lock) == 1
    {
      locks.remove(&self.id);
    }
  }
}

/// The case lifecycle state machine.
///
/// Mutations of one case are serialised through a per-case async mutex, so
/// concurrent votes handled by the same `Arbitration` never lose updates.
/// Writers outside this instance are not coordinated with; the ledger offers
/// no compare-and-swap.
pub struct Arbitration<L, C = StubCodec> {
  cases:      CaseLedger<L>,
  codec:      Arc<C>,
  case_locks: CaseLocks,
}

impl<L: Ledger, C: FieldCodec> Arbitration<L, C> {
  pub fn new(ledger: Arc<L>, codec: Arc<C>) -> Self {
    Self {
      cases: CaseLedger::new(ledger),
      codec,
      case_locks: Mutex::new(HashMap::new()),
    }
  }

  pub fn cases(&self) -> &CaseLedger<L> { &self.cases }

  pub fn codec(&self) -> &Arc<C> { &self.codec }

  async fn lock_case(&self, id: &CaseId) -> CaseGuard<'_> {
    let lock = self
      .case_locks
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .entry(id.clone())
      .or_default()
      .clone();
    let held = lock.lock_owned().await;
    CaseGuard { locks: &self.case_locks, id: id.clone(), held: Some(held) }
  }

  #[cfg(test)]
  pub(crate) fn tracked_locks(&self) -> usize {
    self.case_locks.lock().unwrap_or_else(PoisonError::into_inner).len()
  }

  // ── Create ────────────────────────────────────────────────────────────────

  /// File a new pending case. The amount is encrypted before it leaves this
  /// function.
  pub async fn create(&self, input: NewCase) -> Result<Case> {
    if !input.amount.is_finite() {
      return Err(Error::InvalidAmount(input.amount));
    }
    if input.plaintiff.eq_ignore_ascii_case(&input.defendant) {
      tracing::warn!(party = %input.plaintiff, "plaintiff and defendant are the same party");
    }

    let id = self.unused_id().await?;
    let case = Case {
      id,
      encrypted_amount: self.codec.encode(input.amount),
      details: input.details,
      timestamp: Utc::now().timestamp(),
      plaintiff: input.plaintiff,
      defendant: input.defendant,
      status: CaseStatus::Pending,
      arbitrator_votes: 0,
    };

    self.cases.create(&case).await?;
    tracing::info!(case_id = %case.id, "case filed");
    Ok(case)
  }

  async fn unused_id(&self) -> Result<CaseId> {
    for _ in 0..MAX_ID_ATTEMPTS {
      let id = CaseId::generate();
      if !self.cases.exists(&id).await? {
        return Ok(id);
      }
      tracing::warn!(case_id = %id, "generated case id already taken; retrying");
    }
    Err(Error::IdCollision(MAX_ID_ATTEMPTS))
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  pub async fn get(&self, id: &CaseId) -> Result<Case> {
    self
      .cases
      .load(id)
      .await?
      .ok_or_else(|| Error::CaseNotFound(id.clone()))
  }

  /// All cases, newest first.
  pub async fn list(&self) -> Result<Vec<Case>> { self.cases.load_all().await }

  /// Cases still open for voting, newest first.
  pub async fn pending(&self) -> Result<Vec<Case>> {
    let mut cases = self.list().await?;
    cases.retain(|c| c.status.is_pending());
    Ok(cases)
  }

  pub async fn stats(&self) -> Result<CaseStats> {
    Ok(self.list().await?.iter().collect())
  }

  // ── Voting ────────────────────────────────────────────────────────────────

  /// Record one arbitrator's vote. Each arbitrator votes at most once per
  /// case; closed cases accept no votes.
  pub async fn vote(
    &self,
    id: &CaseId,
    arbitrator: &ArbitratorId,
    accept: bool,
  ) -> Result<Case> {
    self.apply_vote(id, arbitrator, accept, None).await
  }

  /// As [`vote`](Self::vote), but only if the stored case still has
  /// `expected` as its [`revision`](crate::revision).
  pub async fn vote_if_match(
    &self,
    id: &CaseId,
    arbitrator: &ArbitratorId,
    accept: bool,
    expected: &str,
  ) -> Result<Case> {
    self.apply_vote(id, arbitrator, accept, Some(expected)).await
  }

  async fn apply_vote(
    &self,
    id: &CaseId,
    arbitrator: &ArbitratorId,
    accept: bool,
    expected: Option<&str>,
  ) -> Result<Case> {
    let _guard = self.lock_case(id).await;

    let case = self.get(id).await?;
    if let Some(expected) = expected
      && revision(&case)? != expected
    {
      return Err(Error::RevisionMismatch(id.clone()));
    }

    let updated = case.apply_vote(accept)?;
    let mut ballots = self.cases.load_ballots(id).await?;
    if ballots.contains(arbitrator) {
      return Err(Error::AlreadyVoted {
        id:         id.clone(),
        arbitrator: arbitrator.clone(),
      });
    }

    // Ballot before case, so a stored tally change always has its ballot.
    let prior = ballots.clone();
    ballots.push(arbitrator.clone());
    self.cases.save_ballots(id, &ballots).await?;
    if let Err(e) = self.cases.save(&updated).await {
      if let Err(undo) = self.cases.save_ballots(id, &prior).await {
        tracing::warn!(
          case_id = %id,
          %arbitrator,
          error = %undo,
          "could not withdraw ballot after failed vote"
        );
      }
      return Err(e);
    }

    tracing::info!(
      case_id = %id,
      %arbitrator,
      accept,
      tally = updated.arbitrator_votes,
      status = %updated.status,
      "vote recorded"
    );
    Ok(updated)
  }

  // ── Administration ────────────────────────────────────────────────────────

  /// Move a pending case to `rejected`.
  pub async fn reject(&self, id: &CaseId) -> Result<Case> {
    let _guard = self.lock_case(id).await;

    let updated = self.get(id).await?.reject()?;
    self.cases.save(&updated).await?;
    tracing::info!(case_id = %id, "case rejected");
    Ok(updated)
  }
}
