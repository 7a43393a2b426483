//! The arbitration case — the central entity of the system.
//!
//! A case carries its dispute amount only as ciphertext. Its status is a pure
//! function of the signed vote tally, except for the administrative
//! rejection path which moves a pending case to [`CaseStatus::Rejected`].

use std::fmt;

use chrono::Utc;
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Magnitude of the tally at which a case resolves.
pub const VOTE_THRESHOLD: i64 = 3;

const ID_SUFFIX_LEN: usize = 7;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Opaque case identifier: `{unix-millis}-{7 base36 chars}`.
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CaseId(String);

impl CaseId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  /// A fresh time-based identifier with a random suffix.
  pub fn generate() -> Self {
    let millis = Utc::now().timestamp_millis();
    let suffix: String = (0..ID_SUFFIX_LEN)
      .map(|_| BASE36[(OsRng.next_u32() % 36) as usize] as char)
      .collect();
    Self(format!("{millis}-{suffix}"))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for CaseId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Identity of an arbitrator casting a vote. Authorization happens outside
/// this crate; the id only attributes ballots.
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ArbitratorId(String);

impl ArbitratorId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ArbitratorId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
  #[default]
  Pending,
  Resolved,
  Rejected,
}

impl CaseStatus {
  /// The status implied by a tally alone. Never yields `Rejected`.
  pub fn from_tally(votes: i64) -> Self {
    if votes.unsigned_abs() >= VOTE_THRESHOLD.unsigned_abs() {
      Self::Resolved
    } else {
      Self::Pending
    }
  }

  pub fn is_pending(self) -> bool { matches!(self, Self::Pending) }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::Resolved => "resolved",
      Self::Rejected => "rejected",
    }
  }
}

impl fmt::Display for CaseStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Case ────────────────────────────────────────────────────────────────────

/// A single arbitration dispute.
///
/// `arbitrator_votes` keeps its sign: positive tallies lean toward accepting
/// the claim, negative toward dismissing it. Resolution only looks at the
/// magnitude, so a resolved case does not by itself say which side won.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
  pub id:               CaseId,
  pub encrypted_amount: String,
  pub details:          String,
  /// Seconds since the Unix epoch; set once at creation.
  pub timestamp:        i64,
  pub plaintiff:        String,
  pub defendant:        String,
  pub status:           CaseStatus,
  pub arbitrator_votes: i64,
}

impl Case {
  /// Apply one vote, returning the updated case.
  ///
  /// Fails with [`Error::CaseClosed`] unless the case is pending; `self` is
  /// never modified.
  pub fn apply_vote(&self, accept: bool) -> Result<Case> {
    self.ensure_pending()?;
    let delta = if accept { 1 } else { -1 };
    let votes = self.arbitrator_votes.saturating_add(delta);
    Ok(Case {
      arbitrator_votes: votes,
      status: CaseStatus::from_tally(votes),
      ..self.clone()
    })
  }

  /// Administrative rejection of a pending case.
  pub fn reject(&self) -> Result<Case> {
    self.ensure_pending()?;
    Ok(Case { status: CaseStatus::Rejected, ..self.clone() })
  }

  /// Whether `address` is the plaintiff or the defendant. Addresses compare
  /// case-insensitively.
  pub fn is_involved_party(&self, address: &str) -> bool {
    !address.is_empty()
      && (self.plaintiff.eq_ignore_ascii_case(address)
        || self.defendant.eq_ignore_ascii_case(address))
  }

  fn ensure_pending(&self) -> Result<()> {
    if self.status.is_pending() {
      Ok(())
    } else {
      Err(Error::CaseClosed { id: self.id.clone(), status: self.status })
    }
  }
}

// ─── NewCase ─────────────────────────────────────────────────────────────────

/// Input to case creation. The amount is plaintext here and is encrypted
/// before anything is persisted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCase {
  pub plaintiff: String,
  pub defendant: String,
  pub amount:    f64,
  #[serde(default)]
  pub details:   String,
}

// ─── Statistics ──────────────────────────────────────────────────────────────

/// Per-status counts over a set of cases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseStats {
  pub total:    usize,
  pub pending:  usize,
  pub resolved: usize,
  pub rejected: usize,
}

impl<'a> FromIterator<&'a Case> for CaseStats {
  fn from_iter<I: IntoIterator<Item = &'a Case>>(iter: I) -> Self {
    iter.into_iter().fold(Self::default(), |mut stats, case| {
      stats.total += 1;
      match case.status {
        CaseStatus::Pending => stats.pending += 1,
        CaseStatus::Resolved => stats.resolved += 1,
        CaseStatus::Rejected => stats.rejected += 1,
      }
      stats
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn pending_case() -> Case {
    Case {
      id:               CaseId::new("1-abc"),
      encrypted_amount: "FHE-MTA=".into(),
      details:          "late delivery".into(),
      timestamp:        100,
      plaintiff:        "0xAbC".into(),
      defendant:        "0xdef".into(),
      status:           CaseStatus::Pending,
      arbitrator_votes: 0,
    }
  }

  #[test]
  fn tally_magnitude_decides_resolution() {
    assert_eq!(CaseStatus::from_tally(0), CaseStatus::Pending);
    assert_eq!(CaseStatus::from_tally(2), CaseStatus::Pending);
    assert_eq!(CaseStatus::from_tally(-2), CaseStatus::Pending);
    assert_eq!(CaseStatus::from_tally(3), CaseStatus::Resolved);
    assert_eq!(CaseStatus::from_tally(-3), CaseStatus::Resolved);
    assert_eq!(CaseStatus::from_tally(i64::MIN), CaseStatus::Resolved);
  }

  #[test]
  fn apply_vote_does_not_touch_original() {
    let case = pending_case();
    let voted = case.apply_vote(false).unwrap();
    assert_eq!(case.arbitrator_votes, 0);
    assert_eq!(voted.arbitrator_votes, -1);
    assert_eq!(voted.status, CaseStatus::Pending);
  }

  #[test]
  fn resolved_case_refuses_votes() {
    let mut case = pending_case();
    for _ in 0..3 {
      case = case.apply_vote(true).unwrap();
    }
    assert_eq!(case.status, CaseStatus::Resolved);
    assert!(matches!(
      case.apply_vote(true),
      Err(Error::CaseClosed { status: CaseStatus::Resolved, .. })
    ));
  }

  #[test]
  fn reject_only_from_pending() {
    let rejected = pending_case().reject().unwrap();
    assert_eq!(rejected.status, CaseStatus::Rejected);
    assert!(rejected.reject().is_err());
    assert!(rejected.apply_vote(true).is_err());
  }

  #[test]
  fn involved_party_ignores_ascii_case() {
    let case = pending_case();
    assert!(case.is_involved_party("0xabc"));
    assert!(case.is_involved_party("0xDEF"));
    assert!(!case.is_involved_party("0x123"));
    assert!(!case.is_involved_party(""));
  }

  #[test]
  fn generated_ids_have_expected_shape() {
    let id = CaseId::generate();
    let (millis, suffix) = id.as_str().split_once('-').unwrap();
    assert!(millis.parse::<i64>().is_ok());
    assert_eq!(suffix.len(), ID_SUFFIX_LEN);
    assert!(suffix.bytes().all(|b| BASE36.contains(&b)));
    assert_ne!(CaseId::generate(), id);
  }

  #[test]
  fn stats_count_each_status() {
    let a = pending_case();
    let b = pending_case().reject().unwrap();
    let c = Case { status: CaseStatus::Resolved, ..pending_case() };
    let stats: CaseStats = [&a, &b, &c, &a].into_iter().collect();
    assert_eq!(stats, CaseStats { total: 4, pending: 2, resolved: 1, rejected: 1 });
  }
}
