//! Error types for `arbiter-core`.

use std::time::Duration;

use thiserror::Error;

use crate::case::{ArbitratorId, CaseId, CaseStatus};

#[derive(Debug, Error)]
pub enum Error {
  /// The external store is unreachable, a read/write failed, or the
  /// availability probe came back negative.
  #[error("ledger unavailable: {0}")]
  LedgerUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("case not found: {0}")]
  CaseNotFound(CaseId),

  /// A single case record or index entry failed to parse.
  #[error("malformed record at {key:?}: {reason}")]
  MalformedRecord { key: String, reason: String },

  #[error("signer refused: {0}")]
  SignerRefused(String),

  #[error("no signature within {0:?}")]
  SignatureTimeout(Duration),

  #[error("session expired at {0}")]
  SessionExpired(i64),

  #[error("cannot decode ciphertext: {0}")]
  Decode(String),

  #[error("case {id} is {status}, not pending")]
  CaseClosed { id: CaseId, status: CaseStatus },

  #[error("arbitrator {arbitrator} already voted on case {id}")]
  AlreadyVoted { id: CaseId, arbitrator: ArbitratorId },

  #[error("case {0} changed since it was read")]
  RevisionMismatch(CaseId),

  #[error("dispute amount must be finite, got {0}")]
  InvalidAmount(f64),

  #[error("could not allocate an unused case id after {0} attempts")]
  IdCollision(usize),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Box a backend error as [`Error::LedgerUnavailable`].
  pub fn ledger<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::LedgerUnavailable(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
