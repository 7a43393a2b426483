//! Encoding and decoding between domain types and the bytes stored in ledger
//! slots.
//!
//! Cases are stored as UTF-8 JSON objects without their id (the id lives in
//! the slot key). The index and ballot slots are JSON arrays of strings.

use arbiter_core::{
  Error, Result,
  case::{ArbitratorId, Case, CaseId, CaseStatus},
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ─── Keys ────────────────────────────────────────────────────────────────────

/// Slot holding the ordered list of every case id.
pub const INDEX_KEY: &str = "case_keys";

const CASE_PREFIX: &str = "case_";
const BALLOTS_PREFIX: &str = "ballots_";

pub fn case_key(id: &CaseId) -> String { format!("{CASE_PREFIX}{id}") }

pub fn ballots_key(id: &CaseId) -> String { format!("{BALLOTS_PREFIX}{id}") }

// ─── Case record ─────────────────────────────────────────────────────────────

/// The persisted shape of a case. Field order is the on-ledger key order.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaseRecord {
  amount:           String,
  #[serde(default)]
  details:          String,
  timestamp:        i64,
  plaintiff:        String,
  defendant:        String,
  #[serde(default)]
  status:           CaseStatus,
  #[serde(default)]
  arbitrator_votes: i64,
}

impl CaseRecord {
  fn from_case(case: &Case) -> Self {
    Self {
      amount:           case.encrypted_amount.clone(),
      details:          case.details.clone(),
      timestamp:        case.timestamp,
      plaintiff:        case.plaintiff.clone(),
      defendant:        case.defendant.clone(),
      status:           case.status,
      arbitrator_votes: case.arbitrator_votes,
    }
  }

  fn into_case(self, id: CaseId) -> Case {
    Case {
      id,
      encrypted_amount: self.amount,
      details: self.details,
      timestamp: self.timestamp,
      plaintiff: self.plaintiff,
      defendant: self.defendant,
      status: self.status,
      arbitrator_votes: self.arbitrator_votes,
    }
  }
}

pub fn encode_case(case: &Case) -> Result<Bytes> {
  Ok(Bytes::from(serde_json::to_vec(&CaseRecord::from_case(case))?))
}

pub fn decode_case(id: CaseId, bytes: &[u8]) -> Result<Case> {
  let record: CaseRecord =
    serde_json::from_slice(bytes).map_err(|e| malformed(&case_key(&id), e))?;
  Ok(record.into_case(id))
}

/// SHA-256 hex digest of the stored form of `case`. Two reads of an
/// unchanged slot always yield the same revision.
pub fn revision(case: &Case) -> Result<String> {
  let bytes = encode_case(case)?;
  Ok(hex::encode(Sha256::digest(&bytes)))
}

// ─── Index ───────────────────────────────────────────────────────────────────

/// Decode the index slot. Entries that are not strings are skipped with a
/// warning; duplicates keep their first position.
pub fn decode_index(bytes: &[u8]) -> Result<Vec<CaseId>> {
  if bytes.iter().all(u8::is_ascii_whitespace) {
    return Ok(Vec::new());
  }
  let entries: Vec<serde_json::Value> =
    serde_json::from_slice(bytes).map_err(|e| malformed(INDEX_KEY, e))?;

  let mut ids: Vec<CaseId> = Vec::with_capacity(entries.len());
  for (position, entry) in entries.into_iter().enumerate() {
    match entry {
      serde_json::Value::String(s) => {
        let id = CaseId::new(s);
        if !ids.contains(&id) {
          ids.push(id);
        }
      }
      other => {
        tracing::warn!(position, entry = %other, "skipping malformed index entry");
      }
    }
  }
  Ok(ids)
}

pub fn encode_index(ids: &[CaseId]) -> Result<Bytes> {
  Ok(Bytes::from(serde_json::to_vec(ids)?))
}

// ─── Ballots ─────────────────────────────────────────────────────────────────

pub fn decode_ballots(id: &CaseId, bytes: &[u8]) -> Result<Vec<ArbitratorId>> {
  if bytes.is_empty() {
    return Ok(Vec::new());
  }
  serde_json::from_slice(bytes).map_err(|e| malformed(&ballots_key(id), e))
}

pub fn encode_ballots(ballots: &[ArbitratorId]) -> Result<Bytes> {
  Ok(Bytes::from(serde_json::to_vec(ballots)?))
}

fn malformed(key: &str, e: serde_json::Error) -> Error {
  Error::MalformedRecord { key: key.to_owned(), reason: e.to_string() }
}
