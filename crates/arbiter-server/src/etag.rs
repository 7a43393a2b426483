//! ETags for case resources.
//!
//! An ETag is the quoted [`revision`] of the stored record, so it changes
//! whenever any persisted field does and never otherwise.

use arbiter_core::case::Case;
use arbiter_engine::revision;

use crate::error::Error;

pub fn compute_etag(case: &Case) -> Result<String, Error> {
  Ok(format!("\"{}\"", revision(case)?))
}

/// Strip surrounding quotes and a weak-validator prefix from an ETag value.
pub fn strip_etag_quotes(s: &str) -> &str {
  let s = s.trim();
  let s = s.strip_prefix("W/").unwrap_or(s);
  s.trim_matches('"')
}

#[cfg(test)]
mod tests {
  use arbiter_core::case::{CaseId, CaseStatus};

  use super::*;

  fn case(votes: i64) -> Case {
    Case {
      id:               CaseId::new("1-a"),
      encrypted_amount: "FHE-MQ==".into(),
      details:          String::new(),
      timestamp:        1,
      plaintiff:        "p".into(),
      defendant:        "d".into(),
      status:           CaseStatus::Pending,
      arbitrator_votes: votes,
    }
  }

  #[test]
  fn etag_is_quoted_revision() {
    let etag = compute_etag(&case(0)).unwrap();
    assert!(etag.starts_with('"') && etag.ends_with('"'));
    assert_eq!(strip_etag_quotes(&etag), revision(&case(0)).unwrap());
  }

  #[test]
  fn vote_changes_etag() {
    assert_ne!(compute_etag(&case(0)).unwrap(), compute_etag(&case(1)).unwrap());
  }

  #[test]
  fn strips_weak_prefix() {
    assert_eq!(strip_etag_quotes(" W/\"abc\" "), "abc");
    assert_eq!(strip_etag_quotes("abc"), "abc");
  }
}
