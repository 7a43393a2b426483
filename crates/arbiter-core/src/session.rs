//! Session parameters and the decryption challenge message.
//!
//! A [`SessionParams`] value is built once per process (or per viewer
//! session) and passed explicitly to whoever needs to produce a challenge.
//! It carries no authority by itself.

use chrono::{DateTime, Duration, Utc};
use rand_core::{OsRng, RngCore};
use serde::Serialize;

/// Number of random bytes behind the hex public key (2000 hex characters).
const PUBLIC_KEY_BYTES: usize = 1000;

pub const DEFAULT_DURATION_DAYS: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionParams {
  /// Opaque, non-secret key material: `0x` followed by lowercase hex.
  pub public_key:       String,
  /// Address of the ledger contract the signature is scoped to.
  pub contract_address: String,
  pub chain_id:         u64,
  /// Seconds since the Unix epoch.
  pub start_timestamp:  i64,
  pub duration_days:    u32,
}

impl SessionParams {
  /// Fresh parameters starting now, with newly generated key material.
  pub fn generate(
    contract_address: impl Into<String>,
    chain_id: u64,
    duration_days: u32,
  ) -> Self {
    Self {
      public_key: generate_public_key(),
      contract_address: contract_address.into(),
      chain_id,
      start_timestamp: Utc::now().timestamp(),
      duration_days,
    }
  }

  /// The canonical newline-delimited message a viewer must sign.
  pub fn challenge_message(&self) -> String {
    format!(
      "publickey:{}\ncontractAddresses:{}\ncontractsChainId:{}\nstartTimestamp:{}\ndurationDays:{}",
      self.public_key,
      self.contract_address,
      self.chain_id,
      self.start_timestamp,
      self.duration_days,
    )
  }

  /// End of the validity window, in seconds since the Unix epoch.
  pub fn expires_at(&self) -> i64 {
    self
      .start_timestamp
      .saturating_add(Duration::days(i64::from(self.duration_days)).num_seconds())
  }

  pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
    now.timestamp() >= self.expires_at()
  }
}

fn generate_public_key() -> String {
  let mut bytes = vec![0u8; PUBLIC_KEY_BYTES];
  OsRng.fill_bytes(&mut bytes);
  format!("0x{}", hex::encode(bytes))
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn fixed() -> SessionParams {
    SessionParams {
      public_key:       "0xabcd".into(),
      contract_address: "0xC0FFEE".into(),
      chain_id:         11155111,
      start_timestamp:  1_700_000_000,
      duration_days:    30,
    }
  }

  #[test]
  fn challenge_message_layout_is_exact() {
    assert_eq!(
      fixed().challenge_message(),
      "publickey:0xabcd\n\
       contractAddresses:0xC0FFEE\n\
       contractsChainId:11155111\n\
       startTimestamp:1700000000\n\
       durationDays:30"
    );
  }

  #[test]
  fn generated_key_is_long_lowercase_hex() {
    let params = SessionParams::generate("0x1", 1, DEFAULT_DURATION_DAYS);
    let hex_part = params.public_key.strip_prefix("0x").unwrap();
    assert_eq!(hex_part.len(), 2 * PUBLIC_KEY_BYTES);
    assert!(hex_part.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
    assert_ne!(params.public_key, SessionParams::generate("0x1", 1, 30).public_key);
  }

  #[test]
  fn validity_window_ends_after_duration() {
    let params = fixed();
    assert_eq!(params.expires_at(), 1_700_000_000 + 30 * 86_400);
    let inside = Utc.timestamp_opt(params.expires_at() - 1, 0).unwrap();
    let at_end = Utc.timestamp_opt(params.expires_at(), 0).unwrap();
    assert!(!params.is_expired_at(inside));
    assert!(params.is_expired_at(at_end));
  }
}
