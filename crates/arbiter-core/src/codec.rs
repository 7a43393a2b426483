//! Encrypted field codec.
//!
//! [`FieldCodec`] is the contract a confidential-computation backend must
//! satisfy for a numeric field. [`StubCodec`] is a reversible placeholder: it
//! hides nothing and cannot compute over ciphertext, but it fixes the wire
//! format already present in ledgers (`FHE-` followed by base64 of the
//! decimal rendering).

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;

use crate::{Error, Result};

/// Encodes and decodes a numeric value to and from an opaque string.
///
/// Implementations must satisfy `decode(&encode(v)) == v` for every finite
/// `v`.
pub trait FieldCodec: Send + Sync {
  fn encode(&self, value: f64) -> String;

  fn decode(&self, ciphertext: &str) -> Result<f64>;
}

/// Prefix marking a value produced by [`StubCodec::encode`].
pub const CIPHERTEXT_PREFIX: &str = "FHE-";

#[derive(Debug, Clone, Copy, Default)]
pub struct StubCodec;

impl FieldCodec for StubCodec {
  fn encode(&self, value: f64) -> String {
    format!("{CIPHERTEXT_PREFIX}{}", B64.encode(value.to_string()))
  }

  /// Accepts either a prefixed ciphertext or a legacy plain number such as
  /// `"42.5"` written before values were encoded.
  fn decode(&self, ciphertext: &str) -> Result<f64> {
    match ciphertext.strip_prefix(CIPHERTEXT_PREFIX) {
      Some(payload) => {
        let bytes = B64
          .decode(payload)
          .map_err(|e| Error::Decode(format!("invalid base64: {e}")))?;
        let text = String::from_utf8(bytes)
          .map_err(|_| Error::Decode("payload is not UTF-8".to_string()))?;
        parse_finite(&text)
      }
      None => parse_finite(ciphertext),
    }
  }
}

fn parse_finite(text: &str) -> Result<f64> {
  let value: f64 = text
    .trim()
    .parse()
    .map_err(|_| Error::Decode(format!("not a number: {text:?}")))?;
  if value.is_finite() {
    Ok(value)
  } else {
    Err(Error::Decode(format!("not a finite number: {text:?}")))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn encodes_with_prefix_and_base64() {
    assert_eq!(StubCodec.encode(42.0), "FHE-NDI=");
    assert_eq!(StubCodec.encode(1.5), "FHE-MS41");
  }

  #[test]
  fn round_trips_representative_values() {
    for v in [
      0.0,
      -0.0,
      1.0,
      -17.25,
      0.1 + 0.2,
      1e-300,
      123_456_789.123,
      f64::MAX,
      f64::MIN_POSITIVE,
    ] {
      let decoded = StubCodec.decode(&StubCodec.encode(v)).unwrap();
      assert_eq!(decoded.to_bits(), v.to_bits(), "value {v}");
    }
  }

  #[test]
  fn legacy_plain_number_is_accepted() {
    assert_eq!(StubCodec.decode("42.5").unwrap(), 42.5);
    assert_eq!(StubCodec.decode("-3").unwrap(), -3.0);
  }

  #[test]
  fn garbage_is_a_decode_error() {
    for bad in ["", "abc", "FHE-!!!", "FHE-", "NaN", "inf"] {
      assert!(
        matches!(StubCodec.decode(bad), Err(Error::Decode(_))),
        "expected decode error for {bad:?}"
      );
    }
  }

  #[test]
  fn non_utf8_payload_is_a_decode_error() {
    let ciphertext = format!("{CIPHERTEXT_PREFIX}{}", B64.encode([0xff, 0xfe]));
    assert!(matches!(StubCodec.decode(&ciphertext), Err(Error::Decode(_))));
  }
}
