//! Signature-gated decryption.
//!
//! [`DecryptionGate::reveal`] releases the plaintext of a ciphertext field
//! only after a [`Signer`] has produced a signature over the challenge built
//! from the current [`SessionParams`]. The signature itself is not verified
//! here; the gate only makes plaintext release conditional on signer
//! cooperation.

use std::{future::Future, sync::Arc, time::Duration};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, codec::FieldCodec, session::SessionParams};

pub const DEFAULT_SIGNATURE_TIMEOUT: Duration = Duration::from_secs(60);

// ─── Signing capability ──────────────────────────────────────────────────────

/// An opaque signature as returned by the signing capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(pub String);

/// Why the signing capability declined to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refusal(pub String);

/// Holds a private key this crate never sees.
pub trait Signer: Send + Sync {
  fn sign<'a>(
    &'a self,
    message: &'a str,
  ) -> impl Future<Output = Result<Signature, Refusal>> + Send + 'a;
}

// ─── Gate ────────────────────────────────────────────────────────────────────

/// Plaintext released by the gate, with the signature that unlocked it.
#[derive(Debug, Clone, PartialEq)]
pub struct Revealed {
  pub value:     f64,
  pub signature: Signature,
}

pub struct DecryptionGate<C> {
  codec:   Arc<C>,
  timeout: Duration,
}

impl<C: FieldCodec> DecryptionGate<C> {
  pub fn new(codec: Arc<C>) -> Self {
    Self { codec, timeout: DEFAULT_SIGNATURE_TIMEOUT }
  }

  /// How long to wait for the signer before giving up.
  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  /// Request a signature over `session`'s challenge, then decode
  /// `ciphertext`.
  ///
  /// Refusal and timeout are not retried. Dropping the returned future
  /// before the signer answers abandons the attempt.
  pub async fn reveal<S: Signer>(
    &self,
    session: &SessionParams,
    signer: &S,
    ciphertext: &str,
  ) -> Result<Revealed> {
    if session.is_expired_at(Utc::now()) {
      return Err(Error::SessionExpired(session.expires_at()));
    }

    let challenge = session.challenge_message();
    tracing::debug!(
      contract = %session.contract_address,
      chain_id = session.chain_id,
      "requesting decryption signature"
    );

    let signature = match tokio::time::timeout(self.timeout, signer.sign(&challenge)).await {
      Ok(Ok(signature)) => signature,
      Ok(Err(Refusal(reason))) => return Err(Error::SignerRefused(reason)),
      Err(_) => return Err(Error::SignatureTimeout(self.timeout)),
    };

    let value = self.codec.decode(ciphertext)?;
    Ok(Revealed { value, signature })
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
  };

  use super::*;
  use crate::codec::StubCodec;

  fn session() -> SessionParams {
    SessionParams::generate("0xC0FFEE", 31337, 30)
  }

  /// Signs anything, remembering every message it was shown.
  #[derive(Default)]
  struct RecordingSigner {
    seen: Mutex<Vec<String>>,
  }

  impl Signer for RecordingSigner {
    async fn sign(&self, message: &str) -> Result<Signature, Refusal> {
      self.seen.lock().unwrap().push(message.to_owned());
      Ok(Signature("0xsig".into()))
    }
  }

  struct RefusingSigner;

  impl Signer for RefusingSigner {
    async fn sign(&self, _: &str) -> Result<Signature, Refusal> {
      Err(Refusal("user rejected".into()))
    }
  }

  /// Never answers.
  struct SilentSigner;

  impl Signer for SilentSigner {
    async fn sign(&self, _: &str) -> Result<Signature, Refusal> {
      std::future::pending().await
    }
  }

  /// Counts decode calls so tests can see whether plaintext was computed.
  #[derive(Default)]
  struct CountingCodec {
    decodes: AtomicUsize,
  }

  impl FieldCodec for CountingCodec {
    fn encode(&self, value: f64) -> String { StubCodec.encode(value) }

    fn decode(&self, ciphertext: &str) -> Result<f64> {
      self.decodes.fetch_add(1, Ordering::SeqCst);
      StubCodec.decode(ciphertext)
    }
  }

  #[tokio::test]
  async fn signed_challenge_releases_plaintext() {
    let gate = DecryptionGate::new(Arc::new(StubCodec));
    let session = session();
    let signer = RecordingSigner::default();

    let revealed = gate
      .reveal(&session, &signer, &StubCodec.encode(1250.5))
      .await
      .unwrap();

    assert_eq!(revealed.value, 1250.5);
    assert_eq!(revealed.signature, Signature("0xsig".into()));
    assert_eq!(*signer.seen.lock().unwrap(), vec![session.challenge_message()]);
  }

  #[tokio::test]
  async fn challenge_is_rebuilt_from_current_params() {
    let gate = DecryptionGate::new(Arc::new(StubCodec));
    let signer = RecordingSigner::default();
    let first = session();
    let mut second = first.clone();
    second.chain_id = 1;

    gate.reveal(&first, &signer, "7").await.unwrap();
    gate.reveal(&second, &signer, "7").await.unwrap();

    let seen = signer.seen.lock().unwrap();
    assert_eq!(seen[0], first.challenge_message());
    assert_eq!(seen[1], second.challenge_message());
    assert!(seen[1].contains("contractsChainId:1\n"));
  }

  #[tokio::test]
  async fn refusal_yields_no_plaintext() {
    let codec = Arc::new(CountingCodec::default());
    let gate = DecryptionGate::new(codec.clone());

    let result = gate.reveal(&session(), &RefusingSigner, "FHE-NDI=").await;

    assert!(matches!(result, Err(Error::SignerRefused(reason)) if reason == "user rejected"));
    assert_eq!(codec.decodes.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn silent_signer_times_out() {
    let codec = Arc::new(CountingCodec::default());
    let gate = DecryptionGate::new(codec.clone()).with_timeout(Duration::from_millis(20));

    let result = gate.reveal(&session(), &SilentSigner, "FHE-NDI=").await;

    assert!(matches!(result, Err(Error::SignatureTimeout(_))));
    assert_eq!(codec.decodes.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn dropping_a_pending_reveal_decodes_nothing() {
    let codec = Arc::new(CountingCodec::default());
    let gate = DecryptionGate::new(codec.clone());
    let session = session();

    let abandoned = tokio::time::timeout(
      Duration::from_millis(20),
      gate.reveal(&session, &SilentSigner, "FHE-NDI="),
    )
    .await;

    assert!(abandoned.is_err());
    assert_eq!(codec.decodes.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn expired_session_never_asks_the_signer() {
    let gate = DecryptionGate::new(Arc::new(StubCodec));
    let signer = RecordingSigner::default();
    let mut stale = session();
    stale.start_timestamp -= 31 * 86_400;

    let result = gate.reveal(&stale, &signer, "FHE-NDI=").await;

    assert!(matches!(result, Err(Error::SessionExpired(_))));
    assert!(signer.seen.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn undecodable_ciphertext_after_signature() {
    let gate = DecryptionGate::new(Arc::new(StubCodec));
    let result = gate
      .reveal(&session(), &RecordingSigner::default(), "FHE-%%%")
      .await;
    assert!(matches!(result, Err(Error::Decode(_))));
  }
}
