//! JSON HTTP surface for Arbiter.
//!
//! Exposes an axum [`Router`] over an [`Arbitration`] engine backed by any
//! [`Ledger`]. Voting requires arbitrator credentials and rejection requires
//! admin credentials, both via HTTP Basic auth.

pub mod auth;
pub mod error;
pub mod etag;
pub mod handlers;

pub use error::Error;

use std::{path::PathBuf, sync::Arc, time::Duration};

use arbiter_core::{
  codec::StubCodec,
  gate::DecryptionGate,
  ledger::Ledger,
  session::{DEFAULT_DURATION_DAYS, SessionParams},
};
use arbiter_engine::Arbitration;
use axum::{
  Router,
  routing::{get, post},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::{AuthConfig, Credential};
use handlers::{cases, decrypt, session, votes};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                   String,
  pub port:                   u16,
  pub ledger_path:            PathBuf,
  /// Ledger address the decryption challenge is scoped to.
  pub contract_address:       String,
  pub chain_id:               u64,
  #[serde(default = "default_duration_days")]
  pub session_duration_days:  u32,
  #[serde(default = "default_signature_timeout_secs")]
  pub signature_timeout_secs: u64,
  #[serde(default)]
  pub arbitrators:            Vec<Credential>,
  #[serde(default)]
  pub admins:                 Vec<Credential>,
}

fn default_duration_days() -> u32 { DEFAULT_DURATION_DAYS }

fn default_signature_timeout_secs() -> u64 { 60 }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<L: Ledger> {
  pub engine:  Arc<Arbitration<L>>,
  pub gate:    Arc<DecryptionGate<StubCodec>>,
  pub session: Arc<SessionParams>,
  pub auth:    Arc<AuthConfig>,
}

impl<L: Ledger> AppState<L> {
  pub fn new(
    ledger: Arc<L>,
    session: SessionParams,
    auth: AuthConfig,
    signature_timeout: Duration,
  ) -> Self {
    let codec = Arc::new(StubCodec);
    Self {
      engine:  Arc::new(Arbitration::new(ledger, codec.clone())),
      gate:    Arc::new(DecryptionGate::new(codec).with_timeout(signature_timeout)),
      session: Arc::new(session),
      auth:    Arc::new(auth),
    }
  }
}

impl<L: Ledger> Clone for AppState<L> {
  fn clone(&self) -> Self {
    Self {
      engine:  self.engine.clone(),
      gate:    self.gate.clone(),
      session: self.session.clone(),
      auth:    self.auth.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the arbitration API.
pub fn router<L>(state: AppState<L>) -> Router
where
  L: Ledger + 'static,
{
  Router::new()
    .route("/cases",              get(cases::list::<L>).post(cases::create::<L>))
    .route("/cases/{id}",         get(cases::get_one::<L>))
    .route("/cases/{id}/votes",   post(votes::cast::<L>))
    .route("/cases/{id}/reject",  post(votes::reject::<L>))
    .route("/cases/{id}/decrypt", post(decrypt::handler::<L>))
    .route("/session",            get(session::handler::<L>))
    .route("/stats",              get(cases::stats::<L>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Test helpers ─────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod test_support {
  use argon2::{Algorithm, Argon2, Params, PasswordHasher, Version, password_hash::SaltString};
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use rand_core::OsRng;

  use crate::auth::Credential;

  /// A credential hashed with deliberately cheap argon2 parameters.
  pub fn credential(username: &str, password: &str) -> Credential {
    let params = Params::new(1024, 1, 1, None).unwrap();
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string();
    Credential { username: username.to_string(), password_hash }
  }

  pub fn basic(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }
}

// ─── Integration tests ────────────────────────────────────────────────────────
