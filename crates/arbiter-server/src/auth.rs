//! HTTP Basic-auth extractors for the arbitrator and admin capabilities.

use arbiter_core::{case::ArbitratorId, ledger::Ledger};
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use serde::Deserialize;

use crate::{AppState, error::Error};

/// One accepted username and its argon2 PHC hash.
#[derive(Clone, Deserialize)]
pub struct Credential {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Who holds which capability on this server instance.
#[derive(Clone, Default)]
pub struct AuthConfig {
  pub arbitrators: Vec<Credential>,
  pub admins:      Vec<Credential>,
}

/// Present in a handler means the caller authenticated as an arbitrator.
pub struct Arbitrator(pub ArbitratorId);

/// Present in a handler means the caller authenticated as an admin.
pub struct Admin(pub String);

/// Verify Basic credentials against `allowed`, returning the username.
pub fn verify_auth(headers: &HeaderMap, allowed: &[Credential]) -> Result<String, Error> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;

  let credential = allowed
    .iter()
    .find(|c| c.username == username)
    .ok_or(Error::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&credential.password_hash)
    .map_err(|_| Error::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)?;

  Ok(username.to_owned())
}

impl<L> FromRequestParts<AppState<L>> for Arbitrator
where
  L: Ledger + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<L>,
  ) -> Result<Self, Self::Rejection> {
    let username = verify_auth(&parts.headers, &state.auth.arbitrators)?;
    Ok(Arbitrator(ArbitratorId::new(username)))
  }
}

impl<L> FromRequestParts<AppState<L>> for Admin
where
  L: Ledger + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<L>,
  ) -> Result<Self, Self::Rejection> {
    let username = verify_auth(&parts.headers, &state.auth.admins)?;
    Ok(Admin(username))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;

  use arbiter_core::session::SessionParams;
  use arbiter_engine::MemoryLedger;
  use axum::http::{Request, header};

  use crate::test_support::{basic, credential};

  fn make_state() -> AppState<MemoryLedger> {
    AppState::new(
      Arc::new(MemoryLedger::new()),
      SessionParams::generate("0xC0FFEE", 1, 30),
      AuthConfig {
        arbitrators: vec![credential("arb", "secret")],
        admins:      vec![credential("root", "hunter2")],
      },
      std::time::Duration::from_secs(1),
    )
  }

  async fn arbitrator(req: Request<axum::body::Body>, state: &AppState<MemoryLedger>) -> Result<Arbitrator, Error> {
    let (mut parts, _) = req.into_parts();
    Arbitrator::from_request_parts(&mut parts, state).await
  }

  async fn admin(req: Request<axum::body::Body>, state: &AppState<MemoryLedger>) -> Result<Admin, Error> {
    let (mut parts, _) = req.into_parts();
    Admin::from_request_parts(&mut parts, state).await
  }

  fn with_auth(value: &str) -> Request<axum::body::Body> {
    Request::builder()
      .header(header::AUTHORIZATION, value)
      .body(axum::body::Body::empty()).unwrap()
  }

  #[tokio::test]
  async fn arbitrator_credentials_yield_identity() {
    let state = make_state();
    let Arbitrator(id) = arbitrator(with_auth(&basic("arb", "secret")), &state).await.unwrap();
    assert_eq!(id.as_str(), "arb");
  }

  #[tokio::test]
  async fn wrong_password() {
    let state = make_state();
    let result = arbitrator(with_auth(&basic("arb", "wrong")), &state).await;
    assert!(matches!(result, Err(Error::Unauthorized)));
  }

  #[tokio::test]
  async fn capabilities_do_not_overlap() {
    let state = make_state();
    assert!(matches!(
      arbitrator(with_auth(&basic("root", "hunter2")), &state).await,
      Err(Error::Unauthorized)
    ));
    assert!(matches!(
      admin(with_auth(&basic("arb", "secret")), &state).await,
      Err(Error::Unauthorized)
    ));
    assert!(admin(with_auth(&basic("root", "hunter2")), &state).await.is_ok());
  }

  #[tokio::test]
  async fn missing_header() {
    let state = make_state();
    let req = Request::builder().body(axum::body::Body::empty()).unwrap();
    assert!(matches!(arbitrator(req, &state).await, Err(Error::Unauthorized)));
  }

  #[tokio::test]
  async fn invalid_base64() {
    let state = make_state();
    let result = arbitrator(with_auth("Basic !!!not-base64!!!"), &state).await;
    assert!(matches!(result, Err(Error::Unauthorized)));
  }
}
