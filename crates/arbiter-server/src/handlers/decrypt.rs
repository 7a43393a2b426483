//! `POST /cases/:id/decrypt` — release a dispute amount to an involved party.
//!
//! The client fetches the challenge from `GET /session`, has the viewer's
//! wallet sign it, and presents the signature here. The server relays that
//! signature as the signing capability; it does not verify it.
//!
//! `viewer` is asserted by the caller and party addresses are public through
//! `GET /cases`, so the party check only filters honest clients. It is not
//! access control: anyone naming a party and presenting a non-empty
//! signature receives the amount. Binding the viewer to the signature
//! requires verifying it against the challenge, which this server does not
//! do.

use arbiter_core::{
  case::CaseId,
  gate::{Refusal, Signature, Signer},
  ledger::Ledger,
};
use axum::{
  Json,
  extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::Error};

#[derive(Debug, Deserialize)]
pub struct DecryptBody {
  /// Address of the party asking to see the amount.
  pub viewer:    String,
  pub signature: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptResponse {
  pub case_id: CaseId,
  pub amount:  f64,
}

/// A signature the client obtained out of band; absent means the viewer
/// declined to sign.
struct PresentedSignature(Option<String>);

impl Signer for PresentedSignature {
  async fn sign(&self, _message: &str) -> Result<Signature, Refusal> {
    match self.0.as_deref().map(str::trim) {
      Some(sig) if !sig.is_empty() => Ok(Signature(sig.to_owned())),
      _ => Err(Refusal("no signature presented".to_string())),
    }
  }
}

pub async fn handler<L: Ledger + 'static>(
  State(state): State<AppState<L>>,
  Path(id): Path<CaseId>,
  Json(body): Json<DecryptBody>,
) -> Result<Json<DecryptResponse>, Error> {
  let case = state.engine.get(&id).await?;
  if !case.is_involved_party(&body.viewer) {
    return Err(Error::Forbidden(format!(
      "{} is not a party to case {id}",
      body.viewer
    )));
  }

  let signer = PresentedSignature(body.signature);
  let revealed = state
    .gate
    .reveal(&state.session, &signer, &case.encrypted_amount)
    .await?;

  Ok(Json(DecryptResponse { case_id: case.id, amount: revealed.value }))
}
