//! `GET /session` — the parameters and challenge a viewer must sign.

use arbiter_core::{ledger::Ledger, session::SessionParams};
use axum::{Json, extract::State};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
  #[serde(flatten)]
  pub params:     SessionParams,
  pub expires_at: i64,
  pub challenge:  String,
}

pub async fn handler<L: Ledger + 'static>(
  State(state): State<AppState<L>>,
) -> Json<SessionView> {
  let params = SessionParams::clone(&state.session);
  Json(SessionView {
    expires_at: params.expires_at(),
    challenge: params.challenge_message(),
    params,
  })
}
