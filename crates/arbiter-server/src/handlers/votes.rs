//! Handlers that move a case through its lifecycle.
//!
//! | Method | Path | Auth | Notes |
//! |--------|------|------|-------|
//! | `POST` | `/cases/:id/votes` | arbitrator | Body: `{"accept":true}`; honours `If-Match` (`*` matches any case) |
//! | `POST` | `/cases/:id/reject` | admin | Pending cases only |

use arbiter_core::{case::CaseId, ledger::Ledger};
use axum::{
  Json,
  extract::{Path, State},
  http::{HeaderMap, header},
  response::IntoResponse,
};
use serde::Deserialize;

use crate::{
  AppState,
  auth::{Admin, Arbitrator},
  error::Error,
  etag::{compute_etag, strip_etag_quotes},
};

#[derive(Debug, Deserialize)]
pub struct VoteBody {
  pub accept: bool,
}

/// `POST /cases/:id/votes`
pub async fn cast<L: Ledger + 'static>(
  State(state): State<AppState<L>>,
  Arbitrator(arbitrator): Arbitrator,
  Path(id): Path<CaseId>,
  headers: HeaderMap,
  Json(body): Json<VoteBody>,
) -> Result<impl IntoResponse, Error> {
  // `If-Match: *` matches any existing case, which plain `vote` checks.
  let if_match = headers
    .get(header::IF_MATCH)
    .and_then(|v| v.to_str().ok())
    .map(strip_etag_quotes)
    .filter(|tag| *tag != "*");

  let case = match if_match {
    Some(expected) => {
      state
        .engine
        .vote_if_match(&id, &arbitrator, body.accept, expected)
        .await?
    }
    None => state.engine.vote(&id, &arbitrator, body.accept).await?,
  };

  let etag = compute_etag(&case)?;
  Ok(([(header::ETAG, etag)], Json(case)))
}

/// `POST /cases/:id/reject`
pub async fn reject<L: Ledger + 'static>(
  State(state): State<AppState<L>>,
  Admin(admin): Admin,
  Path(id): Path<CaseId>,
) -> Result<impl IntoResponse, Error> {
  tracing::info!(case_id = %id, %admin, "administrative rejection requested");
  let case = state.engine.reject(&id).await?;
  let etag = compute_etag(&case)?;
  Ok(([(header::ETAG, etag)], Json(case)))
}
