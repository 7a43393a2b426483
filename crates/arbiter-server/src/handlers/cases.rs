//! Handlers for `/cases` and `/stats`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/cases` | Optional `?status=pending\|resolved\|rejected`; newest first |
//! | `POST` | `/cases` | Body: [`NewCase`]; returns 201 + stored case |
//! | `GET`  | `/cases/:id` | 404 if not found; sets `ETag` |
//! | `GET`  | `/stats` | Per-status counts |

use arbiter_core::{
  case::{Case, CaseId, CaseStats, CaseStatus, NewCase},
  ledger::Ledger,
};
use axum::{
  Json,
  extract::{Path, Query, State},
  http::{StatusCode, header},
  response::IntoResponse,
};
use serde::Deserialize;

use crate::{AppState, error::Error, etag::compute_etag};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status: Option<CaseStatus>,
}

/// `GET /cases[?status=<status>]`
pub async fn list<L: Ledger + 'static>(
  State(state): State<AppState<L>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Case>>, Error> {
  let mut cases = state.engine.list().await?;
  if let Some(status) = params.status {
    cases.retain(|c| c.status == status);
  }
  Ok(Json(cases))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /cases` — body: `{"plaintiff":"0x…","defendant":"0x…","amount":12.5,"details":"…"}`
pub async fn create<L: Ledger + 'static>(
  State(state): State<AppState<L>>,
  Json(body): Json<NewCase>,
) -> Result<impl IntoResponse, Error> {
  if body.plaintiff.trim().is_empty() || body.defendant.trim().is_empty() {
    return Err(Error::BadRequest(
      "plaintiff and defendant are required".to_string(),
    ));
  }
  let case = state.engine.create(body).await?;
  let etag = compute_etag(&case)?;
  Ok((StatusCode::CREATED, [(header::ETAG, etag)], Json(case)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /cases/:id`
pub async fn get_one<L: Ledger + 'static>(
  State(state): State<AppState<L>>,
  Path(id): Path<CaseId>,
) -> Result<impl IntoResponse, Error> {
  let case = state.engine.get(&id).await?;
  let etag = compute_etag(&case)?;
  Ok(([(header::ETAG, etag)], Json(case)))
}

// ─── Stats ────────────────────────────────────────────────────────────────────

/// `GET /stats`
pub async fn stats<L: Ledger + 'static>(
  State(state): State<AppState<L>>,
) -> Result<Json<CaseStats>, Error> {
  Ok(Json(state.engine.stats().await?))
}
