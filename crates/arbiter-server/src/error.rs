//! Error types and axum `IntoResponse` implementation.

use arbiter_core::Error as CoreError;
use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,
  #[error("forbidden: {0}")]
  Forbidden(String),
  #[error("bad request: {0}")]
  BadRequest(String),
  #[error(transparent)]
  Core(#[from] CoreError),
}

impl Error {
  fn status(&self) -> StatusCode {
    match self {
      Error::Unauthorized => StatusCode::UNAUTHORIZED,
      Error::Forbidden(_) => StatusCode::FORBIDDEN,
      Error::BadRequest(_) => StatusCode::BAD_REQUEST,
      Error::Core(e) => match e {
        CoreError::CaseNotFound(_) => StatusCode::NOT_FOUND,
        CoreError::CaseClosed { .. } | CoreError::AlreadyVoted { .. } => {
          StatusCode::CONFLICT
        }
        CoreError::RevisionMismatch(_) => StatusCode::PRECONDITION_FAILED,
        CoreError::SignerRefused(_) | CoreError::SessionExpired(_) => {
          StatusCode::FORBIDDEN
        }
        CoreError::SignatureTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        CoreError::LedgerUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        CoreError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
        CoreError::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CoreError::MalformedRecord { .. }
        | CoreError::IdCollision(_)
        | CoreError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    let mut res = (status, Json(json!({ "error": self.to_string() }))).into_response();
    if matches!(self, Error::Unauthorized) {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"arbiter\""),
      );
    }
    res
  }
}
