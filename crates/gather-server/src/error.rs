//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every handler returns `Result<_, ApiError>`, so no failure escapes a
//! handler without being mapped to a status code and a JSON body.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::{photos::PhotoError, token::TokenError};

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("payload too large: {0}")]
  PayloadTooLarge(String),

  /// Storage, file-system, or other unexpected failure. The source is logged
  /// but never sent to the client.
  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map any store backend error through its domain classification.
  pub fn store<E: Into<gather_core::Error>>(e: E) -> Self { Self::from(e.into()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match self {
      ApiError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m),
      ApiError::PayloadTooLarge(m) => (StatusCode::PAYLOAD_TOO_LARGE, m),
      ApiError::Internal(e) => {
        tracing::error!(error = %e, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
      }
    };

    let mut res = (status, Json(json!({ "error": message }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    }
    res
  }
}

impl From<gather_core::Error> for ApiError {
  fn from(e: gather_core::Error) -> Self {
    use gather_core::Error as E;
    match e {
      E::UserNotFound(_) => ApiError::NotFound("user not found".into()),
      E::EventNotFound(_) => ApiError::NotFound("event not found".into()),
      E::EmailTaken(_) => ApiError::Conflict("email is already registered".into()),
      E::NotOwner { .. } => {
        ApiError::Forbidden("only the event owner may do that".into())
      }
      E::Invalid(m) => ApiError::BadRequest(m),
      E::UnknownRole(r) => ApiError::BadRequest(format!(
        "unknown account type {r:?}; expected \"student\" or \"organizer\""
      )),
      E::Serialization(e) => ApiError::Internal(Box::new(e)),
      E::Backend(e) => ApiError::Internal(e),
    }
  }
}

impl From<PhotoError> for ApiError {
  fn from(e: PhotoError) -> Self {
    match e {
      PhotoError::NotFound => ApiError::NotFound("photo not found".into()),
      other => ApiError::Internal(Box::new(other)),
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(e: JsonRejection) -> Self {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
      ApiError::PayloadTooLarge(e.body_text())
    } else {
      ApiError::BadRequest(e.body_text())
    }
  }
}

impl From<TokenError> for ApiError {
  fn from(e: TokenError) -> Self { ApiError::Internal(Box::new(e)) }
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  async fn render(e: ApiError) -> (StatusCode, serde_json::Value) {
    let res = e.into_response();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  #[tokio::test]
  async fn domain_errors_map_to_statuses() {
    let cases = [
      (gather_core::Error::UserNotFound(Uuid::nil()), StatusCode::NOT_FOUND),
      (gather_core::Error::EventNotFound(Uuid::nil()), StatusCode::NOT_FOUND),
      (gather_core::Error::EmailTaken("a@x.com".into()), StatusCode::CONFLICT),
      (
        gather_core::Error::NotOwner { event: Uuid::nil(), actor: Uuid::nil() },
        StatusCode::FORBIDDEN,
      ),
      (gather_core::Error::Invalid("title is required".into()), StatusCode::BAD_REQUEST),
      (gather_core::Error::UnknownRole("admin".into()), StatusCode::BAD_REQUEST),
    ];
    for (err, expected) in cases {
      let (status, body) = render(ApiError::from(err)).await;
      assert_eq!(status, expected);
      assert!(body["error"].is_string());
    }
  }

  #[tokio::test]
  async fn internal_errors_hide_detail() {
    let err = ApiError::Internal("disk on fire at /var/lib/gather".into());
    let (status, body) = render(err).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal server error");
  }

  #[tokio::test]
  async fn unauthorized_carries_challenge() {
    let res = ApiError::Unauthorized("missing bearer token".into()).into_response();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.headers()[header::WWW_AUTHENTICATE], "Bearer");
  }
}
