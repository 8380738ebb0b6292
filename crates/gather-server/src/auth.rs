//! Bearer-token extractors.
//!
//! Protected handlers take [`Authenticated`] as an argument; the request is
//! rejected with 401 before the handler body runs if the token is missing or
//! does not verify. Neither extractor touches the store.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use gather_core::{store::GatherStore, user::Identity};

use crate::{AppState, error::ApiError, photos::PhotoStorage, token::TokenService};

/// The caller proved who they are.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated(pub Identity);

/// The caller may or may not have sent a token. A token that is present but
/// invalid is still a 401.
#[derive(Debug, Clone, Copy)]
pub struct MaybeAuthenticated(pub Option<Identity>);

/// The raw token from `Authorization: Bearer <token>`, if that header is
/// present. `Err` if the header exists but is not a usable bearer credential.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, ApiError> {
  let Some(value) = headers.get(header::AUTHORIZATION) else {
    return Ok(None);
  };
  let value = value
    .to_str()
    .map_err(|_| ApiError::Unauthorized("malformed authorization header".into()))?;

  let (scheme, token) = value
    .split_once(' ')
    .ok_or_else(|| ApiError::Unauthorized("expected a bearer token".into()))?;
  if !scheme.eq_ignore_ascii_case("bearer") {
    return Err(ApiError::Unauthorized("expected a bearer token".into()));
  }

  let token = token.trim();
  if token.is_empty() {
    return Err(ApiError::Unauthorized("expected a bearer token".into()));
  }
  Ok(Some(token))
}

/// Verify the bearer token in `headers`, if any.
pub fn authenticate(
  headers: &HeaderMap,
  tokens: &TokenService,
) -> Result<Option<Identity>, ApiError> {
  let Some(token) = bearer_token(headers)? else {
    return Ok(None);
  };
  tokens
    .verify(token)
    .map(Some)
    .map_err(|_| ApiError::Unauthorized("invalid or expired token".into()))
}

impl<S: GatherStore, P: PhotoStorage> FromRequestParts<AppState<S, P>> for Authenticated {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, P>,
  ) -> Result<Self, Self::Rejection> {
    authenticate(&parts.headers, &state.tokens)?
      .map(Authenticated)
      .ok_or_else(|| ApiError::Unauthorized("missing bearer token".into()))
  }
}

impl<S: GatherStore, P: PhotoStorage> FromRequestParts<AppState<S, P>> for MaybeAuthenticated {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, P>,
  ) -> Result<Self, Self::Rejection> {
    authenticate(&parts.headers, &state.tokens).map(MaybeAuthenticated)
  }
}

#[cfg(test)]
mod tests {
  use axum::{body::Body, http::Request};
  use chrono::Duration;
  use gather_core::user::Role;
  use uuid::Uuid;

  use super::*;

  fn tokens() -> TokenService {
    TokenService::new("s3cret", Duration::hours(1)).unwrap()
  }

  fn headers(auth: Option<&str>) -> HeaderMap {
    let mut builder = Request::builder();
    if let Some(auth) = auth {
      builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::empty()).unwrap().into_parts().0.headers
  }

  #[test]
  fn missing_header_is_anonymous() {
    assert!(authenticate(&headers(None), &tokens()).unwrap().is_none());
  }

  #[test]
  fn valid_bearer_yields_identity() {
    let tokens = tokens();
    let id = Identity { user_id: Uuid::new_v4(), role: Role::Organizer };
    let token = tokens.issue(&id).unwrap();

    let found = authenticate(&headers(Some(&format!("Bearer {token}"))), &tokens).unwrap();
    assert_eq!(found, Some(id));

    let lower = authenticate(&headers(Some(&format!("bearer {token}"))), &tokens).unwrap();
    assert_eq!(lower, Some(id));
  }

  #[test]
  fn wrong_scheme_or_garbage_is_unauthorized() {
    for value in ["Basic dXNlcjpwdw==", "Bearer", "Bearer ", "Bearer not.a.jwt", "token"] {
      let err = authenticate(&headers(Some(value)), &tokens()).unwrap_err();
      assert!(matches!(err, ApiError::Unauthorized(_)), "{value:?}");
    }
  }

  #[test]
  fn token_from_other_secret_is_unauthorized() {
    let other = TokenService::new("other", Duration::hours(1)).unwrap();
    let token = other
      .issue(&Identity { user_id: Uuid::new_v4(), role: Role::Student })
      .unwrap();
    let err = authenticate(&headers(Some(&format!("Bearer {token}"))), &tokens()).unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));
  }
}
