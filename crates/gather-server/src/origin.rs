//! The externally visible origin of a request, used to build absolute photo
//! URLs.

use std::convert::Infallible;

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use gather_core::store::GatherStore;

use crate::{AppState, ServerConfig, photos::PhotoStorage};

/// `scheme://host[:port]` as the client addressed this server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin(pub String);

impl RequestOrigin {
  /// Scheme from `X-Forwarded-Proto` (first entry, `http` or `https` only)
  /// or the configured public scheme; host from the `Host` header, the
  /// request URI authority, or the configured bind address, in that order.
  pub fn resolve(parts: &Parts, config: &ServerConfig) -> Self {
    let scheme = forwarded_proto(&parts.headers).unwrap_or(config.public_scheme.as_str());
    let host = parts
      .headers
      .get(header::HOST)
      .and_then(|v| v.to_str().ok())
      .map(str::trim)
      .filter(|h| !h.is_empty())
      .map(str::to_owned)
      .or_else(|| parts.uri.authority().map(|a| a.as_str().to_owned()))
      .unwrap_or_else(|| format!("{}:{}", config.host, config.port));
    Self(format!("{scheme}://{host}"))
  }
}

fn forwarded_proto(headers: &HeaderMap) -> Option<&str> {
  headers
    .get("x-forwarded-proto")
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.split(',').next())
    .map(str::trim)
    .and_then(|p| {
      ["http", "https"]
        .into_iter()
        .find(|scheme| p.eq_ignore_ascii_case(scheme))
    })
}

impl<S: GatherStore, P: PhotoStorage> FromRequestParts<AppState<S, P>> for RequestOrigin {
  type Rejection = Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, P>,
  ) -> Result<Self, Self::Rejection> {
    Ok(Self::resolve(parts, &state.config))
  }
}
