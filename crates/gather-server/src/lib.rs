//! HTTP layer for Gather.
//!
//! Exposes an axum [`Router`] backed by any [`GatherStore`]. Identity travels
//! as signed bearer tokens ([`token`]), protected handlers receive it through
//! the extractors in [`auth`], and profile photos are managed by [`photos`].

pub mod auth;
pub mod error;
pub mod handlers;
pub mod origin;
pub mod password;
pub mod photos;
pub mod token;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post, put},
};
use chrono::Duration;
use gather_core::store::GatherStore;
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use handlers::{auth as auth_routes, events, stats, users};
use photos::{DiskPhotoStorage, PhotoManager, PhotoStorage};
use token::TokenService;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` layered
/// under `GATHER_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  /// Scheme used in absolute URLs when no `X-Forwarded-Proto` is present.
  #[serde(default = "default_public_scheme")]
  pub public_scheme:    String,
  pub store_path:       PathBuf,
  /// Content directory for profile photos.
  #[serde(default = "default_upload_dir")]
  pub upload_dir:       PathBuf,
  /// HS256 signing secret. Required; there is no default.
  pub jwt_secret:       Option<String>,
  #[serde(default = "default_token_ttl_hours")]
  pub token_ttl_hours:  i64,
  #[serde(default = "default_max_upload_bytes")]
  pub max_upload_bytes: usize,
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }
fn default_public_scheme() -> String { "http".to_string() }
fn default_upload_dir() -> PathBuf { PathBuf::from("uploads") }
fn default_token_ttl_hours() -> i64 { token::DEFAULT_TTL_HOURS }
fn default_max_upload_bytes() -> usize { 5 * 1024 * 1024 }

impl ServerConfig {
  /// Build the token service from the configured secret and lifetime.
  pub fn token_service(&self) -> Result<TokenService, token::ConfigError> {
    TokenService::new(
      self.jwt_secret.as_deref().unwrap_or_default(),
      Duration::hours(self.token_ttl_hours),
    )
  }

  #[cfg(test)]
  pub(crate) fn for_tests() -> Self {
    Self {
      host:             "127.0.0.1".to_string(),
      port:             8000,
      public_scheme:    default_public_scheme(),
      store_path:       PathBuf::from(":memory:"),
      upload_dir:       default_upload_dir(),
      jwt_secret:       Some("test-secret".to_string()),
      token_ttl_hours:  default_token_ttl_hours(),
      max_upload_bytes: default_max_upload_bytes(),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
///
/// `P` selects where photo bytes live; the binary uses the local disk.
pub struct AppState<S: GatherStore, P: PhotoStorage = DiskPhotoStorage> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
  pub tokens: Arc<TokenService>,
  pub photos: Arc<PhotoManager<P>>,
}

impl<S: GatherStore, P: PhotoStorage> Clone for AppState<S, P> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      config: Arc::clone(&self.config),
      tokens: Arc::clone(&self.tokens),
      photos: Arc::clone(&self.photos),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the application router. Every route lives under `/api`.
pub fn router<S, P>(state: AppState<S, P>) -> Router
where
  S: GatherStore + 'static,
  P: PhotoStorage,
{
  let body_limit = state.config.max_upload_bytes;

  let api = Router::new()
    // Credentials
    .route("/auth/register",            post(auth_routes::register::<S, P>))
    .route("/auth/login",               post(auth_routes::login::<S, P>))
    // Users
    .route("/user/details",             get(users::details::<S, P>).put(users::update_details::<S, P>))
    .route("/user/update-photo",        put(users::update_photo::<S, P>))
    .route("/user/photo/{filename}",    get(users::photo::<S, P>))
    .route("/user/suggestions",         get(users::suggestions::<S, P>))
    // Events
    .route("/event/create",             post(events::create::<S, P>))
    .route("/event/getevent",           get(events::list::<S, P>))
    .route(
      "/event/{id}",
      get(events::get_one::<S, P>)
        .put(events::update::<S, P>)
        .delete(events::delete::<S, P>),
    )
    .route("/event/{id}/like",          put(events::like::<S, P>).delete(events::unlike::<S, P>))
    .route("/event/{id}/comment",       post(events::comment::<S, P>))
    // Statistics
    .route("/stat",                     get(stats::handler::<S, P>));

  Router::new()
    .nest("/api", api)
    .layer(DefaultBodyLimit::max(body_limit))
    .layer(CorsLayer::permissive())
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
