//! gather-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), layers
//! `GATHER_*` environment variables over it, opens the SQLite store, and
//! serves the JSON API over HTTP.
//!
//! The signing secret has no default; start the server with e.g.
//!
//! ```text
//! GATHER_JWT_SECRET=... GATHER_STORE_PATH=~/.local/share/gather/gather.db gather-server
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use gather_server::{
  AppState, ServerConfig,
  photos::{DiskPhotoStorage, PhotoManager},
};
use gather_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Gather event server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("GATHER").try_parsing(true))
    .build()
    .context("failed to read config file")?;

  let mut server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Refuse to start without a signing secret.
  let tokens = server_cfg
    .token_service()
    .context("invalid token configuration")?;

  server_cfg.store_path = expand_tilde(&server_cfg.store_path);
  server_cfg.upload_dir = expand_tilde(&server_cfg.upload_dir);

  // Open SQLite store.
  let store = SqliteStore::open(&server_cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", server_cfg.store_path))?;

  tracing::info!(
    store = ?server_cfg.store_path,
    uploads = ?server_cfg.upload_dir,
    token_ttl_hours = server_cfg.token_ttl_hours,
    "configuration loaded"
  );

  // Build application state.
  let state = AppState {
    store:  Arc::new(store),
    tokens: Arc::new(tokens),
    photos: Arc::new(PhotoManager::new(DiskPhotoStorage::new(&server_cfg.upload_dir))),
    config: Arc::new(server_cfg.clone()),
  };

  let app = gather_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
