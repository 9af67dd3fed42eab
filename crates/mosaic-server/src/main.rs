//! Memory Mosaic server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `MOSAIC_*` environment variables, opens the SQLite store, and serves the
//! sign-in routes, the JSON API, and uploaded photos over HTTP.
//!
//! ```
//! cargo run -p mosaic-server --bin mosaic -- --config config.toml
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::{Context as _, bail};
use chrono::Duration;
use clap::Parser;
use mosaic_api::uploads::DiskBlobStore;
use mosaic_server::{
  AppState, ServerConfig, oauth::GoogleIdentity, session::SessionStore,
};
use mosaic_store_sqlite::SqliteStore;
use tokio::{net::TcpListener, signal};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Memory Mosaic server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Delete every user and person from the store, then exit.
  #[arg(long)]
  clear_database: bool,
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
    .add_source(
      config::Environment::with_prefix("MOSAIC")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("allowed_origins"),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Operator mode: wipe the store and exit.
  if cli.clear_database {
    let (users, people) = store.clear_all().await.context("failed to clear store")?;
    tracing::info!(users, people, "cleared database");
    store.close().await.context("failed to close store")?;
    return Ok(());
  }

  if server_cfg.session_secret.is_empty() {
    bail!("session_secret must be set (MOSAIC_SESSION_SECRET)");
  }

  let upload_dir = expand_tilde(&server_cfg.upload_dir);
  let blobs = DiskBlobStore::open(&upload_dir, server_cfg.uploads_url())
    .await
    .with_context(|| format!("failed to prepare upload directory {upload_dir:?}"))?;

  let identity = GoogleIdentity::new(
    server_cfg.google_client_id.clone(),
    server_cfg.google_client_secret.clone(),
    server_cfg.callback_url(),
  )
  .context("failed to configure Google sign-in")?;

  let sessions = SessionStore::new(
    server_cfg.session_secret.clone(),
    Duration::hours(server_cfg.session_ttl_hours),
  );

  // Build application state. The spare handle closes the connection once
  // the server has drained.
  let closer = store.clone();
  let state = AppState {
    store:    Arc::new(store),
    blobs:    Arc::new(blobs),
    identity: Arc::new(identity),
    sessions: Arc::new(sessions),
    config:   Arc::new(server_cfg.clone()),
  };

  let app = mosaic_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  closer.close().await.context("failed to close store")?;
  tracing::info!("store closed");

  Ok(())
}

/// Resolves on Ctrl-C or, on unix, SIGTERM.
async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = signal::ctrl_c().await {
      tracing::error!(error = %e, "failed to listen for Ctrl-C");
      std::future::pending::<()>().await;
    }
    tracing::info!("received Ctrl-C, shutting down");
  };

  #[cfg(unix)]
  let terminate = async {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
      Ok(mut sig) => {
        sig.recv().await;
        tracing::info!("received SIGTERM, shutting down");
      }
      Err(e) => {
        tracing::error!(error = %e, "failed to listen for SIGTERM");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {},
    _ = terminate => {},
  }
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
