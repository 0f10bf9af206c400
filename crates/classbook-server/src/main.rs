//! classbook-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered with
//! `CLASSBOOK_*` environment variables, opens the SQLite store, and serves the
//! Classbook API over HTTP until interrupted.
//!
//! # Bootstrapping a teacher
//!
//! Teachers can sign up through `/api/auth/register`, or be created directly:
//!
//! ```text
//! cargo run -p classbook-server -- --add-teacher ana@school.edu
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use classbook_api::{AppState, PhotoStore, auth::hash_password};
use classbook_core::{
  account::{NewAccount, Role},
  store::SchoolStore as _,
};
use classbook_server::{ServerConfig, app, expand_tilde};
use classbook_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Classbook student management server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Create a teacher account with a password read from stdin and exit.
  #[arg(long, value_name = "EMAIL")]
  add_teacher: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("CLASSBOOK"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if let Some(email) = cli.add_teacher {
    add_teacher(&store, &email).await?;
    store.close().await.context("failed to close store")?;
    return Ok(());
  }

  let pruned = store
    .prune_sessions(chrono::Utc::now() - server_cfg.session_ttl())
    .await
    .context("failed to prune expired sessions")?;
  tracing::info!(pruned, "opened store at {store_path:?}");

  let photo_dir = expand_tilde(&server_cfg.photo_dir);
  tokio::fs::create_dir_all(&photo_dir)
    .await
    .with_context(|| format!("failed to create photo directory {photo_dir:?}"))?;

  let state = AppState {
    store:       Arc::new(store.clone()),
    photos:      Arc::new(PhotoStore::new(photo_dir, &server_cfg.public_url)),
    session_ttl: server_cfg.session_ttl(),
  };

  let address = server_cfg.address();
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app(state))
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  tracing::info!("shutting down");
  store.close().await.context("failed to close store")?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for ctrl-c");
  }
}

async fn add_teacher(store: &SqliteStore, email: &str) -> anyhow::Result<()> {
  let password = read_password()?;
  anyhow::ensure!(!password.is_empty(), "password must not be empty");

  let password_hash =
    hash_password(&password).map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;
  let account = store
    .add_account(NewAccount {
      email: email.trim().to_lowercase(),
      password_hash,
      role: Role::Teacher,
      student_id: None,
    })
    .await
    .context("failed to create teacher account")?;

  println!("created teacher {}", account.email);
  Ok(())
}

/// Read a password line from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
