//! arbiter server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! ledger, generates a decryption session for this process, and serves the
//! arbitration API over HTTP.
//!
//! # Password hash generation
//!
//! Arbitrator and admin credentials carry argon2 PHC strings:
//!
//! ```
//! cargo run -p arbiter-server --bin server -- --hash-password
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use arbiter_core::session::SessionParams;
use arbiter_server::{AppState, ServerConfig, auth::AuthConfig};
use arbiter_store_sqlite::SqliteLedger;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use rand_core::OsRng;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Confidential dispute arbitration server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password read from stdin and exit.
  #[arg(long)]
  hash_password: bool,
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

  if cli.hash_password {
    let password = read_password()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("ARBITER"))
    .build()
    .context("failed to read config file")?;

  let cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  if cfg.arbitrators.is_empty() {
    tracing::warn!("no arbitrators configured; votes will be refused");
  }

  let ledger_path = expand_tilde(&cfg.ledger_path);
  let ledger = SqliteLedger::open(&ledger_path)
    .await
    .with_context(|| format!("failed to open ledger at {ledger_path:?}"))?;

  let session = SessionParams::generate(
    &cfg.contract_address,
    cfg.chain_id,
    cfg.session_duration_days,
  );
  tracing::info!(
    contract = %session.contract_address,
    chain_id = session.chain_id,
    expires_at = session.expires_at(),
    "decryption session started"
  );

  let state = AppState::new(
    Arc::new(ledger),
    session,
    AuthConfig {
      arbitrators: cfg.arbitrators.clone(),
      admins:      cfg.admins.clone(),
    },
    Duration::from_secs(cfg.signature_timeout_secs),
  );

  let app = arbiter_server::router(state);
  let address = format!("{}:{}", cfg.host, cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
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
