mod api;
mod app;
mod cache;
mod commands;
mod config;
mod event;
mod query;
mod resources;
mod session;
mod storage;
mod ui;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ktadmin")]
#[command(about = "A terminal admin dashboard for books, messages, newspapers and courses")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/ktadmin/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Collection to open after login
  #[arg(short, long, value_parser = parse_resource)]
  resource: Option<String>,

  /// Log file (default: $XDG_DATA_HOME/ktadmin/ktadmin.log)
  #[arg(long)]
  log_file: Option<PathBuf>,
}

fn parse_resource(name: &str) -> Result<String, String> {
  config::Config::check_resource(name)
    .map(|_| name.to_string())
    .map_err(|e| e.to_string())
}

fn default_log_file() -> Result<PathBuf> {
  let data_dir = dirs::data_dir().ok_or_else(|| eyre!("Could not determine data directory"))?;
  Ok(data_dir.join("ktadmin").join("ktadmin.log"))
}

/// Log to a file; the terminal belongs to the UI.
fn init_logging(path: &Path) -> Result<WorkerGuard> {
  let dir = path.parent().unwrap_or_else(|| Path::new("."));
  std::fs::create_dir_all(dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;
  let file_name = path
    .file_name()
    .ok_or_else(|| eyre!("Invalid log file path: {}", path.display()))?;

  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
  let filter = EnvFilter::try_from_env("KTADMIN_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let log_file = match args.log_file {
    Some(path) => path,
    None => default_log_file()?,
  };
  let _guard = init_logging(&log_file)?;

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;

  // Override the first collection if specified on command line
  let config = if let Some(resource) = args.resource {
    config::Config {
      default_resource: Some(resource),
      ..config
    }
  } else {
    config
  };

  let session = session::Session::persistent(storage::LocalStorage::open()?);
  tracing::info!(signed_in = session.is_signed_in(), "Starting ktadmin");

  // Initialize and run the app
  let mut app = app::App::new(config, session)?;
  app.run().await?;

  Ok(())
}
