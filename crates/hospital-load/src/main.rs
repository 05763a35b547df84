//! hospital-load binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store, loads one capacity or quality file and prints the run counters.
//!
//! ```text
//! hospital-load capacity 2022-09-23.csv
//! hospital-load quality 2022-03-01 Hospital_General_Information.csv
//! ```

use std::{
  fs::File,
  io::{BufReader, BufWriter},
  path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use hospital_load::{LoaderConfig, Source};
use hospital_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Load hospital capacity and quality files")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Where to write rows that failed to load. Overrides `error_report`.
  #[arg(long)]
  errors: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Load an HHS weekly capacity file.
  Capacity {
    /// Input file; relative paths are read from `capacity_dir`.
    file: PathBuf,
  },
  /// Load a CMS quality-rating file.
  Quality {
    /// Date stamped on every rating, as YYYY-MM-DD.
    rating_date: String,
    /// Input file; relative paths are read from `quality_dir`.
    file:        PathBuf,
  },
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
    .add_source(config::Environment::with_prefix("HOSPITAL"))
    .build()
    .context("failed to read config file")?;

  let cfg: LoaderConfig = settings
    .try_deserialize()
    .context("failed to deserialise LoaderConfig")?;

  let store_path = expand_tilde(&cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let errors_path = expand_tilde(cli.errors.as_deref().unwrap_or(&cfg.error_report));

  let loaded = match cli.command {
    Command::Capacity { file } => {
      let path = expand_tilde(&cfg.input_path(Source::Capacity, &file));
      let input = open_input(&path)?;
      hospital_load::run_capacity(&store, input)
        .await
        .with_context(|| format!("capacity load of {path:?} failed"))?
    }
    Command::Quality { rating_date, file } => {
      let path = expand_tilde(&cfg.input_path(Source::Quality, &file));
      let input = open_input(&path)?;
      hospital_load::run_quality(&store, &rating_date, input)
        .await
        .with_context(|| format!("quality load of {path:?} failed"))?
    }
  };

  // The batch is committed; its counters go out before anything else can fail.
  println!("{}", loaded.summary());

  let file = File::create(&errors_path)
    .with_context(|| format!("failed to create error report {errors_path:?}"))?;
  loaded
    .write_error_report(BufWriter::new(file))
    .with_context(|| format!("failed to write error report to {errors_path:?}"))?;
  if !loaded.report.failures.is_empty() {
    tracing::info!(
      "{} failed rows written to {}",
      loaded.report.failures.len(),
      errors_path.display()
    );
  }

  Ok(())
}

fn open_input(path: &Path) -> anyhow::Result<BufReader<File>> {
  let file = File::open(path).with_context(|| format!("failed to open {path:?}"))?;
  Ok(BufReader::new(file))
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
