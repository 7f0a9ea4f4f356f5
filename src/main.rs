//! keyhints - keyboard-driven link hints and omnibar completion.
//!
//! Main entry point for the keyhints CLI.

use std::path::PathBuf;

use clap::Parser;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use keyhints_config::{ConfigLoader, Settings};

mod cli;
mod cmd_check_config;
mod cmd_complete;
mod cmd_engines;
mod cmd_hints;

use cli::{Cli, Commands};

/// Get the keyhints home directory (~/.keyhints).
fn keyhints_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".keyhints"))
        .unwrap_or_else(|| PathBuf::from(".keyhints"))
}

/// Initialize tracing with console and file output.
///
/// Log files are written to ~/.keyhints/logs/ with daily rotation. Console
/// output goes to stderr so command output stays clean.
fn init_tracing() -> anyhow::Result<()> {
    let log_dir = keyhints_dir().join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("keyhints")
        .filename_suffix("log")
        .max_log_files(30)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Keeps the background writer alive for the program duration.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(true)
                .with_writer(std::io::stderr),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

/// Settings from `--config`, else the default file, else built-in defaults.
pub(crate) fn load_settings(config: Option<&PathBuf>) -> anyhow::Result<Settings> {
    let path = config.map(|p| PathBuf::from(ConfigLoader::expand_path(&p.to_string_lossy())));
    Ok(ConfigLoader::load_or_default(path.as_deref())?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let cli = Cli::parse();
    let config = cli.config.as_ref();

    match cli.command {
        Commands::Complete {
            history,
            bookmarks,
            tabs,
            name,
            json,
            query,
        } => {
            let sources = cmd_complete::Sources {
                history,
                bookmarks,
                tabs,
            };
            cmd_complete::run(load_settings(config)?, sources, &name, &query.join(" "), json).await
        }
        Commands::Hints {
            document,
            keys,
            filter,
            mode,
            json,
        } => {
            let mut settings = load_settings(config)?;
            if filter {
                settings.filter_link_hints = true;
            }
            cmd_hints::run(settings, &document, mode, keys.as_deref(), json).await
        }
        Commands::Engines { json } => cmd_engines::run(json),
        Commands::CheckConfig => cmd_check_config::run(config),
    }
}
