use crate::models::LoggingSettings;
use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn ensure_log_dir(log_dir: &str) -> Result<()> {
    let log_path = Utf8Path::new(log_dir);
    if !log_path.exists() {
        fs::create_dir_all(log_path)
            .with_context(|| format!("Failed to create log directory: {}", log_dir))?;
    }
    Ok(())
}

/// `RUST_LOG` wins when set; otherwise debug or info depending on `debug_mode`
fn env_filter(debug_mode: bool) -> EnvFilter {
    let default_level = if debug_mode { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Setup logging with a daily rotating file appender.
///
/// # Returns
/// A guard that must be held for as long as logging should stay active
///
/// # Errors
/// Fails if the log directory cannot be created or a global subscriber is already set.
pub fn setup_logging(settings: &LoggingSettings) -> Result<WorkerGuard> {
    setup_logging_with_console(&LoggingSettings {
        console_output: false,
        ..settings.clone()
    })
}

/// Setup logging, additionally mirroring events to stderr when `console_output` is set.
///
/// Useful while developing against a live cache engine.
pub fn setup_logging_with_console(settings: &LoggingSettings) -> Result<WorkerGuard> {
    ensure_log_dir(&settings.log_dir)?;

    let file_appender = rolling::daily(&settings.log_dir, &settings.log_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false) // No ANSI codes in log files
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let console_layer = settings.console_output.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(env_filter(settings.debug_mode))
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to install global tracing subscriber")?;

    tracing::info!(
        "Logging initialized: dir={}, prefix={}, debug={}, console={}",
        settings.log_dir,
        settings.log_prefix,
        settings.debug_mode,
        settings.console_output
    );

    Ok(guard)
}
