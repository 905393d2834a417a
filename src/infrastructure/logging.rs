//! Logging system configuration and initialization
//!
//! Console logging via tracing with an EnvFilter that keeps dependency
//! internals quiet below TRACE, plus optional non-blocking daily-rolling
//! file output. `RUST_LOG` overrides the configured filter, e.g.
//! `RUST_LOG="debug,sqlx=debug"` to see query logs on a debug run.

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Result;
use lazy_static::lazy_static;
use tracing_appender::non_blocking;
use tracing_subscriber::{
    EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

pub use super::config::LoggingConfig;

// Keeps the non-blocking file writers alive for the process lifetime.
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> =
        Mutex::new(Vec::new());
}

/// The log directory, relative to the executable location.
pub fn get_log_directory() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
    exe_dir.join("logs")
}

/// Initialize logging with the default configuration.
pub fn init_logging() -> Result<()> {
    init_logging_with_config(&LoggingConfig::default())
}

/// Initialize logging with a custom configuration.
///
/// Unless the level is "trace", sqlx/reqwest/hyper/html5ever targets are
/// capped at WARN so crawl output stays readable.
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let directives = if config.level == "trace" {
        "trace".to_string()
    } else {
        format!(
            "{level},sqlx=warn,reqwest=warn,hyper=warn,html5ever=warn",
            level = config.level
        )
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    let console_layer = config
        .console_output
        .then(|| fmt::layer().with_target(false));

    let file_layer = if config.file_output {
        let log_dir = get_log_directory();
        std::fs::create_dir_all(&log_dir)?;
        let appender = tracing_appender::rolling::daily(log_dir, "shopcrawl.log");
        let (writer, guard) = non_blocking(appender);
        LOG_GUARDS.lock().expect("log guard lock").push(guard);
        Some(fmt::layer().with_writer(writer).with_ansi(false))
    } else {
        None
    };

    // try_init so repeated initialization (tests) is harmless.
    let _ = Registry::default()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();
    Ok(())
}
