//! Logging and tracing initialization.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Initialize the tracing subscriber with the given configuration.
///
/// `RUST_LOG` overrides `config.level`. When `config.file` is set, output is
/// appended to that file without ANSI colors; if the file cannot be opened
/// the subscriber writes to stderr and a warning is emitted once installed.
pub fn init_logging(config: &LoggingConfig) {
    let file = config.file.as_ref().map(|path| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| (path.clone(), e))
    });

    let open_error = match file {
        Some(Ok(file)) => {
            let builder = fmt::Subscriber::builder()
                .with_env_filter(env_filter(config))
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            if config.json {
                tracing::subscriber::set_global_default(builder.json().finish()).ok();
            } else {
                tracing::subscriber::set_global_default(builder.with_target(true).finish()).ok();
            }
            return;
        }
        Some(Err(err)) => Some(err),
        None => None,
    };

    if config.json {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter(config))
            .with_writer(std::io::stderr)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter(config))
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }

    if let Some((path, err)) = open_error {
        tracing::warn!(path = %path.display(), error = %err, "Could not open log file, using stderr");
    }
}

fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}
