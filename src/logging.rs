use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable overriding the console filter, in `EnvFilter` syntax.
pub const LOG_ENV: &str = "SESH_LOG";

/// Where log lines go and how much of them.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level for the console (stderr). `SESH_LOG` takes precedence when set.
    pub console_level: LevelFilter,
    /// Append log lines to this file as well.
    pub file: Option<PathBuf>,
    pub file_level: LevelFilter,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            console_level: LevelFilter::WARN,
            file: None,
            file_level: LevelFilter::DEBUG,
        }
    }
}

impl LogConfig {
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(config: &LogConfig) -> Result<()> {
    let console_filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::default().add_directive(config.console_level.into()));
    let console = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    let file = match &config.file {
        Some(path) => {
            let handle = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("can't open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(handle))
                    .with_ansi(false)
                    .with_filter(config.file_level),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .context("logging is already initialized")
}
