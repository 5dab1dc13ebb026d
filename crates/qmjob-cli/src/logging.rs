use crate::error::{CliError, Result};
use std::fs::File;
use std::path::Path;
use tracing_subscriber::{Layer, filter::LevelFilter, fmt, prelude::*};

/// Where log events go and how much of them each sink keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSettings<'a> {
    pub console: LevelFilter,
    pub file: Option<&'a Path>,
}

impl<'a> LogSettings<'a> {
    /// `-q` keeps only errors on stderr; each `-v` adds one level above warnings.
    pub fn from_flags(verbosity: u8, quiet: bool, file: Option<&'a Path>) -> Self {
        let console = if quiet {
            LevelFilter::ERROR
        } else {
            match verbosity {
                0 => LevelFilter::WARN,
                1 => LevelFilter::INFO,
                2 => LevelFilter::DEBUG,
                _ => LevelFilter::TRACE,
            }
        };
        Self { console, file }
    }

    /// The log file always keeps per-molecule planning decisions, even when
    /// the console is quiet.
    pub fn file_level(&self) -> LevelFilter {
        self.console.max(LevelFilter::DEBUG)
    }
}

pub fn setup_logging(settings: &LogSettings<'_>) -> Result<()> {
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .with_filter(settings.console);

    let file_layer = match settings.file {
        Some(path) => {
            let file = File::create(path).map_err(CliError::Io)?;
            Some(
                fmt::layer()
                    .with_writer(file)
                    .with_ansi(false)
                    .with_thread_ids(true)
                    .with_target(true)
                    .with_filter(settings.file_level()),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to install logger: {}", e)))
}
