use std::{fs::File, io};

use thiserror::Error;
use tracing::{
    Level,
    subscriber::{SetGlobalDefaultError, set_global_default},
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::Targets, fmt::format::FmtSpan, layer::SubscriberExt};

/// Name of the log file written to the working directory.
pub const LOG_FILE: &str = "hdr-screenshot.log";

/// Guards that flush the log writers when dropped.
pub struct LoggerGuards {
    _stdout: WorkerGuard,
    _file: WorkerGuard,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Failed to create the log file:\n{0}")]
    CreateFile(#[source] io::Error),

    #[error("Failed to set the global logger:\n{0}")]
    SetGlobal(#[from] SetGlobalDefaultError),
}

/// The level filter for a run, `debug` enables debug level events.
pub fn filter(debug: bool) -> Targets {
    let level = if debug { Level::DEBUG } else { Level::INFO };

    Targets::new().with_default(level)
}

/// Log to stdout and to the log file.
pub fn setup_logger(debug: bool) -> Result<LoggerGuards, Error> {
    // stdout logger
    let (std_writer, std_guard) = tracing_appender::non_blocking(io::stdout());
    let std_logger = tracing_subscriber::fmt::layer()
        .with_writer(std_writer)
        .with_ansi(false)
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE);

    // file logger, truncated each run
    let log_file = File::create(LOG_FILE).map_err(Error::CreateFile)?;
    let (file_writer, file_guard) = tracing_appender::non_blocking(log_file);
    let file_logger = tracing_subscriber::fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE | FmtSpan::ENTER);

    // Register loggers
    let collector = tracing_subscriber::registry()
        .with(std_logger)
        .with(file_logger)
        .with(filter(debug));

    set_global_default(collector)?;

    Ok(LoggerGuards {
        _stdout: std_guard,
        _file: file_guard,
    })
}
