use std::io;

use tracing::dispatcher::DefaultGuard;
use tracing::warn;
use tracing_appender::non_blocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Layer;
use tracing_subscriber::{fmt, registry};

use crate::config::{Config, Logging};

// Stdout carries the report lines, so every console layer writes to stderr.

// This is a helper struct to store the logger guards. When they are dropped, logging can be reset.
#[allow(dead_code)]
pub struct LogGuards {
    log_guard: Option<WorkerGuard>,
    default: DefaultGuard,
}

pub fn init_std_err_logging_thread_local() -> DefaultGuard {
    let collector = registry().with(
        fmt::Layer::new()
            .with_writer(io::stderr)
            .with_filter(LevelFilter::INFO),
    );
    tracing::subscriber::set_default(collector)
}

/// Installs the subscriber for the member with `rank` on the current thread. Rank 0 logs to the
/// console. With [`Logging::Info`] every rank writes a json log file into the output directory.
/// A log file which cannot be created is reported and skipped.
pub fn init_logging(config: &Config, rank: u32) -> LogGuards {
    let dir = config.output_dir();

    let appender = if Logging::Info == config.output().logging {
        Some(
            RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(log_file_name(rank))
                .build(&dir),
        )
    } else {
        None
    };

    let mut appender_error = None;
    let (log_layer, log_guard) = match appender {
        Some(Ok(log_file_appender)) => {
            let (log_file, log_guard) = non_blocking(log_file_appender);
            let layer = fmt::Layer::new()
                .with_writer(log_file)
                .json()
                .with_ansi(false)
                .with_filter(LevelFilter::INFO);
            (Some(layer), Some(log_guard))
        }
        Some(Err(e)) => {
            appender_error = Some(e);
            (None, None)
        }
        None => (None, None),
    };

    let console_layer = (rank == 0).then(|| {
        fmt::layer()
            .with_writer(io::stderr)
            .with_filter(LevelFilter::INFO)
    });

    // Add `Optional`s. If None, then the corresponding layer is not added.
    let collector = registry().with(log_layer).with(console_layer);
    let default = tracing::subscriber::set_default(collector);

    if let Some(e) = appender_error {
        warn!("Was not able to create log file in {dir:?}: {e}");
    }

    LogGuards { log_guard, default }
}

pub fn log_file_name(rank: u32) -> String {
    format!("log_process_{rank}.txt")
}
