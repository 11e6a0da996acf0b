//! logging
//!
//! Process-wide tracing setup. Called once from `main`; library code only
//! emits events.
//!
//! # Layers
//!
//! - Console: the bare message, colored by level, filtered by verbosity
//! - File: timestamped DEBUG lines appended to the day's log file under the
//!   log directory, unless file logging is disabled
//!
//! A panic hook logs the panic with a captured backtrace before the default
//! hook prints it.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use colored::Colorize;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::{self, FormatEvent, FormatFields};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::core::config::Config;
use crate::core::paths::log_file_name;
use crate::ui::output::Verbosity;

/// Overrides the console filter, e.g. `pipeline_helpers=trace`.
pub const LOG_FILTER_ENV: &str = "PIPELINE_HELPERS_LOG";

/// Console filter directive for a verbosity.
pub fn console_directive(verbosity: Verbosity) -> String {
    format!("warn,pipeline_helpers={}", verbosity.filter_directive())
}

/// Message-only console format, colored by level.
struct ConsoleFormat;

impl<S, N> FormatEvent<S, N> for ConsoleFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut message = String::new();
        ctx.field_format()
            .format_fields(format::Writer::new(&mut message), event)?;
        let message = match *event.metadata().level() {
            Level::ERROR => message.red(),
            Level::WARN => message.yellow(),
            Level::INFO => message.green(),
            _ => message.cyan(),
        };
        writeln!(writer, "{}", message)
    }
}

/// Open (appending) today's log file in `dir`.
pub fn open_log_file(dir: &Path) -> std::io::Result<(File, PathBuf)> {
    fs::create_dir_all(dir)?;
    let path = dir.join(log_file_name(Local::now().date_naive()));
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((file, path))
}

/// Install the subscriber and panic hook.
///
/// Returns the log file in use, if any. A log file that cannot be opened is
/// reported on stderr and skipped.
pub fn init(verbosity: Verbosity, config: &Config) -> Option<PathBuf> {
    let console_filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(console_directive(verbosity)));
    let console = tracing_subscriber::fmt::layer()
        .event_format(ConsoleFormat)
        .with_writer(std::io::stdout)
        .with_filter(console_filter);

    let mut log_path = None;
    let file_layer = match config.log_dir().filter(|_| config.log_to_file()) {
        Some(dir) => match open_log_file(&dir) {
            Ok((file, path)) => {
                log_path = Some(path);
                Some(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Arc::new(file))
                        .with_filter(EnvFilter::new("warn,pipeline_helpers=debug")),
                )
            }
            Err(e) => {
                eprintln!("warning: cannot open log file in {}: {}", dir.display(), e);
                None
            }
        },
        None => None,
    };

    // A subscriber may already be installed (tests).
    let _ = tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init();

    install_panic_hook();
    if let Some(path) = &log_path {
        tracing::debug!("Logging to file: {}", path.display());
    }
    log_path
}

/// Log panics with a backtrace, then run the default hook.
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        tracing::error!("{}\nStack trace:\n{}", info, backtrace);
        default_hook(info);
    }));
}
