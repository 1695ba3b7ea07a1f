//! Log line format and subscriber setup.
//!
//! Lines look like `[2026/10/14 09:30:00 +0200][NOTICE] Logged in successfully!`.
//! NOTICE lines go to stdout, WARNING and ERROR to stderr. WARNING and ERROR
//! lines are printed whatever `RUST_LOG` says.

use crate::error::{DdnsError, Result};
use crate::notify::{Notifier, NotifyLayer};
use chrono::Local;
use std::fmt;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::{EnvFilter, FilterExt, LevelFilter};
use tracing_subscriber::layer::Filter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

pub const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S %z";

/// Severity tag printed for a tracing level.
pub fn tag_for(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARNING",
        Level::INFO => "NOTICE",
        Level::DEBUG => "DEBUG",
        Level::TRACE => "TRACE",
    }
}

/// `[timestamp][TAG] message` formatter.
pub struct NoticeFormat;

impl<S, N> FormatEvent<S, N> for NoticeFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            writer,
            "[{}][{}] ",
            Local::now().format(TIMESTAMP_FORMAT),
            tag_for(event.metadata().level())
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Install the global subscriber.
///
/// Quiet mode hides NOTICE lines; otherwise `RUST_LOG` may widen or narrow
/// the default `info` filter down to, but never below, `warn`.
pub fn init<N: Notifier>(quiet: bool, notifier: Option<N>) -> Result<()> {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    let writer = std::io::stderr
        .with_max_level(Level::WARN)
        .or_else(std::io::stdout);

    let fmt_layer = tracing_subscriber::fmt::layer()
        .event_format(NoticeFormat)
        .with_writer(writer)
        .with_filter(console_filter(quiet, directives.as_deref()));

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(notifier.map(NotifyLayer::new))
        .try_init()
        .map_err(|e| DdnsError::Config(format!("Failed to install logger: {}", e)))
}

fn console_filter<S>(quiet: bool, directives: Option<&str>) -> impl Filter<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let env = if quiet {
        EnvFilter::new("warn")
    } else {
        directives
            .filter(|d| !d.trim().is_empty())
            .and_then(|d| EnvFilter::try_new(d).ok())
            .unwrap_or_else(|| EnvFilter::new("info"))
    };
    env.or(LevelFilter::WARN)
}

/// Log a fatal error unless an ERROR line was already written for it.
pub fn report_fatal(err: &DdnsError) {
    if err.is_reported() {
        tracing::info!("Exiting.");
    } else {
        tracing::error!("{}. Exiting.", err);
    }
}
