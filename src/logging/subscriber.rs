//! Tracing subscriber setup: console formatter, file layer, and initialisation.
use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::sync::Mutex;

use tracing::Level;

use super::utils::{format_utc_datetime, format_utc_time, log_file_path, strip_ansi};

/// Target of stage headers.
pub(super) const STAGE_TARGET: &str = "installer::stage";
/// Target of lines relayed from installer processes.
pub(super) const OUTPUT_TARGET: &str = "installer::output";
/// Target of blank separator lines.
pub(super) const SEPARATOR_TARGET: &str = "installer::separator";

/// Rendering class of an event, from its level and target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Stage,
    Output,
    Separator,
    Info,
    Warn,
    Error,
    Debug,
}

impl Kind {
    fn of(metadata: &tracing::Metadata<'_>) -> Self {
        match (*metadata.level(), metadata.target()) {
            (Level::ERROR, _) => Self::Error,
            (Level::WARN, _) => Self::Warn,
            (Level::INFO, STAGE_TARGET) => Self::Stage,
            (Level::INFO, OUTPUT_TARGET) => Self::Output,
            (Level::INFO, SEPARATOR_TARGET) => Self::Separator,
            (Level::INFO, _) => Self::Info,
            _ => Self::Debug,
        }
    }

    /// Console line for `msg`, without the newline.
    fn console(self, msg: &str) -> String {
        match self {
            Self::Error => format!("\x1b[31mERROR\x1b[0m {msg}"),
            Self::Warn => format!("\x1b[33mWARN\x1b[0m  {msg}"),
            Self::Stage => format!("\x1b[1;34m==>\x1b[0m \x1b[1m{msg}\x1b[0m"),
            Self::Output => format!("  \x1b[2m│\x1b[0m {}", colorize_output(msg)),
            Self::Separator => String::new(),
            Self::Info => format!("  {msg}"),
            Self::Debug => format!("  \x1b[2m{msg}\x1b[0m"),
        }
    }

    /// Log-file line for `msg` stamped with `ts`. Separators are not logged.
    fn file(self, ts: &str, msg: &str) -> Option<String> {
        let body = match self {
            Self::Separator => return None,
            Self::Stage => format!("==> {msg}"),
            Self::Output => format!("    │ {msg}"),
            Self::Error => format!("    [error] {msg}"),
            Self::Warn => format!("    [warn] {msg}"),
            Self::Debug => format!("    [debug] {msg}"),
            Self::Info => format!("    {msg}"),
        };
        Some(format!("[{ts}] {body}"))
    }
}

/// Collects the `message` field of an event.
#[derive(Default)]
struct Message(String);

impl tracing::field::Visit for Message {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0.clear();
            let _ = write!(self.0, "{value:?}");
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            value.clone_into(&mut self.0);
        }
    }
}

fn message_of(event: &tracing::Event<'_>) -> String {
    let mut message = Message::default();
    event.record(&mut message);
    message.0
}

/// Appends every event to `<command>.log` with timestamps and ANSI codes
/// stripped.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Truncate the log for `command` and write a header line.
    ///
    /// Returns `None` if the cache directory or the file is unavailable.
    pub(super) fn new(command: &str) -> Option<Self> {
        let path = log_file_path(command)?;
        let version =
            option_env!("DOTFILES_VERSION").unwrap_or(concat!("dev-", env!("CARGO_PKG_VERSION")));
        let header = format!(
            "# dotfiles-installer {version}: {command} started {}\n",
            format_utc_datetime()
        );
        fs::write(&path, header).ok()?;
        let file = fs::OpenOptions::new().append(true).open(&path).ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let msg = strip_ansi(&message_of(event));
        let Some(line) = Kind::of(event.metadata()).file(&format_utc_time(), &msg) else {
            return;
        };
        if let Ok(mut f) = self.file.lock() {
            writeln!(f, "{line}").ok();
        }
    }
}

/// Console formatter: `==>` stage headers, `WARN`/`ERROR` prefixes, a `│`
/// gutter for relayed output and dimmed debug lines.
struct InstallerFormatter;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for InstallerFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let line = Kind::of(event.metadata()).console(&message_of(event));
        writeln!(writer, "{line}")
    }
}

/// Highlight status lines emitted by the sequencers.
fn colorize_output(line: &str) -> String {
    if line.starts_with("Error:") {
        format!("\x1b[31m{line}\x1b[0m")
    } else if line.starts_with("Warning:") {
        format!("\x1b[33m{line}\x1b[0m")
    } else {
        line.to_string()
    }
}

/// Install the global subscriber for `command`.
///
/// Warnings and errors go to stderr, everything else to stdout; `debug`
/// reaches the console only when `verbose`. The log file always receives
/// `debug` and up. Call once, before any logging.
pub fn init_subscriber(verbose: bool, command: &str) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let console_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let make_writer = std::io::stderr
        .with_max_level(Level::WARN)
        .and(std::io::stdout.with_min_level(Level::INFO));

    let console_layer = fmt::layer()
        .event_format(InstallerFormatter)
        .with_writer(make_writer)
        .with_filter(console_level);

    let file_layer = FileLayer::new(command).map(|l| l.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
}
