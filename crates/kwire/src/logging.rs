use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Crates whose events follow `--log-level`.
const KWIRE_TARGETS: [&str; 5] = [
    "kwire",
    "kwire_transport",
    "kwire_schema",
    "kwire_frame",
    "kwire_client",
];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }

    fn shows_targets(self) -> bool {
        matches!(self, LogLevel::Debug | LogLevel::Trace)
    }
}

/// `level` for the kwire crates, at most `warn` for dependencies.
fn log_filter(level: LogLevel) -> Targets {
    let chosen = level.as_filter();
    KWIRE_TARGETS
        .iter()
        .fold(Targets::new(), |targets, target| targets.with_target(*target, chosen))
        .with_default(chosen.min(LevelFilter::WARN))
}

/// Install a stderr subscriber; stdout is reserved for command output.
///
/// At `debug` and `trace` each line names the layer that emitted it.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(level.shows_targets());
    let registry = tracing_subscriber::registry().with(log_filter(level));

    let _ = match format {
        LogFormat::Text => registry.with(layer).try_init(),
        LogFormat::Json => registry.with(layer.json()).try_init(),
    };
}
