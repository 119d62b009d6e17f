//! Logger bootstrap for hosts embedding the solvers.
//!
//! The library itself only logs through the `log` facade. Hosts that do
//! not install their own logger can call [`init_logger`].

use std::io::Write;

use env_logger::{Builder, Target, fmt::Formatter};
use log::{LevelFilter, Record};
use serde::{Deserialize, Serialize};

use crate::types::SolverError;

/// Maximum level of records written by the logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogLevel {
    /// Errors only.
    Error,
    /// Fallbacks: a path search that gave up, or an entry edge found
    /// without a crossing.
    Warn,
    /// Start and end of each pipeline stage.
    #[default]
    Info,
    /// Per-cluster decisions such as the shape verdict.
    Debug,
    /// Everything, including sort worker progress.
    Trace,
    /// Nothing.
    Off,
}

impl LogLevel {
    /// The matching `log` level filter.
    #[must_use]
    pub const fn to_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
            Self::Off => LevelFilter::Off,
        }
    }
}

/// Line layout of log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogFormat {
    /// `LEVEL message`
    #[default]
    Compact,
    /// `LEVEL [module:line] message`
    Pretty,
}

impl LogFormat {
    /// Write one record in this layout, without a trailing newline.
    fn write_record(self, out: &mut impl Write, record: &Record<'_>) -> std::io::Result<()> {
        let tag = record.level().as_str();
        match self {
            Self::Compact => write!(out, "{tag:<5} {}", record.args()),
            Self::Pretty => {
                let module = record.module_path().unwrap_or_else(|| record.target());
                match record.line() {
                    Some(line) => write!(out, "{tag:<5} [{module}:{line}] {}", record.args()),
                    None => write!(out, "{tag:<5} [{module}] {}", record.args()),
                }
            }
        }
    }
}

/// Logger settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogOptions {
    /// Most verbose level written; `Info` unless set.
    pub level: LogLevel,
    /// Line layout; `Compact` unless set.
    pub format: LogFormat,
    /// Prefix every line with a millisecond timestamp.
    pub timestamp: bool,
}

/// Install a global `env_logger` writing to stderr.
///
/// `RUST_LOG` is not consulted; `options.level` alone decides what is
/// written.
///
/// # Errors
///
/// Returns [`SolverError::Logging`] if a global logger is already set.
pub fn init_logger(options: &LogOptions) -> Result<(), SolverError> {
    let LogOptions {
        level,
        format,
        timestamp,
    } = *options;

    Builder::new()
        .filter_level(level.to_filter())
        .write_style(env_logger::WriteStyle::Never)
        .target(Target::Stderr)
        .format(move |buf: &mut Formatter, record| {
            if timestamp {
                write!(buf, "{} ", buf.timestamp_millis())?;
            }
            format.write_record(buf, record)?;
            writeln!(buf)
        })
        .try_init()
        .map_err(|e| SolverError::Logging(e.to_string()))
}
