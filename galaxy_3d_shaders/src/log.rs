//! Logging for the Galaxy3D shader subsystem
//!
//! Every diagnostic of the subsystem (stage compiled, link failed, unknown
//! uniform...) is a [`LogEntry`] handed to the process-wide [`Logger`] set
//! through `Engine::set_logger`. [`DefaultLogger`] prints colored lines to
//! stdout; ERROR entries carry the file:line they were emitted from.
//!
//! Driver compile and link logs are multi-line, so a custom logger is the
//! natural place to collect them (in-game console, test capture).

use colored::*;
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Logger trait for custom logging implementations
///
/// Implement this trait to redirect engine logs (file logging, in-game
/// console, test capture, etc.)
///
/// # Example
///
/// ```no_run
/// use galaxy_3d_shaders::galaxy3d::log::{Logger, LogEntry};
///
/// struct ConsoleLogger;
///
/// impl Logger for ConsoleLogger {
///     fn log(&self, entry: &LogEntry) {
///         eprintln!("{}: {}", entry.source, entry.message);
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    /// Log an entry
    fn log(&self, entry: &LogEntry);
}

/// Log entry containing all information about a log message
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity level (Trace, Debug, Info, Warn, Error)
    pub severity: LogSeverity,

    /// Timestamp when the log was created
    pub timestamp: SystemTime,

    /// Source module (e.g., "galaxy3d::ShaderManager", "galaxy3d::Shader")
    pub source: String,

    /// Log message
    pub message: String,

    /// Source file (only for detailed ERROR logs)
    pub file: Option<&'static str>,

    /// Source line (only for detailed ERROR logs)
    pub line: Option<u32>,
}

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Very verbose information (per-uniform introspection results)
    Trace,

    /// Development information (stage compiled, program linked)
    Debug,

    /// Important informational messages
    Info,

    /// Warning messages (unknown names, out of bounds array indices)
    Warn,

    /// Error messages (compile/link failures) with file:line details
    Error,
}

impl LogSeverity {
    /// Fixed-width label used by [`DefaultLogger`]
    pub fn label(&self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for LogSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label().trim_end())
    }
}

/// Indent every line of a message but the first
///
/// Driver compile and link logs span several lines; indenting them keeps
/// them visually attached to the entry header.
pub fn indent_continuation(message: &str) -> String {
    let mut lines = message.trim_end().lines();
    let mut result = lines.next().unwrap_or_default().to_string();
    for line in lines {
        result.push_str("\n    ");
        result.push_str(line);
    }
    result
}

/// Default logger implementation using colored console output
///
/// Format:
/// - Normal: `[timestamp] [SEVERITY] [source] message`
/// - Error: `[timestamp] [ERROR] [source] message (file:line)`
///
/// Multi-line messages (driver logs) continue on indented lines.
pub struct DefaultLogger;

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f");

        let label = entry.severity.label();
        let severity = match entry.severity {
            LogSeverity::Trace => label.bright_black(),
            LogSeverity::Debug => label.cyan(),
            LogSeverity::Info => label.green(),
            LogSeverity::Warn => label.yellow(),
            LogSeverity::Error => label.red().bold(),
        };

        let message = indent_continuation(&entry.message);
        let location = match (entry.file, entry.line) {
            (Some(file), Some(line)) => format!(" ({}:{})", file, line),
            _ => String::new(),
        };

        println!("[{}] [{}] [{}] {}{}", timestamp, severity, entry.source.bright_blue(), message, location);
    }
}

/// Logger forwarding only entries at or above a severity
///
/// ```no_run
/// use galaxy_3d_shaders::galaxy3d::Engine;
/// use galaxy_3d_shaders::galaxy3d::log::{DefaultLogger, LogSeverity, SeverityFilter};
///
/// // Hide per-uniform introspection traces
/// Engine::set_logger(SeverityFilter::new(LogSeverity::Debug, DefaultLogger));
/// ```
pub struct SeverityFilter<L: Logger> {
    min_severity: LogSeverity,
    inner: L,
}

impl<L: Logger> SeverityFilter<L> {
    pub fn new(min_severity: LogSeverity, inner: L) -> Self {
        Self { min_severity, inner }
    }

    pub fn min_severity(&self) -> LogSeverity {
        self.min_severity
    }
}

impl<L: Logger> Logger for SeverityFilter<L> {
    fn log(&self, entry: &LogEntry) {
        if entry.severity >= self.min_severity {
            self.inner.log(entry);
        }
    }
}

// ===== LOGGING MACROS =====

/// Shared body of the `engine_*` macros
#[doc(hidden)]
#[macro_export]
macro_rules! engine_log {
    ($severity:ident, $source:expr, $($arg:tt)*) => {
        $crate::galaxy3d::Engine::log(
            $crate::galaxy3d::log::LogSeverity::$severity,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a TRACE message (per-uniform introspection, very verbose)
///
/// ```ignore
/// engine_trace!("galaxy3d::Shader", "Found uniform {} at {}", name, location);
/// ```
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => { $crate::engine_log!(Trace, $source, $($arg)*) };
}

/// Log a DEBUG message (stage compiled, program linked)
///
/// ```ignore
/// engine_debug!("galaxy3d::ShaderManager", "Registered include {}", name);
/// ```
#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => { $crate::engine_log!(Debug, $source, $($arg)*) };
}

/// Log an INFO message
#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => { $crate::engine_log!(Info, $source, $($arg)*) };
}

/// Log a WARN message (unknown names, refused operations)
///
/// ```ignore
/// engine_warn!("galaxy3d::ShaderManager", "Want to destroy the inexistent shader {}", name);
/// ```
#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => { $crate::engine_log!(Warn, $source, $($arg)*) };
}

/// Log an ERROR message with file:line information
///
/// ```ignore
/// engine_error!("galaxy3d::ShaderManager", "Failed to link {}:\n{}", key, log);
/// ```
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::galaxy3d::Engine::log_detailed(
            $crate::galaxy3d::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
