/*============================================================
  Synavera Project: Syn-OTA
  Module: synota_core::logger
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Structured, append-only operator log for report runs,
    plus the per-build progress channel shown on stdout.

  Security / Safety Notes:
    Only device codenames, incrementals and local paths are
    logged; changelog bodies stay out of the log.

  Dependencies:
    std::fs::File, std::sync::Mutex, chrono for timestamps.

  Operational Scope:
    Shared by the fetcher and assembler to emit RFC-3339 UTC
    stamped entries for each run.

  Revision History:
    2025-11-12 COD  Adapted Synavera logger for report runs.
    2025-11-19 COD  Shared entry formatting between channels.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Append-only logging with UTC timestamps
    - Deterministic formatting for auditability
    - Graceful error propagation on I/O failures
============================================================*/

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};

use crate::error::{OtaError, Result};

/// Structured log level for Syn-OTA events.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Debug,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Debug => "DEBUG",
        }
    }

    fn always_visible(self) -> bool {
        matches!(self, LogLevel::Warn | LogLevel::Error)
    }
}

/// One formatted log line and the stamp it carries.
struct LogEntry {
    timestamp: String,
    line: String,
}

impl LogEntry {
    fn now(level: LogLevel, code: &str, message: &str) -> Self {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let line = format_entry(&timestamp, level, code, message);
        Self { timestamp, line }
    }
}

/// `{timestamp} [LEVEL] [CODE] message`
fn format_entry(timestamp: &str, level: LogLevel, code: &str, message: &str) -> String {
    format!("{timestamp} [{}] [{code}] {message}", level.as_str())
}

/// Shared logger that emits append-only entries in Synavera format.
pub struct Logger {
    file: Option<Mutex<BufWriter<File>>>,
    path: Option<PathBuf>,
    verbose: bool,
}

impl Logger {
    /// Build a logger that writes to stderr and optionally to a file.
    pub fn new(path: Option<PathBuf>, verbose: bool) -> Result<Self> {
        let file = match path.as_deref() {
            Some(file_path) => Some(Mutex::new(BufWriter::new(open_log(file_path)?))),
            None => None,
        };

        Ok(Self {
            file,
            path,
            verbose,
        })
    }

    /// Logger with no file sink and stderr limited to warnings.
    #[cfg(test)]
    pub fn silent() -> Self {
        Self {
            file: None,
            path: None,
            verbose: false,
        }
    }

    /// Emit a log entry with the given level, code, and message.
    pub fn log<S: AsRef<str>>(&self, level: LogLevel, code: &str, message: S) {
        let entry = LogEntry::now(level, code, message.as_ref());
        if self.verbose || level.always_visible() {
            eprintln!("{}", entry.line);
        }
        self.append(&entry);
    }

    /// Progress notice for operators: always printed to stdout, logged at INFO.
    pub fn progress<S: AsRef<str>>(&self, code: &str, message: S) {
        println!("{}", message.as_ref());
        self.append(&LogEntry::now(LogLevel::Info, code, message.as_ref()));
    }

    fn append(&self, entry: &LogEntry) {
        let Some(file) = &self.file else {
            return;
        };
        if let Ok(mut guard) = file.lock() {
            if writeln!(guard, "{}", entry.line).is_err() {
                eprintln!(
                    "{}",
                    format_entry(
                        &entry.timestamp,
                        LogLevel::Error,
                        "LOGGER",
                        "Failed to write to log file"
                    )
                );
            }
        }
    }

    /// Convenience wrapper for `INFO` level events.
    pub fn info<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Info, code, message);
    }

    /// Convenience wrapper for `WARN` level events.
    pub fn warn<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Warn, code, message);
    }

    /// Convenience wrapper for `ERROR` level events.
    pub fn error<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Error, code, message);
    }

    /// Convenience wrapper for `DEBUG` level events.
    pub fn debug<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Debug, code, message);
    }

    /// Return the path backing this logger, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Flush buffered entries to the log file.
    pub fn finalize(&self) -> Result<()> {
        if let Some(file) = &self.file {
            let mut guard = file
                .lock()
                .map_err(|_| OtaError::Filesystem("Log writer lock poisoned".into()))?;
            guard.flush().map_err(|err| {
                OtaError::Filesystem(format!(
                    "Failed to flush log {}: {err}",
                    self.path().map(|p| p.display().to_string()).unwrap_or_default()
                ))
            })?;
        }
        Ok(())
    }
}

fn open_log(file_path: &Path) -> Result<File> {
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| {
            OtaError::Filesystem(format!(
                "Failed to create log directory {}: {err}",
                parent.display()
            ))
        })?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(file_path)
        .map_err(|err| {
            OtaError::Filesystem(format!(
                "Failed to open log file {}: {err}",
                file_path.display()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_appended_to_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("run.log");
        let logger = Logger::new(Some(path.clone()), false).unwrap();

        logger.info("INIT", "starting");
        logger.progress("CHAIN", "[zahedan] Found incremental: A");
        logger.finalize().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("[INFO] [INIT] starting"));
        assert!(lines[1].ends_with("[INFO] [CHAIN] [zahedan] Found incremental: A"));
        assert_eq!(logger.path(), Some(path.as_path()));
    }

    #[test]
    fn entry_format_is_shared() {
        assert_eq!(
            format_entry("2025-11-19T10:00:00Z", LogLevel::Warn, "DEVICE", "skipped"),
            "2025-11-19T10:00:00Z [WARN] [DEVICE] skipped"
        );
        let entry = LogEntry::now(LogLevel::Info, "CHAIN", "A");
        assert_eq!(entry.line, format!("{} [INFO] [CHAIN] A", entry.timestamp));
    }

    #[test]
    fn silent_logger_has_no_sink() {
        let logger = Logger::silent();
        logger.debug("NOOP", "dropped");
        assert!(logger.path().is_none());
        assert!(logger.finalize().is_ok());
    }
}
