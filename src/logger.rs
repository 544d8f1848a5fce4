//! Process-wide logger construction and handle access.
//!
//! [`init`] runs once at process startup, before concurrent workers begin:
//! it builds the environment-appropriate subscriber, installs it as the
//! global tracing default, and stores the handle in a process-wide slot that
//! [`logger`] reads. Calling it again replaces the handle without
//! synchronizing against concurrent readers.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use tracing::dispatcher::{self, Dispatch};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

use crate::config::{Environment, LoggerConfig};
use crate::encoder::{ConsoleEncoder, JsonEncoder};
use crate::rotation::{RotatingFileWriter, RotationPolicy};
use crate::severity::Severity;

static HANDLE: RwLock<Option<Arc<LoggerHandle>>> = RwLock::new(None);

/// Output destination chosen at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink {
    /// Human-readable lines to standard output (development)
    Console,
    /// JSON records to a rotating daily file (everything else)
    RotatingFile { path: PathBuf },
}

/// The configured logger: its dispatcher, effective minimum severity, and
/// selected sink. Lives for the process lifetime once installed.
#[derive(Debug)]
pub struct LoggerHandle {
    dispatch: Dispatch,
    level: Severity,
    sink: Sink,
}

impl LoggerHandle {
    /// Minimum severity this logger emits
    pub fn level(&self) -> Severity {
        self.level
    }

    /// The sink records are written to
    pub fn sink(&self) -> &Sink {
        &self.sink
    }

    /// The tracing dispatcher backing this logger
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Path of the current log file, if this logger writes to a file
    pub fn file_path(&self) -> Option<&Path> {
        match &self.sink {
            Sink::RotatingFile { path } => Some(path),
            Sink::Console => None,
        }
    }
}

/// Daily log file name for the given date, `YYYYMMDD.log`.
pub fn daily_file_name(date: NaiveDate) -> String {
    format!("{}.log", date.format("%Y%m%d"))
}

fn build_handle(config: &LoggerConfig) -> Result<LoggerHandle> {
    fs::create_dir_all(&config.log_directory).context("Failed to create logs directory")?;

    // Computed once from the current date; a process running past midnight
    // keeps writing to the file it started with.
    let file_path = config
        .log_directory
        .join(daily_file_name(Local::now().date_naive()));

    // Constructed for every environment; the dev branch drops it unused, and
    // the lazy open means no file appears until the first production write.
    let file_writer = RotatingFileWriter::new(file_path.clone(), RotationPolicy::default());

    let filter = EnvFilter::builder()
        .with_default_directive(config.level.filter().into())
        .from_env_lossy();

    let (dispatch, sink) = match config.environment {
        Environment::Dev => {
            let layer = tracing_subscriber::fmt::layer()
                .event_format(ConsoleEncoder)
                .with_writer(io::stdout);
            let subscriber = tracing_subscriber::registry().with(filter).with(layer);
            (Dispatch::new(subscriber), Sink::Console)
        }
        Environment::Production => {
            let layer = tracing_subscriber::fmt::layer()
                .event_format(JsonEncoder)
                .with_writer(file_writer);
            let subscriber = tracing_subscriber::registry().with(filter).with(layer);
            (Dispatch::new(subscriber), Sink::RotatingFile { path: file_path })
        }
    };

    Ok(LoggerHandle {
        dispatch,
        level: config.level,
        sink,
    })
}

/// Initialize the process-wide logger.
///
/// Builds the subscriber for the configured environment, installs it, and
/// emits one `"Logger init success"` info record through the new dispatcher
/// as a smoke test. The global tracing dispatcher can only be claimed once
/// per process; repeated calls still replace the handle returned by
/// [`logger`], so the smoke record always reaches the newest sink.
pub fn init(config: &LoggerConfig) -> Result<Arc<LoggerHandle>> {
    let handle = Arc::new(build_handle(config)?);

    let _ = dispatcher::set_global_default(handle.dispatch().clone());
    if let Ok(mut slot) = HANDLE.write() {
        *slot = Some(Arc::clone(&handle));
    }

    dispatcher::with_default(handle.dispatch(), || {
        tracing::info!("Logger init success");
    });

    Ok(handle)
}

/// Get the current process-wide logger handle.
///
/// Returns `None` until [`init`] has been called; there is no lazy
/// auto-initialization.
pub fn logger() -> Option<Arc<LoggerHandle>> {
    HANDLE.read().ok().and_then(|slot| slot.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::TempDir;

    #[test]
    fn test_daily_file_name_format() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        assert_eq!(daily_file_name(date), "20260830.log");

        let date = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        assert_eq!(daily_file_name(date), "20260102.log");
    }

    #[test]
    fn test_dev_selects_console_and_leaves_no_file() {
        let dir = TempDir::new().unwrap();
        let config = LoggerConfig::new("dev", dir.path(), "info");
        let handle = build_handle(&config).unwrap();

        assert_eq!(*handle.sink(), Sink::Console);
        assert!(handle.file_path().is_none());

        dispatcher::with_default(handle.dispatch(), || {
            tracing::info!("console only");
        });

        // The rotating sink was constructed but never written to
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_production_writes_json_to_daily_file() {
        let dir = TempDir::new().unwrap();
        let config = LoggerConfig::new("prod", dir.path(), "info");
        let handle = build_handle(&config).unwrap();

        let expected = dir.path().join(daily_file_name(Local::now().date_naive()));
        assert_eq!(handle.file_path(), Some(expected.as_path()));

        dispatcher::with_default(handle.dispatch(), || {
            tracing::info!("file bound");
        });

        let contents = fs::read_to_string(&expected).unwrap();
        let record: Value = serde_json::from_str(contents.lines().next().unwrap()).unwrap();
        assert_eq!(record["msg"], "file bound");
        assert_eq!(record["level"], "info");
        assert!(record.get("time").is_some());
        assert!(record.get("caller").is_some());
    }

    #[test]
    fn test_any_non_dev_environment_is_production() {
        let dir = TempDir::new().unwrap();
        let config = LoggerConfig::new("staging", dir.path(), "info");
        let handle = build_handle(&config).unwrap();
        assert!(matches!(handle.sink(), Sink::RotatingFile { .. }));
    }

    #[test]
    fn test_minimum_level_is_applied() {
        let dir = TempDir::new().unwrap();
        let config = LoggerConfig::new("prod", dir.path(), "warn");
        let handle = build_handle(&config).unwrap();

        assert_eq!(handle.level(), Severity::Warn);

        dispatcher::with_default(handle.dispatch(), || {
            tracing::debug!("filtered out");
            tracing::warn!("kept");
        });

        let path = handle.file_path().unwrap();
        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains("kept"));
        assert!(!contents.contains("filtered out"));
    }

    #[test]
    fn test_build_creates_log_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("var").join("log");
        let config = LoggerConfig::new("prod", &nested, "info");
        build_handle(&config).unwrap();
        assert!(nested.is_dir());
    }
}
