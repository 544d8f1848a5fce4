//! Daylog - environment-aware structured logging
//!
//! One call to [`init`] at process startup configures the process-wide
//! logger: human-readable console output in development, JSON records in a
//! size-rotated daily log file everywhere else. [`logger`] hands the
//! resulting handle to anything that needs to inspect it.
//!
//! ```no_run
//! use daylog::LoggerConfig;
//!
//! let config = LoggerConfig::new("prod", "logs", "info");
//! daylog::init(&config).expect("failed to initialize logging");
//! tracing::info!("ready to serve");
//! ```

pub mod config;
pub mod encoder;
pub mod logger;
pub mod rotation;
pub mod severity;

pub use config::{Environment, LoggerConfig};
pub use encoder::{ConsoleEncoder, JsonEncoder};
pub use logger::{daily_file_name, init, logger, LoggerHandle, Sink};
pub use rotation::{RotatingFileWriter, RotationPolicy};
pub use severity::Severity;
