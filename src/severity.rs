//! Minimum severity levels for log filtering.

use std::convert::Infallible;
use std::str::FromStr;

use serde::Deserialize;
use tracing::level_filters::LevelFilter;

/// Ordinal severity filter controlling which records are emitted.
///
/// Parsing is case-insensitive and never fails: `debug`, `info`, `warn`,
/// `panic`, and `fatal` have dedicated match arms, while everything else
/// (including `error`) resolves to [`Severity::Error`] through the fallback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(from = "String")]
pub enum Severity {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Panic,
    Fatal,
}

impl Severity {
    /// Parse a severity string, coercing unrecognized input to `Error`.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Severity::Debug,
            "info" => Severity::Info,
            "warn" => Severity::Warn,
            "panic" => Severity::Panic,
            "fatal" => Severity::Fatal,
            // "error" has no arm of its own and reaches Error through the
            // same fallback as any unrecognized value
            _ => Severity::Error,
        }
    }

    /// Get the display name for this severity
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Panic => "panic",
            Severity::Fatal => "fatal",
        }
    }

    /// Map to the `tracing` level filter.
    ///
    /// `tracing` has no levels above error, so `Panic` and `Fatal` collapse
    /// onto the error filter.
    pub fn filter(&self) -> LevelFilter {
        match self {
            Severity::Debug => LevelFilter::DEBUG,
            Severity::Info => LevelFilter::INFO,
            Severity::Warn => LevelFilter::WARN,
            Severity::Error | Severity::Panic | Severity::Fatal => LevelFilter::ERROR,
        }
    }
}

impl FromStr for Severity {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Severity::parse(s))
    }
}

impl From<&str> for Severity {
    fn from(s: &str) -> Self {
        Severity::parse(s)
    }
}

impl From<String> for Severity {
    fn from(s: String) -> Self {
        Severity::parse(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(Severity::parse("DEBUG"), Severity::Debug);
        assert_eq!(Severity::parse("debug"), Severity::Debug);
        assert_eq!(Severity::parse("Info"), Severity::Info);
        assert_eq!(Severity::parse("Warn"), Severity::Warn);
        assert_eq!(Severity::parse("PANIC"), Severity::Panic);
        assert_eq!(Severity::parse("Fatal"), Severity::Fatal);
    }

    #[test]
    fn test_unrecognized_coerces_to_error() {
        assert_eq!(Severity::parse("bogus"), Severity::Error);
        assert_eq!(Severity::parse(""), Severity::Error);
        assert_eq!(Severity::parse("trace"), Severity::Error);
    }

    #[test]
    fn test_error_resolves_through_the_fallback_arm() {
        // "error" is deliberately not matched explicitly; it lands on Error
        // only because the fallback coerces everything unrecognized there.
        assert_eq!(Severity::parse("error"), Severity::Error);
        assert_eq!(Severity::parse("ERROR"), Severity::Error);
    }

    #[test]
    fn test_ordering() {
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
        assert!(Severity::Error < Severity::Panic);
        assert!(Severity::Panic < Severity::Fatal);
    }

    #[test]
    fn test_filter_mapping() {
        assert_eq!(Severity::Debug.filter(), LevelFilter::DEBUG);
        assert_eq!(Severity::Info.filter(), LevelFilter::INFO);
        assert_eq!(Severity::Warn.filter(), LevelFilter::WARN);
        assert_eq!(Severity::Error.filter(), LevelFilter::ERROR);
        assert_eq!(Severity::Panic.filter(), LevelFilter::ERROR);
        assert_eq!(Severity::Fatal.filter(), LevelFilter::ERROR);
    }

    #[test]
    fn test_default_is_info() {
        assert_eq!(Severity::default(), Severity::Info);
    }

    #[test]
    fn test_from_str_never_fails() {
        let severity: Severity = "warn".parse().unwrap();
        assert_eq!(severity, Severity::Warn);
    }
}
