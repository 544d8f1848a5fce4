//! Log record encoders.
//!
//! Two event formats share the same fixed key set and wall-clock timestamp
//! pattern: [`JsonEncoder`] emits one JSON object per line for the file sink,
//! [`ConsoleEncoder`] emits tab-separated human-readable lines for stdout.

use std::backtrace::Backtrace;
use std::fmt::{self, Write as _};

use chrono::{DateTime, Local};
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

mod keys {
    pub(crate) const TIME: &str = "time";
    pub(crate) const LEVEL: &str = "level";
    pub(crate) const LOGGER: &str = "logger";
    pub(crate) const CALLER: &str = "caller";
    pub(crate) const MSG: &str = "msg";
    pub(crate) const STACKTRACE: &str = "stacktrace";
}

/// Timestamp pattern shared by both encoders: local wall-clock time without
/// a timezone offset.
pub(crate) fn format_timestamp(t: DateTime<Local>) -> String {
    t.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn level_str(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "trace",
        Level::DEBUG => "debug",
        Level::INFO => "info",
        Level::WARN => "warn",
        Level::ERROR => "error",
    }
}

fn caller(meta: &Metadata<'_>) -> String {
    match (meta.file(), meta.line()) {
        (Some(file), Some(line)) => format!("{file}:{line}"),
        (Some(file), None) => file.to_string(),
        _ => "unknown".to_string(),
    }
}

/// Stack traces are attached to error-level records only; the key is still
/// present (empty) on everything else so the record shape stays fixed.
fn stacktrace(level: &Level) -> String {
    if *level == Level::ERROR {
        Backtrace::force_capture().to_string()
    } else {
        String::new()
    }
}

/// Collects the message and any extra fields recorded on an event.
#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Map<String, Value>,
}

impl Visit for FieldVisitor {
    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), value.into());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), value.into());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), value.into());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), value.into());
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields
                .insert(field.name().to_string(), value.to_string().into());
        }
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.fields
            .insert(field.name().to_string(), value.to_string().into());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields
                .insert(field.name().to_string(), format!("{value:?}").into());
        }
    }
}

/// Structured JSON encoder for the file sink.
///
/// Every record carries the keys `time`, `level`, `logger`, `caller`, `msg`,
/// and `stacktrace`; additional fields recorded on the event appear as extra
/// top-level keys (fixed keys always win on collision).
#[derive(Debug, Default, Clone)]
pub struct JsonEncoder;

impl<S, N> FormatEvent<S, N> for JsonEncoder
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let mut record = Map::new();
        record.insert(
            keys::TIME.to_string(),
            format_timestamp(Local::now()).into(),
        );
        record.insert(keys::LEVEL.to_string(), level_str(meta.level()).into());
        record.insert(keys::LOGGER.to_string(), meta.target().into());
        record.insert(keys::CALLER.to_string(), caller(meta).into());
        record.insert(keys::MSG.to_string(), visitor.message.into());
        record.insert(keys::STACKTRACE.to_string(), stacktrace(meta.level()).into());
        for (key, value) in visitor.fields {
            record.entry(key).or_insert(value);
        }

        let line = serde_json::to_string(&Value::Object(record)).map_err(|_| fmt::Error)?;
        writeln!(writer, "{line}")
    }
}

/// Human-readable tab-separated encoder for development console output.
#[derive(Debug, Default, Clone)]
pub struct ConsoleEncoder;

impl<S, N> FormatEvent<S, N> for ConsoleEncoder
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        write!(
            writer,
            "{}\t{}\t{}\t{}\t{}",
            format_timestamp(Local::now()),
            level_str(meta.level()),
            meta.target(),
            caller(meta),
            visitor.message,
        )?;
        for (key, value) in &visitor.fields {
            // Strings render raw; Value's Display would add JSON quotes
            match value {
                Value::String(s) => write!(writer, "\t{key}={s}")?,
                other => write!(writer, "\t{key}={other}")?,
            }
        }

        let trace = stacktrace(meta.level());
        if !trace.is_empty() {
            write!(writer, "\n{trace}")?;
        }

        writeln!(writer)
    }
}
