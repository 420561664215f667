//! Result sink: named scalar results as tagged stdout lines
//!
//! The coordinator emits exactly one line per result. Other workers never
//! touch the sink.

pub mod format;
pub mod parse;

pub use format::{format_line, format_scientific, render_line, LINE_PREFIX, LINE_SUFFIX};
pub use parse::{parse_line, scan_output, Emission};

use crate::error::{ErrorCode, ParsumError, Result};
use std::io::Write;
use std::sync::Mutex;

/// A scalar result value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResultValue {
    Float(f64),
    Integer(i64),
}

impl From<f64> for ResultValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i64> for ResultValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

/// Name and description a result is published under.
///
/// Checked once up front so a bad label fails the run before any work is
/// done instead of after the reduction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultLabel {
    name: String,
    description: String,
}

impl ResultLabel {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let description = description.into();
        render_line(&name, &ResultValue::Integer(0), &description)?;
        Ok(Self { name, description })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Destination for result lines
pub trait ResultSink: Send + Sync {
    /// Write one complete line for `value`.
    fn emit(&self, name: &str, value: ResultValue, description: &str) -> Result<()>;

    fn emit_labeled(&self, label: &ResultLabel, value: ResultValue) -> Result<()> {
        self.emit(label.name(), value, label.description())
    }
}

/// Writes result lines to the process's standard output
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl StdoutSink {
    pub fn new() -> Self {
        Self
    }
}

impl ResultSink for StdoutSink {
    fn emit(&self, name: &str, value: ResultValue, description: &str) -> Result<()> {
        let line = render_line(name, &value, description)?;
        // Hold the lock so the line is never interleaved with other output.
        let mut out = std::io::stdout().lock();
        writeln!(out, "{line}")
            .and_then(|()| out.flush())
            .map_err(|e| write_failed(name, e))
    }
}

/// Writes result lines to any `Write` implementation
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> ResultSink for WriterSink<W> {
    fn emit(&self, name: &str, value: ResultValue, description: &str) -> Result<()> {
        let line = render_line(name, &value, description)?;
        let mut writer = self.writer.lock().map_err(|_| {
            ParsumError::sink_with_code(ErrorCode::SINK_GENERIC, "result writer lock poisoned")
        })?;
        writeln!(writer, "{line}")
            .and_then(|()| writer.flush())
            .map_err(|e| write_failed(name, e))
    }
}

fn write_failed(name: &str, err: std::io::Error) -> ParsumError {
    ParsumError::sink_with_code(
        ErrorCode::SINK_WRITE_FAILED,
        format!("failed to write result '{name}'"),
    )
    .with_source(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_sink_emits_one_line() {
        let sink = WriterSink::new(Vec::new());
        sink.emit("z", ResultValue::Float(1.5), "zeta").unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            text,
            "HDF5:{'name':'z','value':1.5000000000000000e+00,'desc':'zeta'}:5FDH\n"
        );
    }

    #[test]
    fn test_labeled_emission() {
        let sink = WriterSink::new(Vec::new());
        let label = ResultLabel::new("count", "points").unwrap();
        sink.emit_labeled(&label, 17i64.into()).unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "HDF5:{'name':'count','value':17,'desc':'points'}:5FDH\n");
    }

    #[test]
    fn test_invalid_label_writes_nothing() {
        let sink = WriterSink::new(Vec::new());
        let err = sink.emit("bad'name", ResultValue::Float(1.0), "").unwrap_err();

        assert_eq!(err.code(), ErrorCode::VALIDATION_INVALID_LABEL);
        assert!(sink.into_inner().is_empty());
    }

    #[test]
    fn test_label_rejected_up_front() {
        assert!(ResultLabel::new("", "zeta").is_err());
        assert!(ResultLabel::new("z", "back\\slash").is_err());
        assert!(ResultLabel::new("z", "").is_ok());
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_is_sink_error() {
        let sink = WriterSink::new(ClosedPipe);
        let err = sink.emit("z", ResultValue::Float(1.0), "zeta").unwrap_err();

        assert_eq!(err.code(), ErrorCode::SINK_WRITE_FAILED);
        assert_eq!(err.exit_code(), 4);
    }
}
