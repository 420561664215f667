//! Test doubles for the result sink
//!
//! Used by the unit tests and by the integration tests under `tests/`.

use crate::error::{ErrorCode, ParsumError, Result};
use crate::sink::{render_line, Emission, ResultSink, ResultValue};
use std::sync::Mutex;

/// Sink that records every emission instead of writing it
#[derive(Debug, Default)]
pub struct RecordingSink {
    emissions: Mutex<Vec<Emission>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far, in call order
    pub fn emissions(&self) -> Vec<Emission> {
        self.emissions
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.emissions.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    /// The rendered line for each emission
    pub fn lines(&self) -> Vec<String> {
        self.emissions()
            .iter()
            .filter_map(|e| render_line(&e.name, &e.value, &e.description).ok())
            .collect()
    }
}

impl ResultSink for RecordingSink {
    fn emit(&self, name: &str, value: ResultValue, description: &str) -> Result<()> {
        // Reject exactly what a real sink would.
        render_line(name, &value, description)?;
        self.emissions
            .lock()
            .map_err(|_| {
                ParsumError::sink_with_code(ErrorCode::SINK_GENERIC, "recording sink poisoned")
            })?
            .push(Emission {
                name: name.to_string(),
                value,
                description: description.to_string(),
            });
        Ok(())
    }
}

/// Sink whose writes always fail, for exercising the error path
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingSink;

impl ResultSink for FailingSink {
    fn emit(&self, name: &str, _value: ResultValue, _description: &str) -> Result<()> {
        Err(ParsumError::sink_with_code(
            ErrorCode::SINK_WRITE_FAILED,
            format!("refusing to write result '{name}'"),
        ))
    }
}
