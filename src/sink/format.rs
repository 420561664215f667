//! Rendering of result lines
//!
//! ```text
//! HDF5:{'name':'<name>','value':<value>,'desc':'<description>'}:5FDH
//! ```
//!
//! Downstream sweep tooling scans job stdout for this exact shape, so floats
//! use the fixed 16-digit scientific layout rather than Rust's `{:e}`.

use super::ResultValue;
use crate::error::{ErrorCode, ParsumError, Result};

pub const LINE_PREFIX: &str = "HDF5:";
pub const LINE_SUFFIX: &str = ":5FDH";

/// Render `value` in `%.16e` layout: one leading digit, 16 fraction digits,
/// a signed exponent of at least two digits (`5.7721566490153290e-01`).
///
/// The digits are the shortest representation that round-trips, padded with
/// zeros, so a reader parses back exactly the `f64` that was emitted.
pub fn format_scientific(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let shortest = format!("{:e}", value);
    let Some((mantissa, exponent)) = shortest.split_once('e') else {
        return shortest;
    };
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{whole}.{fraction:0<16}e{sign}{digits:0>2}")
}

/// Format one result line without a trailing newline.
///
/// Labels are not validated here; see [`render_line`].
pub fn format_line(name: &str, value: &ResultValue, description: &str) -> String {
    let value = match value {
        ResultValue::Float(v) => format_scientific(*v),
        ResultValue::Integer(v) => v.to_string(),
    };
    format!("{LINE_PREFIX}{{'name':'{name}','value':{value},'desc':'{description}'}}{LINE_SUFFIX}")
}

/// Validate both labels, then format the line.
pub fn render_line(name: &str, value: &ResultValue, description: &str) -> Result<String> {
    if name.is_empty() {
        return Err(invalid_label("name", "must not be empty"));
    }
    validate_label("name", name)?;
    validate_label("desc", description)?;
    Ok(format_line(name, value, description))
}

// Printable ASCII only; quotes and backslashes would break the dict literal.
fn validate_label(field: &str, label: &str) -> Result<()> {
    match label
        .chars()
        .find(|c| !(c.is_ascii_graphic() || *c == ' ') || *c == '\'' || *c == '\\')
    {
        Some(bad) => Err(invalid_label(
            field,
            &format!("character {bad:?} is not allowed in {label:?}"),
        )),
        None => Ok(()),
    }
}

fn invalid_label(field: &str, reason: &str) -> ParsumError {
    ParsumError::validation_with_code(
        ErrorCode::VALIDATION_INVALID_LABEL,
        reason.to_string(),
        Some(field.to_string()),
    )
}
