//! Reading result lines back out of captured output
//!
//! Sweep tooling runs many jobs and collects their results from stdout. Only
//! lines that are a complete, well-formed result line count; everything else
//! is ordinary program output and is skipped.

use super::ResultValue;
use once_cell::sync::Lazy;
use regex::Regex;

static RESULT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^HDF5:\{'name':'([^']*)','value':([^,]+),'desc':'([^']*)'\}:5FDH$")
        .expect("Invalid regex pattern")
});

/// One result recovered from output
#[derive(Debug, Clone, PartialEq)]
pub struct Emission {
    pub name: String,
    pub value: ResultValue,
    pub description: String,
}

/// Parse a single line. Returns `None` for anything that is not a result line.
pub fn parse_line(line: &str) -> Option<Emission> {
    let captures = RESULT_LINE.captures(line.trim_end_matches(['\r', '\n']))?;
    let value = parse_value(&captures[2])?;

    Some(Emission {
        name: captures[1].to_string(),
        value,
        description: captures[3].to_string(),
    })
}

/// Every result line in `output`, in order.
pub fn scan_output(output: &str) -> Vec<Emission> {
    output.lines().filter_map(parse_line).collect()
}

fn parse_value(raw: &str) -> Option<ResultValue> {
    if let Ok(integer) = raw.parse::<i64>() {
        return Some(ResultValue::Integer(integer));
    }
    raw.parse::<f64>().ok().map(ResultValue::Float)
}
