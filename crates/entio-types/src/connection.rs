//! Parsing of Source-style connection strings into [`OutputDefinition`]s.
//!
//! Compiled levels store each output as a key/value pair whose key is the
//! output name and whose value is `target,input,parameter,delay,times`.
//! Newer compilers separate fields with the ESC character (`0x1B`) so that
//! parameters may contain commas; both forms are accepted.
//!
//! The runtime `AddOutput` input uses a single string of the form
//! `"<output> <target>:<input>:<parameter>:<delay>:<times>"`.

use crate::output::{OutputDefinition, UNLIMITED_FIRES};

/// Field separator used by newer level compilers.
pub const ESC_SEPARATOR: char = '\u{1b}';

/// Errors produced while parsing a connection string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// The output name was empty.
    #[error("connection has no output name")]
    MissingOutputName,

    /// Fewer than the two mandatory fields (target, input) were present.
    #[error("connection {value:?} needs at least a target and an input")]
    MissingFields {
        /// The offending connection value.
        value: String,
    },

    /// More than five fields were present.
    #[error("connection {value:?} has {count} fields, expected at most 5")]
    TooManyFields {
        /// The offending connection value.
        value: String,
        /// Number of fields found.
        count: usize,
    },

    /// The delay field was not a non-negative number.
    #[error("invalid delay {value:?}")]
    InvalidDelay {
        /// The offending delay text.
        value: String,
    },

    /// The times field was not an integer.
    #[error("invalid fire limit {value:?}")]
    InvalidTimes {
        /// The offending limit text.
        value: String,
    },
}

/// Parse a level connection value for output `output_name`.
///
/// Trailing fields may be omitted: parameter defaults to none, delay to
/// zero, times to unlimited.
pub fn parse_connection(output_name: &str, value: &str) -> Result<OutputDefinition, ConnectionError> {
    let separator = if value.contains(ESC_SEPARATOR) { ESC_SEPARATOR } else { ',' };
    build(output_name, value, separator)
}

/// Parse an `AddOutput` argument: `"<output> <target>:<input>:<param>:<delay>:<times>"`.
pub fn parse_add_output(spec: &str) -> Result<OutputDefinition, ConnectionError> {
    let spec = spec.trim();
    let (output_name, value) = spec.split_once(char::is_whitespace).unwrap_or((spec, ""));
    build(output_name, value.trim(), ':')
}

fn build(output_name: &str, value: &str, separator: char) -> Result<OutputDefinition, ConnectionError> {
    let output_name = output_name.trim();
    if output_name.is_empty() {
        return Err(ConnectionError::MissingOutputName);
    }

    let fields: Vec<&str> = value.split(separator).map(str::trim).collect();
    if fields.len() > 5 {
        return Err(ConnectionError::TooManyFields {
            value: value.to_owned(),
            count: fields.len(),
        });
    }

    let mut fields = fields.into_iter();
    let target = fields.next().unwrap_or("");
    let input = fields.next().unwrap_or("");
    if target.is_empty() || input.is_empty() {
        return Err(ConnectionError::MissingFields {
            value: value.to_owned(),
        });
    }

    let parameter = fields.next().unwrap_or("");
    let delay = parse_delay(fields.next().unwrap_or(""))?;
    let times = parse_times(fields.next().unwrap_or(""))?;

    let mut output = OutputDefinition::new(output_name, target, input)
        .with_delay(delay)
        .with_fire_limit(times);
    if !parameter.is_empty() {
        output = output.with_parameters([parameter]);
    }
    Ok(output)
}

fn parse_delay(text: &str) -> Result<f32, ConnectionError> {
    if text.is_empty() {
        return Ok(0.0);
    }
    match text.parse::<f32>() {
        Ok(delay) if delay.is_finite() && delay >= 0.0 => Ok(delay),
        _ => Err(ConnectionError::InvalidDelay {
            value: text.to_owned(),
        }),
    }
}

fn parse_times(text: &str) -> Result<i32, ConnectionError> {
    if text.is_empty() {
        return Ok(UNLIMITED_FIRES);
    }
    text.parse::<i32>().map_err(|_err| ConnectionError::InvalidTimes {
        value: text.to_owned(),
    })
}
