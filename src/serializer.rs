//! Serializer
//!
//! Writes tokens back as G-code text: command word first, then the parameters
//! in the order they are stored. Comments are not preserved.

use serde::Deserialize;

use crate::document::Command;
use crate::parser::RawToken;

/// Number formatting for emitted lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SerializeConfig {
    /// Decimal places values are rounded to
    pub precision: usize,
    /// Drop trailing zeros and a trailing decimal point
    pub trim_zeros: bool,
}

impl Default for SerializeConfig {
    fn default() -> Self {
        Self {
            precision: 5,
            trim_zeros: true,
        }
    }
}

/// Emit one command as a line of G-code, without a newline
pub fn serialize(command: &Command, config: &SerializeConfig) -> String {
    serialize_token(&command.token, config)
}

/// Emit a raw token as a line of G-code, without a newline
pub fn serialize_token(token: &RawToken, config: &SerializeConfig) -> String {
    let mut line = token.id.to_string();
    for param in token.params.iter() {
        line.push(' ');
        line.push(param.letter);
        if let Some(value) = param.value {
            line.push_str(&format_value(value, config));
        }
    }
    line
}

/// Format a number at the configured precision
pub fn format_value(value: f64, config: &SerializeConfig) -> String {
    let mut text = format!("{:.*}", config.precision, value);
    if config.trim_zeros && text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    // Rounding can leave "-0" or "-0.000"
    if text.starts_with('-') && text[1..].chars().all(|c| c == '0' || c == '.') {
        text.remove(0);
    }
    text
}
