//! Raw command tokens
//!
//! The transient result of reading one line: identity plus the parameters as
//! written. No defaulting happens here; inherited values are the resolver's
//! job.

use std::fmt;

use serde::Serialize;

use crate::error::LineError;
use crate::parser::lexer::{Token, TokenKind, is_command_letter};

/// Command identity: letter and integer code, like `G1` or `M104`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CommandId {
    pub letter: char,
    pub code: u32,
}

impl CommandId {
    pub const fn new(letter: char, code: u32) -> Self {
        Self { letter, code }
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.letter, self.code)
    }
}

/// A command parameter like "X10" or the bare flag "X" in "G28 X"
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Parameter {
    pub letter: char,
    pub value: Option<f64>,
}

/// Ordered parameter mapping
///
/// Keeps the order the parameters were written in so re-emitted lines look
/// like their source. A repeated letter keeps its first position and the last
/// value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Params(Vec<Parameter>);

impl Params {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Set a parameter, replacing the value of an existing letter
    pub fn insert(&mut self, letter: char, value: Option<f64>) {
        match self.0.iter_mut().find(|p| p.letter == letter) {
            Some(existing) => existing.value = value,
            None => self.0.push(Parameter { letter, value }),
        }
    }

    /// Numeric value of a parameter; `None` when absent or a bare flag
    pub fn get(&self, letter: char) -> Option<f64> {
        self.0
            .iter()
            .find(|p| p.letter == letter)
            .and_then(|p| p.value)
    }

    /// Whether the letter was written, with or without a value
    pub fn contains(&self, letter: char) -> bool {
        self.0.iter().any(|p| p.letter == letter)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One command line, as written
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawToken {
    pub id: CommandId,
    pub params: Params,
}

impl RawToken {
    pub fn new(letter: char, code: u32) -> Self {
        Self {
            id: CommandId::new(letter, code),
            params: Params::new(),
        }
    }

    /// Builder-style numeric parameter
    pub fn with(mut self, letter: char, value: f64) -> Self {
        self.params.insert(letter, Some(value));
        self
    }

    /// Builder-style bare flag parameter
    pub fn with_flag(mut self, letter: char) -> Self {
        self.params.insert(letter, None);
        self
    }

    pub fn get(&self, letter: char) -> Option<f64> {
        self.params.get(letter)
    }

    pub fn has(&self, letter: char) -> bool {
        self.params.contains(letter)
    }
}

/// Convert tokens into a raw command token
///
/// Returns `Ok(None)` for lines holding only comments or nothing at all.
pub fn tokens_to_raw_token(tokens: Vec<Token>) -> Result<Option<RawToken>, LineError> {
    let mut words = tokens.into_iter().filter(|t| t.kind != TokenKind::Comment);

    let Some(command) = words.next() else {
        return Ok(None);
    };

    let (letter, code) = split_word(&command.text);
    if !is_command_letter(letter) {
        return Err(LineError::Malformed(format!(
            "line must start with a G, M or T command, found '{}'",
            command.text
        )));
    }
    let code = match code {
        Some(digits) if digits.chars().all(|c| c.is_ascii_digit()) => {
            digits.parse::<u32>().map_err(|_| {
                LineError::Malformed(format!("command code out of range in '{}'", command.text))
            })?
        }
        Some(_) => {
            return Err(LineError::Malformed(format!(
                "command code must be an unsigned integer, found '{}'",
                command.text
            )));
        }
        None => {
            return Err(LineError::Malformed(format!(
                "missing command code after '{}'",
                letter
            )));
        }
    };

    let mut token = RawToken::new(letter, code);
    for word in words {
        let (param, value) = split_word(&word.text);
        if param == letter {
            return Err(LineError::Malformed(format!(
                "second command '{}' on one line",
                word.text
            )));
        }
        let value = match value {
            Some(number) => match number.parse::<f64>() {
                Ok(value) if value.is_finite() => Some(value),
                Ok(_) => {
                    return Err(LineError::Malformed(format!(
                        "number out of range in '{}'",
                        word.text
                    )));
                }
                Err(_) => {
                    return Err(LineError::Malformed(format!(
                        "invalid number in '{}'",
                        word.text
                    )));
                }
            },
            None => None,
        };
        token.params.insert(param, value);
    }

    Ok(Some(token))
}

/// Split "X10.5" into ('X', Some("10.5")) and "X" into ('X', None)
fn split_word(text: &str) -> (char, Option<&str>) {
    let mut chars = text.chars();
    let letter = chars.next().unwrap_or(' ');
    let rest = chars.as_str();
    (letter, (!rest.is_empty()).then_some(rest))
}
