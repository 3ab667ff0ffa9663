//! Error types
//!
//! Per-line failures carry no position; the parse driver attaches the line
//! number and raw text when it turns them into a [`GcodeError`].

use thiserror::Error;

use crate::parser::CommandId;

/// Failure while interpreting a single line, before line context is known
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LineError {
    /// Unrecognized syntax
    #[error("{0}")]
    Malformed(String),

    /// Well-formed line whose command is not supported
    #[error("unsupported command {0}")]
    UnknownCommand(CommandId),

    /// A modal precondition is violated or a value is out of range
    #[error("{0}")]
    Unresolvable(String),

    /// Arc geometry is ambiguous or impossible
    #[error("{0}")]
    DegenerateArc(String),
}

impl LineError {
    /// Attach the 1-based line number and the raw line text
    pub fn at(self, line: usize, text: &str) -> GcodeError {
        let text = text.trim_end().to_string();
        match self {
            LineError::Malformed(reason) => GcodeError::MalformedLine { line, text, reason },
            LineError::UnknownCommand(command) => GcodeError::UnknownCommand {
                line,
                text,
                command,
            },
            LineError::Unresolvable(reason) => {
                GcodeError::UnresolvableState { line, text, reason }
            }
            LineError::DegenerateArc(reason) => GcodeError::DegenerateArc { line, text, reason },
        }
    }
}

/// Errors surfaced by the public API
#[derive(Error, Debug)]
pub enum GcodeError {
    /// Unrecognized syntax
    #[error("line {line}: malformed line `{text}`: {reason}")]
    MalformedLine {
        line: usize,
        text: String,
        reason: String,
    },

    /// Unsupported command (only raised when skipping is disabled)
    #[error("line {line}: unsupported command {command} in `{text}`")]
    UnknownCommand {
        line: usize,
        text: String,
        command: CommandId,
    },

    /// Modal precondition violated
    #[error("line {line}: cannot resolve machine state at `{text}`: {reason}")]
    UnresolvableState {
        line: usize,
        text: String,
        reason: String,
    },

    /// Ambiguous arc geometry
    #[error("line {line}: degenerate arc `{text}`: {reason}")]
    DegenerateArc {
        line: usize,
        text: String,
        reason: String,
    },

    /// Two documents cannot be joined
    #[error("cannot splice documents: {reason}")]
    SpliceInconsistency { reason: String },

    /// Split index past the end of the document
    #[error("split index {index} is out of range for a document of {len} commands")]
    SplitOutOfRange { index: usize, len: usize },

    /// Reading the line source failed
    #[error("failed to read G-code: {0}")]
    Io(#[from] std::io::Error),
}

impl GcodeError {
    /// Line number of the offending source line, when the error has one
    pub fn line(&self) -> Option<usize> {
        match self {
            GcodeError::MalformedLine { line, .. }
            | GcodeError::UnknownCommand { line, .. }
            | GcodeError::UnresolvableState { line, .. }
            | GcodeError::DegenerateArc { line, .. } => Some(*line),
            _ => None,
        }
    }
}

pub type Result<T, E = GcodeError> = std::result::Result<T, E>;
