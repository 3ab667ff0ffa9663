//! Interpreted commands

use serde::Serialize;

use crate::machine::{CommandKind, DerivedFlags, MachineState, Position};
use crate::parser::{CommandId, RawToken};

/// Where a command came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Origin {
    /// Parsed from a source line
    Source { line: usize },
    /// Linear segment produced from the arc on a source line
    ArcSegment { line: usize },
    /// Inserted by split or merge
    Synthetic,
}

impl Origin {
    /// Source line number, when there is one
    pub fn line(&self) -> Option<usize> {
        match self {
            Origin::Source { line } | Origin::ArcSegment { line } => Some(*line),
            Origin::Synthetic => None,
        }
    }
}

/// One interpreted line of G-code
///
/// Immutable once built. `state` is the full machine state after the command
/// ran; the token keeps the parameters as written for re-emission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Command {
    pub token: RawToken,
    pub kind: CommandKind,
    pub state: MachineState,
    pub flags: DerivedFlags,
    pub origin: Origin,
}

impl Command {
    pub fn id(&self) -> CommandId {
        self.token.id
    }

    pub fn position(&self) -> Position {
        self.state.position
    }

    pub fn extrusion(&self) -> f64 {
        self.state.extrusion
    }

    pub fn feed_rate(&self) -> f64 {
        self.state.feed_rate
    }

    pub fn performs_extrusion(&self) -> bool {
        self.flags.performs_extrusion
    }

    pub fn is_synthetic(&self) -> bool {
        self.origin == Origin::Synthetic
    }
}
