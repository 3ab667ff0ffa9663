//! Document
//!
//! An ordered run of interpreted commands with the state they started from.
//! Commands are shared through `Arc`, so splitting and merging reuse them
//! instead of copying.

mod command;
mod splice;

use std::ops::Range;
use std::sync::Arc;

use serde::Serialize;

pub use command::{Command, Origin};
pub use splice::{EntryRequirements, MergeConfig, UnitPolicy, merge};

use crate::error::LineError;
use crate::machine::{CommandKind, MachineState, Resolver};
use crate::parser::RawToken;
use crate::serializer::{SerializeConfig, serialize};

/// Unknown command line dropped during parsing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLine {
    pub line: usize,
    pub text: String,
}

/// Consecutive commands at one Z height that lay down filament
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    pub z: f64,
    /// Command indices covered by the layer
    pub range: Range<usize>,
}

/// Parsed G-code document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    initial: MachineState,
    commands: Vec<Arc<Command>>,
    skipped: Vec<SkippedLine>,
    resolver: Resolver,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(MachineState::default())
    }
}

impl Document {
    /// Empty document starting from `initial`
    pub fn new(initial: MachineState) -> Self {
        Self::with_resolver(initial, Resolver::default())
    }

    pub fn with_resolver(initial: MachineState, resolver: Resolver) -> Self {
        Self {
            initial,
            commands: Vec::new(),
            skipped: Vec::new(),
            resolver,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter().map(|command| &**command)
    }

    pub fn commands(&self) -> &[Arc<Command>] {
        &self.commands
    }

    pub fn get(&self, index: usize) -> Option<&Command> {
        self.commands.get(index).map(|command| &**command)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn initial_state(&self) -> &MachineState {
        &self.initial
    }

    /// State after the last command, or the initial state when empty
    pub fn terminal_state(&self) -> &MachineState {
        self.commands
            .last()
            .map(|command| &command.state)
            .unwrap_or(&self.initial)
    }

    pub fn resolver(&self) -> Resolver {
        self.resolver
    }

    /// Unknown commands skipped while parsing, in source order
    pub fn skipped(&self) -> &[SkippedLine] {
        &self.skipped
    }

    /// Number of leading commands inserted by a split
    pub fn synthetic_prefix_len(&self) -> usize {
        self.commands
            .iter()
            .take_while(|command| command.is_synthetic())
            .count()
    }

    /// Group commands into printed layers
    ///
    /// A layer is a maximal run of commands at the same Z that contains at
    /// least one extruding move. Travel-only runs are left out.
    pub fn layers(&self) -> Vec<Layer> {
        let mut layers = Vec::new();
        let mut start = 0;

        while start < self.commands.len() {
            let z = self.commands[start].state.position.z;
            let end = self.commands[start..]
                .iter()
                .position(|command| command.state.position.z != z)
                .map_or(self.commands.len(), |offset| start + offset);

            if self.commands[start..end]
                .iter()
                .any(|command| command.performs_extrusion())
            {
                layers.push(Layer {
                    z,
                    range: start..end,
                });
            }
            start = end;
        }

        layers
    }

    /// Re-emit the document as G-code text
    pub fn serialize(&self) -> String {
        self.serialize_with(&SerializeConfig::default())
    }

    pub fn serialize_with(&self, config: &SerializeConfig) -> String {
        let mut text = String::new();
        for command in &self.commands {
            text.push_str(&serialize(command, config));
            text.push('\n');
        }
        text
    }

    /// Resolve a token against the terminal state and append it
    pub fn push(&mut self, token: RawToken, origin: Origin) -> Result<(), LineError> {
        let kind = CommandKind::from_id(token.id).ok_or(LineError::UnknownCommand(token.id))?;
        let (state, flags) = self
            .resolver
            .resolve_kind(kind, &token, self.terminal_state())?;
        self.commands.push(Arc::new(Command {
            token,
            kind,
            state,
            flags,
            origin,
        }));
        Ok(())
    }

    /// Append commands taken from another document, re-resolving each one
    ///
    /// A command whose state and flags come out unchanged is shared as is.
    pub fn extend_resolved<'a>(
        &mut self,
        commands: impl IntoIterator<Item = &'a Arc<Command>>,
    ) -> Result<(), LineError> {
        for command in commands {
            let (state, flags) =
                self.resolver
                    .resolve_kind(command.kind, &command.token, self.terminal_state())?;
            if state == command.state && flags == command.flags {
                self.commands.push(Arc::clone(command));
            } else {
                self.commands.push(Arc::new(Command {
                    token: command.token.clone(),
                    kind: command.kind,
                    state,
                    flags,
                    origin: command.origin,
                }));
            }
        }
        Ok(())
    }

    pub(crate) fn record_skipped(&mut self, line: usize, text: &str) {
        self.skipped.push(SkippedLine {
            line,
            text: text.trim_end().to_string(),
        });
    }
}
