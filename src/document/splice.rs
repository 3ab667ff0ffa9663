//! Splitting and merging documents
//!
//! Both operations re-run the resolver at the seam so each resulting document
//! replays on its own.

use log::debug;
use serde::Deserialize;

use super::{Document, Origin, SkippedLine};
use crate::error::{GcodeError, LineError, Result};
use crate::machine::{Axis, CommandKind, MachineState, Positioning, Units};
use crate::parser::RawToken;

/// What to do when merged documents use different units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitPolicy {
    /// Fail with a splice inconsistency
    #[default]
    Reject,
    /// Insert a G20/G21 at the seam
    InsertSwitch,
}

/// Merge settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub units: UnitPolicy,
}

/// Incoming state a document relies on before establishing it itself
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryRequirements {
    pub positioning: bool,
    pub extrusion_mode: bool,
    pub units: bool,
    /// Absolute E values are used before any `G92 E`
    pub extrusion_origin: bool,
}

impl Document {
    /// Split into `[0, index)` and `[index, len)`
    ///
    /// The second document starts with synthetic commands that restore the
    /// state captured at the split point, so it replays on its own.
    pub fn split_at(&self, index: usize) -> Result<(Document, Document)> {
        if index > self.commands.len() {
            return Err(GcodeError::SplitOutOfRange {
                index,
                len: self.commands.len(),
            });
        }

        let captured = match index {
            0 => self.initial,
            _ => self.commands[index - 1].state,
        };

        // Skipped lines follow the source line where the tail starts
        let boundary = self.commands[index..]
            .iter()
            .find_map(|command| command.origin.line());
        let (head_skipped, tail_skipped): (Vec<SkippedLine>, Vec<SkippedLine>) = self
            .skipped
            .iter()
            .cloned()
            .partition(|skipped| boundary.is_none_or(|line| skipped.line < line));

        let head = Document {
            initial: self.initial,
            commands: self.commands[..index].to_vec(),
            skipped: head_skipped,
            resolver: self.resolver,
        };

        let mut tail = Document::with_resolver(self.initial, self.resolver);
        for token in restore_tokens(&captured, &self.initial) {
            tail.push(token, Origin::Synthetic).map_err(seam_error)?;
        }
        if *tail.terminal_state() != captured {
            return Err(GcodeError::SpliceInconsistency {
                reason: format!("split prefix does not reproduce the state at command {index}"),
            });
        }
        debug!(
            "split at {}: {} synthetic commands restore the tail",
            index,
            tail.commands.len()
        );
        tail.extend_resolved(&self.commands[index..])
            .map_err(seam_error)?;
        tail.skipped = tail_skipped;

        Ok((head, tail))
    }

    /// Append `other` with default merge settings
    pub fn merge(&self, other: &Document) -> Result<Document> {
        self.merge_with(other, &MergeConfig::default())
    }

    /// Append `other`, inserting mode commands where the seam needs them
    pub fn merge_with(&self, other: &Document, config: &MergeConfig) -> Result<Document> {
        let needs = other.entry_requirements();
        let expected = other.initial;
        let mut merged = self.clone();

        if needs.positioning && merged.terminal_state().positioning != expected.positioning {
            if let Some(mode) = expected.positioning {
                merged.push_seam(positioning_token(mode))?;
            }
        }

        if needs.extrusion_mode
            && merged.terminal_state().extrusion_positioning != expected.extrusion_positioning
        {
            if let Some(mode) = expected.extrusion_positioning {
                merged.push_seam(extrusion_mode_token(mode))?;
            }
        }

        if needs.units && merged.terminal_state().units != expected.units {
            match config.units {
                UnitPolicy::Reject => {
                    return Err(GcodeError::SpliceInconsistency {
                        reason: format!(
                            "first document ends in {:?} but the second expects {:?}",
                            merged.terminal_state().units,
                            expected.units
                        ),
                    });
                }
                UnitPolicy::InsertSwitch => merged.push_seam(units_token(expected.units))?,
            }
        }

        if needs.extrusion_origin && merged.terminal_state().extrusion != expected.extrusion {
            merged.push_seam(RawToken::new('G', 92).with('E', expected.extrusion))?;
        }

        merged
            .extend_resolved(&other.commands)
            .map_err(seam_error)?;
        merged.skipped.extend(other.skipped.iter().cloned());
        Ok(merged)
    }

    /// Scan for modes used before the document sets them itself
    pub fn entry_requirements(&self) -> EntryRequirements {
        let mut needs = EntryRequirements::default();
        let mut sets_positioning = false;
        let mut sets_extrusion_mode = false;
        let mut sets_units = false;
        let mut sets_extrusion_origin = false;

        for (i, command) in self.commands.iter().enumerate() {
            let prior = match i {
                0 => &self.initial,
                _ => &self.commands[i - 1].state,
            };
            let token = &command.token;
            let moves_axes = Axis::ALL
                .into_iter()
                .any(|axis| token.get(axis.letter()).is_some());
            let uses_e = token.get('E').is_some();

            match command.kind {
                CommandKind::AbsolutePositioning | CommandKind::RelativePositioning => {
                    sets_positioning = true;
                    sets_extrusion_mode = true;
                }
                CommandKind::AbsoluteExtrusion | CommandKind::RelativeExtrusion => {
                    sets_extrusion_mode = true;
                }
                CommandKind::UnitsInches | CommandKind::UnitsMillimeters => sets_units = true,
                CommandKind::SetPosition => {
                    if !sets_units && (moves_axes || uses_e) {
                        needs.units = true;
                    }
                    if uses_e || token.params.is_empty() {
                        sets_extrusion_origin = true;
                    }
                }
                kind if kind.is_motion() => {
                    if !sets_units && (moves_axes || uses_e) {
                        needs.units = true;
                    }
                    if moves_axes && !sets_positioning {
                        needs.positioning = true;
                    }
                    if uses_e {
                        if !sets_extrusion_mode {
                            needs.extrusion_mode = true;
                        }
                        if !sets_extrusion_origin
                            && prior.extrusion_positioning == Some(Positioning::Absolute)
                        {
                            needs.extrusion_origin = true;
                        }
                    }
                }
                _ => {}
            }
        }

        needs
    }

    /// Append a synthetic command at a merge seam
    fn push_seam(&mut self, token: RawToken) -> Result<()> {
        debug!("merge seam: inserting {}", token.id);
        self.push(token, Origin::Synthetic).map_err(seam_error)
    }
}

/// Merge two documents with default settings
pub fn merge(a: &Document, b: &Document) -> Result<Document> {
    a.merge(b)
}

fn seam_error(err: LineError) -> GcodeError {
    GcodeError::SpliceInconsistency {
        reason: err.to_string(),
    }
}

fn units_token(units: Units) -> RawToken {
    match units {
        Units::Millimeters => RawToken::new('G', 21),
        Units::Inches => RawToken::new('G', 20),
    }
}

fn positioning_token(mode: Positioning) -> RawToken {
    match mode {
        Positioning::Absolute => RawToken::new('G', 90),
        Positioning::Relative => RawToken::new('G', 91),
    }
}

fn extrusion_mode_token(mode: Positioning) -> RawToken {
    match mode {
        Positioning::Absolute => RawToken::new('M', 82),
        Positioning::Relative => RawToken::new('M', 83),
    }
}

/// Commands that take `initial` to `captured`
fn restore_tokens(captured: &MachineState, initial: &MachineState) -> Vec<RawToken> {
    let mut tokens = vec![units_token(captured.units)];
    let mut state = *initial;
    state.units = captured.units;

    let position = captured.position;
    if captured.positioning.is_some() {
        tokens.push(positioning_token(Positioning::Absolute));
        tokens.push(
            RawToken::new('G', 0)
                .with('X', position.x)
                .with('Y', position.y)
                .with('Z', position.z),
        );
        state.positioning = Some(Positioning::Absolute);
        state.extrusion_positioning = Some(Positioning::Absolute);
    } else if position != initial.position {
        tokens.push(
            RawToken::new('G', 92)
                .with('X', position.x)
                .with('Y', position.y)
                .with('Z', position.z),
        );
    }

    if captured.extrusion != state.extrusion {
        tokens.push(RawToken::new('G', 92).with('E', captured.extrusion));
    }
    if captured.feed_rate != state.feed_rate {
        tokens.push(RawToken::new('G', 1).with('F', captured.feed_rate));
    }
    if captured.tool != state.tool {
        tokens.push(RawToken::new('T', captured.tool));
    }
    if captured.extruder_temperature != state.extruder_temperature {
        if let Some(temperature) = captured.extruder_temperature {
            tokens.push(RawToken::new('M', 104).with('S', temperature));
        }
    }
    if captured.bed_temperature != state.bed_temperature {
        if let Some(temperature) = captured.bed_temperature {
            tokens.push(RawToken::new('M', 140).with('S', temperature));
        }
    }
    if captured.fan_speed != state.fan_speed {
        match captured.fan_speed {
            Some(speed) if speed == 0.0 => tokens.push(RawToken::new('M', 107)),
            Some(speed) => tokens.push(RawToken::new('M', 106).with('S', speed)),
            None => {}
        }
    }
    if captured.extruder_pwm != state.extruder_pwm {
        if let Some(pwm) = captured.extruder_pwm {
            tokens.push(RawToken::new('M', 113).with('S', pwm));
        }
    }
    if captured.extruder_on != state.extruder_on {
        tokens.push(match captured.extruder_on {
            true => RawToken::new('M', 101),
            false => RawToken::new('M', 103),
        });
    }

    if captured.positioning == Some(Positioning::Relative) {
        tokens.push(positioning_token(Positioning::Relative));
        state.extrusion_positioning = Some(Positioning::Relative);
    }
    if captured.extrusion_positioning != state.extrusion_positioning {
        if let Some(mode) = captured.extrusion_positioning {
            tokens.push(extrusion_mode_token(mode));
        }
    }

    tokens
}
