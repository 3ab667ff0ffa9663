//! State Resolver
//!
//! Computes the machine state after a command from the state before it.
//! The prior state is passed in and a new one is returned; nothing is kept
//! between calls.

use serde::Serialize;

use crate::error::LineError;
use crate::machine::kind::CommandKind;
use crate::machine::state::{Axis, MachineState, Positioning, Units};
use crate::parser::RawToken;

/// Flags derived from the transition between two states
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DerivedFlags {
    /// New E minus prior E for motion commands, zero otherwise
    pub extrusion_delta: f64,
    /// True when the move lays down filament
    pub performs_extrusion: bool,
}

/// Default fan speed for a bare M106
const FULL_FAN: f64 = 255.0;

/// Resolver settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resolver {
    /// Treat XY moves made while M101 is active as extrusion
    pub legacy_extruder_switch: bool,
}

impl Resolver {
    pub fn new(legacy_extruder_switch: bool) -> Self {
        Self {
            legacy_extruder_switch,
        }
    }

    /// Resolve a token against the prior state
    pub fn resolve(
        &self,
        token: &RawToken,
        prior: &MachineState,
    ) -> Result<(MachineState, DerivedFlags), LineError> {
        let kind = CommandKind::from_id(token.id).ok_or(LineError::UnknownCommand(token.id))?;
        self.resolve_kind(kind, token, prior)
    }

    pub(crate) fn resolve_kind(
        &self,
        kind: CommandKind,
        token: &RawToken,
        prior: &MachineState,
    ) -> Result<(MachineState, DerivedFlags), LineError> {
        let mut next = *prior;

        match kind {
            CommandKind::RapidMove | CommandKind::LinearMove | CommandKind::Arc(_) => {
                apply_motion(token, prior, &mut next)?;
            }
            CommandKind::AbsolutePositioning => {
                next.positioning = Some(Positioning::Absolute);
                next.extrusion_positioning = Some(Positioning::Absolute);
            }
            CommandKind::RelativePositioning => {
                next.positioning = Some(Positioning::Relative);
                next.extrusion_positioning = Some(Positioning::Relative);
            }
            CommandKind::AbsoluteExtrusion => {
                next.extrusion_positioning = Some(Positioning::Absolute);
            }
            CommandKind::RelativeExtrusion => {
                next.extrusion_positioning = Some(Positioning::Relative);
            }
            CommandKind::UnitsInches => next.units = Units::Inches,
            CommandKind::UnitsMillimeters => next.units = Units::Millimeters,
            CommandKind::Home => {
                // Only the named axes home; values are ignored
                let named: Vec<Axis> = Axis::ALL
                    .into_iter()
                    .filter(|axis| token.has(axis.letter()))
                    .collect();
                let axes = if named.is_empty() {
                    Axis::ALL.to_vec()
                } else {
                    named
                };
                for axis in axes {
                    next.position.set(axis, 0.0);
                }
            }
            CommandKind::SetPosition => {
                if token.params.is_empty() {
                    next.position = Default::default();
                    next.extrusion = 0.0;
                } else {
                    for axis in Axis::ALL {
                        if let Some(value) = token.get(axis.letter()) {
                            next.position.set(axis, value);
                        }
                    }
                    if let Some(value) = token.get('E') {
                        next.extrusion = value;
                    }
                }
            }
            CommandKind::ExtruderOn => next.extruder_on = true,
            CommandKind::ExtruderOff => next.extruder_on = false,
            CommandKind::SetExtruderTemperature { .. } => {
                if let Some(temperature) = token.get('S') {
                    next.extruder_temperature = Some(temperature);
                }
            }
            CommandKind::SetBedTemperature { .. } => {
                if let Some(temperature) = token.get('S') {
                    next.bed_temperature = Some(temperature);
                }
            }
            CommandKind::FanOn => next.fan_speed = Some(token.get('S').unwrap_or(FULL_FAN)),
            CommandKind::FanOff => next.fan_speed = Some(0.0),
            CommandKind::ExtruderPwm => {
                if let Some(pwm) = token.get('S') {
                    next.extruder_pwm = Some(pwm);
                }
            }
            CommandKind::SelectTool(tool) => next.tool = tool,
            CommandKind::Dwell
            | CommandKind::Pause
            | CommandKind::DisableMotors
            | CommandKind::ReportTemperature
            | CommandKind::ExtruderSpeed => {}
        }

        if !next.is_finite() {
            return Err(LineError::Unresolvable(
                "resolved value is not a finite number".to_string(),
            ));
        }

        let flags = self.derive_flags(kind, prior, &next);
        Ok((next, flags))
    }

    fn derive_flags(
        &self,
        kind: CommandKind,
        prior: &MachineState,
        next: &MachineState,
    ) -> DerivedFlags {
        if !kind.is_motion() {
            return DerivedFlags::default();
        }

        let extrusion_delta = next.extrusion - prior.extrusion;
        let mut performs_extrusion = extrusion_delta > 0.0;

        if self.legacy_extruder_switch && prior.extruder_on {
            let moved_xy =
                next.position.x != prior.position.x || next.position.y != prior.position.y;
            performs_extrusion |= moved_xy && extrusion_delta >= 0.0;
        }

        DerivedFlags {
            extrusion_delta,
            performs_extrusion,
        }
    }
}

/// Resolve with default settings
pub fn resolve(
    token: &RawToken,
    prior: &MachineState,
) -> Result<(MachineState, DerivedFlags), LineError> {
    Resolver::default().resolve(token, prior)
}

/// Apply axis, extrusion and feed-rate words of a motion command
fn apply_motion(
    token: &RawToken,
    prior: &MachineState,
    next: &mut MachineState,
) -> Result<(), LineError> {
    let moves_axes = Axis::ALL
        .into_iter()
        .any(|axis| token.get(axis.letter()).is_some());
    if moves_axes {
        let mode = prior.positioning.ok_or_else(|| {
            LineError::Unresolvable("motion before any positioning mode (G90/G91)".to_string())
        })?;
        for axis in Axis::ALL {
            if let Some(value) = token.get(axis.letter()) {
                next.position.set(axis, mode.apply(prior.position.get(axis), value));
            }
        }
    }

    if let Some(value) = token.get('E') {
        let mode = prior.extrusion_positioning.ok_or_else(|| {
            LineError::Unresolvable(
                "extrusion before any extruder mode (G90/G91/M82/M83)".to_string(),
            )
        })?;
        next.extrusion = mode.apply(prior.extrusion, value);
    }

    if let Some(feed_rate) = token.get('F') {
        next.feed_rate = feed_rate;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::state::Position;

    fn g1() -> RawToken {
        RawToken::new('G', 1)
    }

    #[test]
    fn absolute_move_replaces_named_axes() {
        let prior = MachineState {
            position: Position::new(1.0, 2.0, 3.0),
            ..MachineState::default()
        };
        let (next, flags) = resolve(&g1().with('X', 10.0), &prior).unwrap();
        assert_eq!(next.position, Position::new(10.0, 2.0, 3.0));
        assert_eq!(flags, DerivedFlags::default());
    }

    #[test]
    fn relative_move_adds_to_prior() {
        let prior = MachineState {
            position: Position::new(1.0, 2.0, 3.0),
            positioning: Some(Positioning::Relative),
            ..MachineState::default()
        };
        let (next, _) = resolve(&g1().with('X', 5.0).with('Z', -1.0), &prior).unwrap();
        assert_eq!(next.position, Position::new(6.0, 2.0, 2.0));
    }

    #[test]
    fn extrusion_mode_is_independent_of_axes() {
        let prior = MachineState {
            extrusion: 10.0,
            extrusion_positioning: Some(Positioning::Relative),
            ..MachineState::default()
        };
        let (next, flags) =
            resolve(&g1().with('X', 4.0).with('E', 0.5), &prior).unwrap();
        assert_eq!(next.position.x, 4.0);
        assert_eq!(next.extrusion, 10.5);
        assert_eq!(flags.extrusion_delta, 0.5);
        assert!(flags.performs_extrusion);
    }

    #[test]
    fn retraction_is_recorded_but_not_extrusion() {
        let prior = MachineState {
            extrusion: 10.0,
            ..MachineState::default()
        };
        let (next, flags) = resolve(&g1().with('E', 8.0), &prior).unwrap();
        assert_eq!(next.extrusion, 8.0);
        assert_eq!(flags.extrusion_delta, -2.0);
        assert!(!flags.performs_extrusion);
    }

    #[test]
    fn feed_rate_persists_until_replaced() {
        let prior = MachineState::default();
        let (state, _) = resolve(&g1().with('X', 1.0).with('F', 1500.0), &prior).unwrap();
        let (state, _) = resolve(&g1().with('X', 2.0), &state).unwrap();
        assert_eq!(state.feed_rate, 1500.0);
    }

    #[test]
    fn g90_g91_set_both_modes_m83_only_extruder() {
        let (state, _) = resolve(&RawToken::new('G', 91), &MachineState::default()).unwrap();
        assert_eq!(state.positioning, Some(Positioning::Relative));
        assert_eq!(state.extrusion_positioning, Some(Positioning::Relative));

        let (state, _) = resolve(&RawToken::new('G', 90), &state).unwrap();
        let (state, _) = resolve(&RawToken::new('M', 83), &state).unwrap();
        assert_eq!(state.positioning, Some(Positioning::Absolute));
        assert_eq!(state.extrusion_positioning, Some(Positioning::Relative));
    }

    #[test]
    fn units_switch_without_conversion() {
        let prior = MachineState {
            position: Position::new(25.4, 0.0, 0.0),
            ..MachineState::default()
        };
        let (state, _) = resolve(&RawToken::new('G', 20), &prior).unwrap();
        assert_eq!(state.units, Units::Inches);
        assert_eq!(state.position.x, 25.4);
    }

    #[test]
    fn home_named_axes_only() {
        let prior = MachineState {
            position: Position::new(5.0, 6.0, 7.0),
            extrusion: 3.0,
            ..MachineState::default()
        };
        let (state, _) = resolve(&RawToken::new('G', 28).with('X', 72.3), &prior).unwrap();
        assert_eq!(state.position, Position::new(0.0, 6.0, 7.0));

        let (state, _) = resolve(&RawToken::new('G', 28), &prior).unwrap();
        assert_eq!(state.position, Position::new(0.0, 0.0, 0.0));
        assert_eq!(state.extrusion, 3.0);
    }

    #[test]
    fn set_position_has_no_extrusion_delta() {
        let prior = MachineState {
            extrusion: 42.0,
            ..MachineState::default()
        };
        let (state, flags) = resolve(&RawToken::new('G', 92).with('E', 0.0), &prior).unwrap();
        assert_eq!(state.extrusion, 0.0);
        assert_eq!(flags.extrusion_delta, 0.0);
        assert!(!flags.performs_extrusion);
    }

    #[test]
    fn auxiliary_state() {
        let state = MachineState::default();
        let (state, _) = resolve(&RawToken::new('M', 104).with('S', 210.0), &state).unwrap();
        let (state, _) = resolve(&RawToken::new('M', 190).with('S', 60.0), &state).unwrap();
        let (state, _) = resolve(&RawToken::new('M', 106), &state).unwrap();
        let (state, _) = resolve(&RawToken::new('T', 1), &state).unwrap();
        assert_eq!(state.extruder_temperature, Some(210.0));
        assert_eq!(state.bed_temperature, Some(60.0));
        assert_eq!(state.fan_speed, Some(255.0));
        assert_eq!(state.tool, 1);

        let (state, _) = resolve(&RawToken::new('M', 107), &state).unwrap();
        assert_eq!(state.fan_speed, Some(0.0));

        let (state, _) = resolve(&RawToken::new('M', 113).with('S', 0.5), &state).unwrap();
        assert_eq!(state.extruder_pwm, Some(0.5));
        let (state, _) = resolve(&RawToken::new('M', 113), &state).unwrap();
        assert_eq!(state.extruder_pwm, Some(0.5));
    }

    #[test]
    fn undefined_mode_is_unresolvable() {
        let prior = MachineState::undefined();
        assert!(matches!(
            resolve(&g1().with('X', 1.0), &prior),
            Err(LineError::Unresolvable(_))
        ));
        assert!(matches!(
            resolve(&g1().with('E', 1.0), &prior),
            Err(LineError::Unresolvable(_))
        ));
        // Feed-only moves need no mode
        assert!(resolve(&g1().with('F', 1200.0), &prior).is_ok());
    }

    #[test]
    fn non_finite_result_is_unresolvable() {
        let prior = MachineState {
            positioning: Some(Positioning::Relative),
            position: Position::new(f64::MAX, 0.0, 0.0),
            ..MachineState::default()
        };
        assert!(matches!(
            resolve(&g1().with('X', f64::MAX), &prior),
            Err(LineError::Unresolvable(_))
        ));
    }

    #[test]
    fn unknown_command_is_reported() {
        let token = RawToken::new('M', 117);
        assert_eq!(
            resolve(&token, &MachineState::default()),
            Err(LineError::UnknownCommand(token.id))
        );
    }

    #[test]
    fn legacy_switch_counts_xy_moves() {
        let resolver = Resolver::new(true);
        let (state, _) = resolver
            .resolve(&RawToken::new('M', 101), &MachineState::default())
            .unwrap();
        let (_, flags) = resolver.resolve(&g1().with('X', 5.0), &state).unwrap();
        assert!(flags.performs_extrusion);

        let (_, flags) = resolver.resolve(&g1().with('Z', 5.0), &state).unwrap();
        assert!(!flags.performs_extrusion);

        let (_, flags) = Resolver::default().resolve(&g1().with('X', 5.0), &state).unwrap();
        assert!(!flags.performs_extrusion);
    }
}
