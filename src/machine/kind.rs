//! Supported commands
//!
//! One variant per command the interpreter understands, each with the
//! parameter letters it accepts. Anything not listed here is an unknown
//! command and gets skipped by the parse driver.

use serde::Serialize;

use crate::parser::CommandId;

/// Arc direction for G2/G3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArcDirection {
    Clockwise,
    CounterClockwise,
}

/// Interpreted command kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CommandKind {
    /// G0
    RapidMove,
    /// G1
    LinearMove,
    /// G2 / G3
    Arc(ArcDirection),
    /// G4
    Dwell,
    /// G20
    UnitsInches,
    /// G21
    UnitsMillimeters,
    /// G28
    Home,
    /// G90
    AbsolutePositioning,
    /// G91
    RelativePositioning,
    /// G92
    SetPosition,
    /// M0 / M1
    Pause,
    /// M18 / M84
    DisableMotors,
    /// M82
    AbsoluteExtrusion,
    /// M83
    RelativeExtrusion,
    /// M101 (legacy 3D G-code)
    ExtruderOn,
    /// M103 (legacy 3D G-code)
    ExtruderOff,
    /// M104 / M109
    SetExtruderTemperature { wait: bool },
    /// M105
    ReportTemperature,
    /// M106
    FanOn,
    /// M107
    FanOff,
    /// M108 (deprecated extruder speed)
    ExtruderSpeed,
    /// M113
    ExtruderPwm,
    /// M140 / M190
    SetBedTemperature { wait: bool },
    /// Tn
    SelectTool(u32),
}

const MOVE_PARAMS: &[char] = &['X', 'Y', 'Z', 'E', 'F'];
const ARC_PARAMS: &[char] = &['X', 'Y', 'Z', 'I', 'J', 'R', 'E', 'F'];
const AXES: &[char] = &['X', 'Y', 'Z'];
const POSITION_PARAMS: &[char] = &['X', 'Y', 'Z', 'E'];
const NONE: &[char] = &[];

impl CommandKind {
    /// Look up the kind of a command identity
    pub fn from_id(id: CommandId) -> Option<Self> {
        let kind = match (id.letter, id.code) {
            ('G', 0) => CommandKind::RapidMove,
            ('G', 1) => CommandKind::LinearMove,
            ('G', 2) => CommandKind::Arc(ArcDirection::Clockwise),
            ('G', 3) => CommandKind::Arc(ArcDirection::CounterClockwise),
            ('G', 4) => CommandKind::Dwell,
            ('G', 20) => CommandKind::UnitsInches,
            ('G', 21) => CommandKind::UnitsMillimeters,
            ('G', 28) => CommandKind::Home,
            ('G', 90) => CommandKind::AbsolutePositioning,
            ('G', 91) => CommandKind::RelativePositioning,
            ('G', 92) => CommandKind::SetPosition,
            ('M', 0 | 1) => CommandKind::Pause,
            ('M', 18 | 84) => CommandKind::DisableMotors,
            ('M', 82) => CommandKind::AbsoluteExtrusion,
            ('M', 83) => CommandKind::RelativeExtrusion,
            ('M', 101) => CommandKind::ExtruderOn,
            ('M', 103) => CommandKind::ExtruderOff,
            ('M', 104) => CommandKind::SetExtruderTemperature { wait: false },
            ('M', 105) => CommandKind::ReportTemperature,
            ('M', 106) => CommandKind::FanOn,
            ('M', 107) => CommandKind::FanOff,
            ('M', 108) => CommandKind::ExtruderSpeed,
            ('M', 109) => CommandKind::SetExtruderTemperature { wait: true },
            ('M', 113) => CommandKind::ExtruderPwm,
            ('M', 140) => CommandKind::SetBedTemperature { wait: false },
            ('M', 190) => CommandKind::SetBedTemperature { wait: true },
            ('T', tool) => CommandKind::SelectTool(tool),
            _ => return None,
        };
        Some(kind)
    }

    /// Parameter letters this command understands
    pub fn accepted_params(&self) -> &'static [char] {
        match self {
            CommandKind::RapidMove | CommandKind::LinearMove => MOVE_PARAMS,
            CommandKind::Arc(_) => ARC_PARAMS,
            CommandKind::Dwell => &['P', 'S'],
            CommandKind::Home => AXES,
            CommandKind::SetPosition => POSITION_PARAMS,
            CommandKind::Pause => &['P', 'S'],
            CommandKind::DisableMotors => &['X', 'Y', 'Z', 'E', 'S'],
            CommandKind::SetExtruderTemperature { .. } => &['S', 'T', 'R'],
            CommandKind::SetBedTemperature { .. } => &['S', 'R'],
            CommandKind::FanOn => &['S', 'P'],
            CommandKind::FanOff => &['P'],
            CommandKind::ExtruderSpeed | CommandKind::ExtruderPwm => &['S'],
            CommandKind::UnitsInches
            | CommandKind::UnitsMillimeters
            | CommandKind::AbsolutePositioning
            | CommandKind::RelativePositioning
            | CommandKind::AbsoluteExtrusion
            | CommandKind::RelativeExtrusion
            | CommandKind::ExtruderOn
            | CommandKind::ExtruderOff
            | CommandKind::ReportTemperature
            | CommandKind::SelectTool(_) => NONE,
        }
    }

    pub fn accepts(&self, letter: char) -> bool {
        self.accepted_params().contains(&letter)
    }

    /// Whether the command moves the tool head
    pub fn is_motion(&self) -> bool {
        matches!(
            self,
            CommandKind::RapidMove | CommandKind::LinearMove | CommandKind::Arc(_)
        )
    }
}
