//! Machine state snapshots
//!
//! A [`MachineState`] is a plain value. Each resolved command carries its own
//! copy, so nothing here is shared or mutated behind a reference.

use serde::Serialize;

/// Coordinate axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Parameter letter naming this axis
    pub fn letter(self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z',
        }
    }
}

/// Absolute position in machine space
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn set(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
            Axis::Z => self.z = value,
        }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2) + (self.z - other.z).powi(2))
            .sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Positioning mode (G90/G91 for axes, M82/M83 for the extruder)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Positioning {
    Absolute,
    Relative,
}

impl Positioning {
    /// Apply a written value to the prior coordinate
    pub fn apply(self, prior: f64, value: f64) -> f64 {
        match self {
            Positioning::Absolute => value,
            Positioning::Relative => prior + value,
        }
    }
}

/// Active unit system (G20/G21)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Units {
    #[default]
    Millimeters,
    Inches,
}

/// Fully resolved machine state after a command
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MachineState {
    pub position: Position,
    /// Axis mode; `None` until a G90/G91 has been seen in strict parsing
    pub positioning: Option<Positioning>,
    /// Extruder mode, tracked apart from the axes
    pub extrusion_positioning: Option<Positioning>,
    /// Cumulative logical E coordinate
    pub extrusion: f64,
    pub feed_rate: f64,
    pub units: Units,
    pub tool: u32,
    pub extruder_temperature: Option<f64>,
    pub bed_temperature: Option<f64>,
    pub fan_speed: Option<f64>,
    /// Extruder heater PWM set by M113
    pub extruder_pwm: Option<f64>,
    /// Legacy M101/M103 extruder switch
    pub extruder_on: bool,
}

impl Default for MachineState {
    /// Power-on state: origin, absolute modes, millimeters
    fn default() -> Self {
        Self {
            position: Position::default(),
            positioning: Some(Positioning::Absolute),
            extrusion_positioning: Some(Positioning::Absolute),
            extrusion: 0.0,
            feed_rate: 0.0,
            units: Units::Millimeters,
            tool: 0,
            extruder_temperature: None,
            bed_temperature: None,
            fan_speed: None,
            extruder_pwm: None,
            extruder_on: false,
        }
    }
}

impl MachineState {
    /// Power-on state with no positioning mode established
    pub fn undefined() -> Self {
        Self {
            positioning: None,
            extrusion_positioning: None,
            ..Self::default()
        }
    }

    /// Whether every numeric field holds a finite value
    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.extrusion.is_finite()
            && self.feed_rate.is_finite()
            && [
                self.extruder_temperature,
                self.bed_temperature,
                self.fan_speed,
                self.extruder_pwm,
            ]
            .iter()
            .flatten()
            .all(|v| v.is_finite())
    }
}
