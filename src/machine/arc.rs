//! Arc Expander
//!
//! Turns a G2/G3 move into a run of G1 tokens. The tokens are written in the
//! modes active at the arc (absolute or relative axes, absolute or relative
//! extrusion), so resolving them in order lands exactly where the arc ends.

use std::f64::consts::TAU;

use log::trace;

use crate::error::LineError;
use crate::machine::kind::{ArcDirection, CommandKind};
use crate::machine::state::{Axis, MachineState, Position, Positioning};
use crate::parser::RawToken;

/// Distances below this are treated as zero
const EPSILON: f64 = 1e-9;

/// How finely arcs are cut into lines
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArcResolution {
    /// Target chord length along the arc, in the active units
    SegmentLength(f64),
    /// Fixed number of segments per arc
    SegmentCount(usize),
}

/// Arc expansion settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcConfig {
    pub resolution: ArcResolution,
    /// Upper bound on segments for one arc
    pub max_segments: usize,
}

impl Default for ArcConfig {
    fn default() -> Self {
        Self {
            resolution: ArcResolution::SegmentLength(1.0),
            max_segments: 720,
        }
    }
}

impl ArcConfig {
    /// Number of segments for an arc of the given length
    pub fn segments_for(&self, length: f64) -> usize {
        let max = self.max_segments.max(1);
        let wanted = match self.resolution {
            ArcResolution::SegmentLength(step) if step > 0.0 => (length / step).ceil() as usize,
            ArcResolution::SegmentLength(_) => max,
            ArcResolution::SegmentCount(count) => count,
        };
        wanted.clamp(1, max)
    }
}

/// Solved arc in the XY plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcGeometry {
    pub center: (f64, f64),
    pub start_angle: f64,
    /// Signed sweep in radians: negative for clockwise
    pub sweep: f64,
    pub start_radius: f64,
    pub end_radius: f64,
}

impl ArcGeometry {
    /// Solve centre, angles and radius from the arc words
    pub fn solve(
        direction: ArcDirection,
        start: (f64, f64),
        end: (f64, f64),
        offset: Option<(f64, f64)>,
        radius: Option<f64>,
    ) -> Result<Self, LineError> {
        let chord = (end.0 - start.0).hypot(end.1 - start.1);
        let coincident = chord < EPSILON;

        let center = match (offset, radius) {
            (Some((i, j)), _) => {
                if i.hypot(j) < EPSILON {
                    return Err(LineError::DegenerateArc(
                        "centre offset I/J is zero".to_string(),
                    ));
                }
                (start.0 + i, start.1 + j)
            }
            (None, Some(r)) => {
                if coincident {
                    return Err(LineError::DegenerateArc(
                        "start and end coincide; a radius cannot describe a full circle"
                            .to_string(),
                    ));
                }
                center_from_radius(direction, start, end, chord, r)?
            }
            (None, None) => {
                return Err(LineError::DegenerateArc(
                    "arc needs an I/J centre offset or an R radius".to_string(),
                ));
            }
        };

        let start_radius = (start.0 - center.0).hypot(start.1 - center.1);
        let end_radius = (end.0 - center.0).hypot(end.1 - center.1);
        if start_radius < EPSILON || end_radius < EPSILON {
            return Err(LineError::DegenerateArc(
                "arc endpoint lies on its centre".to_string(),
            ));
        }

        let start_angle = (start.1 - center.1).atan2(start.0 - center.0);
        let end_angle = (end.1 - center.1).atan2(end.0 - center.0);

        let sweep = if coincident {
            match direction {
                ArcDirection::Clockwise => -TAU,
                ArcDirection::CounterClockwise => TAU,
            }
        } else {
            let mut sweep = end_angle - start_angle;
            match direction {
                ArcDirection::Clockwise if sweep > 0.0 => sweep -= TAU,
                ArcDirection::CounterClockwise if sweep < 0.0 => sweep += TAU,
                _ => {}
            }
            sweep
        };

        Ok(Self {
            center,
            start_angle,
            sweep,
            start_radius,
            end_radius,
        })
    }

    /// Approximate path length in the XY plane
    pub fn length(&self) -> f64 {
        self.sweep.abs() * (self.start_radius + self.end_radius) / 2.0
    }

    /// Point at fraction `t` of the sweep
    pub fn point_at(&self, t: f64) -> (f64, f64) {
        let angle = self.start_angle + self.sweep * t;
        let radius = self.start_radius + (self.end_radius - self.start_radius) * t;
        (
            self.center.0 + radius * angle.cos(),
            self.center.1 + radius * angle.sin(),
        )
    }
}

/// Centre of an R-form arc; negative R selects the longer arc
fn center_from_radius(
    direction: ArcDirection,
    start: (f64, f64),
    end: (f64, f64),
    chord: f64,
    radius: f64,
) -> Result<(f64, f64), LineError> {
    if radius.abs() < EPSILON {
        return Err(LineError::DegenerateArc("radius is zero".to_string()));
    }
    let dx = end.0 - start.0;
    let dy = end.1 - start.1;

    let discriminant = 4.0 * radius * radius - chord * chord;
    if discriminant < -EPSILON {
        return Err(LineError::DegenerateArc(format!(
            "radius {} is smaller than half the chord {}",
            radius.abs(),
            chord / 2.0
        )));
    }

    // Twice the centre's distance from the chord, over the chord length
    let mut h = -discriminant.max(0.0).sqrt() / chord;
    if direction == ArcDirection::CounterClockwise {
        h = -h;
    }
    if radius < 0.0 {
        h = -h;
    }

    Ok((
        start.0 + 0.5 * (dx - dy * h),
        start.1 + 0.5 * (dy + dx * h),
    ))
}

/// Expand an arc command into linear-move tokens
pub fn expand(
    token: &RawToken,
    prior: &MachineState,
    config: &ArcConfig,
) -> Result<Vec<RawToken>, LineError> {
    let Some(CommandKind::Arc(direction)) = CommandKind::from_id(token.id) else {
        return Err(LineError::DegenerateArc(format!(
            "{} is not an arc move",
            token.id
        )));
    };

    let positioning = prior.positioning.ok_or_else(|| {
        LineError::Unresolvable("arc before any positioning mode (G90/G91)".to_string())
    })?;

    let start = prior.position;
    let mut end = start;
    for axis in Axis::ALL {
        if let Some(value) = token.get(axis.letter()) {
            end.set(axis, positioning.apply(start.get(axis), value));
        }
    }

    let extrusion = match token.get('E') {
        Some(value) => {
            let mode = prior.extrusion_positioning.ok_or_else(|| {
                LineError::Unresolvable(
                    "extrusion before any extruder mode (G90/G91/M82/M83)".to_string(),
                )
            })?;
            Some((mode, mode.apply(prior.extrusion, value)))
        }
        None => None,
    };

    let offset = match (token.get('I'), token.get('J')) {
        (None, None) => None,
        (i, j) => Some((i.unwrap_or(0.0), j.unwrap_or(0.0))),
    };
    let geometry = ArcGeometry::solve(
        direction,
        (start.x, start.y),
        (end.x, end.y),
        offset,
        token.get('R'),
    )?;

    let count = config.segments_for(geometry.length());
    trace!(
        "{}: centre ({:.4}, {:.4}) radius {:.4} sweep {:.4} rad in {} segments",
        token.id,
        geometry.center.0,
        geometry.center.1,
        geometry.start_radius,
        geometry.sweep,
        count
    );

    let helical = end.z != start.z;
    let mut segments = Vec::with_capacity(count);
    let mut previous = start;
    let mut previous_e = prior.extrusion;

    for k in 1..=count {
        let t = k as f64 / count as f64;
        let point = if k == count {
            end
        } else {
            let (x, y) = geometry.point_at(t);
            Position::new(x, y, start.z + (end.z - start.z) * t)
        };

        let mut segment = RawToken::new('G', 1);
        match positioning {
            Positioning::Absolute => {
                segment = segment.with('X', point.x).with('Y', point.y);
                if helical {
                    segment = segment.with('Z', point.z);
                }
            }
            Positioning::Relative => {
                segment = segment
                    .with('X', point.x - previous.x)
                    .with('Y', point.y - previous.y);
                if helical {
                    segment = segment.with('Z', point.z - previous.z);
                }
            }
        }

        if let Some((mode, target)) = extrusion {
            let e = if k == count {
                target
            } else {
                prior.extrusion + (target - prior.extrusion) * t
            };
            segment = match mode {
                Positioning::Absolute => segment.with('E', e),
                Positioning::Relative => segment.with('E', e - previous_e),
            };
            previous_e = e;
        }

        if k == 1 {
            if let Some(feed_rate) = token.get('F') {
                segment = segment.with('F', feed_rate);
            }
        }

        previous = point;
        segments.push(segment);
    }

    Ok(segments)
}
