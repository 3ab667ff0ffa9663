//! Machine model
//!
//! Command kinds, state snapshots, the state resolver and the arc expander.

pub mod arc;
pub mod kind;
pub mod resolver;
pub mod state;

pub use arc::{ArcConfig, ArcGeometry, ArcResolution, expand};
pub use kind::{ArcDirection, CommandKind};
pub use resolver::{DerivedFlags, Resolver, resolve};
pub use state::{Axis, MachineState, Position, Positioning, Units};
