//! gcode5d
//!
//! Interprets 5D G-code (as emitted by Skeinforge and Slic3r) into a
//! sequence of typed commands with the resolved machine state at each step.
//!
//! This library provides:
//! - Line tokenization and a fail-fast parse driver
//! - Modal state resolution with arc expansion
//! - Document splitting and merging with seam re-resolution
//! - Re-serialization to G-code text

pub mod config;
pub mod document;
pub mod error;
pub mod machine;
pub mod parser;
pub mod serializer;

// Re-exports for clean public API
pub use config::Config;
pub use document::{Command, Document, Layer, MergeConfig, Origin, SkippedLine, UnitPolicy, merge};
pub use error::{GcodeError, LineError, Result};
pub use machine::{
    ArcConfig, ArcResolution, CommandKind, DerivedFlags, MachineState, Position, Positioning, Units,
    resolve,
};
pub use parser::{CommandId, Parser, ParserConfig, RawToken, parse, parse_files, tokenize};
pub use serializer::{SerializeConfig, serialize};
