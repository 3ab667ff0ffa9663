//! Configuration management for gcode5d.
//!
//! Handles:
//! - Command-line argument parsing
//! - The optional TOML settings file
//! - Merging both into library settings

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::document::MergeConfig;
use crate::machine::{ArcConfig, ArcResolution};
use crate::parser::ParserConfig;
use crate::serializer::SerializeConfig;

/// Command-line arguments for gcode5d
#[derive(Debug, Parser)]
#[command(name = "gcode5d")]
#[command(about = "Interpret, split and merge 5D G-code files")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file (defaults to <config dir>/gcode5d/config.toml)
    #[arg(long, global = true, help = "Path to a TOML settings file")]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(
        long,
        global = true,
        default_value = "info",
        help = "Log level (trace, debug, info, warn, error)"
    )]
    pub log_level: String,

    /// Decimal places in emitted G-code
    #[arg(long, global = true)]
    pub precision: Option<usize>,

    /// Keep G2/G3 as single commands
    #[arg(long, global = true)]
    pub no_arc_expansion: bool,

    /// Fail on unsupported commands instead of skipping them
    #[arg(long, global = true)]
    pub strict: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print every command with its resolved state
    Inspect {
        file: PathBuf,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Re-emit a file in normalized form
    Export {
        file: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Split a file at a command index into two replayable files
    Split {
        file: PathBuf,
        #[arg(long)]
        at: usize,
        first: PathBuf,
        second: PathBuf,
    },
    /// Join two files, adjusting modes at the seam
    Merge {
        first: PathBuf,
        second: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Settings file layout
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub parser: ParserSection,
    pub output: SerializeConfig,
    pub merge: MergeConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserSection {
    pub skip_unknown: bool,
    pub require_explicit_modes: bool,
    pub expand_arcs: bool,
    pub legacy_extruder_switch: bool,
    pub arcs: ArcSection,
}

impl Default for ParserSection {
    fn default() -> Self {
        let defaults = ParserConfig::default();
        Self {
            skip_unknown: defaults.skip_unknown,
            require_explicit_modes: defaults.require_explicit_modes,
            expand_arcs: defaults.expand_arcs,
            legacy_extruder_switch: defaults.legacy_extruder_switch,
            arcs: ArcSection::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArcSection {
    pub segment_length: Option<f64>,
    pub segment_count: Option<usize>,
    pub max_segments: Option<usize>,
}

impl ArcSection {
    fn to_arc_config(&self) -> Result<ArcConfig> {
        let defaults = ArcConfig::default();
        let resolution = match (self.segment_length, self.segment_count) {
            (Some(_), Some(_)) => bail!(
                "set either parser.arcs.segment_length or parser.arcs.segment_count, not both"
            ),
            (Some(length), None) if length > 0.0 && length.is_finite() => {
                ArcResolution::SegmentLength(length)
            }
            (Some(length), None) => {
                bail!("parser.arcs.segment_length must be positive, got {length}")
            }
            (None, Some(0)) => bail!("parser.arcs.segment_count must be at least 1"),
            (None, Some(count)) => ArcResolution::SegmentCount(count),
            (None, None) => defaults.resolution,
        };
        let max_segments = match self.max_segments {
            Some(0) => bail!("parser.arcs.max_segments must be at least 1"),
            Some(max) => max,
            None => defaults.max_segments,
        };
        Ok(ArcConfig {
            resolution,
            max_segments,
        })
    }
}

impl FileConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid gcode5d settings")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    pub fn parser_config(&self) -> Result<ParserConfig> {
        let section = &self.parser;
        Ok(ParserConfig {
            skip_unknown: section.skip_unknown,
            require_explicit_modes: section.require_explicit_modes,
            expand_arcs: section.expand_arcs,
            legacy_extruder_switch: section.legacy_extruder_switch,
            arcs: section.arcs.to_arc_config()?,
        })
    }
}

/// Combined configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    pub parser: ParserConfig,
    pub output: SerializeConfig,
    pub merge: MergeConfig,
    /// Log level
    pub log_level: String,
    /// Settings file that was loaded, if any
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            parser: ParserConfig::default(),
            output: SerializeConfig::default(),
            merge: MergeConfig::default(),
            log_level: "info".to_string(),
            config_path: None,
        }
    }
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args_and_env() -> Result<(Self, Commands)> {
        let args = Args::parse();
        let config = Self::from_args(&args)?;
        Ok((config, args.command))
    }

    /// Create configuration from explicit arguments (useful for testing)
    ///
    /// Command-line flags win over the settings file.
    pub fn from_args(args: &Args) -> Result<Self> {
        let config_path = match &args.config {
            Some(path) => Some(path.clone()),
            None => default_config_path().filter(|path| path.is_file()),
        };

        let file = match &config_path {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let mut parser = file.parser_config()?;
        if args.no_arc_expansion {
            parser.expand_arcs = false;
        }
        if args.strict {
            parser.skip_unknown = false;
        }

        let mut output = file.output;
        if let Some(precision) = args.precision {
            output.precision = precision;
        }

        Ok(Config {
            parser,
            output,
            merge: file.merge,
            log_level: args.log_level.clone(),
            config_path,
        })
    }
}

/// Per-user settings file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("gcode5d").join("config.toml"))
}
