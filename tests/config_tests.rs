//! Settings file loading and command-line overrides
use clap::Parser as _;
use gcode5d::config::{Args, Commands, Config, FileConfig};
use gcode5d::{ArcResolution, UnitPolicy};
use std::io::Write;
use tempfile::NamedTempFile;

fn settings(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write settings");
    file
}

#[test]
fn settings_file_is_loaded() {
    let file = settings(
        r#"
[parser]
expand_arcs = false

[parser.arcs]
segment_length = 0.25

[output]
precision = 3
trim_zeros = false

[merge]
units = "insert-switch"
"#,
    );
    let path = file.path().to_str().unwrap();
    let args = Args::parse_from(["gcode5d", "--config", path, "export", "part.gcode"]);
    let config = Config::from_args(&args).expect("load config");

    assert_eq!(config.config_path.as_deref(), Some(file.path()));
    assert!(!config.parser.expand_arcs);
    assert_eq!(
        config.parser.arcs.resolution,
        ArcResolution::SegmentLength(0.25)
    );
    assert_eq!(config.output.precision, 3);
    assert!(!config.output.trim_zeros);
    assert_eq!(config.merge.units, UnitPolicy::InsertSwitch);
    assert!(matches!(args.command, Commands::Export { output: None, .. }));
}

#[test]
fn flags_win_over_settings_file() {
    let file = settings("[output]\nprecision = 3\n[parser]\nskip_unknown = true\n");
    let path = file.path().to_str().unwrap();
    let args = Args::parse_from([
        "gcode5d",
        "merge",
        "a.gcode",
        "b.gcode",
        "-o",
        "out.gcode",
        "--config",
        path,
        "--precision",
        "1",
        "--strict",
        "--log-level",
        "debug",
    ]);
    let config = Config::from_args(&args).expect("load config");

    assert_eq!(config.output.precision, 1);
    assert!(!config.parser.skip_unknown);
    assert_eq!(config.log_level, "debug");
    match args.command {
        Commands::Merge { output, .. } => {
            assert_eq!(output.as_deref(), Some(std::path::Path::new("out.gcode")))
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn invalid_settings_are_reported_with_path() {
    let file = settings("[parser]\nexpand_arcs = \"sometimes\"\n");
    let path = file.path().to_str().unwrap();
    let args = Args::parse_from(["gcode5d", "--config", path, "inspect", "a.gcode"]);
    let err = Config::from_args(&args).unwrap_err();
    assert!(format!("{err:#}").contains(path));
}

#[test]
fn split_arguments() {
    let args = Args::parse_from([
        "gcode5d", "split", "in.gcode", "--at", "42", "a.gcode", "b.gcode",
    ]);
    match args.command {
        Commands::Split { at, first, second, .. } => {
            assert_eq!(at, 42);
            assert_eq!(first.to_str(), Some("a.gcode"));
            assert_eq!(second.to_str(), Some("b.gcode"));
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn arc_segment_count_from_file() {
    let file = settings("[parser.arcs]\nsegment_count = 36\nmax_segments = 36\n");
    let loaded = FileConfig::load(file.path()).expect("load");
    let parser = loaded.parser_config().expect("parser config");
    assert_eq!(parser.arcs.resolution, ArcResolution::SegmentCount(36));
    assert_eq!(parser.arcs.max_segments, 36);
}
