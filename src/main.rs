use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use gcode5d::config::{Commands, Config};
use gcode5d::{Command, Document, Parser};

fn main() -> Result<()> {
    let (config, command) = Config::from_args_and_env()?;

    env_logger::Builder::new()
        .parse_filters(&config.log_level)
        .init();

    if let Some(path) = &config.config_path {
        info!("using settings from {}", path.display());
    }

    let parser = Parser::new(config.parser);

    match command {
        Commands::Inspect { file, json } => {
            let document = load(&parser, &file)?;
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            if json {
                let commands: Vec<&Command> = document.iter().collect();
                serde_json::to_writer_pretty(&mut out, &commands)
                    .context("failed to write JSON")?;
                writeln!(out)?;
            } else {
                for (index, command) in document.iter().enumerate() {
                    let position = command.position();
                    writeln!(
                        out,
                        "{:>6}  {:<5} X{:<10.3} Y{:<10.3} Z{:<8.3} E{:<10.4} F{:<7} {}",
                        index,
                        command.id().to_string(),
                        position.x,
                        position.y,
                        position.z,
                        command.extrusion(),
                        command.feed_rate(),
                        if command.performs_extrusion() { "extrude" } else { "" }
                    )?;
                }
                for skipped in document.skipped() {
                    writeln!(out, "skipped line {}: {}", skipped.line, skipped.text)?;
                }
            }
        }
        Commands::Export { file, output } => {
            let document = load(&parser, &file)?;
            write_output(output.as_deref(), &document.serialize_with(&config.output))?;
        }
        Commands::Split {
            file,
            at,
            first,
            second,
        } => {
            let document = load(&parser, &file)?;
            let (head, tail) = document
                .split_at(at)
                .with_context(|| format!("failed to split {}", file.display()))?;
            write_output(Some(&first), &head.serialize_with(&config.output))?;
            write_output(Some(&second), &tail.serialize_with(&config.output))?;
            info!(
                "split {} at command {}: {} + {} commands",
                file.display(),
                at,
                head.len(),
                tail.len()
            );
        }
        Commands::Merge {
            first,
            second,
            output,
        } => {
            let a = load(&parser, &first)?;
            let b = load(&parser, &second)?;
            let merged = a.merge_with(&b, &config.merge).with_context(|| {
                format!("failed to merge {} and {}", first.display(), second.display())
            })?;
            write_output(output.as_deref(), &merged.serialize_with(&config.output))?;
        }
    }

    Ok(())
}

fn load(parser: &Parser, path: &Path) -> Result<Document> {
    let document = parser
        .parse_file(path)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    info!(
        "{}: {} commands, {} layers",
        path.display(),
        document.len(),
        document.layers().len()
    );
    Ok(document)
}

/// Write to a file, or stdout when no path is given
fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
        }
        None => {
            std::io::stdout()
                .lock()
                .write_all(text.as_bytes())
                .context("failed to write to stdout")
        }
    }
}
