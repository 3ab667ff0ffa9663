//! GCode Parser
//!
//! Line tokenization plus the parse driver that threads each line through
//! the resolver (and the arc expander) into a [`Document`].

pub mod ast;
pub mod lexer;

use std::io::BufRead;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use rayon::prelude::*;

pub use ast::{CommandId, Parameter, Params, RawToken};
pub use lexer::{Token, TokenKind, peek_command, tokenize_line};

use crate::document::{Document, Origin};
use crate::error::{LineError, Result};
use crate::machine::{self, ArcConfig, CommandKind, MachineState, Resolver};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Tokenize a single line of GCode
///
/// Returns `Ok(None)` for blank and comment-only lines.
pub fn tokenize(line: &str) -> Result<Option<RawToken>, LineError> {
    ast::tokens_to_raw_token(lexer::tokenize_line(line)?)
}

/// Parse driver settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParserConfig {
    /// Skip unsupported commands with a warning instead of failing
    pub skip_unknown: bool,
    /// Start with no positioning mode, so moves before G90/G91 fail
    pub require_explicit_modes: bool,
    /// Replace G2/G3 with linear segments
    pub expand_arcs: bool,
    /// Count XY moves after M101 as extrusion
    pub legacy_extruder_switch: bool,
    pub arcs: ArcConfig,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            skip_unknown: true,
            require_explicit_modes: false,
            expand_arcs: true,
            legacy_extruder_switch: false,
            arcs: ArcConfig::default(),
        }
    }
}

/// Streaming parse driver
#[derive(Debug, Clone, Default)]
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    fn initial_state(&self) -> MachineState {
        if self.config.require_explicit_modes {
            MachineState::undefined()
        } else {
            MachineState::default()
        }
    }

    /// Parse a sequence of lines into a document
    ///
    /// Fails on the first malformed or unresolvable line. Line numbers in
    /// errors are 1-based.
    pub fn parse<I, S>(&self, lines: I) -> Result<Document>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut document = self.empty_document();

        for (index, line) in lines.into_iter().enumerate() {
            self.parse_line(&mut document, index + 1, line.as_ref())?;
        }

        Ok(finish(document))
    }

    pub fn parse_str(&self, text: &str) -> Result<Document> {
        self.parse(text.lines())
    }

    /// Parse from a buffered reader, line by line
    ///
    /// Bytes that are not valid UTF-8 are replaced before tokenizing. Inside
    /// a comment they are dropped with it; anywhere else the line is
    /// malformed.
    pub fn parse_reader<R: BufRead>(&self, mut reader: R) -> Result<Document> {
        let mut document = self.empty_document();
        let mut buffer = Vec::new();
        let mut line = 0;

        loop {
            buffer.clear();
            if reader.read_until(b'\n', &mut buffer)? == 0 {
                break;
            }
            line += 1;
            let text = String::from_utf8_lossy(&buffer);
            self.parse_line(&mut document, line, text.trim_end_matches(['\n', '\r']))?;
        }

        Ok(finish(document))
    }

    pub fn parse_file(&self, path: &Path) -> Result<Document> {
        let file = std::fs::File::open(path)?;
        self.parse_reader(std::io::BufReader::new(file))
    }

    fn empty_document(&self) -> Document {
        let resolver = Resolver::new(self.config.legacy_extruder_switch);
        Document::with_resolver(self.initial_state(), resolver)
    }

    fn parse_line(&self, document: &mut Document, line: usize, text: &str) -> Result<()> {
        let text = match line {
            1 => text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(text),
            _ => text,
        };
        let token = match tokenize(text) {
            Ok(Some(token)) => token,
            Ok(None) => return Ok(()),
            Err(err) => {
                // Vendor commands often carry free-text arguments
                let unknown = lexer::peek_command(text)
                    .filter(|id| CommandKind::from_id(*id).is_none());
                return match unknown {
                    Some(id) if self.config.skip_unknown => {
                        self.skip(document, line, text, id);
                        Ok(())
                    }
                    Some(id) => Err(LineError::UnknownCommand(id).at(line, text)),
                    None => Err(err.at(line, text)),
                };
            }
        };

        let Some(kind) = CommandKind::from_id(token.id) else {
            if self.config.skip_unknown {
                self.skip(document, line, text, token.id);
                return Ok(());
            }
            return Err(LineError::UnknownCommand(token.id).at(line, text));
        };

        for param in token.params.iter() {
            if !kind.accepts(param.letter) {
                debug!(
                    "line {}: {} ignores parameter {}",
                    line, token.id, param.letter
                );
            }
        }

        if matches!(kind, CommandKind::Arc(_)) && self.config.expand_arcs {
            let segments = machine::expand(&token, document.terminal_state(), &self.config.arcs)
                .map_err(|err| err.at(line, text))?;
            for segment in segments {
                document
                    .push(segment, Origin::ArcSegment { line })
                    .map_err(|err| err.at(line, text))?;
            }
            return Ok(());
        }

        document
            .push(token, Origin::Source { line })
            .map_err(|err| err.at(line, text))
    }

    fn skip(&self, document: &mut Document, line: usize, text: &str, id: CommandId) {
        warn!("line {}: skipping unsupported command {}", line, id);
        document.record_skipped(line, text);
    }
}

fn finish(document: Document) -> Document {
    debug!(
        "parsed {} commands, skipped {} lines",
        document.len(),
        document.skipped().len()
    );
    document
}

/// Parse lines with the default configuration
pub fn parse<I, S>(lines: I) -> Result<Document>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Parser::default().parse(lines)
}

/// Parse several files in parallel, one document per file
pub fn parse_files(paths: &[PathBuf], config: &ParserConfig) -> Vec<Result<Document>> {
    let parser = Parser::new(*config);
    paths
        .par_iter()
        .map(|path| {
            parser.parse_file(path).inspect_err(|err| {
                warn!("{}: {}", path.display(), err);
            })
        })
        .collect()
}
