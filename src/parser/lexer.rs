//! GCode Lexer
//!
//! Splits one line into words. Comments, `N` line numbers, `*` checksums and
//! `%` program markers are dropped here so nothing downstream sees them.

use crate::error::LineError;
use crate::parser::ast::CommandId;

/// Token types in GCode
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    /// First word of the line, like "G1", "M104", "T0"
    Command,
    /// Any later word, like "X10", "S255" or a bare flag "X"
    Parameter,
    /// Comment (semicolon or parenthetical)
    Comment,
}

/// A token with its text content
///
/// Letters are upper-cased and whitespace between a letter and its number is
/// removed, so `x 10` is stored as `X10`.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

/// Tokenize a line of GCode into tokens
pub fn tokenize_line(line: &str) -> Result<Vec<Token>, LineError> {
    let mut tokens = Vec::new();
    let mut chars = line.char_indices().peekable();
    let mut first_word = true;

    while let Some((start_idx, ch)) = chars.next() {
        match ch {
            ' ' | '\t' | '\r' | '\n' | '%' => continue,

            // Semicolon comment: consume rest of line
            ';' => {
                tokens.push(Token {
                    kind: TokenKind::Comment,
                    text: line[start_idx..].to_string(),
                });
                break;
            }

            // Parenthetical comment
            '(' => {
                let mut end_idx = line.len();
                for (idx, ch) in chars.by_ref() {
                    if ch == ')' {
                        end_idx = idx + 1;
                        break;
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Comment,
                    text: line[start_idx..end_idx].to_string(),
                });
            }

            // RepRap checksum ends the command part of the line
            '*' => break,

            c if c.is_ascii_alphabetic() => {
                let letter = c.to_ascii_uppercase();

                // Optional whitespace between the letter and its number
                let mut lookahead = chars.clone();
                while matches!(lookahead.peek(), Some(&(_, ' ' | '\t'))) {
                    lookahead.next();
                }
                let number_follows = matches!(
                    lookahead.peek(),
                    Some(&(_, n)) if n.is_ascii_digit() || matches!(n, '.' | '-' | '+')
                );

                let mut text = String::from(letter);
                if number_follows {
                    chars = lookahead;
                    while let Some(&(_, next_ch)) = chars.peek() {
                        if next_ch.is_ascii_digit() || matches!(next_ch, '.' | '-' | '+') {
                            text.push(next_ch);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    check_number(&text)?;
                    if let Some(&(_, next_ch)) = chars.peek() {
                        if !is_word_boundary(next_ch) {
                            return Err(LineError::Malformed(format!(
                                "unexpected '{}' after '{}'",
                                next_ch, text
                            )));
                        }
                    }
                } else if let Some(&(_, next_ch)) = chars.peek() {
                    // A bare letter must stand alone: "XTEN" is not a flag list
                    if next_ch.is_ascii_alphabetic() {
                        return Err(LineError::Malformed(format!(
                            "expected a number after '{}', found '{}'",
                            letter, next_ch
                        )));
                    }
                }

                // A leading N word is a line number, not part of the command
                if first_word && letter == 'N' {
                    continue;
                }

                let kind = if first_word {
                    TokenKind::Command
                } else {
                    TokenKind::Parameter
                };
                first_word = false;
                tokens.push(Token { kind, text });
            }

            other => {
                return Err(LineError::Malformed(format!(
                    "unexpected character '{}'",
                    other
                )));
            }
        }
    }

    Ok(tokens)
}

/// Characters allowed directly after a number
fn is_word_boundary(ch: char) -> bool {
    ch.is_ascii_alphabetic() || matches!(ch, ' ' | '\t' | '\r' | '\n' | ';' | '(' | '*')
}

/// Accept `[+-]digits[.digits]`, `[+-]digits.` and `[+-].digits`
fn check_number(word: &str) -> Result<(), LineError> {
    let number = &word[1..];
    let unsigned = number.strip_prefix(['+', '-']).unwrap_or(number);
    let digits = unsigned.chars().filter(|c| c.is_ascii_digit()).count();
    let dots = unsigned.chars().filter(|&c| c == '.').count();

    if digits == 0 || dots > 1 || digits + dots != unsigned.len() {
        return Err(LineError::Malformed(format!("invalid number in '{}'", word)));
    }
    Ok(())
}

/// Read the command identity of a line without validating its parameters
///
/// Used to recognize vendor commands whose arguments are free text
/// (`M117 Printing...`) so they can be skipped instead of aborting a parse.
pub fn peek_command(line: &str) -> Option<CommandId> {
    let mut rest = line.trim_start();

    // Skip a leading N line number
    if let Some(after) = rest.strip_prefix(['N', 'n']) {
        let digits = after.len() - after.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        if digits > 0 {
            rest = after[digits..].trim_start();
        }
    }

    let mut chars = rest.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    if !is_command_letter(letter) {
        return None;
    }
    let code: String = chars.take_while(|c| c.is_ascii_digit()).collect();
    let code = code.parse().ok()?;
    Some(CommandId::new(letter, code))
}

/// G, M and T words start a command; everything else is a parameter
pub(crate) fn is_command_letter(letter: char) -> bool {
    matches!(letter.to_ascii_uppercase(), 'G' | 'M' | 'T')
}
