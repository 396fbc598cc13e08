//! FILENAME: parser/src/reassembly.rs
//! PURPOSE: Merges quoted token runs into single string / sheet-name tokens.
//! CONTEXT: The lexer treats quote characters as ordinary tokens, independent
//! of what they enclose. This pass walks the token stream with a three-state
//! machine and collapses each quoted run into one token, so the parser only
//! ever sees complete literals:
//!   - Normal: tokens pass through; a quote switches state.
//!   - InString: opened by a double quote. A doubled "" collapses to one
//!     literal quote character and the string stays open; a lone double quote
//!     (or end of input) closes it. The merged token keeps the content in
//!     original order, whitespace included.
//!   - InQuotedName: opened by a single quote. No escape rule; the next
//!     single quote closes it. End of input inside a quoted name is an error.

use crate::error::FormulaError;
use crate::token::{Token, TokenKind};

enum State {
    Normal,
    InString { start: usize, buf: String },
    InQuotedName { start: usize, buf: String },
}

/// Collapses quoted runs in `tokens` into single `Str` / `SheetName` tokens.
/// Every other token passes through unchanged.
pub fn reassemble(tokens: Vec<Token>) -> Result<Vec<Token>, FormulaError> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut state = State::Normal;
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];
        state = match state {
            State::Normal => match token.kind {
                TokenKind::DoubleQuote => State::InString {
                    start: token.offset,
                    buf: String::new(),
                },
                TokenKind::SingleQuote => State::InQuotedName {
                    start: token.offset,
                    buf: String::new(),
                },
                _ => {
                    out.push(token.clone());
                    State::Normal
                }
            },
            State::InString { start, mut buf } => {
                if token.kind == TokenKind::DoubleQuote {
                    let next_is_quote = tokens
                        .get(i + 1)
                        .is_some_and(|t| t.kind == TokenKind::DoubleQuote);
                    if next_is_quote {
                        // "" escape: one literal quote, string stays open
                        buf.push('"');
                        i += 1;
                        State::InString { start, buf }
                    } else {
                        out.push(Token {
                            kind: TokenKind::Str,
                            text: buf,
                            offset: start,
                        });
                        State::Normal
                    }
                } else {
                    buf.push_str(&token.text);
                    State::InString { start, buf }
                }
            }
            State::InQuotedName { start, mut buf } => {
                if token.kind == TokenKind::SingleQuote {
                    out.push(Token {
                        kind: TokenKind::SheetName,
                        text: buf,
                        offset: start,
                    });
                    State::Normal
                } else {
                    buf.push_str(&token.text);
                    State::InQuotedName { start, buf }
                }
            }
        };
        i += 1;
    }

    match state {
        State::Normal => Ok(out),
        // end of input closes an open string
        State::InString { start, buf } => {
            out.push(Token {
                kind: TokenKind::Str,
                text: buf,
                offset: start,
            });
            Ok(out)
        }
        State::InQuotedName { start, .. } => Err(FormulaError::Parse {
            offset: start,
            expected: "closing ' for quoted sheet name".to_string(),
        }),
    }
}
