//! FILENAME: parser/src/lexer.rs
//! PURPOSE: Scans a raw formula string and produces a stream of Tokens.
//! CONTEXT: First stage of the parsing pipeline. Patterns are tried in a
//! fixed declared order and the first match wins; in particular the
//! cell-name pattern runs before the looser bare-name pattern (A1 is a cell,
//! not a name), and the boolean pattern runs between them (TRUE5 is a cell,
//! TRUE is a boolean). Whitespace is kept and quote characters are ordinary
//! one-character tokens here; the reassembly pass merges quoted runs before
//! the parser ever sees them.

use crate::error::FormulaError;
use crate::token::{Token, TokenKind};

pub struct Lexer<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str) -> Self {
        Lexer { text, pos: 0 }
    }

    /// Tokenizes the whole input. Stops at the first character no pattern
    /// matches, reporting its byte offset.
    pub fn tokenize(mut self) -> Result<Vec<Token>, FormulaError> {
        let mut tokens = Vec::new();
        while self.pos < self.text.len() {
            let rest = &self.text[self.pos..];
            let (kind, len) =
                match_token(rest).ok_or(FormulaError::Lex { offset: self.pos })?;
            tokens.push(Token::new(kind, &rest[..len], self.pos));
            self.pos += len;
        }
        Ok(tokens)
    }
}

/// Fixed-text tokens, tried in declared order after the variable-length
/// patterns. Multi-character comparisons sit before their prefixes.
const FIXED_TOKENS: &[(&str, TokenKind)] = &[
    ("{", TokenKind::LBrace),
    ("}", TokenKind::RBrace),
    ("[", TokenKind::LBracket),
    ("]", TokenKind::RBracket),
    ("(", TokenKind::LParen),
    (")", TokenKind::RParen),
    ("#REF!", TokenKind::RefError),
    ("!", TokenKind::Bang),
    (",", TokenKind::Comma),
    (":", TokenKind::Colon),
    ("<>", TokenKind::NotEq),
    ("<=", TokenKind::LessEq),
    (">=", TokenKind::GreaterEq),
    ("<", TokenKind::Less),
    (">", TokenKind::Greater),
    ("=", TokenKind::Eq),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("^", TokenKind::Caret),
    ("&", TokenKind::Ampersand),
    ("$", TokenKind::Dollar),
];

/// Tries every pattern in declared order against the start of `input` and
/// returns the first match with its length in bytes.
fn match_token(input: &str) -> Option<(TokenKind, usize)> {
    if let Some(len) = match_number(input) {
        return Some((TokenKind::Number, len));
    }
    if input.starts_with('\'') {
        return Some((TokenKind::SingleQuote, 1));
    }
    if input.starts_with('"') {
        return Some((TokenKind::DoubleQuote, 1));
    }
    if let Some(len) = match_cell_name(input) {
        return Some((TokenKind::CellName, len));
    }
    if let Some(len) = match_boolean(input) {
        return Some((TokenKind::Bool, len));
    }
    if let Some(len) = match_name(input) {
        return Some((TokenKind::Name, len));
    }
    if let Some(len) = match_whitespace(input) {
        return Some((TokenKind::Whitespace, len));
    }
    for (literal, kind) in FIXED_TOKENS {
        if input.starts_with(literal) {
            return Some((*kind, literal.len()));
        }
    }
    None
}

/// Unsigned numeric literal: digits, optional fraction, optional exponent.
/// Signs belong to the grammar, not the token.
fn match_number(input: &str) -> Option<usize> {
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == 0 {
        return None;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        let mut j = i + 1;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        // a bare trailing dot is not part of the number
        if j > i + 1 {
            i = j;
        }
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exponent_digits = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exponent_digits {
            i = j;
        }
    }
    Some(i)
}

/// Cell address: optional $, letters, optional $, digits.
/// The absolute markers stay in the token text.
fn match_cell_name(input: &str) -> Option<usize> {
    let bytes = input.as_bytes();
    let mut i = 0;
    if bytes.first() == Some(&b'$') {
        i += 1;
    }
    let letters_start = i;
    while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
        i += 1;
    }
    if i == letters_start {
        return None;
    }
    if i < bytes.len() && bytes[i] == b'$' {
        i += 1;
    }
    let digits_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == digits_start {
        return None;
    }
    Some(i)
}

/// TRUE or FALSE with a word boundary, so TRUEISH stays a name.
fn match_boolean(input: &str) -> Option<usize> {
    for literal in ["TRUE", "FALSE"] {
        if let Some(rest) = input.strip_prefix(literal) {
            if !rest.chars().next().is_some_and(is_name_char) {
                return Some(literal.len());
            }
        }
    }
    None
}

/// Bare identifier: letter or underscore, then letters, digits, underscores.
fn match_name(input: &str) -> Option<usize> {
    let mut chars = input.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return None,
    }
    for (idx, c) in chars {
        if !is_name_char(c) {
            return Some(idx);
        }
    }
    Some(input.len())
}

fn match_whitespace(input: &str) -> Option<usize> {
    let mut len = 0;
    for (idx, c) in input.char_indices() {
        if !c.is_whitespace() {
            return if idx == 0 { None } else { Some(idx) };
        }
        len = idx + c.len_utf8();
    }
    if len == 0 {
        None
    } else {
        Some(len)
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
