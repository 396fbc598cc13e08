//! FILENAME: parser/src/parser.rs
//! PURPOSE: Recursive descent parser over the reassembled token stream.
//! CONTEXT: Third stage of the pipeline. Rules either produce a node with the
//! cursor advanced, or report "no match" with the cursor restored — plain
//! backtracking with no side effects. Only true errors (missing ')', missing
//! operand, trailing tokens) raise, and they abort just the current formula.
//!
//! GRAMMAR:
//!   formula   --> expr
//!   expr      --> [unary_op] term ( expr_op term )*
//!   expr_op   --> "&" | "+" | "-" | "<" | ">" | "=" | "<>" | "<=" | ">="
//!   term      --> factor ( term_op factor )*
//!   term_op   --> "*" | "/" | "^"
//!   factor    --> function_call | cell_ref | constant | "(" expr ")"
//!   function_call --> NAME "(" [expr ("," expr)*] ")"
//!   cell_ref  --> [qualifier "!"] ref_atom [":" CELLNAME]
//!   qualifier --> NAME | CELLNAME | SHEETNAME
//!   ref_atom  --> CELLNAME | NAME
//!   constant  --> NUMBER | STR | BOOL | REF_ERROR | DOLLAR
//!
//! Two precedence classes only: term operators bind tighter than expr
//! operators, both fold left-associatively. The unary prefix applies to the
//! first term of an expr and is not recursive.

use crate::ast::{BinaryOperator, Expr, Scope, UnaryOperator, Value};
use crate::error::FormulaError;
use crate::lexer::Lexer;
use crate::reassembly::reassemble;
use crate::token::{Token, TokenKind};

/// The parser holds the (whitespace-free) token stream, a cursor, and the
/// enclosing formula's scope for unqualified references.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    scope: Scope,
}

impl Parser {
    /// Creates a parser over a reassembled token stream. Whitespace tokens
    /// are discarded here; they only matter inside quoted runs, which the
    /// reassembly pass has already merged.
    pub fn new(tokens: Vec<Token>, scope: Scope) -> Self {
        let tokens = tokens
            .into_iter()
            .filter(|t| t.kind != TokenKind::Whitespace)
            .collect();
        Parser {
            tokens,
            pos: 0,
            scope,
        }
    }

    /// Parses the whole stream as one expression. Trailing tokens are an
    /// error: a formula is exactly one expression.
    pub fn parse(mut self) -> Result<Expr, FormulaError> {
        let expr = self
            .expr()?
            .ok_or_else(|| self.err("an expression"))?;
        if let Some(token) = self.peek() {
            return Err(FormulaError::Parse {
                offset: token.offset,
                expected: "end of formula".to_string(),
            });
        }
        Ok(expr)
    }

    // ---- cursor helpers ----

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn kind_at(&self, pos: usize) -> Option<TokenKind> {
        self.tokens.get(pos).map(|t| t.kind)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    /// Offset to blame for an error at the current position: the current
    /// token's start, or just past the last token at end of input.
    fn error_offset(&self) -> usize {
        match self.tokens.get(self.pos) {
            Some(token) => token.offset,
            None => self
                .tokens
                .last()
                .map(|t| t.offset + t.text.len())
                .unwrap_or(0),
        }
    }

    fn err(&self, expected: &str) -> FormulaError {
        FormulaError::Parse {
            offset: self.error_offset(),
            expected: expected.to_string(),
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<(), FormulaError> {
        if self.peek_kind() == Some(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.err(what))
        }
    }

    // ---- grammar rules ----
    //
    // Each rule returns Ok(None) for an ordinary mismatch with the cursor
    // restored, and Err only for a true error.

    fn expr(&mut self) -> Result<Option<Expr>, FormulaError> {
        let saved = self.pos;

        let prefix = match self.peek_kind() {
            Some(TokenKind::Plus) => {
                self.advance();
                Some(UnaryOperator::Plus)
            }
            Some(TokenKind::Minus) => {
                self.advance();
                Some(UnaryOperator::Negate)
            }
            _ => None,
        };

        let Some(mut node) = self.term()? else {
            self.pos = saved;
            return Ok(None);
        };

        if let Some(op) = prefix {
            node = Expr::UnaryOp {
                op,
                operand: Box::new(node),
            };
        }

        while let Some(op) = self.peek_expr_op() {
            self.advance();
            let right = self
                .term()?
                .ok_or_else(|| self.err("an operand after the operator"))?;
            node = Expr::BinaryOp {
                op,
                left: Box::new(node),
                right: Box::new(right),
            };
        }

        Ok(Some(node))
    }

    fn term(&mut self) -> Result<Option<Expr>, FormulaError> {
        let Some(mut node) = self.factor()? else {
            return Ok(None);
        };

        while let Some(op) = self.peek_term_op() {
            self.advance();
            let right = self
                .factor()?
                .ok_or_else(|| self.err("an operand after the operator"))?;
            node = Expr::BinaryOp {
                op,
                left: Box::new(node),
                right: Box::new(right),
            };
        }

        Ok(Some(node))
    }

    fn peek_expr_op(&self) -> Option<BinaryOperator> {
        match self.peek_kind()? {
            TokenKind::Ampersand => Some(BinaryOperator::Concat),
            TokenKind::Plus => Some(BinaryOperator::Add),
            TokenKind::Minus => Some(BinaryOperator::Subtract),
            TokenKind::Less => Some(BinaryOperator::LessThan),
            TokenKind::Greater => Some(BinaryOperator::GreaterThan),
            TokenKind::Eq => Some(BinaryOperator::Equal),
            TokenKind::NotEq => Some(BinaryOperator::NotEqual),
            TokenKind::LessEq => Some(BinaryOperator::LessEqual),
            TokenKind::GreaterEq => Some(BinaryOperator::GreaterEqual),
            _ => None,
        }
    }

    fn peek_term_op(&self) -> Option<BinaryOperator> {
        match self.peek_kind()? {
            TokenKind::Star => Some(BinaryOperator::Multiply),
            TokenKind::Slash => Some(BinaryOperator::Divide),
            TokenKind::Caret => Some(BinaryOperator::Power),
            _ => None,
        }
    }

    /// Factor alternatives are tried in a fixed order; a function call is
    /// only ever recognized as a bare name immediately followed by '('.
    fn factor(&mut self) -> Result<Option<Expr>, FormulaError> {
        if let Some(call) = self.function_call()? {
            return Ok(Some(call));
        }
        if let Some(reference) = self.cell_ref()? {
            return Ok(Some(reference));
        }
        if let Some(constant) = self.constant()? {
            return Ok(Some(constant));
        }
        if self.peek_kind() == Some(TokenKind::LParen) {
            self.advance();
            let inner = self
                .expr()?
                .ok_or_else(|| self.err("an expression after '('"))?;
            self.expect(TokenKind::RParen, "')'")?;
            return Ok(Some(inner));
        }
        Ok(None)
    }

    fn function_call(&mut self) -> Result<Option<Expr>, FormulaError> {
        let saved = self.pos;

        let name = match self.peek() {
            Some(t) if t.kind == TokenKind::Name => t.text.clone(),
            _ => return Ok(None),
        };
        self.advance();

        if self.peek_kind() != Some(TokenKind::LParen) {
            self.pos = saved;
            return Ok(None);
        }
        self.advance();

        let mut args = Vec::new();

        if self.peek_kind() == Some(TokenKind::RParen) {
            self.advance();
            return Ok(Some(Expr::FunctionCall { name, args }));
        }

        loop {
            let arg = self
                .expr()?
                .ok_or_else(|| self.err("a function argument"))?;
            args.push(arg);

            match self.peek_kind() {
                Some(TokenKind::Comma) => self.advance(),
                Some(TokenKind::RParen) => {
                    self.advance();
                    break;
                }
                _ => return Err(self.err("',' or ')' in the argument list")),
            }
        }

        Ok(Some(Expr::FunctionCall { name, args }))
    }

    /// Cell, defined-name, or range reference, optionally sheet-qualified.
    /// The qualifier position also accepts cell-name tokens because ordered
    /// lexing classifies names like Sheet1 as cell addresses.
    fn cell_ref(&mut self) -> Result<Option<Expr>, FormulaError> {
        let saved = self.pos;

        let qualifier = match self.peek() {
            Some(t)
                if matches!(
                    t.kind,
                    TokenKind::Name | TokenKind::CellName | TokenKind::SheetName
                ) && self.kind_at(self.pos + 1) == Some(TokenKind::Bang) =>
            {
                let sheet = t.text.clone();
                self.advance();
                self.advance();
                Some(sheet)
            }
            _ => None,
        };

        let (atom_kind, atom_text) = match self.peek() {
            Some(t) if matches!(t.kind, TokenKind::CellName | TokenKind::Name) => {
                (t.kind, t.text.clone())
            }
            _ => {
                self.pos = saved;
                return Ok(None);
            }
        };
        self.advance();

        let scope = match qualifier {
            Some(sheet) => Scope::Sheet(sheet),
            None => self.scope.clone(),
        };

        // A range needs plain cell addresses on both ends; anything else
        // rejects the whole sub-rule.
        if self.peek_kind() == Some(TokenKind::Colon) {
            if atom_kind == TokenKind::CellName
                && self.kind_at(self.pos + 1) == Some(TokenKind::CellName)
            {
                let end = self.tokens[self.pos + 1].text.clone();
                self.advance();
                self.advance();
                return Ok(Some(Expr::CellRange {
                    scope,
                    start: strip_absolute(&atom_text),
                    end: strip_absolute(&end),
                }));
            }
            self.pos = saved;
            return Ok(None);
        }

        Ok(Some(Expr::CellRef {
            scope,
            cell: strip_absolute(&atom_text),
        }))
    }

    fn constant(&mut self) -> Result<Option<Expr>, FormulaError> {
        let Some(token) = self.peek() else {
            return Ok(None);
        };
        let value = match token.kind {
            TokenKind::Number => {
                let number: f64 = token.text.parse().map_err(|_| FormulaError::Parse {
                    offset: token.offset,
                    expected: "a numeric literal".to_string(),
                })?;
                Value::Number(number)
            }
            TokenKind::Str => Value::Str(token.text.clone()),
            TokenKind::Bool => Value::Bool(token.text == "TRUE"),
            TokenKind::RefError => Value::RefError,
            // a lone $ in value position is kept as a literal
            TokenKind::Dollar => Value::Str(token.text.clone()),
            _ => return Ok(None),
        };
        self.advance();
        Ok(Some(Expr::Literal(value)))
    }
}

/// Drops $ absolute markers, so $A$1 and A1 name the same variable.
fn strip_absolute(text: &str) -> String {
    text.replace('$', "")
}

/// Parses one formula's raw text under the scope it lives in. The text must
/// begin with the '=' formula marker; everything after it is lexed,
/// reassembled, and parsed into a single AST root.
pub fn parse_formula(text: &str, scope: &Scope) -> Result<Expr, FormulaError> {
    let tokens = Lexer::new(text).tokenize()?;

    let mut stream = tokens.into_iter();
    match stream.next() {
        Some(t) if t.kind == TokenKind::Eq => {}
        _ => {
            return Err(FormulaError::Parse {
                offset: 0,
                expected: "'=' formula marker".to_string(),
            })
        }
    }

    let tokens = reassemble(stream.collect())?;
    Parser::new(tokens, scope.clone()).parse()
}
