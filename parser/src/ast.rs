//! FILENAME: parser/src/ast.rs
//! PURPOSE: Defines the abstract syntax tree for formula expressions.
//! CONTEXT: The parser converts the reassembled token stream into this tree;
//! the code-generation stage consumes it read-only. Each node owns its
//! children, one root per formula, no cycles.
//!
//! SUPPORTED EXPRESSIONS:
//! - Literals: numbers, strings, booleans, #REF! errors
//! - Cell and defined-name references: A1, TaxRate, Sheet1!A1, 'My Sheet'!A1
//! - Ranges: A1:B10, Sheet1!A1:B10
//! - Binary operations: &, +, -, *, /, ^, =, <>, <, >, <=, >=
//! - Unary prefix: +, -
//! - Function calls: SUM(A1:A10), IF(A1>0, "yes", "no")

use std::collections::HashSet;
use std::fmt;

/// Serialized form of the global scope. The container format forbids `$` in
/// sheet names, so this can never collide with a real sheet.
pub const GLOBAL_SCOPE_NAME: &str = "$$$GLOBAL$$$";

/// The sheet a formula or reference belongs to. `Global` is the reserved
/// scope for workbook-level named definitions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    Sheet(String),
}

impl Scope {
    pub fn sheet(name: impl Into<String>) -> Self {
        Scope::Sheet(name.into())
    }

    /// Inverse of `Display`: the sentinel string maps back to `Global`.
    pub fn from_name(name: &str) -> Self {
        if name == GLOBAL_SCOPE_NAME {
            Scope::Global
        } else {
            Scope::Sheet(name.to_string())
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => write!(f, "{}", GLOBAL_SCOPE_NAME),
            Scope::Sheet(name) => write!(f, "{}", name),
        }
    }
}

/// A parsed formula expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal value: number, string, boolean, or #REF! error.
    Literal(Value),

    /// A single cell or defined-name reference. `cell` holds the address or
    /// name with absolute markers stripped, so $A$1 and A1 are the same
    /// variable. The scope is the explicit qualifier if one was written,
    /// otherwise the enclosing formula's scope.
    CellRef { scope: Scope, cell: String },

    /// A rectangular range: both endpoints are plain cell addresses.
    CellRange {
        scope: Scope,
        start: String,
        end: String,
    },

    /// A unary prefix operation (e.g. -A1).
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expr>,
    },

    /// A binary operation: left op right (e.g. A1 + 1, A1 > 10).
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// A function call like SUM(A1:A10).
    FunctionCall { name: String, args: Vec<Expr> },
}

/// Literal values that can appear in formulas.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Str(String),
    Bool(bool),
    /// The #REF! reference-error literal.
    RefError,
}

/// Binary operators, in the grammar's two precedence classes: `Multiply`,
/// `Divide`, `Power` bind tighter than everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Concat,       // &
    Add,          // +
    Subtract,     // -
    LessThan,     // <
    GreaterThan,  // >
    Equal,        // =
    NotEqual,     // <>
    LessEqual,    // <=
    GreaterEqual, // >=
    Multiply,     // *
    Divide,       // /
    Power,        // ^
}

/// Unary prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,   // +
    Negate, // -
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOperator::Concat => "&",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::LessThan => "<",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "<>",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Power => "^",
        };
        write!(f, "{}", symbol)
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOperator::Plus => write!(f, "+"),
            UnaryOperator::Negate => write!(f, "-"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "\"{}\"", s),
            Value::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Value::RefError => write!(f, "#REF!"),
        }
    }
}

/// A reference the code generator must receive as a parameter: a cell, a
/// defined name, or a range (named `start:end`), with the scope it resolves
/// in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FreeVariable {
    pub scope: Scope,
    pub name: String,
}

/// Collects the free variables of an expression: every distinct cell, name,
/// or range reference, deduplicated by (scope, name), in first-encountered
/// depth-first order. Nothing in this language binds locally, so every
/// reference is free.
pub fn free_variables(expr: &Expr) -> Vec<FreeVariable> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    collect_free(expr, &mut seen, &mut out);
    out
}

fn collect_free(expr: &Expr, seen: &mut HashSet<FreeVariable>, out: &mut Vec<FreeVariable>) {
    match expr {
        Expr::Literal(_) => {}
        Expr::CellRef { scope, cell } => {
            push_free(
                FreeVariable {
                    scope: scope.clone(),
                    name: cell.clone(),
                },
                seen,
                out,
            );
        }
        Expr::CellRange { scope, start, end } => {
            push_free(
                FreeVariable {
                    scope: scope.clone(),
                    name: format!("{}:{}", start, end),
                },
                seen,
                out,
            );
        }
        Expr::UnaryOp { operand, .. } => collect_free(operand, seen, out),
        Expr::BinaryOp { left, right, .. } => {
            collect_free(left, seen, out);
            collect_free(right, seen, out);
        }
        Expr::FunctionCall { args, .. } => {
            for arg in args {
                collect_free(arg, seen, out);
            }
        }
    }
}

fn push_free(var: FreeVariable, seen: &mut HashSet<FreeVariable>, out: &mut Vec<FreeVariable>) {
    if seen.insert(var.clone()) {
        out.push(var);
    }
}
