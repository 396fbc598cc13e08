//! FILENAME: parser/src/tests.rs
//! PURPOSE: Consolidated unit tests for the parser crate.

use crate::ast::{free_variables, BinaryOperator, Expr, Scope, UnaryOperator, Value};
use crate::error::FormulaError;
use crate::lexer::Lexer;
use crate::parser::parse_formula;
use crate::reassembly::reassemble;
use crate::token::{Token, TokenKind};

fn lex(text: &str) -> Vec<Token> {
    Lexer::new(text).tokenize().unwrap()
}

fn kinds(text: &str) -> Vec<TokenKind> {
    lex(text).into_iter().map(|t| t.kind).collect()
}

fn parse(text: &str) -> Result<Expr, FormulaError> {
    parse_formula(text, &Scope::sheet("Sheet1"))
}

fn cell(cell: &str) -> Expr {
    Expr::CellRef {
        scope: Scope::sheet("Sheet1"),
        cell: cell.to_string(),
    }
}

fn number(n: f64) -> Expr {
    Expr::Literal(Value::Number(n))
}

// ========================================
// LEXER TESTS
// ========================================

#[test]
fn lexer_tokenizes_simple_math() {
    assert_eq!(
        kinds("=1 + 2"),
        vec![
            TokenKind::Eq,
            TokenKind::Number,
            TokenKind::Whitespace,
            TokenKind::Plus,
            TokenKind::Whitespace,
            TokenKind::Number,
        ]
    );
}

#[test]
fn lexer_keeps_whitespace_and_offsets() {
    let tokens = lex("=A1 + 2");
    assert_eq!(tokens[1].text, "A1");
    assert_eq!(tokens[1].offset, 1);
    assert_eq!(tokens[2].kind, TokenKind::Whitespace);
    assert_eq!(tokens[4].kind, TokenKind::Whitespace);
    assert_eq!(tokens[5].offset, 6);
}

#[test]
fn lexer_cell_name_wins_over_bare_name() {
    // A1 satisfies the loose name pattern too; the cell pattern is tried first
    assert_eq!(kinds("A1"), vec![TokenKind::CellName]);
    assert_eq!(kinds("TaxRate"), vec![TokenKind::Name]);
    // letters-then-digits-then-letters splits at the cell-name boundary
    assert_eq!(kinds("A1B"), vec![TokenKind::CellName, TokenKind::Name]);
}

#[test]
fn lexer_absolute_markers_stay_in_cell_token() {
    let tokens = lex("$A$1");
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::CellName);
    assert_eq!(tokens[0].text, "$A$1");
}

#[test]
fn lexer_booleans_have_word_boundaries() {
    assert_eq!(kinds("TRUE"), vec![TokenKind::Bool]);
    assert_eq!(kinds("FALSE"), vec![TokenKind::Bool]);
    // TRUE5 is column TRUE, row 5
    assert_eq!(kinds("TRUE5"), vec![TokenKind::CellName]);
    assert_eq!(kinds("TRUEISH"), vec![TokenKind::Name]);
}

#[test]
fn lexer_tokenizes_comparison_operators() {
    assert_eq!(
        kinds("<><=>=<>="),
        vec![
            TokenKind::NotEq,
            TokenKind::LessEq,
            TokenKind::GreaterEq,
            TokenKind::NotEq,
            TokenKind::Eq,
        ]
    );
}

#[test]
fn lexer_quotes_are_plain_tokens() {
    assert_eq!(
        kinds("\"ab\""),
        vec![TokenKind::DoubleQuote, TokenKind::Name, TokenKind::DoubleQuote]
    );
    assert_eq!(
        kinds("'My Sheet'"),
        vec![
            TokenKind::SingleQuote,
            TokenKind::Name,
            TokenKind::Whitespace,
            TokenKind::Name,
            TokenKind::SingleQuote,
        ]
    );
}

#[test]
fn lexer_numbers_are_unsigned_with_exponents() {
    assert_eq!(kinds("1.5"), vec![TokenKind::Number]);
    assert_eq!(kinds("2e10"), vec![TokenKind::Number]);
    assert_eq!(kinds("2E-3"), vec![TokenKind::Number]);
    // the sign belongs to the grammar
    assert_eq!(kinds("-2"), vec![TokenKind::Minus, TokenKind::Number]);
}

#[test]
fn lexer_recognizes_ref_error_literal() {
    assert_eq!(kinds("#REF!"), vec![TokenKind::RefError]);
}

#[test]
fn lexer_rejects_unknown_characters() {
    let result = Lexer::new("=A1;B2").tokenize();
    assert_eq!(result, Err(FormulaError::Lex { offset: 3 }));
}

// ========================================
// REASSEMBLY TESTS
// ========================================

fn reassembled(text: &str) -> Vec<Token> {
    reassemble(lex(text)).unwrap()
}

#[test]
fn reassembly_merges_string_runs() {
    let tokens = reassembled("\"Hello World\"");
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::Str);
    assert_eq!(tokens[0].text, "Hello World");
    assert_eq!(tokens[0].offset, 0);
}

#[test]
fn reassembly_collapses_doubled_quotes() {
    let tokens = reassembled("\"ab\"\"cd\"");
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].text, "ab\"cd");
}

#[test]
fn reassembly_closes_string_at_end_of_input() {
    // lenient: a string still open at end of input closes implicitly
    let tokens = reassembled("\"abc");
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::Str);
    assert_eq!(tokens[0].text, "abc");
}

#[test]
fn reassembly_merges_quoted_sheet_names() {
    let tokens = reassembled("'My Sheet'!A1");
    assert_eq!(tokens[0].kind, TokenKind::SheetName);
    assert_eq!(tokens[0].text, "My Sheet");
    assert_eq!(tokens[1].kind, TokenKind::Bang);
    assert_eq!(tokens[2].kind, TokenKind::CellName);
}

#[test]
fn reassembly_errors_on_unterminated_sheet_name() {
    let result = reassemble(lex("'My Sheet"));
    assert!(matches!(result, Err(FormulaError::Parse { offset: 0, .. })));
}

#[test]
fn reassembly_passes_other_tokens_through() {
    let tokens = reassembled("A1+2");
    assert_eq!(
        tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
        vec![TokenKind::CellName, TokenKind::Plus, TokenKind::Number]
    );
}

// ========================================
// PARSER TESTS - LITERALS
// ========================================

#[test]
fn parser_parses_number_literal() {
    assert_eq!(parse("=42").unwrap(), number(42.0));
}

#[test]
fn parser_parses_decimal_number() {
    assert_eq!(parse("=3.14159").unwrap(), number(3.14159));
}

#[test]
fn parser_parses_string_literal() {
    assert_eq!(
        parse("=\"Hello World\"").unwrap(),
        Expr::Literal(Value::Str("Hello World".to_string()))
    );
}

#[test]
fn parser_parses_escaped_quotes_in_string() {
    assert_eq!(
        parse("=\"ab\"\"cd\"").unwrap(),
        Expr::Literal(Value::Str("ab\"cd".to_string()))
    );
}

#[test]
fn parser_parses_booleans() {
    assert_eq!(parse("=TRUE").unwrap(), Expr::Literal(Value::Bool(true)));
    assert_eq!(parse("=FALSE").unwrap(), Expr::Literal(Value::Bool(false)));
}

#[test]
fn parser_parses_ref_error_literal() {
    assert_eq!(parse("=#REF!").unwrap(), Expr::Literal(Value::RefError));
}

// ========================================
// PARSER TESTS - REFERENCES
// ========================================

#[test]
fn parser_parses_simple_cell_ref() {
    assert_eq!(parse("=A1").unwrap(), cell("A1"));
}

#[test]
fn parser_unqualified_ref_inherits_formula_scope() {
    let result = parse_formula("=A1", &Scope::sheet("Budget")).unwrap();
    assert_eq!(
        result,
        Expr::CellRef {
            scope: Scope::sheet("Budget"),
            cell: "A1".to_string()
        }
    );
}

#[test]
fn parser_unqualified_ref_defaults_to_global_scope() {
    // a workbook-level named definition has no enclosing sheet
    let result = parse_formula("=A1+TaxRate", &Scope::Global).unwrap();
    assert_eq!(
        result,
        Expr::BinaryOp {
            op: BinaryOperator::Add,
            left: Box::new(Expr::CellRef {
                scope: Scope::Global,
                cell: "A1".to_string()
            }),
            right: Box::new(Expr::CellRef {
                scope: Scope::Global,
                cell: "TaxRate".to_string()
            }),
        }
    );
}

#[test]
fn parser_strips_absolute_markers() {
    assert_eq!(parse("=$A$1").unwrap(), cell("A1"));
    assert_eq!(parse("=$A$1:$B$10").unwrap(), parse("=A1:B10").unwrap());
}

#[test]
fn parser_parses_range() {
    assert_eq!(
        parse("=A1:B10").unwrap(),
        Expr::CellRange {
            scope: Scope::sheet("Sheet1"),
            start: "A1".to_string(),
            end: "B10".to_string(),
        }
    );
}

#[test]
fn parser_parses_defined_name_reference() {
    assert_eq!(parse("=TaxRate * 2").unwrap(), Expr::BinaryOp {
        op: BinaryOperator::Multiply,
        left: Box::new(cell("TaxRate")),
        right: Box::new(number(2.0)),
    });
}

#[test]
fn parser_parses_bare_sheet_qualifier() {
    let result = parse("=Sheet2!B4").unwrap();
    assert_eq!(
        result,
        Expr::CellRef {
            scope: Scope::sheet("Sheet2"),
            cell: "B4".to_string()
        }
    );
}

#[test]
fn parser_parses_quoted_sheet_qualifier() {
    let result = parse("='Sheet Two'!A1").unwrap();
    assert_eq!(
        result,
        Expr::CellRef {
            scope: Scope::sheet("Sheet Two"),
            cell: "A1".to_string()
        }
    );
}

#[test]
fn parser_parses_qualified_range() {
    let result = parse("='Q1 Data'!A1:A3").unwrap();
    assert_eq!(
        result,
        Expr::CellRange {
            scope: Scope::sheet("Q1 Data"),
            start: "A1".to_string(),
            end: "A3".to_string(),
        }
    );
}

#[test]
fn parser_rejects_name_range_endpoints() {
    // ranges need plain cell addresses on both ends
    assert!(parse("=Alpha:Beta").is_err());
    assert!(parse("=A1:Beta").is_err());
}

// ========================================
// PARSER TESTS - OPERATORS AND PRECEDENCE
// ========================================

#[test]
fn parser_parses_addition_of_cells() {
    assert_eq!(
        parse("=A1+B2").unwrap(),
        Expr::BinaryOp {
            op: BinaryOperator::Add,
            left: Box::new(cell("A1")),
            right: Box::new(cell("B2")),
        }
    );
}

#[test]
fn parser_folds_chains_left_associatively() {
    // A1+B2+C3 --> (A1+B2)+C3
    assert_eq!(
        parse("=A1+B2+C3").unwrap(),
        Expr::BinaryOp {
            op: BinaryOperator::Add,
            left: Box::new(Expr::BinaryOp {
                op: BinaryOperator::Add,
                left: Box::new(cell("A1")),
                right: Box::new(cell("B2")),
            }),
            right: Box::new(cell("C3")),
        }
    );
}

#[test]
fn parser_term_ops_bind_tighter() {
    // 1 + 2 * 3 --> 1 + (2 * 3)
    assert_eq!(
        parse("=1 + 2 * 3").unwrap(),
        Expr::BinaryOp {
            op: BinaryOperator::Add,
            left: Box::new(number(1.0)),
            right: Box::new(Expr::BinaryOp {
                op: BinaryOperator::Multiply,
                left: Box::new(number(2.0)),
                right: Box::new(number(3.0)),
            }),
        }
    );
}

#[test]
fn parser_concat_shares_expr_precedence() {
    // & sits in the same class as +, so the chain folds left
    assert_eq!(
        parse("=A1 & B2 + C3").unwrap(),
        Expr::BinaryOp {
            op: BinaryOperator::Add,
            left: Box::new(Expr::BinaryOp {
                op: BinaryOperator::Concat,
                left: Box::new(cell("A1")),
                right: Box::new(cell("B2")),
            }),
            right: Box::new(cell("C3")),
        }
    );
}

#[test]
fn parser_comparison_folds_with_expr_class() {
    assert_eq!(
        parse("=A1 = 10").unwrap(),
        Expr::BinaryOp {
            op: BinaryOperator::Equal,
            left: Box::new(cell("A1")),
            right: Box::new(number(10.0)),
        }
    );
}

#[test]
fn parser_power_folds_left_within_term() {
    // 2 ^ 3 ^ 2 --> (2 ^ 3) ^ 2
    assert_eq!(
        parse("=2^3^2").unwrap(),
        Expr::BinaryOp {
            op: BinaryOperator::Power,
            left: Box::new(Expr::BinaryOp {
                op: BinaryOperator::Power,
                left: Box::new(number(2.0)),
                right: Box::new(number(3.0)),
            }),
            right: Box::new(number(2.0)),
        }
    );
}

#[test]
fn parser_handles_parentheses_override() {
    assert_eq!(
        parse("=(1 + 2) * 3").unwrap(),
        Expr::BinaryOp {
            op: BinaryOperator::Multiply,
            left: Box::new(Expr::BinaryOp {
                op: BinaryOperator::Add,
                left: Box::new(number(1.0)),
                right: Box::new(number(2.0)),
            }),
            right: Box::new(number(3.0)),
        }
    );
}

#[test]
fn parser_unary_prefix_applies_to_first_term() {
    // -A1+B2 --> (-A1)+B2
    assert_eq!(
        parse("=-A1+B2").unwrap(),
        Expr::BinaryOp {
            op: BinaryOperator::Add,
            left: Box::new(Expr::UnaryOp {
                op: UnaryOperator::Negate,
                operand: Box::new(cell("A1")),
            }),
            right: Box::new(cell("B2")),
        }
    );
}

#[test]
fn parser_unary_wraps_whole_first_term() {
    // -2^2 --> -(2^2): the prefix applies to the term, not the factor
    assert_eq!(
        parse("=-2^2").unwrap(),
        Expr::UnaryOp {
            op: UnaryOperator::Negate,
            operand: Box::new(Expr::BinaryOp {
                op: BinaryOperator::Power,
                left: Box::new(number(2.0)),
                right: Box::new(number(2.0)),
            }),
        }
    );
}

#[test]
fn parser_unary_plus_is_recognized() {
    assert_eq!(
        parse("=+A1").unwrap(),
        Expr::UnaryOp {
            op: UnaryOperator::Plus,
            operand: Box::new(cell("A1")),
        }
    );
}

#[test]
fn parser_negative_operand_via_parentheses() {
    // the prefix is not recursive; a nested sign needs grouping
    assert_eq!(
        parse("=1+(-2)").unwrap(),
        Expr::BinaryOp {
            op: BinaryOperator::Add,
            left: Box::new(number(1.0)),
            right: Box::new(Expr::UnaryOp {
                op: UnaryOperator::Negate,
                operand: Box::new(number(2.0)),
            }),
        }
    );
}

// ========================================
// PARSER TESTS - FUNCTION CALLS
// ========================================

#[test]
fn parser_parses_function_no_args() {
    assert_eq!(
        parse("=NOW()").unwrap(),
        Expr::FunctionCall {
            name: "NOW".to_string(),
            args: vec![]
        }
    );
}

#[test]
fn parser_parses_function_with_range_and_number() {
    assert_eq!(
        parse("=SUM(A1:A3,5)").unwrap(),
        Expr::FunctionCall {
            name: "SUM".to_string(),
            args: vec![
                Expr::CellRange {
                    scope: Scope::sheet("Sheet1"),
                    start: "A1".to_string(),
                    end: "A3".to_string(),
                },
                number(5.0),
            ],
        }
    );
}

#[test]
fn parser_parses_nested_function_calls() {
    assert_eq!(
        parse("=IF(A1>0, SUM(B1:B2), \"none\")").unwrap(),
        Expr::FunctionCall {
            name: "IF".to_string(),
            args: vec![
                Expr::BinaryOp {
                    op: BinaryOperator::GreaterThan,
                    left: Box::new(cell("A1")),
                    right: Box::new(number(0.0)),
                },
                Expr::FunctionCall {
                    name: "SUM".to_string(),
                    args: vec![Expr::CellRange {
                        scope: Scope::sheet("Sheet1"),
                        start: "B1".to_string(),
                        end: "B2".to_string(),
                    }],
                },
                Expr::Literal(Value::Str("none".to_string())),
            ],
        }
    );
}

#[test]
fn parser_name_without_paren_is_a_reference() {
    // only name-then-( is a call; a bare name is a defined-name reference
    assert_eq!(parse("=Total").unwrap(), cell("Total"));
}

// ========================================
// PARSER TESTS - ERROR CASES
// ========================================

#[test]
fn parser_error_on_missing_marker() {
    assert!(matches!(
        parse("1 + 2"),
        Err(FormulaError::Parse { offset: 0, .. })
    ));
}

#[test]
fn parser_error_on_empty_formula() {
    assert!(parse("=").is_err());
}

#[test]
fn parser_error_on_unclosed_paren() {
    // never a partial or silently truncated tree
    assert!(parse("=A1+(B2").is_err());
}

#[test]
fn parser_error_on_unclosed_function() {
    assert!(parse("=SUM(1, 2").is_err());
}

#[test]
fn parser_error_on_trailing_operator() {
    assert!(parse("=1 +").is_err());
}

#[test]
fn parser_error_on_trailing_tokens() {
    assert!(parse("=1 2").is_err());
}

#[test]
fn parser_error_on_truncated_range() {
    assert!(parse("=SUM(A1:)").is_err());
}

#[test]
fn parser_error_on_unterminated_sheet_name() {
    assert!(parse("='Sheet Two!A1").is_err());
}

// ========================================
// DETERMINISM
// ========================================

#[test]
fn parser_is_deterministic() {
    let texts = [
        "=SUM(A1:A3,5)*2",
        "='Sheet Two'!A1 & \"x\"",
        "=-A1+B2+C3",
        "=IF(A1>=10, \"big\", \"small\")",
    ];
    for text in texts {
        assert_eq!(parse(text).unwrap(), parse(text).unwrap());
    }
}

// ========================================
// FREE VARIABLES
// ========================================

#[test]
fn free_variables_dedup_in_dfs_order() {
    let expr = parse("=A1+SUM(B1:B3,A1)*C2").unwrap();
    let vars = free_variables(&expr);
    let names: Vec<&str> = vars.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["A1", "B1:B3", "C2"]);
    for var in &vars {
        assert_eq!(var.scope, Scope::sheet("Sheet1"));
    }
}

#[test]
fn free_variables_track_qualified_scopes() {
    let expr = parse("=Sheet2!A1+A1").unwrap();
    let vars = free_variables(&expr);
    assert_eq!(vars.len(), 2);
    assert_eq!(vars[0].scope, Scope::sheet("Sheet2"));
    assert_eq!(vars[1].scope, Scope::sheet("Sheet1"));
}

#[test]
fn free_variables_ignore_literals() {
    let expr = parse("=1+2*3 & \"x\"").unwrap();
    assert!(free_variables(&expr).is_empty());
}
