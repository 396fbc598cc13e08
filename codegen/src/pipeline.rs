//! FILENAME: codegen/src/pipeline.rs
//! PURPOSE: Batch driver: parse every registered formula, then emit stubs.
//! CONTEXT: A lex or parse error aborts only the formula it occurred in. The
//! failing id and message are recorded and the batch continues; a run never
//! dies on one bad formula. Symbol assignment happens in one sequential pass
//! after parsing, before emission reads the table.

use parser::{parse_formula, Expr};
use registry::{FormulaRecord, NotFoundError, Registry};

use crate::emit::{assign_generated_names, emit_function};

/// One successfully parsed formula, keyed by its registry id.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFormula {
    pub id: u32,
    pub ast: Expr,
}

/// A formula the front end rejected, with the error it reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaFailure {
    pub id: u32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompileOutput {
    /// The emitted module: one function skeleton per parsed formula, id order.
    pub module: String,
    pub parsed: Vec<ParsedFormula>,
    pub failures: Vec<FormulaFailure>,
}

/// Parses every formula record under its own scope and emits the module.
pub fn compile(registry: &mut Registry) -> Result<CompileOutput, NotFoundError> {
    let records: Vec<FormulaRecord> = registry.formulas().to_vec();

    let mut parsed = Vec::new();
    let mut failures = Vec::new();
    for record in &records {
        match parse_formula(&record.text, &record.scope) {
            Ok(ast) => parsed.push(ParsedFormula {
                id: record.id,
                ast,
            }),
            Err(error) => {
                log::warn!(
                    "skipping formula {} ({}::{}): {}",
                    record.id,
                    record.scope,
                    record.name,
                    error
                );
                failures.push(FormulaFailure {
                    id: record.id,
                    message: error.to_string(),
                });
            }
        }
    }

    assign_generated_names(registry, &parsed);

    let mut module = String::new();
    for item in &parsed {
        let record = &records[(item.id - 1) as usize];
        module.push_str(&emit_function(record, &item.ast, registry)?);
        module.push('\n');
    }

    Ok(CompileOutput {
        module,
        parsed,
        failures,
    })
}
