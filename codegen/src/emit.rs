//! FILENAME: codegen/src/emit.rs
//! PURPOSE: Symbol naming and per-formula stub emission.
//! CONTEXT: Each formula becomes one Python function skeleton: a provenance
//! comment header, a signature whose parameters are the formula's free
//! variables in first-encountered order, and a pass body. The symbol comes
//! from the registry's symbol table; an id prefix keeps symbols unique even
//! when sanitization collides.

use parser::{free_variables, Expr, FreeVariable, Scope};
use registry::{FormulaRecord, NotFoundError, Registry};

use crate::pipeline::ParsedFormula;

/// Lowercases and folds every non-alphanumeric character to '_'.
fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

fn scope_label(scope: &Scope) -> String {
    match scope {
        Scope::Global => "wb".to_string(),
        Scope::Sheet(name) => sanitize(name),
    }
}

/// The generated function name for one formula record.
pub fn symbol_for(record: &FormulaRecord) -> String {
    format!(
        "f{}_{}_{}",
        record.id,
        scope_label(&record.scope),
        sanitize(&record.name)
    )
}

fn parameter_name(variable: &FreeVariable) -> String {
    format!("{}_{}", scope_label(&variable.scope), sanitize(&variable.name))
}

/// Populates the symbol table for the given parsed formulas. One sequential
/// pass, run after parsing and before any emission reads the table.
pub fn assign_generated_names(registry: &mut Registry, parsed: &[ParsedFormula]) {
    let records: Vec<FormulaRecord> = parsed
        .iter()
        .map(|p| registry.formulas()[(p.id - 1) as usize].clone())
        .collect();
    for record in records {
        let symbol = symbol_for(&record);
        registry.set_generated_name(&record.scope, &record.name, symbol);
    }
}

/// Emits one function skeleton for a parsed formula.
pub fn emit_function(
    record: &FormulaRecord,
    ast: &Expr,
    registry: &Registry,
) -> Result<String, NotFoundError> {
    let symbol = registry.get_generated_name(&record.scope, &record.name)?;
    let parameters: Vec<String> = free_variables(ast).iter().map(parameter_name).collect();

    let mut lines = Vec::new();
    lines.push(format!("# formula {}", record.id));
    lines.push(format!("# scope = {}", record.scope));
    lines.push(format!("# name = {}", record.name));
    lines.push("# source formula:".to_string());
    lines.push(format!("# {}", record.text));
    lines.push(format!("def {}({}):", symbol, parameters.join(", ")));
    lines.push("    pass".to_string());
    lines.push(String::new());
    Ok(lines.join("\n"))
}
