//! FILENAME: persistence/src/scanner.rs
//! PURPOSE: Scans an xlsx workbook into formula and constant records.
//! CONTEXT: Sheets are visited in workbook order and cells in row-major
//! order, so the registry's id assignment is reproducible run to run. Cells
//! with a stored formula become formula records (calamine strips the leading
//! '=', so the marker is restored here); every other non-empty cell becomes
//! a constant record. Workbook-level defined names land in the global scope.

use std::collections::HashMap;
use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx};
use parser::{Scope, Value};
use registry::Registry;

use crate::coord::cell_name;
use crate::error::PersistenceError;

/// Reads `path` and returns a fresh registry holding every discovered
/// formula and constant record.
pub fn scan_xlsx(path: &Path) -> Result<Registry, PersistenceError> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let sheet_names = workbook.sheet_names().to_vec();
    let mut registry = Registry::new();

    for sheet_name in &sheet_names {
        scan_sheet(&mut workbook, sheet_name, &mut registry)?;
    }

    scan_defined_names(&workbook, &mut registry);

    Ok(registry)
}

fn scan_sheet(
    workbook: &mut Xlsx<std::io::BufReader<std::fs::File>>,
    sheet_name: &str,
    registry: &mut Registry,
) -> Result<(), PersistenceError> {
    let scope = Scope::sheet(sheet_name);

    // Formulas first: the formula range and the value range can start at
    // different positions, so both are keyed by absolute coordinates.
    let formula_range = workbook.worksheet_formula(sheet_name)?;
    let formula_start = formula_range.start().unwrap_or((0, 0));
    let mut cell_formulas: HashMap<(u32, u32), String> = HashMap::new();
    for (row_idx, row) in formula_range.rows().enumerate() {
        for (col_idx, body) in row.iter().enumerate() {
            if body.is_empty() {
                continue;
            }
            cell_formulas.insert(
                (
                    formula_start.0 + row_idx as u32,
                    formula_start.1 + col_idx as u32,
                ),
                body.clone(),
            );
        }
    }

    let value_range = workbook.worksheet_range(sheet_name)?;
    let value_start = value_range.start().unwrap_or((0, 0));
    for (row_idx, row) in value_range.rows().enumerate() {
        for (col_idx, data) in row.iter().enumerate() {
            let position = (
                value_start.0 + row_idx as u32,
                value_start.1 + col_idx as u32,
            );
            let name = cell_name(position.0, position.1);

            if let Some(body) = cell_formulas.remove(&position) {
                registry.record_formula(scope.clone(), name, format!("={}", body));
                continue;
            }

            let value = match data {
                Data::Empty => continue,
                Data::String(s) => Value::Str(s.clone()),
                Data::Float(f) => Value::Number(*f),
                Data::Int(i) => Value::Number(*i as f64),
                Data::Bool(b) => Value::Bool(*b),
                Data::DateTime(dt) => Value::Number(dt.as_f64()),
                Data::DateTimeIso(s) => Value::Str(s.clone()),
                Data::DurationIso(s) => Value::Str(s.clone()),
                Data::Error(calamine::CellErrorType::Ref) => Value::RefError,
                Data::Error(e) => {
                    log::debug!("skipping error cell {}!{}: {:?}", sheet_name, name, e);
                    continue;
                }
            };
            registry.define_constant(scope.clone(), name, value);
        }
    }

    // Formula cells with no cached value, in position order for determinism.
    let mut leftovers: Vec<_> = cell_formulas.into_iter().collect();
    leftovers.sort_by_key(|(position, _)| *position);
    for ((row, col), body) in leftovers {
        registry.record_formula(scope.clone(), cell_name(row, col), format!("={}", body));
    }

    Ok(())
}

/// Workbook-level defined names scan into the global scope. The container
/// stores their content without the formula marker; anything that is not a
/// bare number or boolean is treated as a formula and gets the marker back.
fn scan_defined_names(
    workbook: &Xlsx<std::io::BufReader<std::fs::File>>,
    registry: &mut Registry,
) {
    for (name, content) in workbook.defined_names() {
        if content.is_empty() {
            continue;
        }
        if let Ok(number) = content.parse::<f64>() {
            registry.define_constant(Scope::Global, name.clone(), Value::Number(number));
        } else if content == "TRUE" || content == "FALSE" {
            registry.define_constant(Scope::Global, name.clone(), Value::Bool(content == "TRUE"));
        } else {
            let text = if content.starts_with('=') {
                content.clone()
            } else {
                format!("={}", content)
            };
            registry.record_formula(Scope::Global, name.clone(), text);
        }
    }
}
