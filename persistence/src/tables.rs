//! FILENAME: persistence/src/tables.rs
//! PURPOSE: The persisted intermediate tables between scanning and parsing.
//! CONTEXT: Two CSV files with a header row each: the formula table
//! (id, scope, name, formula) and the constant table (id, scope, name,
//! value). The global scope serializes as its sentinel string. Loading a
//! table re-records rows in file order into a fresh registry, which must
//! reproduce the persisted ids exactly; a mismatch means the file was edited
//! or reordered and is rejected.

use std::path::Path;

use parser::{Scope, Value};
use registry::Registry;
use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;

#[derive(Debug, Serialize, Deserialize)]
struct FormulaRow {
    id: u32,
    scope: String,
    name: String,
    formula: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ConstantRow {
    id: u32,
    scope: String,
    name: String,
    value: String,
}

pub fn write_formula_table(registry: &Registry, path: &Path) -> Result<(), PersistenceError> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in registry.formulas() {
        writer.serialize(FormulaRow {
            id: record.id,
            scope: record.scope.to_string(),
            name: record.name.clone(),
            formula: record.text.clone(),
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_constant_table(registry: &Registry, path: &Path) -> Result<(), PersistenceError> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in registry.constants() {
        writer.serialize(ConstantRow {
            id: record.id,
            scope: record.scope.to_string(),
            name: record.name.clone(),
            value: value_field(&record.value),
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Loads a formula table into `registry`, verifying that re-recording in
/// file order reproduces the persisted ids.
pub fn read_formula_table(path: &Path, registry: &mut Registry) -> Result<(), PersistenceError> {
    let mut reader = csv::Reader::from_path(path)?;
    for row in reader.deserialize() {
        let row: FormulaRow = row?;
        let id = registry.record_formula(Scope::from_name(&row.scope), row.name, row.formula);
        if id != row.id {
            return Err(PersistenceError::InvalidFormat(format!(
                "formula table row {} re-registered as id {}",
                row.id, id
            )));
        }
    }
    Ok(())
}

pub fn read_constant_table(path: &Path, registry: &mut Registry) -> Result<(), PersistenceError> {
    let mut reader = csv::Reader::from_path(path)?;
    for row in reader.deserialize() {
        let row: ConstantRow = row?;
        let value = parse_value_field(&row.value);
        let id = registry.define_constant(Scope::from_name(&row.scope), row.name, value);
        if id != row.id {
            return Err(PersistenceError::InvalidFormat(format!(
                "constant table row {} re-registered as id {}",
                row.id, id
            )));
        }
    }
    Ok(())
}

/// Display form for the value column. Values round-trip by shape on load.
fn value_field(value: &Value) -> String {
    match value {
        Value::Number(n) => n.to_string(),
        Value::Str(s) => s.clone(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::RefError => "#REF!".to_string(),
    }
}

fn parse_value_field(field: &str) -> Value {
    match field {
        "TRUE" => Value::Bool(true),
        "FALSE" => Value::Bool(false),
        "#REF!" => Value::RefError,
        _ => field
            .parse::<f64>()
            .map(Value::Number)
            .unwrap_or_else(|_| Value::Str(field.to_string())),
    }
}
