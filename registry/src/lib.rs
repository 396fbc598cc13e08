//! FILENAME: registry/src/lib.rs
//! PURPOSE: Library root for the formula/constant registry.
//! CONTEXT: The registry collects the (scope, name) records the workbook
//! scanner discovers, assigns them stable dense ids, and later carries the
//! symbol table mapping each formula to its generated function name. One
//! registry instance per scan batch, passed explicitly through the pipeline.

mod error;
mod registry;

pub use error::NotFoundError;
pub use registry::{ConstantRecord, FormulaRecord, Registry};
