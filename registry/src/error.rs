//! FILENAME: registry/src/error.rs

use thiserror::Error;

/// Lookup failure for a (scope, name) that was never registered. This means
/// the calling stage broke its contract (e.g. code generation asking for a
/// symbol that was never assigned); it is not a recoverable input condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no {kind} registered for {scope}::{name}")]
pub struct NotFoundError {
    pub kind: &'static str,
    pub scope: String,
    pub name: String,
}
