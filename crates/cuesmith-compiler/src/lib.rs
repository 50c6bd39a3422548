//! Cuesmith compiler: orchestrates the full compilation pipeline.
//!
//! ```text
//! Effect Table → Reader → Row Validator → Model Builder → Sketch Codegen → .ino
//! ```
//!
//! Compilation is all-or-nothing. Every row is swept and every diagnostic
//! collected before generation is attempted; a single error anywhere means
//! no sketch. Warnings never block.

pub mod model;

use std::fmt::Write as _;

use cuesmith_codegen::CodegenError;
use cuesmith_signals::Registry;
use cuesmith_table::{read_records, RowValidator};
use cuesmith_types::{Diagnostics, ShowModel};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

pub use model::build_model;

#[derive(Debug, Error)]
pub enum CompileError {
    /// The table failed validation; carries every diagnostic from the pass.
    #[error("table contains {} error(s)", .0.errors.len())]
    Invalid(Diagnostics),
    /// A model invariant broke inside the generator. Indicates a compiler
    /// bug, not a table problem.
    #[error(transparent)]
    Codegen(#[from] CodegenError),
}

/// A successful compilation: the sketch text plus everything worth
/// reporting about it.
#[derive(Debug)]
pub struct CompileOutput {
    pub sketch: String,
    pub model: ShowModel,
    /// Truncated sha-256 of the table, as embedded in the sketch header.
    pub fingerprint: String,
    /// Warnings only; a compilation with errors never reaches this type.
    pub diagnostics: Diagnostics,
}

impl CompileOutput {
    /// The derived show model as pretty-printed JSON, for inspection.
    pub fn model_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.model)
    }
}

/// Compile a whole effect table into sketch source.
///
/// `source_name` is only recorded in the generated header; it does not
/// affect how the table is read.
pub fn compile(source: &str, source_name: &str) -> Result<CompileOutput, CompileError> {
    let mut diags = Diagnostics::new();
    let registry = Registry::standard();

    let records = read_records(source, &mut diags);
    debug!(records = records.len(), "table read");

    let mut validator = RowValidator::new(&registry);
    let validated: Vec<_> = records
        .iter()
        .filter_map(|raw| validator.validate(raw, &mut diags))
        .collect();
    debug!(valid = validated.len(), errors = diags.errors.len(), "rows validated");

    let model = build_model(validated, &mut diags);

    if diags.has_errors() {
        return Err(CompileError::Invalid(diags));
    }

    let fingerprint = fingerprint(source);
    let sketch = cuesmith_codegen::generate_sketch(&model, &registry, source_name, &fingerprint)?;
    debug!(bytes = sketch.len(), %fingerprint, "sketch generated");

    Ok(CompileOutput {
        sketch,
        model,
        fingerprint,
        diagnostics: diags,
    })
}

/// First 12 hex digits of the table's sha-256.
fn fingerprint(source: &str) -> String {
    let digest = Sha256::digest(source.as_bytes());
    let mut hex = String::with_capacity(12);
    for byte in &digest[..6] {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable_and_twelve_hex_digits() {
        let fp = fingerprint("a,b,c\n");
        assert_eq!(fp.len(), 12);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(fp, fingerprint("a,b,c\n"));
        assert_ne!(fp, fingerprint("a,b,d\n"));
    }
}
