use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic severity.
///
/// Referential problems are always warnings; everything else is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Diagnostic category, determined by code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagCategory {
    /// Wrong row shape (column count).
    Structural,
    /// A field fails its literal grammar.
    Syntactic,
    /// Cross-field contradiction within one row.
    Semantic,
    /// Cross-row or cross-cue inconsistency; never blocks generation.
    Referential,
}

/// Numeric diagnostic code (E100–E499).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DiagCode(pub u16);

impl DiagCode {
    // ── Structural (E100–E199) ──
    pub const WRONG_COLUMN_COUNT: Self = Self(100);

    // ── Syntactic (E200–E299) ──
    pub const BAD_INPUT_REF: Self = Self(200);
    pub const UNKNOWN_TRIGGER: Self = Self(201);
    pub const BAD_TRIGGER_STATE: Self = Self(202);
    pub const BAD_EXIT_STATE: Self = Self(203);
    pub const BAD_OUTPUT_REF: Self = Self(204);
    pub const UNKNOWN_OUTPUT_KIND: Self = Self(205);
    pub const BAD_OFFSET: Self = Self(206);
    pub const BAD_DURATION: Self = Self(207);
    pub const BAD_FREQUENCY: Self = Self(208);

    // ── Semantic (E300–E399) ──
    pub const UNKNOWN_PIN_CLASS: Self = Self(300);
    pub const DORMANT_CLASS_MISMATCH: Self = Self(301);
    pub const MIN_ABOVE_MAX: Self = Self(302);
    pub const UNKNOWN_WAVEFORM: Self = Self(303);
    pub const ALWAYS_EXIT_CONFLICT: Self = Self(304);
    pub const VARIABLE_KIND_MISMATCH: Self = Self(305);
    pub const KIND_CLASS_MISMATCH: Self = Self(306);
    pub const VALUE_OUT_OF_RANGE: Self = Self(307);

    // ── Referential (E400–E499, warnings) ──
    pub const UNREACHABLE_STATE: Self = Self(400);
    pub const UNUSED_VARIABLE: Self = Self(401);
    pub const INPUT_MISMATCH: Self = Self(402);
    pub const BINDING_CONFLICT: Self = Self(403);
    pub const DORMANT_CONFLICT: Self = Self(404);

    /// Get the category for this code.
    pub fn category(self) -> DiagCategory {
        match self.0 {
            100..=199 => DiagCategory::Structural,
            200..=299 => DiagCategory::Syntactic,
            300..=399 => DiagCategory::Semantic,
            _ => DiagCategory::Referential,
        }
    }
}

impl fmt::Display for DiagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

impl fmt::Display for DiagCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structural => write!(f, "structural"),
            Self::Syntactic => write!(f, "syntactic"),
            Self::Semantic => write!(f, "semantic"),
            Self::Referential => write!(f, "referential"),
        }
    }
}

/// A structured compiler diagnostic.
///
/// `row` is the 1-based table line the diagnostic points at, when it points
/// at one at all — whole-pass warnings (unreachable state, unused variable)
/// carry no row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<u32>,
    pub code: DiagCode,
    pub severity: Severity,
    pub category: DiagCategory,
    pub message: String,
}

impl Diagnostic {
    /// Create an error diagnostic attached to a row.
    pub fn error(row: u32, code: DiagCode, message: impl Into<String>) -> Self {
        Self {
            row: Some(row),
            code,
            severity: Severity::Error,
            category: code.category(),
            message: message.into(),
        }
    }

    /// Create a warning attached to a row.
    pub fn warning(row: u32, code: DiagCode, message: impl Into<String>) -> Self {
        Self {
            row: Some(row),
            code,
            severity: Severity::Warning,
            category: code.category(),
            message: message.into(),
        }
    }

    /// Create a whole-pass warning with no row.
    pub fn pass_warning(code: DiagCode, message: impl Into<String>) -> Self {
        Self {
            row: None,
            code,
            severity: Severity::Warning,
            category: code.category(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        match self.row {
            Some(row) => write!(
                f,
                "{label}: row {row}: {} [{}] {}",
                self.code, self.category, self.message
            ),
            None => write!(f, "{label}: {} [{}] {}", self.code, self.category, self.message),
        }
    }
}

impl std::error::Error for Diagnostic {}

/// Accumulated diagnostics for one compilation pass.
///
/// Errors from every row are collected before generation is attempted; a
/// single error anywhere aborts generation entirely. Warnings never block.
/// There is no cap — the CLI prints every diagnostic from the pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if any error occurred.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn push_error(&mut self, diagnostic: Diagnostic) {
        self.errors.push(diagnostic);
    }

    pub fn push_warning(&mut self, diagnostic: Diagnostic) {
        self.warnings.push(diagnostic);
    }

    /// All diagnostics in report order: errors first, then warnings.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.errors.iter().chain(self.warnings.iter())
    }
}
