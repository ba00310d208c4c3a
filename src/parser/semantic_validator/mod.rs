//! Semantic validation for fixture programs
//!
//! A rule-based pass that runs after parsing to catch mistakes the grammar
//! can't express: stray loop control, undefined names, shadowed declarations
//! and dead statements.
//!
//! # Usage
//!
//! ```ignore
//! use guardflow::parser::{parse_program, semantic_validator::validate_program};
//!
//! let program = parse_program(source)?;
//! for finding in validate_program(&program, source) {
//!     eprintln!("{}", finding);
//! }
//! ```
//!
//! # Adding a New Rule
//!
//! 1. Create a new file in `semantic_validator/rules/`
//! 2. Implement `ValidationRule` for your struct
//! 3. Add it to the `Validator::new()` constructor

pub mod rules;

use crate::executor::types::ast::{Program, Span};

// ============================================================================
// Validation Error Types
// ============================================================================

/// A finding produced by semantic analysis.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The source location of the issue
    pub span: Span,
    /// Human-readable message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Which rule produced this finding
    pub rule_id: &'static str,
}

/// Severity levels for validation findings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The program is rejected
    Error,
    /// Reported by `check`, does not block loading
    Warning,
}

impl ValidationError {
    pub fn error(span: Span, message: impl Into<String>, rule_id: &'static str) -> Self {
        Self {
            span,
            message: message.into(),
            severity: Severity::Error,
            rule_id,
        }
    }

    pub fn warning(span: Span, message: impl Into<String>, rule_id: &'static str) -> Self {
        Self {
            span,
            message: message.into(),
            severity: Severity::Warning,
            rule_id,
        }
    }

    /// Check if this is an error (not a warning)
    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(
            f,
            "{} at line {}, col {}: {} [{}]",
            severity,
            self.span.start_line + 1,
            self.span.start_col + 1,
            self.message,
            self.rule_id
        )
    }
}

impl std::error::Error for ValidationError {}

// ============================================================================
// ValidationRule Trait
// ============================================================================

/// Trait that all validation rules implement.
///
/// Rules are independent of each other; each one checks a single concern.
pub trait ValidationRule: Send + Sync {
    /// Unique identifier for this rule (e.g., "undefined-name")
    fn id(&self) -> &'static str;

    /// Human-readable description of what this rule checks
    fn description(&self) -> &'static str;

    /// Run the validation and return any findings. Empty means no issues.
    fn validate(&self, program: &Program, source: &str) -> Vec<ValidationError>;
}

// ============================================================================
// Validator - Runs All Rules
// ============================================================================

/// Runs every registered rule over a program.
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    /// Create a new validator with all built-in rules.
    pub fn new() -> Self {
        Self {
            rules: vec![
                // Error rules
                Box::new(rules::LoopControlRule),
                Box::new(rules::UndefinedNameRule),
                Box::new(rules::DuplicateDeclarationRule),
                // Warning rules
                Box::new(rules::UnreachableCodeRule),
            ],
        }
    }

    /// Run all validation rules and collect findings.
    pub fn validate(&self, program: &Program, source: &str) -> Vec<ValidationError> {
        self.rules
            .iter()
            .flat_map(|rule| rule.validate(program, source))
            .collect()
    }

    /// Registered rules as `(id, description)` pairs
    pub fn rules(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.rules.iter().map(|r| (r.id(), r.description()))
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Validate a program and return all findings.
pub fn validate_program(program: &Program, source: &str) -> Vec<ValidationError> {
    Validator::new().validate(program, source)
}

/// Check if a program has any error-severity findings.
pub fn has_errors(program: &Program, source: &str) -> bool {
    validate_program(program, source)
        .iter()
        .any(|e| e.is_error())
}
