//! Exception kinds and values
//!
//! Exceptions are plain values: they travel through `Control::Throw` and end up
//! either bound to a catch clause or reported as `ExecutionOutcome::Raised`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Exception kind tag
///
/// The first three kinds are the ones fixtures raise and catch explicitly.
/// The remaining kinds are raised by the evaluator itself when an operation
/// cannot be carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExceptionKind {
    /// Division or remainder by zero
    ArithmeticFailure,
    /// Explicit raise for an invalid argument
    ArgumentFailure,
    /// Resource acquisition, read or release failure
    ResourceFailure,
    /// Operand of the wrong type
    TypeFailure,
    /// Index outside the bounds of a list or string
    IndexFailure,
    /// Undefined variable or function at runtime
    NameFailure,
    /// Call nesting deeper than the configured limit
    CallDepthFailure,
    /// Configured step budget exhausted
    BudgetFailure,
}

impl ExceptionKind {
    /// Every kind, in declaration order
    pub const ALL: [ExceptionKind; 8] = [
        ExceptionKind::ArithmeticFailure,
        ExceptionKind::ArgumentFailure,
        ExceptionKind::ResourceFailure,
        ExceptionKind::TypeFailure,
        ExceptionKind::IndexFailure,
        ExceptionKind::NameFailure,
        ExceptionKind::CallDepthFailure,
        ExceptionKind::BudgetFailure,
    ];

    /// Name used in fixture source and in output
    pub fn name(&self) -> &'static str {
        match self {
            ExceptionKind::ArithmeticFailure => "ArithmeticFailure",
            ExceptionKind::ArgumentFailure => "ArgumentFailure",
            ExceptionKind::ResourceFailure => "ResourceFailure",
            ExceptionKind::TypeFailure => "TypeFailure",
            ExceptionKind::IndexFailure => "IndexFailure",
            ExceptionKind::NameFailure => "NameFailure",
            ExceptionKind::CallDepthFailure => "CallDepthFailure",
            ExceptionKind::BudgetFailure => "BudgetFailure",
        }
    }

    /// Look up a kind by its source name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.name() == name)
    }
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Exception value with kind and message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exception {
    pub kind: ExceptionKind,
    pub message: String,
    /// Release failures that occurred while this exception was propagating
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suppressed: Vec<Exception>,
}

impl Exception {
    /// Create a new exception with kind and message
    pub fn new(kind: ExceptionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            suppressed: Vec::new(),
        }
    }

    pub fn arithmetic(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::ArithmeticFailure, message)
    }

    pub fn argument(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::ArgumentFailure, message)
    }

    pub fn resource(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::ResourceFailure, message)
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::TypeFailure, message)
    }

    pub fn index(index: i64, len: usize) -> Self {
        Self::new(
            ExceptionKind::IndexFailure,
            format!("Index {} out of bounds for length {}", index, len),
        )
    }

    pub fn name(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::NameFailure, message)
    }

    /// Division or remainder by zero
    pub fn division_by_zero() -> Self {
        Self::arithmetic("/ by zero")
    }

    /// Attach a suppressed exception, keeping this one as the primary
    pub fn suppress(&mut self, other: Exception) {
        self.suppressed.push(other);
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in ExceptionKind::ALL {
            assert_eq!(ExceptionKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ExceptionKind::from_name("Exception"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Exception::division_by_zero().to_string(),
            "ArithmeticFailure: / by zero"
        );
        assert_eq!(
            Exception::new(ExceptionKind::ArgumentFailure, "").to_string(),
            "ArgumentFailure"
        );
    }

    #[test]
    fn test_suppress_keeps_primary() {
        let mut primary = Exception::argument("bad");
        primary.suppress(Exception::resource("close failed"));
        assert_eq!(primary.kind, ExceptionKind::ArgumentFailure);
        assert_eq!(primary.suppressed.len(), 1);
        assert_eq!(primary.suppressed[0].kind, ExceptionKind::ResourceFailure);
    }
}
