//! Rule: Loop Control
//!
//! `break` and `continue` must sit inside a loop of the same function, and a
//! labelled jump must name one of its enclosing loops.
//!
//! ```text
//! fn f() {
//!     break          // Error: not inside a loop
//!     outer: while (true) {
//!         for (x in xs) { continue outer }   // OK
//!         break inner                          // Error: unknown label
//!     }
//! }
//! ```

use crate::executor::types::ast::{Program, Stmt};

use super::super::{ValidationError, ValidationRule};

/// Rule that checks break/continue placement and labels.
pub struct LoopControlRule;

impl ValidationRule for LoopControlRule {
    fn id(&self) -> &'static str {
        "loop-control"
    }

    fn description(&self) -> &'static str {
        "break and continue must target an enclosing loop"
    }

    fn validate(&self, program: &Program, _source: &str) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for func in &program.functions {
            // Loop labels are scoped to one function body
            let mut loops = Vec::new();
            check_stmt(&func.body, &mut loops, &mut errors, self.id());
        }
        errors
    }
}

/// `loops` holds the label (if any) of each enclosing loop, innermost last
fn check_stmt(
    stmt: &Stmt,
    loops: &mut Vec<Option<String>>,
    errors: &mut Vec<ValidationError>,
    rule_id: &'static str,
) {
    match stmt {
        Stmt::Break { label, span } | Stmt::Continue { label, span } => {
            let keyword = if matches!(stmt, Stmt::Break { .. }) {
                "break"
            } else {
                "continue"
            };
            if loops.is_empty() {
                errors.push(ValidationError::error(
                    *span,
                    format!("'{}' outside of a loop", keyword),
                    rule_id,
                ));
            } else if let Some(name) = label {
                if !loops.iter().any(|l| l.as_deref() == Some(name.as_str())) {
                    errors.push(ValidationError::error(
                        *span,
                        format!("'{} {}' does not name an enclosing loop", keyword, name),
                        rule_id,
                    ));
                }
            }
        }

        Stmt::While { label, body, .. }
        | Stmt::DoWhile { label, body, .. }
        | Stmt::ForEach { label, body, .. } => {
            loops.push(label.clone());
            check_stmt(body, loops, errors, rule_id);
            loops.pop();
        }

        Stmt::For {
            label,
            init,
            update,
            body,
            ..
        } => {
            if let Some(init) = init {
                check_stmt(init, loops, errors, rule_id);
            }
            loops.push(label.clone());
            if let Some(update) = update {
                check_stmt(update, loops, errors, rule_id);
            }
            check_stmt(body, loops, errors, rule_id);
            loops.pop();
        }

        Stmt::Block { body, .. } => {
            for stmt in body {
                check_stmt(stmt, loops, errors, rule_id);
            }
        }

        Stmt::If { then_s, else_s, .. } => {
            check_stmt(then_s, loops, errors, rule_id);
            if let Some(else_stmt) = else_s {
                check_stmt(else_stmt, loops, errors, rule_id);
            }
        }

        Stmt::Try {
            body,
            catches,
            finally,
            ..
        } => {
            check_stmt(body, loops, errors, rule_id);
            for clause in catches {
                check_stmt(&clause.body, loops, errors, rule_id);
            }
            if let Some(finally) = finally {
                check_stmt(finally, loops, errors, rule_id);
            }
        }

        Stmt::Declare { .. }
        | Stmt::Assign { .. }
        | Stmt::Return { .. }
        | Stmt::Throw { .. }
        | Stmt::Emit { .. }
        | Stmt::Expr { .. } => {}
    }
}
