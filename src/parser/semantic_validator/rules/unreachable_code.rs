//! Rule: Unreachable Code
//!
//! Warns about statements that follow `return`, `throw`, `break` or
//! `continue` in the same block. One warning per block.

use crate::executor::types::ast::{Program, Stmt};

use super::super::{ValidationError, ValidationRule};

pub struct UnreachableCodeRule;

impl ValidationRule for UnreachableCodeRule {
    fn id(&self) -> &'static str {
        "unreachable-code"
    }

    fn description(&self) -> &'static str {
        "Statements after an unconditional jump never run"
    }

    fn validate(&self, program: &Program, _source: &str) -> Vec<ValidationError> {
        let mut warnings = Vec::new();
        for func in &program.functions {
            check_stmt(&func.body, &mut warnings, self.id());
        }
        warnings
    }
}

fn check_stmt(stmt: &Stmt, warnings: &mut Vec<ValidationError>, rule_id: &'static str) {
    match stmt {
        Stmt::Block { body, .. } => {
            if let Some(pos) = body.iter().position(Stmt::is_abrupt) {
                if let Some(dead) = body.get(pos + 1) {
                    warnings.push(ValidationError::warning(
                        dead.span(),
                        format!("Unreachable code after '{}'", jump_keyword(&body[pos])),
                        rule_id,
                    ));
                }
            }
            for stmt in body {
                check_stmt(stmt, warnings, rule_id);
            }
        }

        Stmt::If { then_s, else_s, .. } => {
            check_stmt(then_s, warnings, rule_id);
            if let Some(else_stmt) = else_s {
                check_stmt(else_stmt, warnings, rule_id);
            }
        }

        Stmt::While { body, .. } | Stmt::DoWhile { body, .. } | Stmt::ForEach { body, .. } => {
            check_stmt(body, warnings, rule_id)
        }

        Stmt::For { body, .. } => check_stmt(body, warnings, rule_id),

        Stmt::Try {
            body,
            catches,
            finally,
            ..
        } => {
            check_stmt(body, warnings, rule_id);
            for clause in catches {
                check_stmt(&clause.body, warnings, rule_id);
            }
            if let Some(finally) = finally {
                check_stmt(finally, warnings, rule_id);
            }
        }

        _ => {}
    }
}

fn jump_keyword(stmt: &Stmt) -> &'static str {
    match stmt {
        Stmt::Return { .. } => "return",
        Stmt::Throw { .. } => "throw",
        Stmt::Break { .. } => "break",
        _ => "continue",
    }
}
