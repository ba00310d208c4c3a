//! Rule: Duplicate Declaration
//!
//! Variables live in one flat environment per call, so a nested declaration
//! would clobber the outer binding and remove it on scope exit. Any name that
//! is already visible may not be declared again. The same goes for function
//! names (which may also not shadow builtins or exception kinds) and for
//! parameter lists.

use std::collections::HashSet;

use crate::executor::errors::ExceptionKind;
use crate::executor::stdlib::Builtin;
use crate::executor::types::ast::{Program, Span, Stmt};

use super::super::{ValidationError, ValidationRule};

/// Rule that rejects shadowing and repeated names.
pub struct DuplicateDeclarationRule;

impl ValidationRule for DuplicateDeclarationRule {
    fn id(&self) -> &'static str {
        "duplicate-declaration"
    }

    fn description(&self) -> &'static str {
        "A name may be declared only once where it is visible"
    }

    fn validate(&self, program: &Program, _source: &str) -> Vec<ValidationError> {
        let rule_id = self.id();
        let mut errors = Vec::new();
        let mut functions = HashSet::new();

        for func in &program.functions {
            if !functions.insert(func.name.as_str()) {
                errors.push(ValidationError::error(
                    func.span,
                    format!("Function '{}' is defined more than once", func.name),
                    rule_id,
                ));
            }
            if Builtin::from_name(&func.name).is_some()
                || ExceptionKind::from_name(&func.name).is_some()
            {
                errors.push(ValidationError::error(
                    func.span,
                    format!("Function '{}' collides with a builtin name", func.name),
                    rule_id,
                ));
            }

            let mut visible = HashSet::new();
            for param in &func.params {
                declare(param, func.span, &mut visible, &mut errors, rule_id);
            }
            check_stmt(&func.body, &mut visible, &mut errors, rule_id);
        }

        errors
    }
}

fn declare(
    name: &str,
    span: Span,
    visible: &mut HashSet<String>,
    errors: &mut Vec<ValidationError>,
    rule_id: &'static str,
) {
    if !visible.insert(name.to_string()) {
        errors.push(ValidationError::error(
            span,
            format!("'{}' is already declared", name),
            rule_id,
        ));
    }
}

/// `visible` is cloned at every nested scope so siblings may reuse a name
fn check_stmt(
    stmt: &Stmt,
    visible: &mut HashSet<String>,
    errors: &mut Vec<ValidationError>,
    rule_id: &'static str,
) {
    let span = stmt.span();

    match stmt {
        Stmt::Declare { name, .. } => declare(name, span, visible, errors, rule_id),

        Stmt::Block { body, .. } => {
            let mut inner = visible.clone();
            for stmt in body {
                check_stmt(stmt, &mut inner, errors, rule_id);
            }
        }

        Stmt::If { then_s, else_s, .. } => {
            check_stmt(then_s, &mut visible.clone(), errors, rule_id);
            if let Some(else_stmt) = else_s {
                check_stmt(else_stmt, &mut visible.clone(), errors, rule_id);
            }
        }

        Stmt::While { body, .. } | Stmt::DoWhile { body, .. } => {
            check_stmt(body, &mut visible.clone(), errors, rule_id);
        }

        Stmt::For {
            init, update, body, ..
        } => {
            let mut loop_scope = visible.clone();
            if let Some(init) = init {
                check_stmt(init, &mut loop_scope, errors, rule_id);
            }
            if let Some(update) = update {
                check_stmt(update, &mut loop_scope.clone(), errors, rule_id);
            }
            check_stmt(body, &mut loop_scope, errors, rule_id);
        }

        Stmt::ForEach { binding, body, .. } => {
            let mut body_scope = visible.clone();
            declare(binding, span, &mut body_scope, errors, rule_id);
            check_stmt(body, &mut body_scope, errors, rule_id);
        }

        Stmt::Try {
            resources,
            body,
            catches,
            finally,
            ..
        } => {
            let mut body_scope = visible.clone();
            for decl in resources {
                declare(&decl.name, span, &mut body_scope, errors, rule_id);
            }
            check_stmt(body, &mut body_scope, errors, rule_id);

            for clause in catches {
                let mut catch_scope = visible.clone();
                declare(&clause.binding, span, &mut catch_scope, errors, rule_id);
                check_stmt(&clause.body, &mut catch_scope, errors, rule_id);
            }

            if let Some(finally) = finally {
                check_stmt(finally, &mut visible.clone(), errors, rule_id);
            }
        }

        Stmt::Assign { .. }
        | Stmt::Return { .. }
        | Stmt::Throw { .. }
        | Stmt::Emit { .. }
        | Stmt::Expr { .. }
        | Stmt::Break { .. }
        | Stmt::Continue { .. } => {}
    }
}
