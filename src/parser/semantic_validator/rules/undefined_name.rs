//! Rule: Undefined Name
//!
//! Reports an error when a variable is used outside the scope that declares
//! it, when a call names a function that doesn't exist, or when a call passes
//! the wrong number of arguments.
//!
//! # Examples
//!
//! ```text
//! // Error: 'x' is used before declaration
//! let y = x + 1
//! let x = 5
//! ```
//!
//! ```text
//! // Error: 'r' only exists inside the try body
//! try (r = open(path)) { println(r.readLine()) } finally { println(r) }
//! ```

use std::collections::HashSet;

use crate::executor::stdlib::Builtin;
use crate::executor::types::ast::{Expr, Program, Span, Stmt};

use super::super::{ValidationError, ValidationRule};

/// Rule that checks names and call arity.
pub struct UndefinedNameRule;

impl ValidationRule for UndefinedNameRule {
    fn id(&self) -> &'static str {
        "undefined-name"
    }

    fn description(&self) -> &'static str {
        "Variables must be declared before use and calls must name a known function with the right arity"
    }

    fn validate(&self, program: &Program, _source: &str) -> Vec<ValidationError> {
        let mut checker = Checker {
            program,
            errors: Vec::new(),
            rule_id: self.id(),
        };

        for func in &program.functions {
            let mut scope = Scope::new();
            for param in &func.params {
                scope.define(param);
            }
            checker.check_stmt(&func.body, &mut scope);
        }

        checker.errors
    }
}

// ============================================================================
// Scope Tracking
// ============================================================================

/// Tracks variables in scope.
struct Scope {
    defined: HashSet<String>,
}

impl Scope {
    fn new() -> Self {
        Self {
            defined: HashSet::new(),
        }
    }

    fn define(&mut self, name: &str) {
        self.defined.insert(name.to_string());
    }

    fn is_defined(&self, name: &str) -> bool {
        self.defined.contains(name)
    }

    /// Create a child scope (for blocks, loops, handlers)
    fn child(&self) -> Self {
        Self {
            defined: self.defined.clone(),
        }
    }
}

// ============================================================================
// AST Traversal
// ============================================================================

struct Checker<'a> {
    program: &'a Program,
    errors: Vec<ValidationError>,
    rule_id: &'static str,
}

impl Checker<'_> {
    fn report(&mut self, span: Span, message: String) {
        self.errors
            .push(ValidationError::error(span, message, self.rule_id));
    }

    fn check_stmt(&mut self, stmt: &Stmt, scope: &mut Scope) {
        let span = stmt.span();

        match stmt {
            Stmt::Block { body, .. } => {
                let mut block_scope = scope.child();
                for stmt in body {
                    self.check_stmt(stmt, &mut block_scope);
                }
            }

            Stmt::Declare { name, init, .. } => {
                // Initializer first, so `let x = x + 1` is caught
                if let Some(init_expr) = init {
                    self.check_expr(init_expr, scope, span);
                }
                scope.define(name);
            }

            Stmt::Assign { place, value, .. } => {
                if !scope.is_defined(&place.var) {
                    self.report(span, format!("Assignment to undeclared variable '{}'", place.var));
                }
                for index in &place.indices {
                    self.check_expr(index, scope, span);
                }
                self.check_expr(value, scope, span);
            }

            Stmt::If {
                test,
                then_s,
                else_s,
                ..
            } => {
                self.check_expr(test, scope, span);
                self.check_stmt(then_s, &mut scope.child());
                if let Some(else_stmt) = else_s {
                    self.check_stmt(else_stmt, &mut scope.child());
                }
            }

            Stmt::While { test, body, .. } => {
                self.check_expr(test, scope, span);
                self.check_stmt(body, &mut scope.child());
            }

            Stmt::DoWhile { body, test, .. } => {
                self.check_stmt(body, &mut scope.child());
                self.check_expr(test, scope, span);
            }

            Stmt::For {
                init,
                test,
                update,
                body,
                ..
            } => {
                let mut loop_scope = scope.child();
                if let Some(init) = init {
                    self.check_stmt(init, &mut loop_scope);
                }
                if let Some(test) = test {
                    self.check_expr(test, &loop_scope, span);
                }
                if let Some(update) = update {
                    self.check_stmt(update, &mut loop_scope.child());
                }
                self.check_stmt(body, &mut loop_scope.child());
            }

            Stmt::ForEach {
                binding,
                iterable,
                body,
                ..
            } => {
                self.check_expr(iterable, scope, span);
                let mut body_scope = scope.child();
                body_scope.define(binding);
                self.check_stmt(body, &mut body_scope);
            }

            Stmt::Try {
                resources,
                body,
                catches,
                finally,
                ..
            } => {
                // Each resource path may use the handles opened before it
                let mut body_scope = scope.child();
                for decl in resources {
                    self.check_expr(&decl.path, &body_scope, span);
                    body_scope.define(&decl.name);
                }
                self.check_stmt(body, &mut body_scope);

                for clause in catches {
                    let mut catch_scope = scope.child();
                    catch_scope.define(&clause.binding);
                    self.check_stmt(&clause.body, &mut catch_scope);
                }

                if let Some(finally) = finally {
                    self.check_stmt(finally, &mut scope.child());
                }
            }

            Stmt::Return { value, .. } | Stmt::Emit { value, .. } => {
                if let Some(expr) = value {
                    self.check_expr(expr, scope, span);
                }
            }

            Stmt::Throw { value, .. } => self.check_expr(value, scope, span),

            Stmt::Expr { expr, .. } => self.check_expr(expr, scope, span),

            // These don't contain name references
            Stmt::Break { .. } | Stmt::Continue { .. } => {}
        }
    }

    /// Expressions carry no spans of their own; findings point at the statement
    fn check_expr(&mut self, expr: &Expr, scope: &Scope, span: Span) {
        match expr {
            Expr::Ident { name } => {
                if !scope.is_defined(name) {
                    self.report(span, format!("Undefined variable '{}'", name));
                }
            }

            Expr::Call { callee, args } => {
                let expected = match Builtin::from_name(callee) {
                    Some(builtin) => Some(builtin.arity()),
                    None => self.program.function(callee).map(|f| f.params.len()),
                };
                match expected {
                    None => self.report(span, format!("Unknown function '{}'", callee)),
                    Some(n) if n != args.len() => self.report(
                        span,
                        format!("'{}' expects {} argument(s), got {}", callee, n, args.len()),
                    ),
                    Some(_) => {}
                }
                for arg in args {
                    self.check_expr(arg, scope, span);
                }
            }

            Expr::Binary { left, right, .. } => {
                self.check_expr(left, scope, span);
                self.check_expr(right, scope, span);
            }

            Expr::Unary { operand, .. } => self.check_expr(operand, scope, span),

            Expr::LitList { elements } => {
                for element in elements {
                    self.check_expr(element, scope, span);
                }
            }

            Expr::NewException { message, .. } => {
                if let Some(message) = message {
                    self.check_expr(message, scope, span);
                }
            }

            Expr::Index { target, index } => {
                self.check_expr(target, scope, span);
                self.check_expr(index, scope, span);
            }

            // Only the object, not the property
            Expr::Member { object, .. } => self.check_expr(object, scope, span),

            Expr::Method { receiver, args, .. } => {
                self.check_expr(receiver, scope, span);
                for arg in args {
                    self.check_expr(arg, scope, span);
                }
            }

            Expr::LitNull | Expr::LitBool { .. } | Expr::LitInt { .. } | Expr::LitStr { .. } => {}
        }
    }
}
