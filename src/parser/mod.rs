//! PEST-based parser for the fixture language
//!
//! Produces the executor AST with span information for error reporting.

use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

use super::executor::errors::ExceptionKind;
use super::executor::types::ast::{
    BinaryOp, CatchClause, CatchPattern, Expr, FunctionDef, Place, Program, ResourceDecl, Span,
    Stmt, Stream, UnaryOp,
};

pub mod semantic_validator;

#[cfg(test)]
mod tests;

use semantic_validator::{ValidationError, Validator};

/* ===================== PEST Parser ===================== */

#[derive(Parser)]
#[grammar = "parser/flow.pest"]
struct FlowParser;

/* ===================== Error Types ===================== */

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{0}")]
    PestError(String, Option<Span>),
    #[error("{0}")]
    BuildError(String, Option<Span>),
}

impl ParseError {
    pub fn span(&self) -> Option<Span> {
        match self {
            ParseError::PestError(_, span) => *span,
            ParseError::BuildError(_, span) => *span,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ParseError::PestError(msg, _) => msg,
            ParseError::BuildError(msg, _) => msg,
        }
    }
}

impl From<pest::error::Error<Rule>> for ParseError {
    fn from(err: pest::error::Error<Rule>) -> Self {
        let span = match err.line_col {
            pest::error::LineColLocation::Pos((line, col)) => Some(Span::new(
                line.saturating_sub(1),
                col.saturating_sub(1),
                line.saturating_sub(1),
                col,
            )),
            pest::error::LineColLocation::Span((start_line, start_col), (end_line, end_col)) => {
                Some(Span::new(
                    start_line.saturating_sub(1),
                    start_col.saturating_sub(1),
                    end_line.saturating_sub(1),
                    end_col.saturating_sub(1),
                ))
            }
        };
        ParseError::PestError(err.to_string(), span)
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Failure to turn source text into a runnable program
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("program is invalid:\n{}", format_findings(.0))]
    Invalid(Vec<ValidationError>),
}

fn format_findings(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/* ===================== Span Helpers ===================== */

/// Convert a PEST pair's span to our Span type
fn pair_to_span(pair: &Pair<Rule>, source: &str) -> Span {
    let pest_span = pair.as_span();
    let (start_line, start_col) = offset_to_line_col(source, pest_span.start());
    let (end_line, end_col) = offset_to_line_col(source, pest_span.end());
    Span::new(start_line, start_col, end_line, end_col)
}

/// Convert byte offset to (line, column) - 0-indexed
fn offset_to_line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 0;
    let mut col = 0;
    let mut current_offset = 0;

    for ch in source.chars() {
        if current_offset >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 0;
        } else {
            col += 1;
        }
        current_offset += ch.len_utf8();
    }

    (line, col)
}

/// Take the next child pair, or fail with a build error naming what was expected
fn next_pair<'i>(inner: &mut Pairs<'i, Rule>, what: &str, span: Span) -> ParseResult<Pair<'i, Rule>> {
    inner
        .next()
        .ok_or_else(|| ParseError::BuildError(format!("Expected {}", what), Some(span)))
}

/* ===================== Public API ===================== */

/// Parse a fixture source file into its function definitions
pub fn parse_program(source: &str) -> ParseResult<Program> {
    let mut pairs = FlowParser::parse(Rule::program, source)?;
    let program = next_pair(&mut pairs, "program", Span::default())?;

    let mut functions = Vec::new();
    for pair in program.into_inner() {
        match pair.as_rule() {
            Rule::function_def => functions.push(build_function(pair, source)?),
            Rule::EOI => {}
            _ => {
                return Err(ParseError::BuildError(
                    format!("Unexpected program content: {:?}", pair.as_rule()),
                    Some(pair_to_span(&pair, source)),
                ))
            }
        }
    }

    Ok(Program { functions })
}

/// Parse a sequence of statements into a single Block (testing API)
pub fn parse(source: &str) -> ParseResult<Stmt> {
    let mut pairs = FlowParser::parse(Rule::statements, source)?;
    let root = next_pair(&mut pairs, "statements", Span::default())?;
    let span = pair_to_span(&root, source);

    let mut body = Vec::new();
    for pair in root.into_inner() {
        if pair.as_rule() == Rule::statement {
            body.push(build_statement(pair, source)?);
        }
    }

    Ok(Stmt::Block { body, span })
}

/// Parse and validate a fixture program
///
/// Warnings are dropped; any error-severity finding rejects the program.
pub fn load_program(source: &str) -> Result<Program, LoadError> {
    let program = parse_program(source)?;
    let errors: Vec<ValidationError> = Validator::new()
        .validate(&program, source)
        .into_iter()
        .filter(|e| e.is_error())
        .collect();

    if !errors.is_empty() {
        return Err(LoadError::Invalid(errors));
    }
    Ok(program)
}

/* ===================== AST Builder ===================== */

fn build_function(pair: Pair<Rule>, source: &str) -> ParseResult<FunctionDef> {
    let span = pair_to_span(&pair, source);
    let mut inner = pair.into_inner();

    let name = next_pair(&mut inner, "function name", span)?.as_str().to_string();

    let mut params = Vec::new();
    let mut body = None;
    for pair in inner {
        match pair.as_rule() {
            Rule::param_list => {
                params = pair.into_inner().map(|p| p.as_str().to_string()).collect();
            }
            Rule::block => body = Some(build_block(pair, source)?),
            _ => {}
        }
    }

    let body = body.ok_or_else(|| {
        ParseError::BuildError(format!("Function {} has no body", name), Some(span))
    })?;

    Ok(FunctionDef {
        name,
        params,
        body,
        span,
    })
}

fn build_block(pair: Pair<Rule>, source: &str) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair, source);
    let statements: Result<Vec<Stmt>, ParseError> = pair
        .into_inner()
        .map(|stmt_pair| build_statement(stmt_pair, source))
        .collect();

    Ok(Stmt::Block {
        body: statements?,
        span,
    })
}

fn build_statement(pair: Pair<Rule>, source: &str) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair, source);

    match pair.as_rule() {
        Rule::statement => {
            let inner = next_pair(&mut pair.into_inner(), "statement", span)?;
            build_statement(inner, source)
        }
        Rule::block => build_block(pair, source),
        Rule::declare_stmt => {
            let mut inner = pair.into_inner();
            let name = next_pair(&mut inner, "variable name", span)?.as_str().to_string();
            let init = match inner.next() {
                Some(expr_pair) => Some(build_expression(expr_pair, source)?),
                None => None,
            };
            Ok(Stmt::Declare { name, init, span })
        }
        Rule::assign_stmt => build_assign_stmt(pair, source),
        Rule::incdec_stmt => build_incdec_stmt(pair, source),
        Rule::expr_stmt => {
            let expr_pair = next_pair(&mut pair.into_inner(), "expression", span)?;
            let expr = build_expression(expr_pair, source)?;
            Ok(Stmt::Expr { expr, span })
        }
        Rule::if_stmt => build_if_stmt(pair, source),
        Rule::labeled_stmt => {
            let mut inner = pair.into_inner();
            let label = next_pair(&mut inner, "label", span)?.as_str().to_string();
            let loop_pair = next_pair(&mut inner, "loop", span)?;
            build_loop(loop_pair, source, Some(label))
        }
        Rule::while_stmt | Rule::do_while_stmt | Rule::for_stmt | Rule::for_each_stmt => {
            build_loop(pair, source, None)
        }
        Rule::try_stmt => build_try_stmt(pair, source),
        Rule::return_stmt => {
            let value = match pair.into_inner().next() {
                Some(expr_pair) => Some(build_expression(expr_pair, source)?),
                None => None,
            };
            Ok(Stmt::Return { value, span })
        }
        Rule::throw_stmt => {
            let expr_pair = next_pair(&mut pair.into_inner(), "thrown value", span)?;
            Ok(Stmt::Throw {
                value: build_expression(expr_pair, source)?,
                span,
            })
        }
        Rule::break_stmt => Ok(Stmt::Break {
            label: pair.into_inner().next().map(|p| p.as_str().to_string()),
            span,
        }),
        Rule::continue_stmt => Ok(Stmt::Continue {
            label: pair.into_inner().next().map(|p| p.as_str().to_string()),
            span,
        }),
        Rule::emit_stmt => {
            let mut inner = pair.into_inner();
            let stream = match next_pair(&mut inner, "print target", span)?.as_str() {
                "eprintln" => Stream::Err,
                _ => Stream::Out,
            };
            let value = match inner.next() {
                Some(expr_pair) => Some(build_expression(expr_pair, source)?),
                None => None,
            };
            Ok(Stmt::Emit {
                stream,
                value,
                span,
            })
        }
        _ => Err(ParseError::BuildError(
            format!("Unexpected statement rule: {:?}", pair.as_rule()),
            Some(span),
        )),
    }
}

fn build_place(pair: Pair<Rule>, source: &str) -> ParseResult<Place> {
    let span = pair_to_span(&pair, source);
    let mut inner = pair.into_inner();
    let var = next_pair(&mut inner, "variable", span)?.as_str().to_string();
    let indices = inner
        .map(|index_pair| build_expression(index_pair, source))
        .collect::<ParseResult<Vec<_>>>()?;
    Ok(Place { var, indices })
}

fn build_assign_stmt(pair: Pair<Rule>, source: &str) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair, source);
    let mut inner = pair.into_inner();

    let place = build_place(next_pair(&mut inner, "assignment target", span)?, source)?;
    let op_pair = next_pair(&mut inner, "assignment operator", span)?;
    let value = build_expression(next_pair(&mut inner, "assigned value", span)?, source)?;

    let op = match op_pair.as_str() {
        "=" => None,
        "+=" => Some(BinaryOp::Add),
        "-=" => Some(BinaryOp::Sub),
        "*=" => Some(BinaryOp::Mul),
        "/=" => Some(BinaryOp::Div),
        "%=" => Some(BinaryOp::Rem),
        other => {
            return Err(ParseError::BuildError(
                format!("Unknown assignment operator: {}", other),
                Some(pair_to_span(&op_pair, source)),
            ))
        }
    };

    // `x op= e` is `x = x op e`
    let value = match op {
        Some(op) => Expr::Binary {
            op,
            left: Box::new(place.to_expr()),
            right: Box::new(value),
        },
        None => value,
    };

    Ok(Stmt::Assign { place, value, span })
}

fn build_incdec_stmt(pair: Pair<Rule>, source: &str) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair, source);
    let mut inner = pair.into_inner();

    let place = build_place(next_pair(&mut inner, "operand", span)?, source)?;
    let op = match next_pair(&mut inner, "++ or --", span)?.as_str() {
        "--" => BinaryOp::Sub,
        _ => BinaryOp::Add,
    };

    let value = Expr::Binary {
        op,
        left: Box::new(place.to_expr()),
        right: Box::new(Expr::LitInt { v: 1 }),
    };
    Ok(Stmt::Assign { place, value, span })
}

fn build_if_stmt(pair: Pair<Rule>, source: &str) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair, source);
    let mut inner = pair.into_inner();

    let test = build_expression(next_pair(&mut inner, "condition", span)?, source)?;
    let then_s = build_statement(next_pair(&mut inner, "then branch", span)?, source)?;

    let else_s = if let Some(else_clause_pair) = inner.next() {
        let else_inner = next_pair(&mut else_clause_pair.into_inner(), "else branch", span)?;
        Some(Box::new(build_statement(else_inner, source)?))
    } else {
        None
    };

    Ok(Stmt::If {
        test,
        then_s: Box::new(then_s),
        else_s,
        span,
    })
}

fn build_loop(pair: Pair<Rule>, source: &str, label: Option<String>) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair, source);
    let rule = pair.as_rule();
    let mut inner = pair.into_inner();

    match rule {
        Rule::while_stmt => {
            let test = build_expression(next_pair(&mut inner, "condition", span)?, source)?;
            let body = build_statement(next_pair(&mut inner, "loop body", span)?, source)?;
            Ok(Stmt::While {
                label,
                test,
                body: Box::new(body),
                span,
            })
        }
        Rule::do_while_stmt => {
            let body = build_statement(next_pair(&mut inner, "loop body", span)?, source)?;
            let test = build_expression(next_pair(&mut inner, "condition", span)?, source)?;
            Ok(Stmt::DoWhile {
                label,
                body: Box::new(body),
                test,
                span,
            })
        }
        Rule::for_each_stmt => {
            let binding = next_pair(&mut inner, "loop variable", span)?.as_str().to_string();
            let iterable = build_expression(next_pair(&mut inner, "iterable", span)?, source)?;
            let body = build_statement(next_pair(&mut inner, "loop body", span)?, source)?;
            Ok(Stmt::ForEach {
                label,
                binding,
                iterable,
                body: Box::new(body),
                span,
            })
        }
        Rule::for_stmt => {
            let mut init = None;
            let mut test = None;
            let mut update = None;
            let mut body = None;

            // Each header part is optional, so dispatch on rule rather than position
            for part in inner {
                match part.as_rule() {
                    Rule::for_init => {
                        let stmt = next_pair(&mut part.into_inner(), "loop initializer", span)?;
                        init = Some(Box::new(build_statement(stmt, source)?));
                    }
                    Rule::for_test => {
                        let expr = next_pair(&mut part.into_inner(), "loop condition", span)?;
                        test = Some(build_expression(expr, source)?);
                    }
                    Rule::for_update => {
                        let stmt = next_pair(&mut part.into_inner(), "loop update", span)?;
                        update = Some(Box::new(build_statement(stmt, source)?));
                    }
                    _ => body = Some(build_statement(part, source)?),
                }
            }

            let body = body.ok_or_else(|| {
                ParseError::BuildError("Expected loop body".to_string(), Some(span))
            })?;
            Ok(Stmt::For {
                label,
                init,
                test,
                update,
                body: Box::new(body),
                span,
            })
        }
        _ => Err(ParseError::BuildError(
            format!("Expected a loop, got {:?}", rule),
            Some(span),
        )),
    }
}

fn build_try_stmt(pair: Pair<Rule>, source: &str) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair, source);

    let mut resources = Vec::new();
    let mut body = None;
    let mut catches = Vec::new();
    let mut finally = None;

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::resource_list => {
                for decl in part.into_inner() {
                    let decl_span = pair_to_span(&decl, source);
                    let mut decl_inner = decl.into_inner();
                    let name = next_pair(&mut decl_inner, "resource name", decl_span)?
                        .as_str()
                        .to_string();
                    let path =
                        build_expression(next_pair(&mut decl_inner, "path", decl_span)?, source)?;
                    resources.push(ResourceDecl { name, path });
                }
            }
            Rule::block => body = Some(build_block(part, source)?),
            Rule::catch_clause => catches.push(build_catch_clause(part, source)?),
            Rule::finally_clause => {
                let block = next_pair(&mut part.into_inner(), "finally block", span)?;
                finally = Some(Box::new(build_block(block, source)?));
            }
            _ => {}
        }
    }

    if resources.is_empty() && catches.is_empty() && finally.is_none() {
        return Err(ParseError::BuildError(
            "try requires resources, a catch clause or a finally block".to_string(),
            Some(span),
        ));
    }

    let body = body
        .ok_or_else(|| ParseError::BuildError("Expected try block".to_string(), Some(span)))?;

    Ok(Stmt::Try {
        resources,
        body: Box::new(body),
        catches,
        finally,
        span,
    })
}

fn build_catch_clause(pair: Pair<Rule>, source: &str) -> ParseResult<CatchClause> {
    let span = pair_to_span(&pair, source);
    let mut pattern = CatchPattern::Any;
    let mut binding = None;
    let mut body = None;

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::catch_kinds => {
                let mut kinds = Vec::new();
                for kind_pair in part.into_inner() {
                    let kind = ExceptionKind::from_name(kind_pair.as_str()).ok_or_else(|| {
                        ParseError::BuildError(
                            format!("Unknown exception kind: {}", kind_pair.as_str()),
                            Some(pair_to_span(&kind_pair, source)),
                        )
                    })?;
                    kinds.push(kind);
                }
                pattern = CatchPattern::Kinds { kinds };
            }
            Rule::identifier => binding = Some(part.as_str().to_string()),
            Rule::block => body = Some(build_block(part, source)?),
            _ => {}
        }
    }

    let binding = binding.ok_or_else(|| {
        ParseError::BuildError("Expected catch variable".to_string(), Some(span))
    })?;
    let body = body
        .ok_or_else(|| ParseError::BuildError("Expected catch block".to_string(), Some(span)))?;

    Ok(CatchClause {
        pattern,
        binding,
        body: Box::new(body),
    })
}

/* ===================== Expressions ===================== */

fn build_binary_expr(pair: Pair<Rule>, source: &str) -> ParseResult<Expr> {
    let span = pair_to_span(&pair, source);
    let inner_pairs: Vec<_> = pair.into_inner().collect();

    if inner_pairs.is_empty() {
        return Err(ParseError::BuildError(
            "Empty binary expression".to_string(),
            Some(span),
        ));
    }

    let mut left = build_expression(inner_pairs[0].clone(), source)?;

    let mut i = 1;
    while i < inner_pairs.len() {
        let op_rule = inner_pairs[i].as_rule();

        i += 1;
        if i >= inner_pairs.len() {
            return Err(ParseError::BuildError(
                "Missing right operand after operator".to_string(),
                Some(span),
            ));
        }

        let right = build_expression(inner_pairs[i].clone(), source)?;

        let op = match op_rule {
            Rule::op_or => BinaryOp::Or,
            Rule::op_and => BinaryOp::And,
            Rule::op_eq => BinaryOp::Eq,
            Rule::op_ne => BinaryOp::Ne,
            Rule::op_lt => BinaryOp::Lt,
            Rule::op_lte => BinaryOp::Lte,
            Rule::op_gt => BinaryOp::Gt,
            Rule::op_gte => BinaryOp::Gte,
            Rule::op_add => BinaryOp::Add,
            Rule::op_sub => BinaryOp::Sub,
            Rule::op_mul => BinaryOp::Mul,
            Rule::op_div => BinaryOp::Div,
            Rule::op_rem => BinaryOp::Rem,
            _ => {
                return Err(ParseError::BuildError(
                    format!(
                        "Expected operator rule at index {}, got {:?}",
                        i - 1,
                        op_rule
                    ),
                    Some(span),
                ))
            }
        };

        left = Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        };

        i += 1;
    }

    Ok(left)
}

fn build_expression(pair: Pair<Rule>, source: &str) -> ParseResult<Expr> {
    let span = pair_to_span(&pair, source);

    match pair.as_rule() {
        Rule::expression => {
            let inner = next_pair(&mut pair.into_inner(), "expression", span)?;
            build_expression(inner, source)
        }
        Rule::or_expr
        | Rule::and_expr
        | Rule::equality_expr
        | Rule::comparison_expr
        | Rule::additive_expr
        | Rule::multiplicative_expr => build_binary_expr(pair, source),
        Rule::unary_expr => {
            let mut inner = pair.into_inner();
            let first = next_pair(&mut inner, "operand", span)?;

            match first.as_rule() {
                Rule::op_not | Rule::op_neg => {
                    let operand_pair = next_pair(&mut inner, "operand", span)?;
                    if first.as_rule() == Rule::op_neg {
                        if let Some(v) = negative_literal(&operand_pair, span)? {
                            return Ok(Expr::LitInt { v });
                        }
                    }
                    let op = if first.as_rule() == Rule::op_not {
                        UnaryOp::Not
                    } else {
                        UnaryOp::Neg
                    };
                    Ok(Expr::Unary {
                        op,
                        operand: Box::new(build_expression(operand_pair, source)?),
                    })
                }
                _ => build_expression(first, source),
            }
        }
        Rule::postfix_expr => {
            let mut inner = pair.into_inner();
            let mut expr = build_expression(next_pair(&mut inner, "operand", span)?, source)?;

            for postfix_pair in inner {
                let postfix_span = pair_to_span(&postfix_pair, source);
                match postfix_pair.as_rule() {
                    Rule::index_suffix => {
                        let index_pair = next_pair(&mut postfix_pair.into_inner(), "index", span)?;
                        expr = Expr::Index {
                            target: Box::new(expr),
                            index: Box::new(build_expression(index_pair, source)?),
                        };
                    }
                    Rule::member_suffix => {
                        let mut suffix_inner = postfix_pair.into_inner();
                        let name = next_pair(&mut suffix_inner, "member name", postfix_span)?
                            .as_str()
                            .to_string();
                        expr = match suffix_inner.next() {
                            Some(args_pair) => Expr::Method {
                                receiver: Box::new(expr),
                                method: name,
                                args: build_arg_list(args_pair, source)?,
                            },
                            None => Expr::Member {
                                object: Box::new(expr),
                                property: name,
                            },
                        };
                    }
                    other => {
                        return Err(ParseError::BuildError(
                            format!("Unexpected postfix rule: {:?}", other),
                            Some(postfix_span),
                        ))
                    }
                }
            }

            Ok(expr)
        }
        Rule::call_expr => {
            let mut inner = pair.into_inner();
            let callee = next_pair(&mut inner, "function name", span)?.as_str().to_string();
            let args = build_arg_list(next_pair(&mut inner, "arguments", span)?, source)?;

            // `Kind("message")` builds an exception value
            if let Some(kind) = ExceptionKind::from_name(&callee) {
                if args.len() > 1 {
                    return Err(ParseError::BuildError(
                        format!("{} takes at most one message argument", callee),
                        Some(span),
                    ));
                }
                return Ok(Expr::NewException {
                    kind,
                    message: args.into_iter().next().map(Box::new),
                });
            }

            Ok(Expr::Call { callee, args })
        }
        Rule::identifier => Ok(Expr::Ident {
            name: pair.as_str().to_string(),
        }),
        Rule::int_lit => {
            let num_str = pair.as_str();
            let v = num_str.parse::<i32>().map_err(|e| {
                ParseError::BuildError(
                    format!("Failed to parse integer '{}': {}", num_str, e),
                    Some(span),
                )
            })?;
            Ok(Expr::LitInt { v })
        }
        Rule::bool_lit => Ok(Expr::LitBool {
            v: pair.as_str() == "true",
        }),
        Rule::null_lit => Ok(Expr::LitNull),
        Rule::string => {
            let raw = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
            Ok(Expr::LitStr { v: unescape(raw) })
        }
        Rule::list_lit => Ok(Expr::LitList {
            elements: build_arg_list(pair, source)?,
        }),
        _ => Err(ParseError::BuildError(
            format!("Unexpected expression rule: {:?}", pair.as_rule()),
            Some(span),
        )),
    }
}

fn build_arg_list(pair: Pair<Rule>, source: &str) -> ParseResult<Vec<Expr>> {
    pair.into_inner()
        .map(|expr_pair| build_expression(expr_pair, source))
        .collect()
}

/// `-<digits>` parsed as one literal, so the most negative int is expressible
///
/// Only a bare `int_lit` qualifies; the operand's own text can carry trailing
/// whitespace, so the pair tree is walked instead.
fn negative_literal(operand: &Pair<Rule>, span: Span) -> ParseResult<Option<i32>> {
    let mut node = operand.clone();
    while node.as_rule() != Rule::int_lit {
        if !matches!(node.as_rule(), Rule::unary_expr | Rule::postfix_expr) {
            return Ok(None);
        }
        let mut children = node.into_inner();
        match (children.next(), children.next()) {
            (Some(only), None) => node = only,
            _ => return Ok(None),
        }
    }

    let text = node.as_str();
    format!("-{}", text).parse::<i32>().map(Some).map_err(|e| {
        ParseError::BuildError(
            format!("Failed to parse integer '-{}': {}", text, e),
            Some(span),
        )
    })
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
