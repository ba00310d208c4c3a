//! Expression evaluation
//!
//! Expressions evaluate to a value or fail with an [`Exception`]; the calling
//! statement handler turns a failure into `Control::Throw`. Calls to fixture
//! functions run in a fresh VM one level deeper.

use super::errors::Exception;
use super::stdlib::{self, call_builtin, Builtin};
use super::types::{BinaryOp, Expr, Place, UnaryOp, Val};
use super::vm::{Env, Runtime};
use super::{invoke, ExecutionOutcome};
use tracing::debug;

/// Result of evaluating an expression
pub type EvalResult = Result<Val, Exception>;

/// Evaluate an expression
///
/// `env` is mutable only for list-mutating methods such as `add`; `depth` is
/// the call depth of the activation doing the evaluation.
pub fn eval_expr(expr: &Expr, env: &mut Env, rt: &mut Runtime, depth: usize) -> EvalResult {
    match expr {
        Expr::LitNull => Ok(Val::Null),

        Expr::LitBool { v } => Ok(Val::Bool(*v)),

        Expr::LitInt { v } => Ok(Val::Int(*v)),

        Expr::LitStr { v } => Ok(Val::Str(v.clone())),

        Expr::LitList { elements } => {
            let mut vals = Vec::with_capacity(elements.len());
            for elem in elements {
                vals.push(eval_expr(elem, env, rt, depth)?);
            }
            Ok(Val::List(vals))
        }

        Expr::Ident { name } => env
            .get(name)
            .cloned()
            .ok_or_else(|| Exception::name(format!("{} is not defined", name))),

        Expr::Binary { op, left, right } => match op {
            BinaryOp::And => {
                if !eval_expr(left, env, rt, depth)?.as_condition()? {
                    return Ok(Val::Bool(false));
                }
                Ok(Val::Bool(eval_expr(right, env, rt, depth)?.as_condition()?))
            }
            BinaryOp::Or => {
                if eval_expr(left, env, rt, depth)?.as_condition()? {
                    return Ok(Val::Bool(true));
                }
                Ok(Val::Bool(eval_expr(right, env, rt, depth)?.as_condition()?))
            }
            _ => {
                let l = eval_expr(left, env, rt, depth)?;
                let r = eval_expr(right, env, rt, depth)?;
                binary(*op, &l, &r)
            }
        },

        Expr::Unary { op, operand } => {
            let v = eval_expr(operand, env, rt, depth)?;
            match op {
                UnaryOp::Neg => Ok(Val::Int(v.as_int()?.wrapping_neg())),
                UnaryOp::Not => Ok(Val::Bool(!v.as_condition()?)),
            }
        }

        Expr::Call { callee, args } => {
            let mut vals = Vec::with_capacity(args.len());
            for arg in args {
                vals.push(eval_expr(arg, env, rt, depth)?);
            }
            if let Some(builtin) = Builtin::from_name(callee) {
                return call_builtin(builtin, &vals, &mut *rt.files);
            }
            match invoke(rt, callee, vals, depth + 1) {
                ExecutionOutcome::Completed(v) => Ok(v),
                ExecutionOutcome::Raised(e) => Err(e),
                ExecutionOutcome::BrokeLoop | ExecutionOutcome::ContinuedLoop => {
                    debug!(callee = %callee, "loop control escaped a function body");
                    Ok(Val::Null)
                }
            }
        }

        Expr::NewException { kind, message } => {
            let message = match message {
                Some(m) => eval_expr(m, env, rt, depth)?.to_string(),
                None => String::new(),
            };
            Ok(Val::Exception(Exception::new(*kind, message)))
        }

        Expr::Index { target, index } => {
            let t = eval_expr(target, env, rt, depth)?;
            let i = eval_expr(index, env, rt, depth)?.as_int()?;
            index_value(&t, i)
        }

        Expr::Member { object, property } => {
            let obj = eval_expr(object, env, rt, depth)?;
            member(&obj, property)
        }

        Expr::Method {
            receiver,
            method,
            args,
        } => eval_method(receiver, method, args, env, rt, depth),
    }
}

/* ===================== Operators ===================== */

/// Apply a strict (non short-circuit) binary operator
pub fn binary(op: BinaryOp, l: &Val, r: &Val) -> EvalResult {
    match op {
        BinaryOp::Add => match (l, r) {
            (Val::Int(a), Val::Int(b)) => Ok(Val::Int(a.wrapping_add(*b))),
            (Val::Str(_), _) | (_, Val::Str(_)) => Ok(Val::Str(format!("{}{}", l, r))),
            _ => Err(unsupported(op, l, r)),
        },
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            let (Val::Int(a), Val::Int(b)) = (l, r) else {
                return Err(unsupported(op, l, r));
            };
            arithmetic(op, *a, *b).map(Val::Int)
        }
        BinaryOp::Eq => Ok(Val::Bool(l == r)),
        BinaryOp::Ne => Ok(Val::Bool(l != r)),
        BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte => {
            let ord = match (l, r) {
                (Val::Int(a), Val::Int(b)) => a.cmp(b),
                (Val::Str(a), Val::Str(b)) => a.cmp(b),
                _ => return Err(unsupported(op, l, r)),
            };
            let result = match op {
                BinaryOp::Lt => ord.is_lt(),
                BinaryOp::Lte => ord.is_le(),
                BinaryOp::Gt => ord.is_gt(),
                _ => ord.is_ge(),
            };
            Ok(Val::Bool(result))
        }
        BinaryOp::And => Ok(Val::Bool(l.as_condition()? && r.as_condition()?)),
        BinaryOp::Or => Ok(Val::Bool(l.as_condition()? || r.as_condition()?)),
    }
}

/// 32-bit integer arithmetic: wrapping, truncating toward zero, zero divisor raises
fn arithmetic(op: BinaryOp, a: i32, b: i32) -> Result<i32, Exception> {
    match op {
        BinaryOp::Sub => Ok(a.wrapping_sub(b)),
        BinaryOp::Mul => Ok(a.wrapping_mul(b)),
        BinaryOp::Div | BinaryOp::Rem if b == 0 => Err(Exception::division_by_zero()),
        BinaryOp::Div => Ok(a.wrapping_div(b)),
        BinaryOp::Rem => Ok(a.wrapping_rem(b)),
        _ => Ok(a.wrapping_add(b)),
    }
}

fn unsupported(op: BinaryOp, l: &Val, r: &Val) -> Exception {
    Exception::type_error(format!(
        "Operator {} not supported for {} and {}",
        op.symbol(),
        l.type_name(),
        r.type_name()
    ))
}

/* ===================== Indexing & Members ===================== */

fn checked_index(i: i32, len: usize) -> Result<usize, Exception> {
    if i < 0 || i as usize >= len {
        return Err(Exception::index(i as i64, len));
    }
    Ok(i as usize)
}

/// Read element `i` of a list, or character `i` of a string
pub fn index_value(target: &Val, i: i32) -> EvalResult {
    match target {
        Val::List(items) => Ok(items[checked_index(i, items.len())?].clone()),
        Val::Str(s) => {
            let len = s.chars().count();
            let at = checked_index(i, len)?;
            Ok(s.chars().nth(at).map(|c| Val::Str(c.to_string())).unwrap_or(Val::Null))
        }
        other => Err(Exception::type_error(format!(
            "{} cannot be indexed",
            other.type_name()
        ))),
    }
}

fn member(obj: &Val, property: &str) -> EvalResult {
    match (obj, property) {
        (Val::List(_) | Val::Str(_), "length") => stdlib::len(obj),
        (Val::Exception(e), "message") => Ok(Val::Str(e.message.clone())),
        (Val::Exception(e), "kind") => Ok(Val::Str(e.kind.name().to_string())),
        (Val::Exception(e), "suppressed") => Ok(Val::List(
            e.suppressed.iter().cloned().map(Val::Exception).collect(),
        )),
        _ => Err(Exception::type_error(format!(
            "{} has no property {}",
            obj.type_name(),
            property
        ))),
    }
}

/// Mutable access to the value a place denotes
///
/// Indices must already be evaluated.
pub fn place_mut<'e>(env: &'e mut Env, var: &str, indices: &[i32]) -> Result<&'e mut Val, Exception> {
    let mut slot = env
        .get_mut(var)
        .ok_or_else(|| Exception::name(format!("{} is not defined", var)))?;
    for &i in indices {
        slot = match slot {
            Val::List(items) => {
                let at = checked_index(i, items.len())?;
                &mut items[at]
            }
            other => {
                return Err(Exception::type_error(format!(
                    "{} does not support indexed assignment",
                    other.type_name()
                )))
            }
        };
    }
    Ok(slot)
}

/// Evaluate the index expressions of a place, left to right
pub fn eval_indices(
    place: &Place,
    env: &mut Env,
    rt: &mut Runtime,
    depth: usize,
) -> Result<Vec<i32>, Exception> {
    let mut indices = Vec::with_capacity(place.indices.len());
    for index in &place.indices {
        indices.push(eval_expr(index, env, rt, depth)?.as_int()?);
    }
    Ok(indices)
}

/// View an expression as an assignable place, if it is one
fn as_place(expr: &Expr) -> Option<Place> {
    match expr {
        Expr::Ident { name } => Some(Place::var(name.clone())),
        Expr::Index { target, index } => {
            let mut place = as_place(target)?;
            place.indices.push((**index).clone());
            Some(place)
        }
        _ => None,
    }
}

/* ===================== Methods ===================== */

fn expect_args(method: &str, args: &[Val], n: usize) -> Result<(), Exception> {
    if args.len() != n {
        return Err(Exception::argument(format!(
            "{} expects {} argument(s), got {}",
            method,
            n,
            args.len()
        )));
    }
    Ok(())
}

fn eval_method(
    receiver: &Expr,
    method: &str,
    args: &[Expr],
    env: &mut Env,
    rt: &mut Runtime,
    depth: usize,
) -> EvalResult {
    // `add` mutates the list stored in a variable, so it needs the place
    if method == "add" {
        let Some(place) = as_place(receiver) else {
            return Err(Exception::type_error("add requires a list variable"));
        };
        let indices = eval_indices(&place, env, rt, depth)?;
        let mut vals = Vec::with_capacity(args.len());
        for arg in args {
            vals.push(eval_expr(arg, env, rt, depth)?);
        }
        expect_args(method, &vals, 1)?;
        let item = vals.pop().unwrap_or(Val::Null);
        return match place_mut(env, &place.var, &indices)? {
            Val::List(items) => {
                items.push(item);
                Ok(Val::Bool(true))
            }
            other => Err(Exception::type_error(format!(
                "{} has no method add",
                other.type_name()
            ))),
        };
    }

    let recv = eval_expr(receiver, env, rt, depth)?;
    let mut vals = Vec::with_capacity(args.len());
    for arg in args {
        vals.push(eval_expr(arg, env, rt, depth)?);
    }

    match (&recv, method) {
        (Val::Resource(id), "readLine") => {
            expect_args(method, &vals, 0)?;
            Ok(rt
                .resources
                .read_line(*id)?
                .map(Val::Str)
                .unwrap_or(Val::Null))
        }
        (Val::List(_), "get") => {
            expect_args(method, &vals, 1)?;
            index_value(&recv, vals[0].as_int()?)
        }
        (Val::List(_), "size") | (Val::Str(_), "length") => {
            expect_args(method, &vals, 0)?;
            stdlib::len(&recv)
        }
        (Val::Exception(_), "getMessage") => {
            expect_args(method, &vals, 0)?;
            member(&recv, "message")
        }
        (_, "toString") => {
            expect_args(method, &vals, 0)?;
            Ok(Val::Str(recv.to_string()))
        }
        _ => Err(Exception::type_error(format!(
            "{} has no method {}",
            recv.type_name(),
            method
        ))),
    }
}
