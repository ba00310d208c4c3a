//! Statement execution handlers
//!
//! Each statement type has its own handler function that processes
//! the statement based on its current execution phase.
//!
//! Handlers that own children (Block, loops, Try) look at `vm.control` first:
//! a loop absorbs the break/continue aimed at it, a Try runs its release,
//! handler and cleanup steps, and everything else pops itself so the control
//! keeps travelling down the stack.

use super::errors::Exception;
use super::expressions::{eval_expr, eval_indices, place_mut, EvalResult};
use super::types::{
    AssignPhase, BlockPhase, BreakPhase, CatchClause, ContinuePhase, Control, DeclarePhase,
    DoWhilePhase, EmitPhase, Expr, ExprPhase, ForEachPhase, ForPhase, FrameKind, IfPhase, Place,
    ResourceDecl, ResourceId, ReturnPhase, Stmt, Stream, ThrowPhase, TryPhase, Val, WhilePhase,
};
use super::vm::{push_stmt, set_top_kind, Runtime, VM};
use tracing::debug;

/* ===================== Helpers ===================== */

/// Evaluate an expression in the VM's environment
fn eval(vm: &mut VM, rt: &mut Runtime, expr: &Expr) -> EvalResult {
    let depth = vm.depth;
    eval_expr(expr, &mut vm.env, rt, depth)
}

/// Evaluate a loop or branch condition
fn eval_condition(vm: &mut VM, rt: &mut Runtime, expr: &Expr) -> Result<bool, Exception> {
    eval(vm, rt, expr)?.as_condition()
}

/// Start propagating an exception
fn raise(vm: &mut VM, error: Exception) {
    debug!(kind = %error.kind, message = %error.message, "exception raised");
    vm.control = Control::Throw(error);
}

/// Consume a break/continue aimed at this loop
///
/// Returns false when the loop must exit: either a matching break, or control
/// the loop does not own (which keeps propagating after the pop).
fn absorb_loop_control(vm: &mut VM, label: &Option<String>) -> bool {
    match &vm.control {
        Control::None => true,
        Control::Continue(target) if Control::targets(target, label) => {
            vm.control = Control::None;
            true
        }
        Control::Break(target) if Control::targets(target, label) => {
            vm.control = Control::None;
            false
        }
        _ => false,
    }
}

/* ===================== Statement Handlers ===================== */

/// Execute Block statement
pub fn execute_block(
    vm: &mut VM,
    phase: BlockPhase,
    idx: usize,
    declared_vars: Vec<String>,
    body: &[Stmt],
) {
    // If control flow is active, clean up and pop
    if vm.control != Control::None {
        for var_name in &declared_vars {
            vm.env.remove(var_name);
        }
        vm.frames.pop();
        return;
    }

    let mut declared_vars = declared_vars;

    match phase {
        BlockPhase::Execute => {
            if idx >= body.len() {
                for var_name in declared_vars.iter() {
                    vm.env.remove(var_name);
                }
                vm.frames.pop();
                return;
            }

            let child_stmt = &body[idx];

            if let Stmt::Declare { name, .. } = child_stmt {
                declared_vars.push(name.clone());
            }

            set_top_kind(
                vm,
                FrameKind::Block {
                    phase: BlockPhase::Execute,
                    idx: idx + 1,
                    declared_vars,
                },
            );

            push_stmt(vm, child_stmt);
        }
    }
}

/// Execute Declare statement (let)
pub fn execute_declare(
    vm: &mut VM,
    rt: &mut Runtime,
    phase: DeclarePhase,
    name: String,
    init: Option<Expr>,
) {
    match phase {
        DeclarePhase::Eval => {
            let value = match &init {
                Some(expr) => match eval(vm, rt, expr) {
                    Ok(v) => v,
                    Err(e) => {
                        raise(vm, e);
                        vm.frames.pop();
                        return;
                    }
                },
                None => Val::Null,
            };

            vm.env.insert(name, value);
            vm.frames.pop();
        }
    }
}

/// Execute Assign statement
///
/// Index expressions are evaluated before the right-hand side.
pub fn execute_assign(
    vm: &mut VM,
    rt: &mut Runtime,
    phase: AssignPhase,
    place: Place,
    value: Expr,
) {
    match phase {
        AssignPhase::Eval => {
            if let Err(e) = assign(vm, rt, &place, &value) {
                raise(vm, e);
            }
            vm.frames.pop();
        }
    }
}

fn assign(vm: &mut VM, rt: &mut Runtime, place: &Place, value: &Expr) -> Result<(), Exception> {
    let depth = vm.depth;
    let indices = eval_indices(place, &mut vm.env, rt, depth)?;
    let val = eval_expr(value, &mut vm.env, rt, depth)?;
    *place_mut(&mut vm.env, &place.var, &indices)? = val;
    Ok(())
}

/// Execute Expr statement
pub fn execute_expr(vm: &mut VM, rt: &mut Runtime, phase: ExprPhase, expr: Expr) {
    match phase {
        ExprPhase::Eval => {
            // Expression statements discard their value
            if let Err(e) = eval(vm, rt, &expr) {
                raise(vm, e);
            }
            vm.frames.pop();
        }
    }
}

/// Execute Emit statement (println / eprintln)
pub fn execute_emit(
    vm: &mut VM,
    rt: &mut Runtime,
    phase: EmitPhase,
    stream: Stream,
    value: Option<Expr>,
) {
    match phase {
        EmitPhase::Eval => {
            let line = match &value {
                Some(expr) => match eval(vm, rt, expr) {
                    Ok(v) => v.to_string(),
                    Err(e) => {
                        raise(vm, e);
                        vm.frames.pop();
                        return;
                    }
                },
                None => String::new(),
            };

            rt.output.emit(stream, &line);
            vm.frames.pop();
        }
    }
}

/// Execute If statement
pub fn execute_if(
    vm: &mut VM,
    rt: &mut Runtime,
    phase: IfPhase,
    test: Expr,
    then_s: Box<Stmt>,
    else_s: Option<Box<Stmt>>,
) {
    match phase {
        IfPhase::Eval => {
            let is_true = match eval_condition(vm, rt, &test) {
                Ok(b) => b,
                Err(e) => {
                    raise(vm, e);
                    vm.frames.pop();
                    return;
                }
            };

            // The branch replaces the If frame
            vm.frames.pop();

            if is_true {
                push_stmt(vm, &then_s);
            } else if let Some(else_stmt) = &else_s {
                push_stmt(vm, else_stmt);
            }
        }
    }
}

/// Execute While statement
pub fn execute_while(
    vm: &mut VM,
    rt: &mut Runtime,
    phase: WhilePhase,
    label: Option<String>,
    test: Expr,
    body: Box<Stmt>,
) {
    if !absorb_loop_control(vm, &label) {
        vm.frames.pop();
        return;
    }

    match phase {
        WhilePhase::Eval => match eval_condition(vm, rt, &test) {
            Ok(true) => push_stmt(vm, &body),
            Ok(false) => {
                vm.frames.pop();
            }
            Err(e) => {
                raise(vm, e);
                vm.frames.pop();
            }
        },
    }
}

/// Execute DoWhile statement
///
/// The body runs once before the first test.
pub fn execute_do_while(
    vm: &mut VM,
    rt: &mut Runtime,
    phase: DoWhilePhase,
    label: Option<String>,
    body: Box<Stmt>,
    test: Expr,
) {
    if !absorb_loop_control(vm, &label) {
        vm.frames.pop();
        return;
    }

    match phase {
        DoWhilePhase::Start => {
            set_top_kind(
                vm,
                FrameKind::DoWhile {
                    phase: DoWhilePhase::Test,
                },
            );
            push_stmt(vm, &body);
        }
        DoWhilePhase::Test => match eval_condition(vm, rt, &test) {
            Ok(true) => push_stmt(vm, &body),
            Ok(false) => {
                vm.frames.pop();
            }
            Err(e) => {
                raise(vm, e);
                vm.frames.pop();
            }
        },
    }
}

/// Execute three-part For statement
///
/// A `continue` lands in the Update phase, so the post-body step still runs
/// before the next test.
#[allow(clippy::too_many_arguments)]
pub fn execute_for(
    vm: &mut VM,
    rt: &mut Runtime,
    phase: ForPhase,
    label: Option<String>,
    init: Option<Box<Stmt>>,
    test: Option<Expr>,
    update: Option<Box<Stmt>>,
    body: Box<Stmt>,
) {
    if !absorb_loop_control(vm, &label) {
        exit_for(vm, init.as_deref());
        return;
    }

    match phase {
        ForPhase::Init => {
            set_top_kind(
                vm,
                FrameKind::For {
                    phase: ForPhase::Test,
                },
            );
            if let Some(init) = &init {
                push_stmt(vm, init);
            }
        }
        ForPhase::Test => {
            let keep_going = match &test {
                Some(expr) => eval_condition(vm, rt, expr),
                None => Ok(true),
            };
            match keep_going {
                Ok(true) => {
                    set_top_kind(
                        vm,
                        FrameKind::For {
                            phase: ForPhase::Update,
                        },
                    );
                    push_stmt(vm, &body);
                }
                Ok(false) => exit_for(vm, init.as_deref()),
                Err(e) => {
                    raise(vm, e);
                    exit_for(vm, init.as_deref());
                }
            }
        }
        ForPhase::Update => {
            set_top_kind(
                vm,
                FrameKind::For {
                    phase: ForPhase::Test,
                },
            );
            if let Some(update) = &update {
                push_stmt(vm, update);
            }
        }
    }
}

/// Pop a For frame, dropping the variable its initializer declared
fn exit_for(vm: &mut VM, init: Option<&Stmt>) {
    if let Some(Stmt::Declare { name, .. }) = init {
        vm.env.remove(name);
    }
    vm.frames.pop();
}

/// Execute ForEach statement
#[allow(clippy::too_many_arguments)]
pub fn execute_for_each(
    vm: &mut VM,
    rt: &mut Runtime,
    _phase: ForEachPhase,
    items: Option<Vec<Val>>,
    idx: usize,
    label: Option<String>,
    binding: String,
    iterable: Expr,
    body: Box<Stmt>,
) {
    if !absorb_loop_control(vm, &label) {
        vm.env.remove(&binding);
        vm.frames.pop();
        return;
    }

    // If items is None, we need to evaluate the iterable first
    let items = match items {
        Some(items) => items,
        None => {
            let iterated = eval(vm, rt, &iterable).and_then(|v| match v {
                Val::List(items) => Ok(items),
                Val::Str(s) => Ok(s.chars().map(|c| Val::Str(c.to_string())).collect()),
                other => Err(Exception::type_error(format!(
                    "Cannot iterate over {}",
                    other.type_name()
                ))),
            });
            match iterated {
                Ok(items) => items,
                Err(e) => {
                    raise(vm, e);
                    vm.frames.pop();
                    return;
                }
            }
        }
    };

    if idx >= items.len() {
        vm.env.remove(&binding);
        vm.frames.pop();
        return;
    }

    vm.env.insert(binding, items[idx].clone());

    set_top_kind(
        vm,
        FrameKind::ForEach {
            phase: ForEachPhase::Iterate,
            items: Some(items),
            idx: idx + 1,
        },
    );

    push_stmt(vm, &body);
}

/* ===================== Try ===================== */

/// Execute Try statement
///
/// Order of events:
/// 1. Header resources are acquired left to right, one per step
/// 2. The body runs
/// 3. Acquired resources are released in reverse order
/// 4. A pending exception is offered to the catch clauses in order
/// 5. The finally block runs with the pending control stashed; if it
///    completes normally the stashed control is restored, otherwise its own
///    control wins
#[allow(clippy::too_many_arguments)]
pub fn execute_try(
    vm: &mut VM,
    rt: &mut Runtime,
    phase: TryPhase,
    acquired: Vec<ResourceId>,
    catch_idx: Option<usize>,
    pending: Option<Control>,
    resources: &[ResourceDecl],
    body: Box<Stmt>,
    catches: &[CatchClause],
    finally: Option<Box<Stmt>>,
) {
    match phase {
        TryPhase::Acquire => {
            let mut acquired = acquired;

            let Some(decl) = resources.get(acquired.len()) else {
                set_top_kind(
                    vm,
                    FrameKind::Try {
                        phase: TryPhase::BodyStarted,
                        acquired,
                        catch_idx: None,
                        pending: None,
                    },
                );
                push_stmt(vm, &body);
                return;
            };

            let opened = match eval(vm, rt, &decl.path) {
                Ok(Val::Str(path)) => rt.resources.acquire(&mut *rt.files, &path),
                Ok(other) => Err(Exception::type_error(format!(
                    "Resource path must be a string, got {}",
                    other.type_name()
                ))),
                Err(e) => Err(e),
            };

            match opened {
                Ok(id) => {
                    vm.env.insert(decl.name.clone(), Val::Resource(id));
                    acquired.push(id);
                    set_top_kind(
                        vm,
                        FrameKind::Try {
                            phase: TryPhase::Acquire,
                            acquired,
                            catch_idx: None,
                            pending: None,
                        },
                    );
                }
                Err(e) => {
                    // The body never runs; earlier resources are still released
                    raise(vm, e);
                    finish_body(vm, rt, &acquired, resources, catches, finally);
                }
            }
        }

        TryPhase::BodyStarted => finish_body(vm, rt, &acquired, resources, catches, finally),

        TryPhase::CatchStarted => {
            if let Some(clause) = catch_idx.and_then(|i| catches.get(i)) {
                vm.env.remove(&clause.binding);
            }
            enter_finally(vm, finally);
        }

        TryPhase::FinallyStarted => {
            let pending = pending.unwrap_or(Control::None);
            if vm.control == Control::None {
                vm.control = pending;
            } else if pending != Control::None {
                debug!(
                    discarded = ?pending,
                    replaced_by = ?vm.control,
                    "finally completed abruptly"
                );
            }
            vm.frames.pop();
        }
    }
}

/// Release resources, then hand a pending exception to the first matching catch
fn finish_body(
    vm: &mut VM,
    rt: &mut Runtime,
    acquired: &[ResourceId],
    resources: &[ResourceDecl],
    catches: &[CatchClause],
    finally: Option<Box<Stmt>>,
) {
    release_resources(vm, rt, acquired, resources);

    match std::mem::replace(&mut vm.control, Control::None) {
        Control::Throw(error) => {
            match catches.iter().position(|c| c.pattern.matches(error.kind)) {
                Some(i) => {
                    let clause = &catches[i];
                    debug!(kind = %error.kind, binding = %clause.binding, "exception caught");
                    vm.env.insert(clause.binding.clone(), Val::Exception(error));
                    set_top_kind(
                        vm,
                        FrameKind::Try {
                            phase: TryPhase::CatchStarted,
                            acquired: vec![],
                            catch_idx: Some(i),
                            pending: None,
                        },
                    );
                    push_stmt(vm, &clause.body);
                    return;
                }
                None => vm.control = Control::Throw(error),
            }
        }
        other => vm.control = other,
    }

    enter_finally(vm, finally);
}

/// Release acquired resources newest first
///
/// A release failure becomes the pending exception when nothing was thrown,
/// and is attached as suppressed to an exception that is already propagating.
fn release_resources(
    vm: &mut VM,
    rt: &mut Runtime,
    acquired: &[ResourceId],
    resources: &[ResourceDecl],
) {
    for (i, id) in acquired.iter().enumerate().rev() {
        if let Some(decl) = resources.get(i) {
            vm.env.remove(&decl.name);
        }
        let Err(failure) = rt.resources.release(*id) else {
            continue;
        };
        if let Control::Throw(primary) = &mut vm.control {
            debug!(primary = %primary, suppressed = %failure, "release failure suppressed");
            primary.suppress(failure);
            continue;
        }
        raise(vm, failure);
    }
}

/// Run the finally block with the current control stashed, or pop if there is none
fn enter_finally(vm: &mut VM, finally: Option<Box<Stmt>>) {
    match finally {
        Some(finally) => {
            let pending = std::mem::replace(&mut vm.control, Control::None);
            set_top_kind(
                vm,
                FrameKind::Try {
                    phase: TryPhase::FinallyStarted,
                    acquired: vec![],
                    catch_idx: None,
                    pending: Some(pending),
                },
            );
            push_stmt(vm, &finally);
        }
        None => {
            vm.frames.pop();
        }
    }
}

/* ===================== Jumps ===================== */

/// Execute Return statement
pub fn execute_return(vm: &mut VM, rt: &mut Runtime, phase: ReturnPhase, value: Option<Expr>) {
    match phase {
        ReturnPhase::Eval => {
            let val = match &value {
                Some(expr) => match eval(vm, rt, expr) {
                    Ok(v) => v,
                    Err(e) => {
                        raise(vm, e);
                        vm.frames.pop();
                        return;
                    }
                },
                None => Val::Null,
            };

            vm.control = Control::Return(val);
            vm.frames.pop();
        }
    }
}

/// Execute Throw statement
pub fn execute_throw(vm: &mut VM, rt: &mut Runtime, phase: ThrowPhase, value: Expr) {
    match phase {
        ThrowPhase::Eval => {
            let error = match eval(vm, rt, &value) {
                Ok(Val::Exception(e)) => e,
                Ok(other) => Exception::type_error(format!(
                    "Cannot throw a value of type {}",
                    other.type_name()
                )),
                Err(e) => e,
            };
            raise(vm, error);
            vm.frames.pop();
        }
    }
}

/// Execute Break statement
pub fn execute_break(vm: &mut VM, _phase: BreakPhase, label: Option<String>) {
    vm.control = Control::Break(label);
    vm.frames.pop();
}

/// Execute Continue statement
pub fn execute_continue(vm: &mut VM, _phase: ContinuePhase, label: Option<String>) {
    vm.control = Control::Continue(label);
    vm.frames.pop();
}
