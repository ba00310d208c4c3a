//! Core execution loop
//!
//! This module contains the step() function - the heart of the interpreter.
//! It processes one frame at a time, advancing execution phases and managing the frame stack.
//!
//! ## Function Organization
//! 1. run_until_done() - Top-level driver (calls step repeatedly)
//! 2. step() - Main execution loop (dispatches to statement handlers)

use super::errors::Exception;
use super::statements::{
    execute_assign, execute_block, execute_break, execute_continue, execute_declare,
    execute_do_while, execute_emit, execute_expr, execute_for, execute_for_each, execute_if,
    execute_return, execute_throw, execute_try, execute_while,
};
use super::types::{Control, FrameKind, Stmt};
use super::vm::{Runtime, VM};
use tracing::{debug, trace};

/* ===================== Public API ===================== */

/// Run the VM until its frame stack is empty
///
/// After completion, inspect `vm.control` for the final state. Every step is
/// charged against the runtime's step budget; when the budget runs out the
/// run is abandoned with a BudgetFailure that no catch clause can intercept.
pub fn run_until_done(vm: &mut VM, rt: &mut Runtime) {
    while !vm.frames.is_empty() {
        if let Err(exhausted) = rt.charge_step() {
            abandon(vm, rt, exhausted);
            return;
        }
        step(vm, rt);
    }
}

/// Execute one step of the VM
///
/// Gets the top frame and dispatches to its statement handler. Each handler
/// manages its own control flow propagation.
pub fn step(vm: &mut VM, rt: &mut Runtime) {
    let Some(frame_idx) = vm.frames.len().checked_sub(1) else {
        return;
    };

    // Clone frame data we need (to avoid borrow checker issues)
    let (kind, node) = {
        let f = &vm.frames[frame_idx];
        (f.kind.clone(), f.node.clone())
    };

    trace!(depth = vm.depth, frames = vm.frames.len(), stmt = node.kind_name(), "step");

    match (kind, node) {
        (
            FrameKind::Block {
                phase,
                idx,
                declared_vars,
            },
            Stmt::Block { body, .. },
        ) => execute_block(vm, phase, idx, declared_vars, body.as_slice()),

        (FrameKind::Declare { phase }, Stmt::Declare { name, init, .. }) => {
            execute_declare(vm, rt, phase, name, init)
        }

        (FrameKind::Assign { phase }, Stmt::Assign { place, value, .. }) => {
            execute_assign(vm, rt, phase, place, value)
        }

        (FrameKind::Expr { phase }, Stmt::Expr { expr, .. }) => execute_expr(vm, rt, phase, expr),

        (FrameKind::Emit { phase }, Stmt::Emit { stream, value, .. }) => {
            execute_emit(vm, rt, phase, stream, value)
        }

        (
            FrameKind::If { phase },
            Stmt::If {
                test,
                then_s,
                else_s,
                ..
            },
        ) => execute_if(vm, rt, phase, test, then_s, else_s),

        (
            FrameKind::While { phase },
            Stmt::While {
                label, test, body, ..
            },
        ) => execute_while(vm, rt, phase, label, test, body),

        (
            FrameKind::DoWhile { phase },
            Stmt::DoWhile {
                label, body, test, ..
            },
        ) => execute_do_while(vm, rt, phase, label, body, test),

        (
            FrameKind::For { phase },
            Stmt::For {
                label,
                init,
                test,
                update,
                body,
                ..
            },
        ) => execute_for(vm, rt, phase, label, init, test, update, body),

        (
            FrameKind::ForEach { phase, items, idx },
            Stmt::ForEach {
                label,
                binding,
                iterable,
                body,
                ..
            },
        ) => execute_for_each(vm, rt, phase, items, idx, label, binding, iterable, body),

        (
            FrameKind::Try {
                phase,
                acquired,
                catch_idx,
                pending,
            },
            Stmt::Try {
                resources,
                body,
                catches,
                finally,
                ..
            },
        ) => execute_try(
            vm,
            rt,
            phase,
            acquired,
            catch_idx,
            pending,
            &resources,
            body,
            &catches,
            finally,
        ),

        (FrameKind::Return { phase }, Stmt::Return { value, .. }) => {
            execute_return(vm, rt, phase, value)
        }

        (FrameKind::Throw { phase }, Stmt::Throw { value, .. }) => {
            execute_throw(vm, rt, phase, value)
        }

        (FrameKind::Break { phase }, Stmt::Break { label, .. }) => execute_break(vm, phase, label),

        (FrameKind::Continue { phase }, Stmt::Continue { label, .. }) => {
            execute_continue(vm, phase, label)
        }

        // Shouldn't happen - push_stmt pairs every node with its own frame kind
        (kind, node) => unreachable!(
            "Frame kind {:?} does not match statement {}",
            kind,
            node.kind_name()
        ),
    }
}

/* ===================== Budget ===================== */

/// Stop the run: drop every frame and close whatever is still open
fn abandon(vm: &mut VM, rt: &mut Runtime, exhausted: Exception) {
    debug!(
        depth = vm.depth,
        steps = rt.steps(),
        frames = vm.frames.len(),
        "step budget exhausted"
    );
    vm.frames.clear();
    rt.resources.release_all();
    vm.control = Control::Throw(exhausted);
}
