//! # Executor - Stack-Driven Control-Flow Evaluator
//!
//! ## Core Principles
//!
//! 1. **Stack-driven execution**: All state in `frames: Vec<Frame>`, no recursion per statement
//! 2. **Statement-level execution**: Each frame has a phase tracking micro-steps
//! 3. **Centralized control flow**: `Control` enum carries break/continue/return/throw
//! 4. **Injected host**: Output and files come from the `Runtime`, never from globals
//!
//! ## Exit protocol
//!
//! A statement finishes either normally (`Control::None`) or abruptly
//! (break, continue, return, throw). Try frames turn that into a fixed order:
//! release resources, pick a catch clause, run finally. The final control of
//! the root frame becomes the [`ExecutionOutcome`].

pub mod errors;
pub mod exec_loop;
pub mod expressions;
pub mod host;
pub mod resources;
pub mod statements;
pub mod stdlib;
pub mod types;
pub mod vm;

#[cfg(test)]
mod tests;

// Re-export commonly used items
pub use errors::{Exception, ExceptionKind};
pub use exec_loop::{run_until_done, step};
pub use expressions::EvalResult;
pub use host::{
    ConsoleSink, DiskFileSystem, Emission, FileSystem, LineReader, MemoryFileSystem, OutputLog,
    OutputSink,
};
pub use resources::{ResourceEvent, ResourceTable};
pub use types::{Control, Expr, FunctionDef, Program, Stmt, Stream, Val};
pub use vm::{Env, Runtime, VM};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::{panic, thread};
use tracing::debug;

/// Native stack reserved per level of fixture call nesting
const STACK_PER_CALL: usize = 256 * 1024;
/// Native stack for the outermost activation and the host calls it makes
const STACK_BASE: usize = 4 * 1024 * 1024;

/// Result of running a block or function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum ExecutionOutcome {
    /// Finished normally; carries the returned value (null when nothing was returned)
    Completed(Val),
    /// An exception reached the top level
    Raised(Exception),
    /// A `break` escaped every loop
    BrokeLoop,
    /// A `continue` escaped every loop
    ContinuedLoop,
}

impl ExecutionOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, ExecutionOutcome::Completed(_))
    }

    /// Returned value, if the run completed
    pub fn value(&self) -> Option<&Val> {
        match self {
            ExecutionOutcome::Completed(v) => Some(v),
            _ => None,
        }
    }

    /// Uncaught exception, if the run raised
    pub fn exception(&self) -> Option<&Exception> {
        match self {
            ExecutionOutcome::Raised(e) => Some(e),
            _ => None,
        }
    }

    fn from_control(control: Control) -> Self {
        match control {
            Control::None => ExecutionOutcome::Completed(Val::Null),
            Control::Return(v) => ExecutionOutcome::Completed(v),
            Control::Throw(e) => ExecutionOutcome::Raised(e),
            Control::Break(_) => ExecutionOutcome::BrokeLoop,
            Control::Continue(_) => ExecutionOutcome::ContinuedLoop,
        }
    }
}

/// Run a statement with `inputs` bound as variables
pub fn run_block(block: &Stmt, inputs: HashMap<String, Val>, rt: &mut Runtime) -> ExecutionOutcome {
    on_eval_stack(rt, move |rt| {
        let mut vm = VM::new(block.clone(), inputs);
        run_until_done(&mut vm, rt);
        ExecutionOutcome::from_control(vm.control)
    })
}

/// Call a program function by name with positional arguments
pub fn run_function(rt: &mut Runtime, name: &str, args: Vec<Val>) -> ExecutionOutcome {
    on_eval_stack(rt, move |rt| invoke(rt, name, args, 0))
}

/// Run `eval` on a thread whose stack fits the configured call depth
///
/// Nested fixture calls recurse on the native stack, so the caller's thread
/// may be far too small for the deepest allowed nesting.
fn on_eval_stack<'a, F>(rt: &mut Runtime<'a>, eval: F) -> ExecutionOutcome
where
    F: FnOnce(&mut Runtime<'a>) -> ExecutionOutcome + Send,
{
    let stack_size = STACK_BASE + rt.limits.call_depth() * STACK_PER_CALL;

    thread::scope(|scope| {
        let spawned = thread::Builder::new()
            .name("guardflow-eval".to_string())
            .stack_size(stack_size)
            .spawn_scoped(scope, move || eval(rt));

        match spawned {
            Ok(handle) => handle
                .join()
                .unwrap_or_else(|payload| panic::resume_unwind(payload)),
            Err(e) => ExecutionOutcome::Raised(Exception::new(
                ExceptionKind::CallDepthFailure,
                format!("could not reserve {} bytes of evaluator stack: {}", stack_size, e),
            )),
        }
    })
}

/// Run a function activation at `depth`
///
/// Lookup, arity and depth failures are reported as raised exceptions so a
/// nested call site can catch them like any other.
pub(crate) fn invoke(rt: &mut Runtime, name: &str, args: Vec<Val>, depth: usize) -> ExecutionOutcome {
    let Some(func) = rt.function(name) else {
        return ExecutionOutcome::Raised(Exception::name(format!("Unknown function: {}", name)));
    };

    if args.len() != func.params.len() {
        return ExecutionOutcome::Raised(Exception::argument(format!(
            "{} expects {} argument(s), got {}",
            name,
            func.params.len(),
            args.len()
        )));
    }

    let limit = rt.limits.call_depth();
    if depth >= limit {
        return ExecutionOutcome::Raised(Exception::new(
            ExceptionKind::CallDepthFailure,
            format!("call depth limit of {} exceeded", limit),
        ));
    }

    debug!(function = name, depth, "function entered");

    let env = func.params.iter().cloned().zip(args).collect::<HashMap<_, _>>();
    let mut vm = VM::at_depth(func.body.clone(), env, depth);
    run_until_done(&mut vm, rt);
    ExecutionOutcome::from_control(vm.control)
}
