//! Virtual Machine state
//!
//! The VM holds the execution state of one function activation:
//! - frames: Stack of active statements
//! - env: Variables visible to the running code
//! - control: Current control flow state (return, break, etc.)
//!
//! Everything shared across activations (program, host capabilities, resource
//! table, step counter) lives in the [`Runtime`] passed to every step.

use super::errors::{Exception, ExceptionKind};
use super::host::{FileSystem, OutputSink};
use super::resources::ResourceTable;
use super::types::{
    AssignPhase, BlockPhase, BreakPhase, ContinuePhase, Control, DeclarePhase, DoWhilePhase,
    EmitPhase, ExprPhase, ForEachPhase, ForPhase, Frame, FrameKind, FunctionDef, IfPhase, Program,
    ReturnPhase, Stmt, ThrowPhase, TryPhase, Val, WhilePhase,
};
use crate::config::EvaluatorConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type Env = HashMap<String, Val>;

/* ===================== VM ===================== */

/// Virtual Machine state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VM {
    /// Stack of execution frames
    pub frames: Vec<Frame>,

    /// Variable environment
    pub env: Env,

    /// Current control flow state
    pub control: Control,

    /// Call nesting depth of this activation (0 for the entry point)
    pub depth: usize,
}

impl VM {
    /// Create a new VM for a statement
    ///
    /// The statement is wrapped in a root frame; `env` holds the inputs.
    pub fn new(program: Stmt, env: Env) -> Self {
        Self::at_depth(program, env, 0)
    }

    pub fn at_depth(program: Stmt, env: Env, depth: usize) -> Self {
        let mut vm = VM {
            frames: vec![],
            env,
            control: Control::None,
            depth,
        };

        push_stmt(&mut vm, &program);

        vm
    }
}

/* ===================== Runtime ===================== */

/// Host-side state shared by every VM in a run
pub struct Runtime<'a> {
    pub program: &'a Program,
    pub output: &'a mut dyn OutputSink,
    pub files: &'a mut dyn FileSystem,
    pub resources: ResourceTable,
    pub limits: EvaluatorConfig,
    steps: u64,
}

impl<'a> Runtime<'a> {
    pub fn new(
        program: &'a Program,
        output: &'a mut dyn OutputSink,
        files: &'a mut dyn FileSystem,
    ) -> Self {
        Self {
            program,
            output,
            files,
            resources: ResourceTable::new(),
            limits: EvaluatorConfig::default(),
            steps: 0,
        }
    }

    pub fn with_limits(mut self, limits: EvaluatorConfig) -> Self {
        self.limits = limits;
        self
    }

    pub fn function(&self, name: &str) -> Option<&'a FunctionDef> {
        self.program.function(name)
    }

    /// Steps taken so far across all activations
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Count one VM step against the budget
    ///
    /// Once the budget is exhausted every further call fails, so enclosing
    /// activations stop as well.
    pub fn charge_step(&mut self) -> Result<(), Exception> {
        self.steps += 1;
        match self.limits.max_steps {
            Some(max) if self.steps > max => Err(Exception::new(
                ExceptionKind::BudgetFailure,
                format!("step budget of {} exhausted", max),
            )),
            _ => Ok(()),
        }
    }
}

/* ===================== Frame Management ===================== */

/// Push a new frame for a statement onto the stack
///
/// This determines the initial phase based on the statement type.
pub fn push_stmt(vm: &mut VM, stmt: &Stmt) {
    let kind = match stmt {
        Stmt::Block { .. } => FrameKind::Block {
            phase: BlockPhase::Execute,
            idx: 0,
            declared_vars: vec![],
        },

        Stmt::Declare { .. } => FrameKind::Declare {
            phase: DeclarePhase::Eval,
        },

        Stmt::Assign { .. } => FrameKind::Assign {
            phase: AssignPhase::Eval,
        },

        Stmt::Expr { .. } => FrameKind::Expr {
            phase: ExprPhase::Eval,
        },

        Stmt::Emit { .. } => FrameKind::Emit {
            phase: EmitPhase::Eval,
        },

        Stmt::If { .. } => FrameKind::If {
            phase: IfPhase::Eval,
        },

        Stmt::While { .. } => FrameKind::While {
            phase: WhilePhase::Eval,
        },

        Stmt::DoWhile { .. } => FrameKind::DoWhile {
            phase: DoWhilePhase::Start,
        },

        Stmt::For { .. } => FrameKind::For {
            phase: ForPhase::Init,
        },

        Stmt::ForEach { .. } => FrameKind::ForEach {
            phase: ForEachPhase::Iterate,
            items: None,
            idx: 0,
        },

        Stmt::Try { .. } => FrameKind::Try {
            phase: TryPhase::Acquire,
            acquired: vec![],
            catch_idx: None,
            pending: None,
        },

        Stmt::Return { .. } => FrameKind::Return {
            phase: ReturnPhase::Eval,
        },

        Stmt::Throw { .. } => FrameKind::Throw {
            phase: ThrowPhase::Eval,
        },

        Stmt::Break { .. } => FrameKind::Break {
            phase: BreakPhase::Execute,
        },

        Stmt::Continue { .. } => FrameKind::Continue {
            phase: ContinuePhase::Execute,
        },
    };

    vm.frames.push(Frame {
        kind,
        node: stmt.clone(),
    });
}

/// Replace the kind of the top frame
pub(crate) fn set_top_kind(vm: &mut VM, kind: FrameKind) {
    if let Some(frame) = vm.frames.last_mut() {
        frame.kind = kind;
    }
}
