//! Control flow and execution frame types

use super::super::errors::Exception;
use super::ast::Stmt;
use super::phase::{
    AssignPhase, BlockPhase, BreakPhase, ContinuePhase, DeclarePhase, DoWhilePhase, EmitPhase,
    ExprPhase, ForEachPhase, ForPhase, IfPhase, ReturnPhase, ThrowPhase, TryPhase, WhilePhase,
};
use super::values::{ResourceId, Val};
use serde::{Deserialize, Serialize};

/* ===================== Control Flow ===================== */

/// Control flow state
///
/// This represents active control flow (return, break, continue, throw).
/// When control != None, every frame handler checks it first and either
/// consumes it (loops, Try) or pops itself so the control keeps travelling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum Control {
    None,
    Break(Option<String>),    // Optional loop label
    Continue(Option<String>), // Optional loop label
    Return(Val),
    Throw(Exception),
}

impl Control {
    /// Does a break/continue label target a loop carrying `loop_label`?
    ///
    /// An unlabeled jump targets the innermost loop.
    pub fn targets(jump_label: &Option<String>, loop_label: &Option<String>) -> bool {
        jump_label.is_none() || jump_label == loop_label
    }
}

/* ===================== Frames ===================== */

/// Frame kind - the type and state of a statement being executed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum FrameKind {
    Block {
        phase: BlockPhase,
        idx: usize,
        declared_vars: Vec<String>,
    },
    Declare {
        phase: DeclarePhase,
    },
    Assign {
        phase: AssignPhase,
    },
    Expr {
        phase: ExprPhase,
    },
    Emit {
        phase: EmitPhase,
    },
    If {
        phase: IfPhase,
    },
    While {
        phase: WhilePhase,
    },
    DoWhile {
        phase: DoWhilePhase,
    },
    For {
        phase: ForPhase,
    },
    ForEach {
        phase: ForEachPhase,
        /// Items to iterate over (None = iterable not yet evaluated)
        items: Option<Vec<Val>>,
        /// Current iteration index
        idx: usize,
    },
    Try {
        phase: TryPhase,
        /// Resources acquired so far, in acquisition order
        acquired: Vec<ResourceId>,
        /// Index of the running catch clause
        catch_idx: Option<usize>,
        /// Control stashed while the finally block runs
        pending: Option<Control>,
    },
    Return {
        phase: ReturnPhase,
    },
    Throw {
        phase: ThrowPhase,
    },
    Break {
        phase: BreakPhase,
    },
    Continue {
        phase: ContinuePhase,
    },
}

/// Execution frame - one per active statement
///
/// The frame stack replaces the system call stack, so a VM can be inspected
/// or serialized between any two steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    /// The kind and state of this frame
    #[serde(flatten)]
    pub kind: FrameKind,

    /// The AST node (statement) this frame represents
    pub node: Stmt,
}
