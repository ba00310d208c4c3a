//! Execution phase enums for each statement type
//!
//! Each statement type has its own Phase enum that tracks which execution step
//! it's currently at. These are serialized as u8.

use serde::{Deserialize, Serialize};

/// Execution phase for Block statements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(u8)]
pub enum BlockPhase {
    Execute = 0,
}

/// Execution phase for Declare statements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(u8)]
pub enum DeclarePhase {
    Eval = 0,
}

/// Execution phase for Assign statements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(u8)]
pub enum AssignPhase {
    Eval = 0,
}

/// Execution phase for Expr statements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ExprPhase {
    Eval = 0,
}

/// Execution phase for Emit statements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(u8)]
pub enum EmitPhase {
    Eval = 0,
}

/// Execution phase for If statements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(u8)]
pub enum IfPhase {
    Eval = 0,
}

/// Execution phase for While statements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(u8)]
pub enum WhilePhase {
    /// Evaluate the test, then push the body or exit
    Eval = 0,
}

/// Execution phase for DoWhile statements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(u8)]
pub enum DoWhilePhase {
    /// First iteration: push the body without testing
    Start = 0,
    /// Body finished: evaluate the test
    Test = 1,
}

/// Execution phase for three-part For statements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ForPhase {
    /// Run the initializer
    Init = 0,
    /// Evaluate the continuation test
    Test = 1,
    /// Body finished (normally or via continue): run the post-body step
    Update = 2,
}

/// Execution phase for ForEach statements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ForEachPhase {
    Iterate = 0,
}

/// Execution phase for Try statements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TryPhase {
    /// Acquiring header resources, one per step
    Acquire = 0,
    /// Guarded body is running
    BodyStarted = 1,
    /// A catch clause is running
    CatchStarted = 2,
    /// The finally block is running with the pending control stashed
    FinallyStarted = 3,
}

/// Execution phase for Return statements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ReturnPhase {
    Eval = 0,
}

/// Execution phase for Throw statements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ThrowPhase {
    Eval = 0,
}

/// Execution phase for Break statements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(u8)]
pub enum BreakPhase {
    Execute = 0,
}

/// Execution phase for Continue statements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ContinuePhase {
    Execute = 0,
}
