//! Type definitions for the executor
//!
//! This module contains all the core types used by the executor:
//! - AST nodes (Stmt, Expr, Program)
//! - Runtime values (Val)
//! - Control flow (Control, Frame, FrameKind)
//! - Execution phases (Phase enums for each statement type)

pub mod ast;
pub mod control;
pub mod phase;
pub mod values;

// Re-export all types for convenient access
pub use ast::{
    BinaryOp, CatchClause, CatchPattern, Expr, FunctionDef, Place, Program, ResourceDecl, Span,
    Stmt, Stream, UnaryOp,
};
pub use control::{Control, Frame, FrameKind};
pub use phase::*;
pub use values::{ResourceId, Val};
