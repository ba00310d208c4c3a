//! Validation Rules
//!
//! Each file in this module contains one validation rule:
//!
//! - `loop_control.rs` - `break`/`continue` outside a loop or with an unknown label
//! - `undefined_name.rs` - Variables and functions used before declaration, call arity
//! - `duplicate_declaration.rs` - Names declared twice in one function
//! - `unreachable_code.rs` - Statements after an unconditional jump

mod duplicate_declaration;
mod loop_control;
mod undefined_name;
mod unreachable_code;

pub use duplicate_declaration::DuplicateDeclarationRule;
pub use loop_control::LoopControlRule;
pub use undefined_name::UndefinedNameRule;
pub use unreachable_code::UnreachableCodeRule;
