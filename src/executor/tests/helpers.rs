//! Test helpers for executor tests
//!
//! Common utilities for loading fixture programs and running them against
//! in-memory hosts

use crate::config::EvaluatorConfig;
use crate::executor::{
    run_block, run_function, ExecutionOutcome, MemoryFileSystem, OutputLog, ResourceEvent,
    Runtime, Val,
};
use crate::executor::types::{Program, Stmt};
use std::collections::HashMap;

/// Fixture sources shared by several test modules
pub const STRUCTURES: &str = include_str!("../../../demos/structures.flow");
pub const TYPES: &str = include_str!("../../../demos/types.flow");

/// Parse program source, validate, serialize/deserialize
///
/// This helper:
/// - Parses the program
/// - Asserts the validator reports no errors (warnings are fine)
/// - Serializes and deserializes (to test round-trip compatibility)
pub fn load(source: &str) -> Program {
    let program = crate::parser::parse_program(source).expect("Parse program failed");
    let errors = crate::parser::semantic_validator::validate_program(&program, source);
    let validation_errors: Vec<_> = errors.iter().filter(|e| e.is_error()).collect();
    assert!(
        validation_errors.is_empty(),
        "Program validation failed: {:?}",
        validation_errors
    );
    let json = serde_json::to_string(&program).expect("Program serialization failed");
    serde_json::from_str(&json).expect("Program deserialization failed")
}

/// Everything a run leaves behind
#[derive(Debug)]
pub struct Report {
    pub outcome: ExecutionOutcome,
    pub output: OutputLog,
    pub live: usize,
    pub acquired: usize,
    pub released: usize,
    pub history: Vec<ResourceEvent>,
}

impl Report {
    /// Emitted lines in order, both streams
    pub fn lines(&self) -> Vec<&str> {
        self.output.lines()
    }

    pub fn value(&self) -> &Val {
        match &self.outcome {
            ExecutionOutcome::Completed(v) => v,
            other => panic!("expected completion, got {:?}", other),
        }
    }
}

/// Call `function` with default limits
pub fn call(program: &Program, function: &str, args: Vec<Val>, files: MemoryFileSystem) -> Report {
    call_with_limits(program, function, args, files, EvaluatorConfig::default())
}

pub fn call_with_limits(
    program: &Program,
    function: &str,
    args: Vec<Val>,
    mut files: MemoryFileSystem,
    limits: EvaluatorConfig,
) -> Report {
    let mut output = OutputLog::new();
    let (outcome, live, acquired, released, history) = {
        let mut rt = Runtime::new(program, &mut output, &mut files).with_limits(limits);
        let outcome = run_function(&mut rt, function, args);
        (
            outcome,
            rt.resources.live(),
            rt.resources.acquired(),
            rt.resources.released(),
            rt.resources.history().to_vec(),
        )
    };
    Report {
        outcome,
        output,
        live,
        acquired,
        released,
        history,
    }
}

/// Parse a bare statement list and run it WITHOUT validation
///
/// Use this for runtime behavior the validator would reject up front, such
/// as loop control escaping to the top or reading an unbound name.
pub fn run_source(source: &str, inputs: HashMap<String, Val>) -> Report {
    let block = crate::parser::parse(source).expect("Parse failed");
    let json = serde_json::to_string(&block).expect("Block serialization failed");
    let block: Stmt = serde_json::from_str(&json).expect("Block deserialization failed");

    let program = Program::default();
    let mut files = MemoryFileSystem::new();
    let mut output = OutputLog::new();
    let (outcome, live, acquired, released, history) = {
        let mut rt = Runtime::new(&program, &mut output, &mut files);
        let outcome = run_block(&block, inputs, &mut rt);
        (
            outcome,
            rt.resources.live(),
            rt.resources.acquired(),
            rt.resources.released(),
            rt.resources.history().to_vec(),
        )
    };
    Report {
        outcome,
        output,
        live,
        acquired,
        released,
        history,
    }
}

/// Wrap statements in `fn main() { ... }`, load and run it
pub fn run_main(body: &str) -> Report {
    let program = load(&format!("fn main() {{\n{}\n}}", body));
    call(&program, "main", vec![], MemoryFileSystem::new())
}

pub fn strs(items: &[&str]) -> Val {
    Val::List(items.iter().map(|s| Val::str(*s)).collect())
}

pub fn ints(items: &[i32]) -> Val {
    Val::List(items.iter().map(|n| Val::Int(*n)).collect())
}
