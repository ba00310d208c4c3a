pub mod cli;
pub mod config;
pub mod executor;
pub mod parser;

// Re-export the evaluator entry points
pub use executor::{run_block, run_function, ExecutionOutcome, Runtime};
pub use parser::{load_program, parse_program};
