//! Whole-fixture runs, evaluation limits and outcome encoding

use super::helpers::*;
use crate::config::EvaluatorConfig;
use crate::executor::{Exception, ExceptionKind, ExecutionOutcome, MemoryFileSystem, Stream, Val};

const FINALLY: &str = "In `finally' block.";

fn structures_main_expected() -> Vec<String> {
    let mut lines: Vec<String> = vec![
        FINALLY.into(),
        "[             tryCatchFinally] 5 (should be 5, check for `finally' block)".into(),
        "Division by zero.".into(),
        FINALLY.into(),
        "[             tryCatchFinally] 0 (should be 0, check for division error and `finally' block)".into(),
        FINALLY.into(),
        "[            tryWithResources] // structures.flow (should be \"// structures.flow\", check for `finally' block)".into(),
        "An error occurred.".into(),
        FINALLY.into(),
        "[            tryWithResources]  (should be \"\", check for error message and `finally' block)".into(),
        "[              throwException] 5 (should be 5)".into(),
        "[              throwException] PASSED (should be PASSED)".into(),
    ];

    lines.extend((0..5).map(|i| format!("Loop iteration {}", i)));
    lines.push("[                     forLoop] (should show iterations 0 to 4)".into());
    lines.extend((0..5).rev().map(|i| format!("Loop iteration {}", i)));
    lines.push("[              inverseforLoop] (should show iterations 4 to 0)".into());

    let collatz = ["6", "3", "10", "5", "16", "8", "4", "2", "1"];
    for name in ["whileLoop", "doWhileLoop", "breakInEndlessLoop"] {
        lines.extend(collatz.iter().map(|s| s.to_string()));
        lines.push(format!(
            "[{:>28}] (should show the following sequence: 6, 3, 10, 5, 16, 8, 4, 2, 1)",
            name
        ));
    }

    lines.extend([1, 3, 5, 7, 9].iter().map(|i| format!("Loop iteration {}", i)));
    lines.push("[           continueInForLoop] (should show odd iterations from 1 to 9)".into());
    lines
}

#[test]
fn test_structures_self_test() {
    let program = load(STRUCTURES);
    let files = MemoryFileSystem::new().with_file("structures.flow", STRUCTURES);
    let report = call(&program, "main", vec![], files);

    assert_eq!(report.value(), &Val::Null);
    assert_eq!(report.lines(), structures_main_expected());
    assert_eq!(
        report.output.stream_lines(Stream::Err),
        vec!["Division by zero.", "An error occurred."]
    );
    assert_eq!(report.acquired, 1);
    assert_eq!(report.live, 0);
}

#[test]
fn test_step_budget_is_not_catchable() {
    let program = load(
        r#"
fn spin() {
    while (true) { }
}

fn main(path) {
    try (r = open(path)) {
        try {
            spin()
        } catch (e) {
            println("caught " + e)
        }
    } finally {
        println("finally")
    }
}
"#,
    );
    let files = MemoryFileSystem::new().with_file("a.txt", "alpha");
    let limits = EvaluatorConfig {
        max_steps: Some(500),
        ..EvaluatorConfig::default()
    };
    let report = call_with_limits(&program, "main", vec![Val::str("a.txt")], files, limits);

    let e = report.outcome.exception().unwrap();
    assert_eq!(e.kind, ExceptionKind::BudgetFailure);
    assert_eq!(e.message, "step budget of 500 exhausted");
    // no handler or finally block ran, but the handle was still closed
    assert!(report.lines().is_empty());
    assert_eq!(report.acquired, 1);
    assert_eq!(report.live, 0);
}

#[test]
fn test_budget_large_enough_for_fixture() {
    let program = load(STRUCTURES);
    let files = MemoryFileSystem::new().with_file("structures.flow", STRUCTURES);
    let limits = EvaluatorConfig {
        max_steps: Some(100_000),
        ..EvaluatorConfig::default()
    };
    let report = call_with_limits(&program, "main", vec![], files, limits);
    assert!(report.outcome.is_completed());
}

#[test]
fn test_call_depth_limit_is_catchable() {
    let program = load(
        r#"
fn down(n) {
    return down(n + 1)
}

fn main() {
    try {
        down(0)
    } catch (CallDepthFailure e) {
        return e.message
    }
}
"#,
    );
    let limits = EvaluatorConfig {
        max_call_depth: 16,
        ..EvaluatorConfig::default()
    };
    let report = call_with_limits(&program, "main", vec![], MemoryFileSystem::new(), limits);

    assert_eq!(report.value(), &Val::str("call depth limit of 16 exceeded"));
}

const RUNAWAY: &str = r#"
fn down(n) {
    return down(n + 1)
}

fn sum(n) {
    if (n == 0) return 0
    return n + sum(n - 1)
}

fn main() {
    try {
        down(0)
    } catch (CallDepthFailure e) {
        return e.message
    }
}
"#;

#[test]
fn test_default_call_depth_is_reached_without_overflow() {
    let program = load(RUNAWAY);

    let report = call(&program, "main", vec![], MemoryFileSystem::new());
    assert_eq!(report.value(), &Val::str("call depth limit of 256 exceeded"));

    let deep = call(&program, "sum", vec![Val::Int(255)], MemoryFileSystem::new());
    assert_eq!(deep.value(), &Val::Int(32640));
}

#[test]
fn test_oversized_call_depth_is_clamped() {
    let program = load(RUNAWAY);
    let limits = EvaluatorConfig {
        max_call_depth: 100_000,
        ..EvaluatorConfig::default()
    };
    let report = call_with_limits(&program, "main", vec![], MemoryFileSystem::new(), limits);

    assert_eq!(report.value(), &Val::str("call depth limit of 1024 exceeded"));
}

#[test]
fn test_recursion_within_limit() {
    let program = load(
        r#"
fn fact(n) {
    if (n <= 1) return 1
    return n * fact(n - 1)
}
"#,
    );
    let report = call(&program, "fact", vec![Val::Int(10)], MemoryFileSystem::new());
    assert_eq!(report.value(), &Val::Int(3628800));
}

#[test]
fn test_unknown_function_and_arity_at_entry() {
    let program = load(STRUCTURES);

    let missing = call(&program, "nope", vec![], MemoryFileSystem::new());
    assert_eq!(
        missing.outcome.exception().unwrap().kind,
        ExceptionKind::NameFailure
    );

    let arity = call(&program, "forLoop", vec![], MemoryFileSystem::new());
    let e = arity.outcome.exception().unwrap();
    assert_eq!(e.kind, ExceptionKind::ArgumentFailure);
    assert_eq!(e.message, "forLoop expects 1 argument(s), got 0");
}

#[test]
fn test_outcome_json() {
    let mut error = Exception::argument("bad");
    error.suppress(Exception::resource("a.txt: close failed"));
    let outcomes = vec![
        ExecutionOutcome::Completed(ints(&[1, 2])),
        ExecutionOutcome::Raised(error),
        ExecutionOutcome::BrokeLoop,
    ];

    let json = serde_json::to_string(&outcomes).unwrap();
    let back: Vec<ExecutionOutcome> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, outcomes);

    let completed = serde_json::to_value(&outcomes[0]).unwrap();
    assert_eq!(completed["t"], "Completed");
}
