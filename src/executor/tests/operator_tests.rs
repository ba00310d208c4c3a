use super::helpers::*;
use crate::executor::{ExceptionKind, Val};
use maplit::hashmap;

fn eval(expr: &str) -> Val {
    let report = run_source(&format!("return {}", expr), hashmap! {});
    report.value().clone()
}

fn eval_err(expr: &str) -> (ExceptionKind, String) {
    let report = run_source(&format!("return {}", expr), hashmap! {});
    let e = report
        .outcome
        .exception()
        .unwrap_or_else(|| panic!("{} should raise", expr));
    (e.kind, e.message.clone())
}

#[test]
fn test_integer_division_truncates_toward_zero() {
    assert_eq!(eval("7 / 2"), Val::Int(3));
    assert_eq!(eval("-7 / 2"), Val::Int(-3));
    assert_eq!(eval("-7 % 2"), Val::Int(-1));
    assert_eq!(eval("7 % -2"), Val::Int(1));
}

#[test]
fn test_arithmetic_wraps() {
    assert_eq!(eval("2147483647 + 1"), Val::Int(i32::MIN));
    assert_eq!(eval("-2147483648 - 1"), Val::Int(i32::MAX));
    assert_eq!(eval("-2147483648 / -1"), Val::Int(i32::MIN));
    assert_eq!(eval("-(-2147483648)"), Val::Int(i32::MIN));
}

#[test]
fn test_division_by_zero() {
    assert_eq!(
        eval_err("1 / 0"),
        (ExceptionKind::ArithmeticFailure, "/ by zero".to_string())
    );
    assert_eq!(eval_err("1 % 0").0, ExceptionKind::ArithmeticFailure);
}

#[test]
fn test_string_concatenation() {
    assert_eq!(eval(r#""n=" + 5"#), Val::str("n=5"));
    assert_eq!(eval(r#"5 + "!""#), Val::str("5!"));
    assert_eq!(eval(r#"1 + 2 + "x""#), Val::str("3x"));
    assert_eq!(eval(r#""x" + 1 + 2"#), Val::str("x12"));
    assert_eq!(eval(r#"[1, 2] + "" + null + true"#), Val::str("[1, 2]nulltrue"));
}

#[test]
fn test_comparisons() {
    assert_eq!(eval("1 < 2 && 2 <= 2 && 3 > 2 && 3 >= 3"), Val::Bool(true));
    assert_eq!(eval(r#""apple" < "banana""#), Val::Bool(true));
    assert_eq!(eval(r#"1 == "1""#), Val::Bool(false));
    assert_eq!(eval("[1, [2]] == [1, [2]]"), Val::Bool(true));
    assert_eq!(eval("null != false"), Val::Bool(true));

    assert_eq!(
        eval_err(r#"1 < "a""#),
        (
            ExceptionKind::TypeFailure,
            "Operator < not supported for int and string".to_string()
        )
    );
}

#[test]
fn test_logical_operators_short_circuit() {
    assert_eq!(eval("false && 1 / 0 == 0"), Val::Bool(false));
    assert_eq!(eval("true || 1 / 0 == 0"), Val::Bool(true));
    assert_eq!(eval("!false"), Val::Bool(true));

    assert_eq!(eval_err("true && 1").0, ExceptionKind::TypeFailure);
    assert_eq!(
        eval_err("!0"),
        (
            ExceptionKind::TypeFailure,
            "Condition must be a bool, got int".to_string()
        )
    );
}

#[test]
fn test_unbound_name_at_runtime() {
    assert_eq!(
        eval_err("missing + 1"),
        (ExceptionKind::NameFailure, "missing is not defined".to_string())
    );
}

#[test]
fn test_exception_values() {
    assert_eq!(
        eval(r#"ArgumentFailure("bad").message"#),
        Val::str("bad")
    );
    assert_eq!(eval("ArithmeticFailure().kind"), Val::str("ArithmeticFailure"));
    assert_eq!(eval(r#"str(IndexFailure("at " + 3))"#), Val::str("IndexFailure: at 3"));

    // throwing a non-exception is itself a failure
    let report = run_source("throw 42", hashmap! {});
    assert_eq!(
        report.outcome.exception().unwrap().kind,
        ExceptionKind::TypeFailure
    );
}
