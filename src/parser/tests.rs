use super::*;
use crate::executor::types::ast::{BinaryOp, CatchPattern, Expr, Stmt, Stream, UnaryOp};

/// Parse a statement list and return its top-level statements
fn stmts(source: &str) -> Vec<Stmt> {
    match parse(source).expect("Parse should succeed") {
        Stmt::Block { body, .. } => body,
        other => panic!("expected block, got {:?}", other),
    }
}

fn single(source: &str) -> Stmt {
    let mut body = stmts(source);
    assert_eq!(body.len(), 1, "expected one statement in {:?}", source);
    body.remove(0)
}

fn expr_of(source: &str) -> Expr {
    match single(source) {
        Stmt::Expr { expr, .. } => expr,
        other => panic!("expected expression statement, got {:?}", other),
    }
}

/* ===================== Programs ===================== */

#[test]
fn test_parse_program_functions() {
    let program = parse_program(
        r#"
// leading comment
fn divide(a, b) {
    return a / b
}

/* block comment */
fn main() {}
"#,
    )
    .unwrap();

    assert_eq!(program.functions.len(), 2);
    let divide = program.function("divide").unwrap();
    assert_eq!(divide.params, vec!["a", "b"]);
    assert_eq!(divide.span.start_line, 2);
    assert!(program.function("main").unwrap().params.is_empty());
}

#[test]
fn test_statements_outside_function_rejected() {
    let err = parse_program("let x = 1").unwrap_err();
    assert!(matches!(err, ParseError::PestError(..)));
    assert_eq!(err.span().unwrap().start_line, 0);
}

/* ===================== Statements ===================== */

#[test]
fn test_declare_and_assign() {
    let body = stmts("let x = 1; x = 2; let y");
    assert!(matches!(&body[0], Stmt::Declare { name, init: Some(Expr::LitInt { v: 1 }), .. } if name == "x"));
    assert!(matches!(&body[1], Stmt::Assign { place, value: Expr::LitInt { v: 2 }, .. } if place.var == "x"));
    assert!(matches!(&body[2], Stmt::Declare { init: None, .. }));
}

#[test]
fn test_compound_assignment_desugars() {
    match single("slots[i % 8] += str(i)") {
        Stmt::Assign { place, value, .. } => {
            assert_eq!(place.var, "slots");
            assert_eq!(place.indices.len(), 1);
            match value {
                Expr::Binary { op, left, right } => {
                    assert_eq!(op, BinaryOp::Add);
                    assert!(matches!(*left, Expr::Index { .. }));
                    assert!(matches!(*right, Expr::Call { ref callee, .. } if callee == "str"));
                }
                other => panic!("expected binary, got {:?}", other),
            }
        }
        other => panic!("expected assign, got {:?}", other),
    }
}

#[test]
fn test_increment_and_decrement() {
    let body = stmts("i++\nj--");
    assert!(matches!(
        &body[0],
        Stmt::Assign { value: Expr::Binary { op: BinaryOp::Add, .. }, .. }
    ));
    assert!(matches!(
        &body[1],
        Stmt::Assign { value: Expr::Binary { op: BinaryOp::Sub, .. }, .. }
    ));
}

#[test]
fn test_loops() {
    let body = stmts(
        r#"
while (n != 1) { n = n / 2 }
do { n++ } while (n < 10)
for (let i = count - 1; i >= 0; i--) println(i)
for (;;) { break }
for (x in xs) println(x)
"#,
    );

    assert!(matches!(&body[0], Stmt::While { label: None, .. }));
    assert!(matches!(&body[1], Stmt::DoWhile { .. }));
    match &body[2] {
        Stmt::For {
            init: Some(init),
            test: Some(Expr::Binary { op: BinaryOp::Gte, .. }),
            update: Some(_),
            ..
        } => assert!(matches!(**init, Stmt::Declare { .. })),
        other => panic!("expected counting loop, got {:?}", other),
    }
    assert!(matches!(
        &body[3],
        Stmt::For { init: None, test: None, update: None, .. }
    ));
    assert!(matches!(&body[4], Stmt::ForEach { binding, .. } if binding == "x"));
}

#[test]
fn test_labels_and_jumps() {
    let body = stmts(
        r#"
outer: while (true) {
    continue outer
    break
}
"#,
    );

    match &body[0] {
        Stmt::While {
            label: Some(label),
            body,
            ..
        } => {
            assert_eq!(label, "outer");
            match &**body {
                Stmt::Block { body, .. } => {
                    assert!(matches!(&body[0], Stmt::Continue { label: Some(l), .. } if l == "outer"));
                    assert!(matches!(&body[1], Stmt::Break { label: None, .. }));
                }
                other => panic!("expected block, got {:?}", other),
            }
        }
        other => panic!("expected labelled while, got {:?}", other),
    }
}

#[test]
fn test_return_operand_must_be_on_same_line() {
    let body = stmts("return\nx");
    assert!(matches!(&body[0], Stmt::Return { value: None, .. }));
    assert!(matches!(&body[1], Stmt::Expr { .. }));

    assert!(matches!(
        single("return -1"),
        Stmt::Return { value: Some(Expr::LitInt { v: -1 }), .. }
    ));
}

#[test]
fn test_emit_streams() {
    let body = stmts(r#"println("a") eprintln("b") println()"#);
    assert!(matches!(&body[0], Stmt::Emit { stream: Stream::Out, value: Some(_), .. }));
    assert!(matches!(&body[1], Stmt::Emit { stream: Stream::Err, .. }));
    assert!(matches!(&body[2], Stmt::Emit { value: None, .. }));
}

#[test]
fn test_try_catch_finally() {
    let stmt = single(
        r#"
try (first = open(a); second = open(b)) {
    println(first.readLine())
} catch (ResourceFailure | ArgumentFailure e) {
    println(e.message)
} catch (other) {
    throw other
} finally {
    println("done")
}
"#,
    );

    match stmt {
        Stmt::Try {
            resources,
            catches,
            finally,
            ..
        } => {
            let names: Vec<_> = resources.iter().map(|r| r.name.as_str()).collect();
            assert_eq!(names, vec!["first", "second"]);
            assert_eq!(catches.len(), 2);
            assert_eq!(
                catches[0].pattern,
                CatchPattern::Kinds {
                    kinds: vec![ExceptionKind::ResourceFailure, ExceptionKind::ArgumentFailure]
                }
            );
            assert_eq!(catches[0].binding, "e");
            assert_eq!(catches[1].pattern, CatchPattern::Any);
            assert_eq!(catches[1].binding, "other");
            assert!(finally.is_some());
        }
        other => panic!("expected try, got {:?}", other),
    }
}

#[test]
fn test_try_errors() {
    let err = parse("try { println(1) }").unwrap_err();
    assert!(err.message().contains("try requires"));

    let err = parse("try { } catch (NotAKind e) { }").unwrap_err();
    assert_eq!(err.message(), "Unknown exception kind: NotAKind");
    assert!(matches!(err, ParseError::BuildError(_, Some(_))));
}

/* ===================== Expressions ===================== */

#[test]
fn test_precedence() {
    // 1 + 2 * 3 == 7 || false
    match expr_of("1 + 2 * 3 == 7 || false") {
        Expr::Binary {
            op: BinaryOp::Or,
            left,
            ..
        } => match *left {
            Expr::Binary {
                op: BinaryOp::Eq,
                left,
                ..
            } => match *left {
                Expr::Binary {
                    op: BinaryOp::Add,
                    right,
                    ..
                } => assert!(matches!(*right, Expr::Binary { op: BinaryOp::Mul, .. })),
                other => panic!("expected +, got {:?}", other),
            },
            other => panic!("expected ==, got {:?}", other),
        },
        other => panic!("expected ||, got {:?}", other),
    }
}

#[test]
fn test_left_associative() {
    // (10 - 4) - 3
    match expr_of("10 - 4 - 3") {
        Expr::Binary {
            op: BinaryOp::Sub,
            left,
            right,
        } => {
            assert!(matches!(*left, Expr::Binary { op: BinaryOp::Sub, .. }));
            assert!(matches!(*right, Expr::LitInt { v: 3 }));
        }
        other => panic!("expected -, got {:?}", other),
    }
}

#[test]
fn test_unary_and_literals() {
    assert!(matches!(
        expr_of("!done"),
        Expr::Unary { op: UnaryOp::Not, .. }
    ));
    assert!(matches!(
        expr_of("-x"),
        Expr::Unary { op: UnaryOp::Neg, .. }
    ));
    assert!(matches!(
        expr_of("-2147483648"),
        Expr::LitInt { v: i32::MIN }
    ));
    assert!(matches!(expr_of("null"), Expr::LitNull));
    assert!(matches!(expr_of("[1, \"a\", true]"), Expr::LitList { ref elements } if elements.len() == 3));
    assert!(matches!(expr_of(r#""a\"b\n""#), Expr::LitStr { ref v } if v == "a\"b\n"));
    assert!(matches!(expr_of(r#""""#), Expr::LitStr { ref v } if v.is_empty()));
}

#[test]
fn test_most_negative_literal_as_operand() {
    match expr_of("-2147483648 - 1") {
        Expr::Binary { op: BinaryOp::Sub, left, right } => {
            assert!(matches!(*left, Expr::LitInt { v: i32::MIN }));
            assert!(matches!(*right, Expr::LitInt { v: 1 }));
        }
        other => panic!("expected -, got {:?}", other),
    }

    // a suffixed or parenthesized operand stays a negation
    assert!(matches!(
        expr_of("-(5)"),
        Expr::Unary { op: UnaryOp::Neg, .. }
    ));
    assert!(matches!(
        expr_of("-xs[0]"),
        Expr::Unary { op: UnaryOp::Neg, .. }
    ));
}

#[test]
fn test_control_character_escapes() {
    assert!(matches!(expr_of(r#""a\bc\f""#), Expr::LitStr { ref v } if v == "a\u{8}c\u{c}"));
    assert!(matches!(expr_of(r#""\t\r\0""#), Expr::LitStr { ref v } if v == "\t\r\0"));
}

#[test]
fn test_integer_overflow_is_build_error() {
    let err = parse("let x = 99999999999").unwrap_err();
    assert!(err.message().starts_with("Failed to parse integer"));
}

#[test]
fn test_postfix_chain() {
    match expr_of("rows[0].get(1).toString()") {
        Expr::Method {
            receiver, method, ..
        } => {
            assert_eq!(method, "toString");
            match *receiver {
                Expr::Method {
                    receiver, method, args,
                } => {
                    assert_eq!(method, "get");
                    assert_eq!(args.len(), 1);
                    assert!(matches!(*receiver, Expr::Index { .. }));
                }
                other => panic!("expected get, got {:?}", other),
            }
        }
        other => panic!("expected method call, got {:?}", other),
    }

    assert!(matches!(
        expr_of("e.message"),
        Expr::Member { ref property, .. } if property == "message"
    ));
}

#[test]
fn test_exception_construction() {
    assert!(matches!(
        expr_of(r#"ArgumentFailure("Divisor must not be zero")"#),
        Expr::NewException { kind: ExceptionKind::ArgumentFailure, message: Some(_) }
    ));
    assert!(matches!(
        expr_of("ArithmeticFailure()"),
        Expr::NewException { message: None, .. }
    ));
}

#[test]
fn test_keywords_are_not_identifiers() {
    assert!(parse("let while = 1").is_err());
    // keyword prefixes are fine
    assert!(matches!(single("let iffy = 1"), Stmt::Declare { ref name, .. } if name == "iffy"));
    assert!(matches!(single("let format = 1"), Stmt::Declare { ref name, .. } if name == "format"));
}

#[test]
fn test_spans() {
    let body = stmts("let a = 1\n  println(a)");
    assert_eq!(body[0].span().start_line, 0);
    assert_eq!(body[1].span().start_line, 1);
    assert_eq!(body[1].span().start_col, 2);
}

#[test]
fn test_ast_json_round_trip() {
    let source = r#"
fn main(xs) {
    try (r = open("a.txt")) {
        for (x in xs) { if (x % 2 == 0) continue; println(x) }
    } catch (ResourceFailure e) {
        eprintln(e.message)
    } finally {
        println("done")
    }
}
"#;
    let program = parse_program(source).unwrap();
    let json = serde_json::to_string(&program).unwrap();
    let back: Program = serde_json::from_str(&json).unwrap();
    assert_eq!(serde_json::to_string(&back).unwrap(), json);
}
