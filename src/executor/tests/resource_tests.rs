//! Scoped resources: acquisition order, release order, failure policy

use super::helpers::*;
use crate::executor::{Emission, ExceptionKind, MemoryFileSystem, ResourceEvent, Stream, Val};

fn acquired(path: &str) -> ResourceEvent {
    ResourceEvent::Acquired(path.to_string())
}

fn released(path: &str) -> ResourceEvent {
    ResourceEvent::Released(path.to_string())
}

const TWO_RESOURCES: &str = r#"
fn both(a, b) {
    try (first = open(a); second = open(b)) {
        println(first.readLine() + " / " + second.readLine())
    } finally {
        println("finally")
    }
}
"#;

#[test]
fn test_reads_first_line_and_releases() {
    let program = load(STRUCTURES);
    let files = MemoryFileSystem::new().with_file("data.txt", "first line\nsecond line\n");
    let report = call(&program, "tryWithResources", vec![Val::str("data.txt")], files);

    assert_eq!(report.value(), &Val::str("first line"));
    assert_eq!(report.lines(), vec!["In `finally' block."]);
    assert_eq!(report.history, vec![acquired("data.txt"), released("data.txt")]);
    assert_eq!(report.live, 0);
}

#[test]
fn test_missing_file_is_caught() {
    let program = load(STRUCTURES);
    let report = call(
        &program,
        "tryWithResources",
        vec![Val::str("Nonexistent.file")],
        MemoryFileSystem::new(),
    );

    assert_eq!(report.value(), &Val::str(""));
    assert_eq!(
        report.output.emissions(),
        &[
            Emission {
                stream: Stream::Err,
                line: "An error occurred.".to_string()
            },
            Emission {
                stream: Stream::Out,
                line: "In `finally' block.".to_string()
            },
        ]
    );
    assert!(report.history.is_empty());
}

#[test]
fn test_release_in_reverse_acquisition_order() {
    let program = load(TWO_RESOURCES);
    let files = MemoryFileSystem::new()
        .with_file("a.txt", "alpha")
        .with_file("b.txt", "beta");
    let report = call(
        &program,
        "both",
        vec![Val::str("a.txt"), Val::str("b.txt")],
        files,
    );

    assert!(report.outcome.is_completed());
    assert_eq!(report.lines(), vec!["alpha / beta", "finally"]);
    assert_eq!(
        report.history,
        vec![
            acquired("a.txt"),
            acquired("b.txt"),
            released("b.txt"),
            released("a.txt"),
        ]
    );
}

#[test]
fn test_failed_acquisition_releases_earlier_resources() {
    let program = load(TWO_RESOURCES);
    let files = MemoryFileSystem::new().with_file("a.txt", "alpha");
    let report = call(
        &program,
        "both",
        vec![Val::str("a.txt"), Val::str("missing.txt")],
        files,
    );

    let e = report.outcome.exception().unwrap();
    assert_eq!(e.kind, ExceptionKind::ResourceFailure);
    assert_eq!(e.message, "missing.txt (No such file or directory)");
    // the body never ran, finally did
    assert_eq!(report.lines(), vec!["finally"]);
    assert_eq!(report.history, vec![acquired("a.txt"), released("a.txt")]);
    assert_eq!(report.live, 0);
}

#[test]
fn test_release_failure_replaces_pending_return() {
    let program = load(
        r#"
fn readIt(path) {
    try (r = open(path)) {
        return r.readLine()
    } finally {
        println("finally")
    }
}
"#,
    );
    let files = MemoryFileSystem::new()
        .with_file("a.txt", "alpha")
        .fail_on_close("a.txt");
    let report = call(&program, "readIt", vec![Val::str("a.txt")], files);

    let e = report.outcome.exception().unwrap();
    assert_eq!(e.kind, ExceptionKind::ResourceFailure);
    assert_eq!(e.message, "a.txt: close failed");
    assert!(e.suppressed.is_empty());
    assert_eq!(report.lines(), vec!["finally"]);
    assert_eq!(report.live, 0);
}

#[test]
fn test_release_failure_is_suppressed_under_primary_exception() {
    let program = load(
        r#"
fn primary(path) {
    try (r = open(path)) {
        throw ArgumentFailure("primary")
    } catch (ArgumentFailure e) {
        println(e.message)
        println(len(e.suppressed))
        println(e.suppressed[0].message)
    }
}
"#,
    );
    let files = MemoryFileSystem::new()
        .with_file("a.txt", "alpha")
        .fail_on_close("a.txt");
    let report = call(&program, "primary", vec![Val::str("a.txt")], files);

    assert!(report.outcome.is_completed());
    // resources are released before the handler sees the exception
    assert_eq!(report.lines(), vec!["primary", "1", "a.txt: close failed"]);
}

#[test]
fn test_every_release_attempted_when_several_fail() {
    let program = load(TWO_RESOURCES);
    let files = MemoryFileSystem::new()
        .with_file("a.txt", "alpha")
        .with_file("b.txt", "beta")
        .fail_on_close("a.txt")
        .fail_on_close("b.txt");
    let report = call(
        &program,
        "both",
        vec![Val::str("a.txt"), Val::str("b.txt")],
        files,
    );

    let e = report.outcome.exception().unwrap();
    // first failure becomes primary, the later one is attached to it
    assert_eq!(e.message, "b.txt: close failed");
    assert_eq!(e.suppressed.len(), 1);
    assert_eq!(e.suppressed[0].message, "a.txt: close failed");
    assert_eq!(report.released, 2);
    assert_eq!(report.live, 0);
}

#[test]
fn test_handle_is_closed_after_scope() {
    let program = load(
        r#"
fn leak(path) {
    let h
    try (r = open(path)) {
        h = r
    }
    return h.readLine()
}
"#,
    );
    let files = MemoryFileSystem::new().with_file("a.txt", "alpha");
    let report = call(&program, "leak", vec![Val::str("a.txt")], files);

    let e = report.outcome.exception().unwrap();
    assert_eq!(e.kind, ExceptionKind::ResourceFailure);
    assert_eq!(e.message, "Stream closed");
    assert_eq!(report.released, 1);
}

#[test]
fn test_jumps_out_of_scope_release_each_time() {
    let program = load(
        r#"
fn loops(path) {
    for (let i = 0; i < 4; i++) {
        try (r = open(path)) {
            if (i == 0) continue
            if (i == 2) break
            r.readLine()
        }
    }
    return 1
}
"#,
    );
    let files = MemoryFileSystem::new().with_file("a.txt", "alpha");
    let report = call(&program, "loops", vec![Val::str("a.txt")], files);

    assert_eq!(report.value(), &Val::Int(1));
    assert_eq!(report.acquired, 3);
    assert_eq!(report.released, 3);
    assert_eq!(report.live, 0);
}

#[test]
fn test_read_failure_is_catchable() {
    let program = load(
        r#"
fn main(path) {
    try (r = open(path)) {
        return r.readLine()
    } catch (ResourceFailure e) {
        return "caught " + e.message
    }
}
"#,
    );
    let files = MemoryFileSystem::new()
        .with_file("a.txt", "alpha")
        .fail_on_read("a.txt");
    let report = call(&program, "main", vec![Val::str("a.txt")], files);

    assert_eq!(report.value(), &Val::str("caught a.txt: read failed"));
    assert_eq!(report.live, 0);
}

#[test]
fn test_read_first_line_builtin() {
    let report = {
        let program = load("fn main(p) { return readFirstLine(p) }");
        let files = MemoryFileSystem::new().with_file("notes.txt", "top\nrest");
        call(&program, "main", vec![Val::str("notes.txt")], files)
    };

    assert_eq!(report.value(), &Val::str("top"));
    // no scoped handle involved
    assert!(report.history.is_empty());
}
