//! End-to-end behaviour of an Execute cycle as the operator sees it.

use lineq::host::{BufferSink, FileLines, RecordingNotifier, StaticLines};
use lineq::shell::{DEFAULT_QUERY, QueryPanel};
use lineq::{EngineError, LineSequence, QueryEngine, QuerySpec};

fn sample() -> Vec<&'static str> {
    vec!["alpha", "", "beta", "gamma delta", "  indented", "x"]
}

fn execute(query: &str, helpers: &str, lines: &[&str]) -> Result<Vec<String>, EngineError> {
    let lines: LineSequence = lines.iter().copied().collect();
    QueryEngine::new().execute(&QuerySpec::new(query).with_helpers(helpers), &lines)
}

fn panel_run(query: &str, helpers: &str, lines: &[&str]) -> (bool, BufferSink, RecordingNotifier) {
    let mut panel = QueryPanel::new();
    panel.set_query(query);
    panel.set_helpers(helpers);
    let mut sink = BufferSink::default();
    let notifier = RecordingNotifier::default();
    let ok = panel.execute(
        &QueryEngine::new(),
        &StaticLines::new(lines.iter().copied()),
        &mut sink,
        &notifier,
    );
    (ok, sink, notifier)
}

#[test]
fn test_default_query_is_identity() {
    let lines = sample();
    assert_eq!(execute(DEFAULT_QUERY, "", &lines).unwrap(), lines);
}

#[test]
fn test_filter_never_grows_output() {
    let inputs: Vec<Vec<&str>> = vec![
        sample(),
        vec![],
        vec!["", "", ""],
        vec!["a", "a", "a", "b", "a"],
        vec!["   ", "\t", "x y z", "longer line here"],
        (0..50).map(|i| if i % 3 == 0 { "aaa" } else { "b" }).collect(),
    ];
    let predicates: [(&str, fn(&str) -> bool); 6] = [
        ("l.len() > 3", |l: &str| l.chars().count() > 3),
        ("l == \"\"", |l: &str| l.is_empty()),
        ("true", |_: &str| true),
        ("false", |_: &str| false),
        ("l.contains(\"a\")", |l: &str| l.contains('a')),
        ("l.trim() != \"\"", |l: &str| !l.trim().is_empty()),
    ];

    for lines in &inputs {
        for (predicate, holds) in &predicates {
            let query = format!("from l in lines where {} select l", predicate);
            let output = execute(&query, "", lines).unwrap();
            let expected: Vec<&str> = lines.iter().copied().filter(|l| holds(l)).collect();
            assert!(output.len() <= lines.len(), "{} over {:?}", query, lines);
            assert_eq!(output, expected, "{} over {:?}", query, lines);
        }
    }
}

#[test]
fn test_count_is_single_line() {
    assert_eq!(execute("lines.count()", "", &["a", "b", "c"]).unwrap(), vec!["3"]);
}

#[test]
fn test_grouping_by_length() {
    let output = execute("from l in lines group l by l.len()", "", &["a", "b", "aa"]).unwrap();
    assert_eq!(
        output,
        vec!["{ Key = 1, Elements = [a, b] }", "{ Key = 2, Elements = [aa] }"]
    );
}

#[test]
fn test_repeated_runs_are_identical() {
    let engine = QueryEngine::new();
    let lines: LineSequence = sample().into_iter().collect();
    let spec = QuerySpec::new("lines.filter(@ != \"\").sort(@.len()).with_index()");
    let first = engine.execute(&spec, &lines).unwrap();
    for _ in 0..5 {
        assert_eq!(engine.execute(&spec, &lines).unwrap(), first);
    }
    assert_eq!(engine.units_loaded(), 6);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_compile_report_quotes_offending_line() {
    let (ok, sink, notifier) = panel_run("lines.map(@.len(", "", &["a"]);
    assert!(!ok);
    assert!(sink.buffers.is_empty());

    let notes = notifier.notes.borrow();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].0, "Query Compilation Error");
    assert!(notes[0].1.starts_with("Compiler Errors:"));
    assert!(notes[0].1.contains("lines.map(@.len("), "{}", notes[0].1);
}

#[test]
fn test_each_broken_helper_is_diagnosed() {
    let helpers = "fn a(x) = x +;\nfn b(y) = y * ;\nfn ok(z) = z;";
    match execute("lines", helpers, &[]) {
        Err(EngineError::Compile(err)) => {
            assert_eq!(err.len(), 2, "{}", err.report());
            assert!(err.diagnostics[0].line < err.diagnostics[1].line);
        }
        other => panic!("expected compile error, got {:?}", other),
    }
}

#[test]
fn test_unknown_name_is_a_compile_error() {
    let err = execute("lines.map(nope)", "", &[]).unwrap_err();
    assert_eq!(err.title(), "Query Compilation Error");
    assert!(err.to_string().contains("`nope` does not exist"));
}

#[test]
fn test_runtime_faults_leave_output_untouched() {
    for query in [
        "lines.map(@.len() / 0)",
        "lines.first(@ == \"zzz\").upper()",
        "lines.filter(@.matches(\"[\"))",
    ] {
        let (ok, sink, notifier) = panel_run(query, "", &["a", "b"]);
        assert!(!ok, "{}", query);
        assert!(sink.buffers.is_empty(), "{}", query);
        let notes = notifier.notes.borrow();
        assert_eq!(notes[0].0, "Query Runtime Error", "{}", query);
    }
}

#[test]
fn test_successful_runs_each_get_a_buffer() {
    let mut panel = QueryPanel::new();
    let engine = QueryEngine::new();
    let notifier = RecordingNotifier::default();
    let mut sink = BufferSink::default();
    let source = StaticLines::new(["b", "a"]);

    assert!(panel.execute(&engine, &source, &mut sink, &notifier));
    panel.set_query("lines.sort()");
    assert!(panel.execute(&engine, &source, &mut sink, &notifier));

    assert_eq!(sink.buffers, vec![vec!["b", "a"], vec!["a", "b"]]);
}

#[test]
fn test_unreadable_input_is_reported_not_run() {
    let mut panel = QueryPanel::new();
    let notifier = RecordingNotifier::default();
    let mut sink = BufferSink::default();
    let source = FileLines::new("/nonexistent/lineq/input.txt");

    assert!(!panel.execute(&QueryEngine::new(), &source, &mut sink, &notifier));
    assert!(sink.buffers.is_empty());

    let notes = notifier.notes.borrow();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].0, "Query Input Error");
    assert!(notes[0].1.contains("/nonexistent/lineq/input.txt"), "{}", notes[0].1);
}
