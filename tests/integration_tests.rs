use lineq::{
    EngineError, EvalError, LineSequence, QueryEngine, QuerySpec, RuntimeError, Value,
    assemble, compile_and_load, invoke,
};

fn input(lines: &[&str]) -> LineSequence {
    lines.iter().copied().collect()
}

fn run(query: &str, lines: &[&str]) -> Vec<String> {
    QueryEngine::new()
        .execute(&QuerySpec::new(query), &input(lines))
        .unwrap_or_else(|e| panic!("query failed: {}", e))
}

fn run_with(query: &str, helpers: &str, lines: &[&str]) -> Vec<String> {
    QueryEngine::new()
        .execute(&QuerySpec::new(query).with_helpers(helpers), &input(lines))
        .unwrap_or_else(|e| panic!("query failed: {}", e))
}

fn eval(query: &str, lines: &[&str]) -> Result<Value, EvalError> {
    let unit = compile_and_load(&assemble(query, None)).unwrap_or_else(|e| panic!("{}", e));
    invoke(&unit, &input(lines))
        .map(|execution| execution.into_value())
        .map_err(|RuntimeError(e)| e)
}

fn runtime_error(query: &str, lines: &[&str]) -> EvalError {
    match eval(query, lines) {
        Err(e) => e,
        Ok(v) => panic!("expected a runtime error, got {:?}", v),
    }
}

// ============================================================================
// Comprehensions
// ============================================================================

#[test]
fn test_identity() {
    assert_eq!(run("from l in lines select l", &["a", "b"]), vec!["a", "b"]);
    assert_eq!(run("lines", &["a", "b"]), vec!["a", "b"]);
}

#[test]
fn test_where_and_select() {
    let output = run(
        "from l in lines where l.startswith(\"#\") select l.substring(1).trim()",
        &["# one", "two", "#three"],
    );
    assert_eq!(output, vec!["one", "three"]);
}

#[test]
fn test_let_and_orderby() {
    let output = run(
        "from l in lines let n = l.len() orderby n descending, l select l + \":\" + n",
        &["bb", "a", "cc", "ddd"],
    );
    assert_eq!(output, vec!["ddd:3", "bb:2", "cc:2", "a:1"]);
}

#[test]
fn test_nested_from() {
    let output = run(
        "from a in lines from b in lines where a < b select a + b",
        &["x", "y", "z"],
    );
    assert_eq!(output, vec!["xy", "xz", "yz"]);
}

#[test]
fn test_group_by_clause() {
    let output = run("from l in lines group l by l.len()", &["a", "b", "aa"]);
    assert_eq!(
        output,
        vec!["{ Key = 1, Elements = [a, b] }", "{ Key = 2, Elements = [aa] }"]
    );
}

#[test]
fn test_group_elements_are_sequences() {
    let output = run(
        "from g in lines.group_by(@[0]) select g.Key + \"=\" + g.count()",
        &["apple", "avocado", "banana"],
    );
    assert_eq!(output, vec!["a=2", "b=1"]);
}

// ============================================================================
// Array methods
// ============================================================================

#[test]
fn test_filter_map_with_implicit_param() {
    let output = run("lines.filter(@.len() > 1).map(@.upper())", &["a", "bc", "def"]);
    assert_eq!(output, vec!["BC", "DEF"]);
}

#[test]
fn test_named_lambda() {
    let output = run("lines.map(l => l.chars().reverse().join())", &["abc"]);
    assert_eq!(output, vec!["cba"]);
}

#[test]
fn test_aggregates() {
    let lines = &["3", "1", "2"];
    assert_eq!(run("lines.count()", lines), vec!["3"]);
    assert_eq!(run("lines.sum(@.parse_int())", lines), vec!["6"]);
    assert_eq!(run("lines.map(@.parse_int()).max()", lines), vec!["3"]);
    assert_eq!(run("lines.map(@.parse_int()).min()", lines), vec!["1"]);
    assert_eq!(run("lines.avg(@.parse_int())", lines), vec!["2"]);
    assert_eq!(run("lines.any(@ == \"2\")", lines), vec!["true"]);
    assert_eq!(run("lines.all(@.len() == 1)", lines), vec!["true"]);
    assert_eq!(run("lines.count(@ > \"1\")", lines), vec!["2"]);
}

#[test]
fn test_empty_aggregates() {
    assert_eq!(run("lines.max()", &[]), vec!["null"]);
    assert_eq!(run("lines.first()", &[]), vec!["null"]);
    assert_eq!(run("lines.sum(@.len())", &[]), vec!["0"]);
}

#[test]
fn test_sorting_is_stable() {
    let lines = &["bb", "a", "cc", "d"];
    assert_eq!(run("lines.sort(@.len())", lines), vec!["a", "d", "bb", "cc"]);
    assert_eq!(run("lines.sort_desc(@.len())", lines), vec!["bb", "cc", "a", "d"]);
    assert_eq!(run("lines.sort()", lines), vec!["a", "bb", "cc", "d"]);
}

#[test]
fn test_slicing_methods() {
    let lines = &["1", "2", "3", "4"];
    assert_eq!(run("lines.take(2)", lines), vec!["1", "2"]);
    assert_eq!(run("lines.skip(3)", lines), vec!["4"]);
    assert_eq!(run("lines.take(10)", lines), lines.to_vec());
    assert_eq!(run("lines.take_while(@ != \"3\")", lines), vec!["1", "2"]);
    assert_eq!(run("lines.skip_while(@ != \"3\")", lines), vec!["3", "4"]);
    assert_eq!(run("lines.reverse().first()", lines), vec!["4"]);
    assert_eq!(run("lines.last(@ < \"3\")", lines), vec!["2"]);
}

#[test]
fn test_unique_and_flatten() {
    assert_eq!(run("lines.unique()", &["a", "b", "a"]), vec!["a", "b"]);
    assert_eq!(
        run("lines.map(@.split(\",\")).flatten()", &["a,b", "c"]),
        vec!["a", "b", "c"]
    );
    assert_eq!(
        run("lines.flat_map(@.words())", &["x y", "z"]),
        vec!["x", "y", "z"]
    );
}

#[test]
fn test_with_index_and_join() {
    assert_eq!(
        run("lines.with_index().map(@.Index + \": \" + @.Value)", &["a", "b"]),
        vec!["0: a", "1: b"]
    );
    assert_eq!(run("lines.join(\"|\")", &["a", "b"]), vec!["a|b"]);
    assert_eq!(run("lines.index_of(\"b\")", &["a", "b"]), vec!["1"]);
    assert_eq!(run("lines.contains(\"c\")", &["a", "b"]), vec!["false"]);
}

#[test]
fn test_nested_implicit_params() {
    let output = run("lines.map(@.split(\",\").map(@.trim()).join(\"-\"))", &["a, b ,c"]);
    assert_eq!(output, vec!["a-b-c"]);
}

// ============================================================================
// String methods
// ============================================================================

#[test]
fn test_string_methods() {
    let line = &["  Hello World  "];
    assert_eq!(run("lines.map(@.trim().lower())", line), vec!["hello world"]);
    assert_eq!(run("lines.map(@.trim_start())", line), vec!["Hello World  "]);
    assert_eq!(run("lines.map(@.words().count())", line), vec!["2"]);
    assert_eq!(run("lines.map(@.trim().replace(\"o\", \"0\"))", line), vec!["Hell0 W0rld"]);
    assert_eq!(run("lines.map(@.trim().substring(6, 3))", line), vec!["Wor"]);
    assert_eq!(run("lines.map(@.trim().index_of(\"W\"))", line), vec!["6"]);
    assert_eq!(run("lines.map(@.trim().ends_with(\"ld\"))", line), vec!["true"]);
}

#[test]
fn test_padding() {
    assert_eq!(run("lines.map(@.pad_left(3, \"0\"))", &["7"]), vec!["007"]);
    assert_eq!(run("lines.map(@.pad_right(3) + \"|\")", &["ab"]), vec!["ab |"]);
}

#[test]
fn test_regex_methods() {
    let lines = &["id=12 x", "none", "id=7"];
    assert_eq!(
        run("lines.filter(@.matches(\"id=\\\\d+\"))", lines),
        vec!["id=12 x", "id=7"]
    );
    assert_eq!(
        run("lines.map(@.captures(\"id=(\\\\d+)\").first() ?? \"-\")", lines),
        vec!["12", "-", "7"]
    );
    assert_eq!(
        run("lines.map(@.re_replace(\"(\\\\w+)=(\\\\d+)\", \"$2:$1\"))", &["id=12"]),
        vec!["12:id"]
    );
    assert_eq!(run("lines.flat_map(@.find_all(\"\\\\d\"))", &["a1b22"]), vec!["1", "2", "2"]);
}

#[test]
fn test_split_with_empty_separator() {
    assert_eq!(run("lines.first().split(\"\")", &["abc"]), vec!["a", "b", "c"]);
}

// ============================================================================
// Arithmetic and values
// ============================================================================

#[test]
fn test_arithmetic() {
    assert_eq!(eval("7 / 2", &[]), Ok(Value::Float(3.5)));
    assert_eq!(eval("6 / 3", &[]), Ok(Value::Integer(2)));
    assert_eq!(eval("7 % 4", &[]), Ok(Value::Integer(3)));
    assert_eq!(eval("3 * 0.1", &[]), Ok(Value::Float(0.3)));
    assert_eq!(eval("1 == 1.0", &[]), Ok(Value::Boolean(true)));
    assert_eq!(eval("\"n\" + 1", &[]), Ok(Value::String("n1".into())));
}

#[test]
fn test_conditional_and_coalesce() {
    assert_eq!(
        run("lines.map(if @ == \"\" then \"<blank>\" else @)", &["a", ""]),
        vec!["a", "<blank>"]
    );
    assert_eq!(eval("null ?? 5", &[]), Ok(Value::Integer(5)));
}

#[test]
fn test_builtin_functions() {
    assert_eq!(run("range(1, 3)", &[]), vec!["1", "2", "3"]);
    assert_eq!(run("repeat(\"ab\", 2)", &[]), vec!["ab", "ab"]);
    assert_eq!(eval("int(\"42\") + int(2.9)", &[]), Ok(Value::Integer(44)));
    assert_eq!(eval("float(1)", &[]), Ok(Value::Float(1.0)));
    assert_eq!(eval("str(12) + str(null)", &[]), Ok(Value::String("12null".into())));
}

#[test]
fn test_records_and_access() {
    assert_eq!(
        run("lines.map({ Line: @, Len: @.len() })", &["ab"]),
        vec!["{ Line = ab, Len = 2 }"]
    );
    assert_eq!(eval("{ A: 1 }.keys()", &[]), Ok(Value::Array(vec!["A".into()])));
    assert_eq!(eval("[1, 2, 3][-1]", &[]), Ok(Value::Integer(3)));
    assert_eq!(eval("\"abc\"[1]", &[]), Ok(Value::String("b".into())));
    assert_eq!(eval("null.type()", &[]), Ok(Value::String("null".into())));
    assert_eq!(eval("null.is_null()", &[]), Ok(Value::Boolean(true)));
}

// ============================================================================
// Helpers
// ============================================================================

#[test]
fn test_helper_functions_and_fields() {
    let helpers = "fn is_comment(l) = l.trim().startswith(\"#\");\n\
                   fn label(l) { return prefix + l; }\n\
                   let prefix = \"> \";";
    let output = run_with(
        "lines.filter(not is_comment(@)).map(label(@))",
        helpers,
        &["# skip", "keep"],
    );
    assert_eq!(output, vec!["> keep"]);
}

#[test]
fn test_recursive_helper() {
    let output = run_with("lines.map(fact(@.parse_int()))", "fn fact(n) = if n <= 1 then 1 else n * fact(n - 1);", &["5", "10"]);
    assert_eq!(output, vec!["120", "3628800"]);
}

#[test]
fn test_declared_record_with_display() {
    let helpers = "record Pair(key, value) {\n\
                   fn display(self) = self.key + \" => \" + self.value;\n\
                   fn swap(self) = Pair(self.value, self.key);\n\
                   }";
    let output = run_with(
        "lines.map(Pair(@.split(\"=\")[0], @.split(\"=\")[1]).swap())",
        helpers,
        &["a=1"],
    );
    assert_eq!(output, vec!["1 => a"]);
}

#[test]
fn test_declared_record_without_display_is_structured() {
    let output = run_with(
        "lines.map(Entry(@, @.len()))",
        "record Entry(text, size);",
        &["abc"],
    );
    assert_eq!(output, vec!["{ text = abc, size = 3 }"]);
}

#[test]
fn test_custom_display_inside_anonymous_record() {
    let output = run_with(
        "[{ P: Tag(\"x\") }]",
        "record Tag(name) { fn display(self) = \"<\" + self.name + \">\"; }",
        &[],
    );
    assert_eq!(output, vec!["{ P = <x> }"]);
}

// ============================================================================
// Runtime faults
// ============================================================================

#[test]
fn test_division_by_zero() {
    assert_eq!(runtime_error("1 / 0", &[]), EvalError::DivisionByZero);
    assert_eq!(runtime_error("1 % 0", &[]), EvalError::DivisionByZero);
}

#[test]
fn test_null_dereference() {
    let err = runtime_error("lines.first().upper()", &[]);
    assert!(matches!(err, EvalError::NullReference(_)), "{:?}", err);
    let err = runtime_error("null.Name", &[]);
    assert!(matches!(err, EvalError::NullReference(_)), "{:?}", err);
}

#[test]
fn test_bad_regex() {
    let err = runtime_error("lines.filter(@.matches(\"(\"))", &["a"]);
    assert!(matches!(err, EvalError::Regex(_)), "{:?}", err);
}

#[test]
fn test_overflow_and_conversion() {
    assert!(matches!(
        runtime_error("9223372036854775807 + 1", &[]),
        EvalError::Overflow(_)
    ));
    assert!(matches!(
        runtime_error("lines.map(@.parse_int())", &["x"]),
        EvalError::Conversion(_)
    ));
}

#[test]
fn test_index_out_of_range() {
    assert!(matches!(
        runtime_error("lines[5]", &["a"]),
        EvalError::AccessError(_)
    ));
}

#[test]
fn test_missing_record_field() {
    assert!(matches!(
        runtime_error("{ A: 1 }.B", &[]),
        EvalError::AccessError(_)
    ));
}

#[test]
fn test_field_initializer_fault_is_runtime_error() {
    let err = QueryEngine::new()
        .execute(
            &QuerySpec::new("lines").with_helpers("let broken = 1 / 0;"),
            &input(&["a"]),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Runtime(RuntimeError(EvalError::DivisionByZero))
    ));
}
