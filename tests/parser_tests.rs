// tests/parser_tests.rs

use lineq::ast::{BinOp, Clause, Expr, Member, Terminal, UnaryOp};
use lineq::lexer::Lexer;
use lineq::parser::Parser;

fn parse(input: &str) -> Expr {
    Parser::new(Lexer::new(input)).parse().unwrap()
}

fn parse_err(input: &str) -> String {
    Parser::new(Lexer::new(input)).parse().unwrap_err().message
}

// ============================================================================
// Simple tests
// ============================================================================

#[test]
fn test_comparison() {
    let expr = parse("l.len() > 100");

    assert!(matches!(
        expr,
        Expr::BinaryOp {
            op: BinOp::GreaterThan,
            ..
        }
    ));
}

#[test]
fn test_parentheses() {
    let expr = parse("(1 + 2) * 3");

    // Should be: Multiply(Add(1, 2), 3)
    match expr {
        Expr::BinaryOp {
            op: BinOp::Multiply,
            left,
            right,
        } => {
            assert!(matches!(*left, Expr::BinaryOp { op: BinOp::Add, .. }));
            assert_eq!(*right, Expr::Integer(3));
        }
        other => panic!("Expected multiply, got {:?}", other),
    }
}

#[test]
fn test_precedence_and_binds_tighter_than_or() {
    let expr = parse("a or b and c");
    match expr {
        Expr::BinaryOp {
            op: BinOp::Or,
            right,
            ..
        } => assert!(matches!(*right, Expr::BinaryOp { op: BinOp::And, .. })),
        other => panic!("Expected or, got {:?}", other),
    }
}

#[test]
fn test_coalesce_is_lowest_binary_operator() {
    let expr = parse("a or b ?? c");
    assert!(matches!(
        expr,
        Expr::BinaryOp {
            op: BinOp::NullCoalesce,
            ..
        }
    ));
}

#[test]
fn test_comparisons_do_not_chain() {
    let message = parse_err("1 < l.len() < 5");
    assert!(message.contains("cannot be chained"), "{}", message);
}

#[test]
fn test_subtraction_is_left_associative() {
    match parse("10 - 4 - 3") {
        Expr::BinaryOp {
            op: BinOp::Subtract,
            left,
            right,
        } => {
            assert!(matches!(*left, Expr::BinaryOp { op: BinOp::Subtract, .. }));
            assert_eq!(*right, Expr::Integer(3));
        }
        other => panic!("Expected subtract, got {:?}", other),
    }
}

#[test]
fn test_unary_not_and_negate() {
    assert!(matches!(
        parse("not l.matches(\"x\")"),
        Expr::Unary {
            op: UnaryOp::Not,
            ..
        }
    ));
    assert!(matches!(
        parse("-3"),
        Expr::Unary {
            op: UnaryOp::Negate,
            ..
        }
    ));
}

// ============================================================================
// Postfix chains
// ============================================================================

#[test]
fn test_method_chain() {
    let expr = parse("lines.filter(@.len() > 2).count()");
    match expr {
        Expr::MethodCall {
            object,
            method,
            args,
            ..
        } => {
            assert_eq!(method, "count");
            assert!(args.is_empty());
            assert!(matches!(*object, Expr::MethodCall { ref method, .. } if method == "filter"));
        }
        other => panic!("Expected method call, got {:?}", other),
    }
}

#[test]
fn test_keyword_method_names() {
    let expr = parse("lines.where(@ != \"\").select(@.upper())");
    assert!(matches!(expr, Expr::MethodCall { ref method, .. } if method == "select"));
}

#[test]
fn test_field_and_index() {
    let expr = parse("g.Elements[0]");
    match expr {
        Expr::Index { object, index } => {
            assert!(matches!(*object, Expr::Member { ref name, .. } if name == "Elements"));
            assert_eq!(*index, Expr::Integer(0));
        }
        other => panic!("Expected index, got {:?}", other),
    }
}

#[test]
fn test_call_vs_name() {
    assert!(matches!(parse("trim_all(lines)"), Expr::Call { ref name, .. } if name == "trim_all"));
    assert!(matches!(parse("lines"), Expr::Ident { ref name, .. } if name == "lines"));
}

// ============================================================================
// Lambdas, records, arrays
// ============================================================================

#[test]
fn test_lambda_argument() {
    let expr = parse("lines.map(l => l.trim())");
    match expr {
        Expr::MethodCall { args, .. } => {
            assert!(matches!(&args[0], Expr::Lambda { param, .. } if param == "l"));
        }
        other => panic!("Expected method call, got {:?}", other),
    }
}

#[test]
fn test_record_literal_keeps_field_order() {
    let expr = parse("{ Line: l, Len: l.len() }");
    match expr {
        Expr::Object(fields) => {
            let names: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
            assert_eq!(names, vec!["Line", "Len"]);
        }
        other => panic!("Expected object, got {:?}", other),
    }
}

#[test]
fn test_duplicate_record_field_is_rejected() {
    assert_eq!(
        parse_err("{ A: 1, A: 2 }"),
        "duplicate field `A` in record literal"
    );
}

#[test]
fn test_array_literal() {
    assert_eq!(
        parse("[1, 2]"),
        Expr::Array(vec![Expr::Integer(1), Expr::Integer(2)])
    );
}

#[test]
fn test_conditional() {
    assert!(matches!(
        parse("if l == \"\" then \"<blank>\" else l"),
        Expr::Conditional { .. }
    ));
}

// ============================================================================
// Comprehensions
// ============================================================================

#[test]
fn test_comprehension_clauses() {
    let expr = parse(
        "from l in lines let n = l.len() where n > 0 orderby n descending, l select { L: l, N: n }",
    );
    let Expr::Query(query) = expr else {
        panic!("Expected query");
    };
    assert_eq!(query.clauses.len(), 4);
    assert!(matches!(&query.clauses[0], Clause::From { var, .. } if var == "l"));
    assert!(matches!(&query.clauses[1], Clause::Let { name, .. } if name == "n"));
    assert!(matches!(&query.clauses[2], Clause::Where(_)));
    match &query.clauses[3] {
        Clause::OrderBy(orderings) => {
            assert_eq!(orderings.len(), 2);
            assert!(orderings[0].descending);
            assert!(!orderings[1].descending);
        }
        other => panic!("Expected orderby, got {:?}", other),
    }
    assert!(matches!(query.terminal, Terminal::Select(Expr::Object(_))));
}

#[test]
fn test_group_terminal() {
    let Expr::Query(query) = parse("from l in lines group l by l.len()") else {
        panic!("Expected query");
    };
    assert!(matches!(query.terminal, Terminal::Group { .. }));
}

#[test]
fn test_comprehension_needs_terminal() {
    let message = parse_err("from l in lines where l");
    assert!(message.contains("`select` or `group`"), "{}", message);
}

// ============================================================================
// Units
// ============================================================================

#[test]
fn test_unit_members() {
    let source = "unit U {\n\
                  fn f(x) = x;\n\
                  fn g(a, b) { return a + b; }\n\
                  let limit = 3;\n\
                  record P(a, b) { fn display(self) = self.a; }\n\
                  record Q(v);\n\
                  }";
    let (unit, errors) = Parser::new(Lexer::new(source)).parse_unit();
    assert!(errors.is_empty(), "{:?}", errors);
    assert_eq!(unit.name, "U");
    let names: Vec<&str> = unit.members.iter().map(Member::name).collect();
    assert_eq!(names, vec!["f", "g", "limit", "P", "Q"]);
    match &unit.members[3] {
        Member::Record(record) => {
            assert_eq!(record.fields, vec!["a", "b"]);
            assert!(record.method("display").is_some());
        }
        other => panic!("Expected record, got {:?}", other),
    }
}

#[test]
fn test_unit_recovers_after_each_broken_member() {
    let source = "unit U {\n\
                  fn a(x) = x +;\n\
                  fn ok(x) = x;\n\
                  let b = ;\n\
                  record C(;\n\
                  }";
    let (unit, errors) = Parser::new(Lexer::new(source)).parse_unit();
    assert_eq!(errors.len(), 3, "{:?}", errors);
    let lines: Vec<usize> = errors.iter().map(|e| e.pos.line).collect();
    assert_eq!(lines, vec![2, 4, 5]);
    assert_eq!(unit.members.len(), 1);
}

#[test]
fn test_unit_missing_closing_brace() {
    let (_, errors) = Parser::new(Lexer::new("unit U { fn f(x) = x;")).parse_unit();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("expected `}`"));
}

#[test]
fn test_unit_collects_lex_errors() {
    let (_, errors) = Parser::new(Lexer::new("unit U { fn f(x) = x # 1; }")).parse_unit();
    assert!(errors.iter().any(|e| e.message == "unexpected character '#'"));
}

#[test]
fn test_record_method_needs_receiver() {
    let (_, errors) =
        Parser::new(Lexer::new("unit U { record P(a) { fn show() = 1; } }")).parse_unit();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("first parameter"));
}
