// tests/compiler_tests.rs

use lucene_compiler::{
    CompileError, CompilerConfig, Error, ExpansionContext, ExpansionError, FieldMap, Filter,
    GroupNode, Node, Operator, ParseError, Prefix, QueryCompiler, RangeFilter, TermNode,
};

fn compiler() -> QueryCompiler {
    QueryCompiler::new(
        CompilerConfig::builder()
            .field_metadata(FieldMap::new().analyzed("title").analyzed("body"))
            .build(),
    )
}

fn compile(query: &str) -> Filter {
    compiler().compile_filter(query).unwrap()
}

fn term(field: &str, value: &str) -> Filter {
    Filter::term(field, value)
}

fn query_string(query: &str, field: Option<&str>, operator: Operator) -> Filter {
    Filter::QueryString {
        query: query.to_string(),
        default_field: field.map(str::to_string),
        default_operator: operator,
    }
}

// ============================================================================
// Empty input and determinism
// ============================================================================

#[test]
fn test_empty_query_matches_all() {
    assert_eq!(compile(""), Filter::MatchAll);
    assert_eq!(compile("   "), Filter::MatchAll);
    assert_eq!(compile("()"), Filter::MatchAll);
    assert_eq!(compile("-()"), Filter::MatchAll);
}

#[test]
fn test_compiling_twice_is_identical() {
    let compiler = compiler();
    let query = "title:rust AND (status:open OR -status:closed) age:[1 TO 5}";
    let first = compiler.compile_filter(query).unwrap();
    let second = compiler.compile_filter(query).unwrap();
    assert_eq!(first, second);
}

// ============================================================================
// Leaves
// ============================================================================

#[test]
fn test_exact_match_term() {
    assert_eq!(compile("status:active"), term("status", "active"));
}

#[test]
fn test_analyzed_term_is_query_string() {
    assert_eq!(
        compile("title:rust"),
        query_string("rust", Some("title"), Operator::Or)
    );
}

#[test]
fn test_analyzed_phrase_keeps_quotes() {
    assert_eq!(
        compile(r#"title:"big data""#),
        query_string("\"big data\"", Some("title"), Operator::Or)
    );
}

#[test]
fn test_bare_term_without_default_field() {
    assert_eq!(compile("hello"), query_string("hello", None, Operator::Or));
}

#[test]
fn test_bare_term_uses_default_field() {
    let exact = QueryCompiler::new(CompilerConfig::builder().default_field("tag").build());
    assert_eq!(exact.compile_filter("hello").unwrap(), term("tag", "hello"));

    let analyzed = QueryCompiler::new(
        CompilerConfig::builder()
            .default_field("message")
            .field_metadata(FieldMap::new().analyzed("message"))
            .build(),
    );
    assert_eq!(
        analyzed.compile_filter("hello").unwrap(),
        query_string("hello", Some("message"), Operator::Or)
    );
}

#[test]
fn test_query_string_carries_group_operator() {
    let compiler = QueryCompiler::new(
        CompilerConfig::builder()
            .default_operator(Operator::And)
            .field_metadata(FieldMap::new().analyzed("title"))
            .build(),
    );
    assert_eq!(
        compiler.compile_filter("title:quick").unwrap(),
        query_string("quick", Some("title"), Operator::And)
    );
}

#[test]
fn test_ranges() {
    assert_eq!(
        compile("age:[18 TO 65]"),
        Filter::Range(RangeFilter {
            field: "age".to_string(),
            gte: Some("18".to_string()),
            lte: Some("65".to_string()),
            ..Default::default()
        })
    );
    assert_eq!(
        compile("age:{18 TO *]"),
        Filter::Range(RangeFilter {
            field: "age".to_string(),
            gt: Some("18".to_string()),
            ..Default::default()
        })
    );
    assert_eq!(
        compile("age:<10"),
        Filter::Range(RangeFilter {
            field: "age".to_string(),
            lt: Some("10".to_string()),
            ..Default::default()
        })
    );
}

#[test]
fn test_signed_values() {
    assert_eq!(compile("temp:-5"), term("temp", "-5"));
    assert_eq!(compile("temp:+5"), term("temp", "+5"));
    assert_eq!(
        compile("-temp:-5"),
        Filter::Not(Box::new(term("temp", "-5")))
    );
}

#[test]
fn test_signed_range_bounds() {
    assert_eq!(
        compile("temp:[-10 TO +10]"),
        Filter::Range(RangeFilter {
            field: "temp".to_string(),
            gte: Some("-10".to_string()),
            lte: Some("+10".to_string()),
            ..Default::default()
        })
    );
    assert_eq!(
        compile("temp:>=-5"),
        Filter::Range(RangeFilter {
            field: "temp".to_string(),
            gte: Some("-5".to_string()),
            ..Default::default()
        })
    );
    assert_eq!(
        compile("temp:{* TO -1}"),
        Filter::Range(RangeFilter {
            field: "temp".to_string(),
            lt: Some("-1".to_string()),
            ..Default::default()
        })
    );
}

#[test]
fn test_unbounded_range_is_a_no_op() {
    assert_eq!(compile("age:[* TO *]"), Filter::MatchAll);
    assert_eq!(compile("status:open age:[* TO *]"), term("status", "open"));
}

#[test]
fn test_exists_and_missing_on_exact_fields() {
    assert_eq!(compile("_exists_:status"), Filter::exists("status"));
    assert_eq!(compile("_missing_:status"), Filter::missing("status"));
}

// ============================================================================
// Suppression on analyzed fields
// ============================================================================

#[test]
fn test_suppressed_leaves_on_analyzed_fields() {
    assert_eq!(compile("_exists_:body"), Filter::MatchAll);
    assert_eq!(compile("_missing_:body"), Filter::MatchAll);
    assert_eq!(compile("body:[1 TO 5]"), Filter::MatchAll);
}

#[test]
fn test_suppressed_leaf_is_identity_for_and_and_or() {
    assert_eq!(compile("status:open AND _exists_:body"), term("status", "open"));
    assert_eq!(compile("status:open OR _exists_:body"), term("status", "open"));
    assert_eq!(compile("_exists_:body AND status:open"), term("status", "open"));
}

// ============================================================================
// Composition
// ============================================================================

#[test]
fn test_and_or() {
    assert_eq!(
        compile("a:1 AND b:2"),
        Filter::And(vec![term("a", "1"), term("b", "2")])
    );
    assert_eq!(
        compile("a:1 OR b:2 OR c:3"),
        Filter::Or(vec![term("a", "1"), term("b", "2"), term("c", "3")])
    );
}

#[test]
fn test_and_binds_tighter_than_or() {
    assert_eq!(
        compile("a:1 AND b:2 OR c:3"),
        Filter::Or(vec![
            Filter::And(vec![term("a", "1"), term("b", "2")]),
            term("c", "3"),
        ])
    );
}

#[test]
fn test_juxtaposition_uses_default_operator() {
    assert_eq!(
        compile("a:1 b:2 OR c:3"),
        Filter::Or(vec![term("a", "1"), term("b", "2"), term("c", "3")])
    );

    let and_default =
        QueryCompiler::new(CompilerConfig::builder().default_operator(Operator::And).build());
    assert_eq!(
        and_default.compile_filter("a:1 b:2 OR c:3").unwrap(),
        Filter::And(vec![
            term("a", "1"),
            Filter::Or(vec![term("b", "2"), term("c", "3")]),
        ])
    );
}

#[test]
fn test_required_prefix_overrides_or() {
    assert_eq!(
        compile("title:rust OR +status:open"),
        Filter::And(vec![
            query_string("rust", Some("title"), Operator::Or),
            term("status", "open"),
        ])
    );
    assert_eq!(
        compile("title:rust OR status:open"),
        Filter::Or(vec![
            query_string("rust", Some("title"), Operator::Or),
            term("status", "open"),
        ])
    );
}

#[test]
fn test_prohibited_prefix_inverts() {
    assert_eq!(
        compile("status:active AND -status:deleted"),
        Filter::And(vec![
            term("status", "active"),
            Filter::Not(Box::new(term("status", "deleted"))),
        ])
    );
    assert_eq!(
        compile("NOT status:deleted"),
        Filter::Not(Box::new(term("status", "deleted")))
    );
}

#[test]
fn test_negation_and_prohibited_prefix_invert_once() {
    let expected = Filter::Not(Box::new(term("status", "deleted")));
    assert_eq!(compile("-NOT status:deleted"), expected);

    let node = Node::from(TermNode {
        field: Some("status".to_string()),
        term: "deleted".to_string(),
        negated: true,
        prefix: Some(Prefix::Prohibited),
        ..Default::default()
    });
    assert_eq!(compiler().compile_node(&node).unwrap(), expected);
}

#[test]
fn test_prohibited_group() {
    assert_eq!(
        compile("-tags:(beta OR internal)"),
        Filter::Not(Box::new(Filter::Or(vec![
            term("tags", "beta"),
            term("tags", "internal"),
        ])))
    );
}

#[test]
fn test_group_composes_with_enclosing_operator() {
    assert_eq!(
        compile("status:open AND (a:1 OR b:2)"),
        Filter::And(vec![
            term("status", "open"),
            Filter::Or(vec![term("a", "1"), term("b", "2")]),
        ])
    );
}

// ============================================================================
// Field scoping
// ============================================================================

#[test]
fn test_nested_field_is_qualified() {
    assert_eq!(compile("parent:(child:value)"), term("parent.child", "value"));
    assert_eq!(compile("a:(b:(c:1))"), term("a.b.c", "1"));
}

#[test]
fn test_group_field_applies_to_bare_terms() {
    assert_eq!(
        compile("tags:(beta internal)"),
        Filter::Or(vec![term("tags", "beta"), term("tags", "internal")])
    );
}

#[test]
fn test_scopes_are_popped_after_group() {
    assert_eq!(
        compile("parent:(child:1) other:2"),
        Filter::Or(vec![term("parent.child", "1"), term("other", "2")])
    );
}

#[test]
fn test_analyzed_check_uses_qualified_name() {
    let compiler = QueryCompiler::new(
        CompilerConfig::builder()
            .field_metadata(FieldMap::new().analyzed("author.name"))
            .build(),
    );
    assert_eq!(
        compiler.compile_filter("author:(name:ann _exists_:name)").unwrap(),
        query_string("ann", Some("author.name"), Operator::Or)
    );
}

// ============================================================================
// Errors
// ============================================================================

fn nested(depth: usize) -> Node {
    let mut node = Node::from(TermNode::new(Some("a"), "1"));
    for _ in 0..depth {
        node = Node::from(GroupNode {
            children: vec![node],
            has_parens: true,
            ..Default::default()
        });
    }
    node
}

#[test]
fn test_depth_limit() {
    let compiler = QueryCompiler::new(CompilerConfig::builder().max_depth(3).build());
    assert_eq!(compiler.compile_node(&nested(3)).unwrap(), term("a", "1"));
    assert_eq!(
        compiler.compile_node(&nested(4)),
        Err(Error::Compile(CompileError::TooDeeplyNested { limit: 3 }))
    );
}

#[test]
fn test_depth_limit_applies_while_parsing() {
    let compiler = QueryCompiler::new(CompilerConfig::builder().max_depth(2).build());
    assert!(compiler.compile_filter("(a:1)").is_ok());
    assert!(matches!(
        compiler.compile_filter("((a:1))"),
        Err(Error::Parse(_))
    ));
}

#[test]
fn test_operator_groups_count_toward_depth() {
    let shallow = QueryCompiler::new(CompilerConfig::builder().max_depth(2).build());
    assert!(shallow.compile_filter("(x:1 a:1)").is_ok());
    assert_eq!(
        shallow.compile_filter("(x:1 a:1 AND b:2)"),
        Err(Error::Parse(ParseError::TooDeeplyNested { limit: 2 }))
    );

    let deeper = QueryCompiler::new(CompilerConfig::builder().max_depth(3).build());
    assert_eq!(
        deeper.compile_filter("(x:1 a:1 AND b:2)").unwrap(),
        Filter::Or(vec![
            term("x", "1"),
            Filter::And(vec![term("a", "1"), term("b", "2")]),
        ])
    );
}

#[test]
fn test_macro_error_is_surfaced_verbatim() {
    let compiler = QueryCompiler::new(
        CompilerConfig::builder()
            .with_macro(
                |node: &Node, _: &mut ExpansionContext| -> Result<(), ExpansionError> {
                    match node.field() {
                        Some("zip") => Err(ExpansionError::new("unknown postal code '00000'")),
                        _ => Ok(()),
                    }
                },
            )
            .build(),
    );

    assert!(compiler.compile_filter("city:paris").is_ok());

    let err = compiler.compile_filter("city:paris zip:00000").unwrap_err();
    assert_eq!(
        err,
        Error::Compile(CompileError::Expansion(ExpansionError::new(
            "unknown postal code '00000'"
        )))
    );
    assert_eq!(err.to_string(), "Compile error: unknown postal code '00000'");
}

#[test]
fn test_syntax_error_is_a_parse_error() {
    let err = compile_err("status:(open");
    assert!(matches!(err, Error::Parse(_)));
    assert!(err.to_string().starts_with("Parse error: "));
}

fn compile_err(query: &str) -> Error {
    compiler().compile_filter(query).unwrap_err()
}
