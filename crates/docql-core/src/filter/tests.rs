//! Tests for document filters.

use super::*;
use crate::cql::{CqlValue, Predicate};
use crate::row::{RowValue, ShreddedRow, TableProperties};
use serde_json::json;

fn row(path: &[&str], value: RowValue) -> ShreddedRow {
    ShreddedRow::new(
        "doc",
        path.iter().map(|s| (*s).to_string()).collect(),
        value,
        1,
    )
}

fn text(s: &str) -> RowValue {
    RowValue::String(s.to_string())
}

// =============================================================================
// LIKE patterns
// =============================================================================

#[test]
fn test_like_wildcards() {
    // Arrange
    let pattern = LikePattern::compile("a%b_c%d").expect("compile");

    // Act & Assert
    assert!(pattern.matches("aXXbYcZZd"));
    assert!(pattern.matches("abXcd"));
    assert!(!pattern.matches("aXXbYYcZZd"));
    assert!(!pattern.matches("aXXbc"));
}

#[test]
fn test_like_is_case_insensitive() {
    let pattern = LikePattern::compile("par%").expect("compile");

    assert!(pattern.matches("PARIS"));
    assert!(pattern.matches("parrot"));
    assert!(!pattern.matches("spar"));
}

#[test]
fn test_like_escapes_regex_metacharacters() {
    // Arrange
    let pattern = LikePattern::compile("a.b*(c)[d]$").expect("compile");

    // Act & Assert
    assert!(pattern.matches("a.b*(c)[d]$"));
    assert!(!pattern.matches("aXb*(c)[d]$"));
    assert!(!pattern.matches("a.bbb(c)[d]$"));
}

#[test]
fn test_like_rejects_empty_pattern() {
    let result = LikePattern::compile("");

    assert!(matches!(result, Err(crate::Error::InvalidFilter(_))));
}

mod like_proptests {
    use super::*;
    use proptest::prelude::*;

    fn reference_match(text: &[char], pattern: &[char]) -> bool {
        match pattern.split_first() {
            None => text.is_empty(),
            Some(('%', rest)) => (0..=text.len()).any(|i| reference_match(&text[i..], rest)),
            Some(('_', rest)) => !text.is_empty() && reference_match(&text[1..], rest),
            Some((c, rest)) => text
                .split_first()
                .is_some_and(|(t, tail)| t.eq_ignore_ascii_case(c) && reference_match(tail, rest)),
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        /// Property: LIKE agrees with a direct wildcard matcher
        #[test]
        fn prop_like_matches_reference(
            pattern in "[abAB.*%_]{1,8}",
            text in "[abAB.*]{0,10}"
        ) {
            let compiled = LikePattern::compile(&pattern).expect("compile");
            let chars_p: Vec<char> = pattern.chars().collect();
            let chars_t: Vec<char> = text.chars().collect();

            prop_assert_eq!(compiled.matches(&text), reference_match(&chars_t, &chars_p));
        }

        /// Property: a wildcard-free pattern matches exactly its own text, in any case
        #[test]
        fn prop_literal_pattern_matches_itself(text in "[a-zA-Z0-9.+?()|^$]{1,12}") {
            let compiled = LikePattern::compile(&text).expect("compile");

            prop_assert!(compiled.matches(&text.to_uppercase()));
            let longer = format!("{text}x");
            prop_assert!(!compiled.matches(&longer));
        }
    }
}

// =============================================================================
// Filter operations
// =============================================================================

#[test]
fn test_operation_registry_returns_shared_instances() {
    for code in FilterOpCode::ALL {
        let op = FilterOperation::of(code);
        assert_eq!(op.op_code(), code);
        assert!(std::ptr::eq(op, FilterOperation::of(code)));
    }
}

#[test]
fn test_operator_tokens_round_trip() {
    for code in FilterOpCode::ALL {
        assert_eq!(FilterOpCode::from_operator(code.operator()), Some(code));
    }
    assert_eq!(FilterOpCode::from_operator("$foo"), None);
}

#[test]
fn test_operation_typed_tests() {
    let eq = FilterOperation::of(FilterOpCode::Eq);
    let gt = FilterOperation::of(FilterOpCode::Gt);
    let lte = FilterOperation::of(FilterOpCode::Lte);

    assert!(eq.test_string(Some("a"), Some("a")));
    assert!(!eq.test_string(None, Some("a")));
    assert!(gt.test_double(Some(3.0), Some(2.0)));
    assert!(!gt.test_double(Some(2.0), Some(2.0)));
    assert!(lte.test_double(Some(2.0), Some(2.0)));
    assert!(gt.test_string(Some("b"), Some("a")));
    assert!(eq.test_boolean(Some(true), Some(true)));
    assert!(!gt.test_boolean(Some(true), Some(false)));
}

#[test]
fn test_operation_like_is_left_to_condition() {
    let like = FilterOperation::of(FilterOpCode::Like);

    assert!(!like.test_string(Some("web"), Some("w%")));
    assert!(!like.test_string(None, Some("w%")));
    assert!(!like.test_double(Some(1.0), Some(1.0)));
}

#[test]
fn test_operation_contains_key_ignores_literal() {
    let op = FilterOperation::of(FilterOpCode::ContainsKey);

    assert!(op.test_string(Some("anything"), None));
    assert!(op.test_double(Some(1.0), Some(99.0)));
    assert!(!op.test_boolean(None, Some(true)));
}

#[test]
fn test_operation_negate_pairs() {
    let pairs = [
        (FilterOpCode::Eq, FilterOpCode::Ne),
        (FilterOpCode::Ne, FilterOpCode::Eq),
        (FilterOpCode::Gt, FilterOpCode::Lte),
        (FilterOpCode::Gte, FilterOpCode::Lt),
        (FilterOpCode::Lt, FilterOpCode::Gte),
        (FilterOpCode::Lte, FilterOpCode::Gt),
    ];
    for (code, negated) in pairs {
        let op = FilterOperation::of(code).negate().expect("negate");
        assert_eq!(op.op_code(), negated);
    }
}

#[test]
fn test_operation_negate_unsupported() {
    for code in [
        FilterOpCode::Like,
        FilterOpCode::Contains,
        FilterOpCode::ContainsKey,
        FilterOpCode::Exists,
    ] {
        let result = FilterOperation::of(code).negate();
        assert!(matches!(result, Err(crate::Error::UnsupportedOperation(_))));
    }
}

// =============================================================================
// Conditions
// =============================================================================

#[test]
fn test_eq_condition_pushes_down_on_typed_column() {
    // Arrange
    let props = TableProperties::default();
    let condition = Condition::value(FilterOpCode::Eq, QueryValue::Double(5.0)).expect("valid");

    // Act
    let push_down = condition.try_push_down(&props).expect("push down");

    // Assert
    assert_eq!(push_down.condition.column, "dbl_value");
    assert_eq!(push_down.condition.predicate, Predicate::Eq);
    assert_eq!(push_down.value, CqlValue::Double(5.0));
}

#[test]
fn test_ne_condition_is_in_memory_and_true_on_missing() {
    // Arrange
    let props = TableProperties::default();
    let condition =
        Condition::value(FilterOpCode::Ne, QueryValue::String("x".into())).expect("valid");

    // Act & Assert
    assert!(condition.try_push_down(&props).is_none());
    assert!(condition.is_evaluate_on_missing_fields());
    assert!(condition.test(&row(&["a"], RowValue::Double(1.0))));
    assert!(!condition.test(&row(&["a"], text("x"))));
}

#[test]
fn test_ordering_condition_rejects_booleans() {
    let result = Condition::value(FilterOpCode::Gt, QueryValue::Boolean(true));

    assert!(matches!(result, Err(crate::Error::InvalidFilter(_))));
}

#[test]
fn test_like_condition_push_down_only_when_positive() {
    // Arrange
    let props = TableProperties::default();
    let positive = Condition::like("web%", false).expect("valid");
    let negated = Condition::like("web%", true).expect("valid");

    // Act
    let push_down = positive.try_push_down(&props).expect("push down");

    // Assert
    assert_eq!(push_down.condition.to_string(), "text_value LIKE ?");
    assert_eq!(push_down.value, CqlValue::String("web%".into()));
    assert!(negated.try_push_down(&props).is_none());
}

#[test]
fn test_like_condition_missing_field_duality() {
    // Arrange
    let missing = row(&["n"], RowValue::Double(1.0));
    let positive = Condition::like("a%", false).expect("valid");
    let negated = Condition::like("a%", true).expect("valid");

    // Act & Assert
    assert!(!positive.test(&missing));
    assert!(negated.test(&missing));
    assert!(positive.test(&row(&["n"], text("Apple"))));
    assert!(!negated.test(&row(&["n"], text("Apple"))));
}

#[test]
fn test_contains_condition_dispatches_on_value_type() {
    // Arrange
    let props = TableProperties::default();

    // Act
    let number = Condition::contains(QueryValue::Double(95.0))
        .try_push_down(&props)
        .expect("push down");
    let flag = Condition::contains(QueryValue::Boolean(true))
        .try_push_down(&props)
        .expect("push down");
    let word = Condition::contains(QueryValue::String("web".into()))
        .try_push_down(&props)
        .expect("push down");

    // Assert
    assert_eq!(number.condition.to_string(), "dbl_value = ?");
    assert_eq!(number.value, CqlValue::Double(95.0));
    assert_eq!(flag.condition.to_string(), "bool_value = ?");
    assert_eq!(word.condition.to_string(), "text_value = ?");
}

#[test]
fn test_contains_condition_tests_rows() {
    let condition = Condition::contains(QueryValue::Double(95.0));

    assert!(condition.test(&row(&["scores", "[000001]"], RowValue::Double(95.0))));
    assert!(!condition.test(&row(&["scores", "[000001]"], RowValue::Double(94.0))));
    assert!(!condition.test(&row(&["scores", "[000001]"], text("95"))));
}

#[test]
fn test_contains_key_condition() {
    let props = TableProperties::default();
    let condition = Condition::contains_key("city").expect("valid");

    assert!(condition.try_push_down(&props).is_none());
    assert_eq!(condition.target_key(), Some("city"));
    assert!(matches!(
        Condition::contains_key(""),
        Err(crate::Error::InvalidFilter(_))
    ));
}

#[test]
fn test_condition_negation() {
    // Arrange
    let eq = Condition::value(FilterOpCode::Eq, QueryValue::Double(1.0)).expect("valid");

    // Act
    let ne = eq.negate().expect("negate");

    // Assert
    assert_eq!(ne.op_code(), FilterOpCode::Ne);
    for condition in [
        Condition::like("x", false).expect("valid"),
        Condition::contains(QueryValue::Boolean(true)),
        Condition::contains_key("k").expect("valid"),
        Condition::exists(),
    ] {
        assert!(matches!(
            condition.negate(),
            Err(crate::Error::UnsupportedOperation(_))
        ));
    }
}

// =============================================================================
// Providers
// =============================================================================

#[test]
fn test_provider_unsupported_shapes() {
    let like = ConditionProvider::for_operator("$like", false).expect("provider");
    let contains = ConditionProvider::for_operator("$contains", false).expect("provider");

    for literal in [json!(1), json!(true), json!({"a": 1}), json!(["a"])] {
        assert_eq!(
            like.create_condition(&literal).expect("no error"),
            ProvidedCondition::Unsupported
        );
    }
    for literal in [json!(null), json!({"a": 1}), json!([1])] {
        assert_eq!(
            contains.create_condition(&literal).expect("no error"),
            ProvidedCondition::Unsupported
        );
    }
}

#[test]
fn test_provider_contains_tags_value_type() {
    // Arrange
    let provider = ConditionProvider::for_operator("$contains", false).expect("provider");

    // Act
    let condition = provider
        .create_condition(&json!(95))
        .expect("valid")
        .into_condition()
        .expect("condition");

    // Assert
    assert_eq!(condition.query_value(), QueryValue::Double(95.0));
    assert_eq!(condition.op_code(), FilterOpCode::Contains);
}

#[test]
fn test_provider_empty_like_pattern_is_an_error() {
    let provider = ConditionProvider::for_operator("$like", false).expect("provider");

    assert!(matches!(
        provider.create_condition(&json!("")),
        Err(crate::Error::InvalidFilter(_))
    ));
}

#[test]
fn test_provider_negated_variants() {
    // Arrange & Act
    let not_eq = ConditionProvider::for_operator("$eq", true).expect("provider");

    // Assert
    assert_eq!(not_eq.op_code(), FilterOpCode::Ne);
    for raw in ["$like", "$contains", "$containsKey", "$exists"] {
        assert!(matches!(
            ConditionProvider::for_operator(raw, true),
            Err(crate::Error::UnsupportedOperation(_))
        ));
    }
}

#[test]
fn test_provider_unknown_operator() {
    assert!(matches!(
        ConditionProvider::for_operator("$regex", false),
        Err(crate::Error::InvalidFilter(_))
    ));
}

// =============================================================================
// Paths and parsing
// =============================================================================

#[test]
fn test_filter_path_parse() {
    // Arrange & Act
    let path = FilterPath::parse(r"a.b\.c.[2]").expect("parse");

    // Assert
    assert_eq!(path.segments(), &["a", "b.c", "[000002]"]);
    assert_eq!(path.field(), "[000002]");
    assert_eq!(path.parent_path(), &["a", "b.c"]);
    assert_eq!(path.to_string(), r"a.b\.c.[000002]");
}

#[test]
fn test_filter_path_rejects_empty_segment() {
    assert!(FilterPath::parse("a..b").is_err());
    assert!(FilterPath::parse("").is_err());
}

#[test]
fn test_parser_builds_ordered_expressions() {
    // Arrange
    let parser = FilterParser::new(&TableProperties::default());
    let filter = json!({
        "price": {"$gt": 10, "$lte": 20},
        "tags": {"$contains": "web"}
    });

    // Act
    let expressions = parser.parse(&filter).expect("parse");

    // Assert
    assert_eq!(expressions.len(), 3);
    assert_eq!(expressions[0].condition().op_code(), FilterOpCode::Gt);
    assert_eq!(expressions[1].condition().op_code(), FilterOpCode::Lte);
    assert_eq!(expressions[2].path().segments(), &["tags"]);
    for (i, expression) in expressions.iter().enumerate() {
        assert_eq!(expression.order_index(), i);
    }
}

#[test]
fn test_parser_not_operator() {
    // Arrange
    let parser = FilterParser::new(&TableProperties::default());

    // Act
    let expressions = parser
        .parse(&json!({"status": {"$not": {"$eq": "done"}}}))
        .expect("parse");
    let like = parser.parse(&json!({"name": {"$not": {"$like": "a%"}}}));

    // Assert
    assert_eq!(expressions[0].condition().op_code(), FilterOpCode::Ne);
    assert!(matches!(like, Err(crate::Error::UnsupportedOperation(_))));
}

#[test]
fn test_parser_errors() {
    let props = TableProperties {
        max_depth: 2,
        ..TableProperties::default()
    };
    let parser = FilterParser::new(&props);

    for filter in [
        json!({}),
        json!([1]),
        json!({"a": 1}),
        json!({"a": {}}),
        json!({"a": {"$foo": 1}}),
        json!({"a": {"$like": 3}}),
        json!({"a": {"$exists": false}}),
        json!({"a.b.c": {"$eq": 1}}),
    ] {
        assert!(
            matches!(parser.parse(&filter), Err(crate::Error::InvalidFilter(_))),
            "expected InvalidFilter for {filter}"
        );
    }
}

#[test]
fn test_parse_str_rejects_bad_json() {
    let parser = FilterParser::new(&TableProperties::default());

    assert!(matches!(
        parser.parse_str("{not json"),
        Err(crate::Error::InvalidFilter(_))
    ));
}

// =============================================================================
// Document evaluation
// =============================================================================

#[test]
fn test_expression_contains_is_path_aware() {
    // Arrange
    let expression = FilterExpression::new(
        FilterPath::parse("tags").expect("path"),
        Condition::contains(QueryValue::String("javascript".into())),
        0,
    );
    let first = vec![
        row(&["name"], text("javascript")),
        row(&["tags", "[000000]"], text("programming")),
    ];
    let second = vec![
        row(&["name"], text("python")),
        row(&["tags", "[000000]"], text("javascript")),
    ];

    // Act & Assert
    assert!(!expression.test_document(&first));
    assert!(expression.test_document(&second));
}

#[test]
fn test_expression_contains_key_and_exists() {
    // Arrange
    let rows = vec![
        row(&["address", "city"], text("Paris")),
        row(&["address", "zip", "code"], text("75001")),
    ];
    let has_zip = FilterExpression::new(
        FilterPath::parse("address").expect("path"),
        Condition::contains_key("zip").expect("valid"),
        0,
    );
    let has_country = FilterExpression::new(
        FilterPath::parse("address").expect("path"),
        Condition::contains_key("country").expect("valid"),
        0,
    );
    let exists = FilterExpression::new(
        FilterPath::parse("address").expect("path"),
        Condition::exists(),
        0,
    );

    // Act & Assert
    assert!(has_zip.test_document(&rows));
    assert!(!has_country.test_document(&rows));
    assert!(exists.test_document(&rows));
}

#[test]
fn test_expression_missing_field() {
    let rows = vec![row(&["name"], text("x"))];
    let ne = FilterExpression::new(
        FilterPath::parse("status").expect("path"),
        Condition::value(FilterOpCode::Ne, QueryValue::String("done".into())).expect("valid"),
        0,
    );
    let eq = FilterExpression::new(
        FilterPath::parse("status").expect("path"),
        Condition::value(FilterOpCode::Eq, QueryValue::String("done".into())).expect("valid"),
        0,
    );

    assert!(ne.test_document(&rows));
    assert!(!eq.test_document(&rows));
}
