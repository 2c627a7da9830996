use serde_json::json;
use sqlport::prelude::*;

fn datatype() -> Datatype<AnsiBackend> {
    Datatype::new(AnsiBackend::new("main"))
}

/// Quote for binding, then decode the bound text as if the backend returned it.
fn round_trip(types: &mut Datatype<AnsiBackend>, value: Value, type_name: &str) -> Value {
    let raw = types
        .quote(&value, Some(type_name), QuoteOptions::UNQUOTED)
        .unwrap()
        .map_or(Value::Null, Value::Text);
    types.decode(raw, type_name, false).unwrap()
}

#[test]
fn scalar_values_survive_a_round_trip() {
    let mut types = datatype();
    assert_eq!(round_trip(&mut types, Value::Int(-17), "integer"), Value::Int(-17));
    assert_eq!(round_trip(&mut types, Value::Bool(true), "boolean"), Value::Bool(true));
    assert_eq!(round_trip(&mut types, Value::Bool(false), "boolean"), Value::Bool(false));
    assert_eq!(round_trip(&mut types, Value::Float(2.5), "float"), Value::Float(2.5));
    assert_eq!(
        round_trip(&mut types, Value::from("O'Brien"), "text"),
        Value::from("O'Brien")
    );
    assert_eq!(
        round_trip(&mut types, Value::from("2024-02-29 12:30:00"), "timestamp"),
        Value::from("2024-02-29 12:30:00")
    );
    assert_eq!(round_trip(&mut types, Value::Null, "date"), Value::Null);
}

#[test]
fn temporal_and_uuid_values_survive_a_round_trip() {
    let mut types = datatype();
    let cases = [
        ("2024-02-29", "date"),
        ("1970-01-01", "date"),
        ("23:59:59", "time"),
        ("00:00:00", "time"),
        ("1999-12-31 23:59:59", "timestamp"),
        ("123e4567-e89b-42d3-a456-426614174000", "uuid"),
    ];
    for (text, type_name) in cases {
        assert_eq!(
            round_trip(&mut types, Value::from(text), type_name),
            Value::from(text),
            "{type_name}"
        );
    }
}

#[test]
fn decimal_values_survive_a_round_trip() {
    let mut types = datatype();
    for text in ["1234.56", "-1234.56", "0.001", "-7"] {
        assert_eq!(round_trip(&mut types, Value::from(text), "decimal"), Value::from(text));
    }
    // Locale separators come back in canonical form, which is then stable.
    let canonical = round_trip(&mut types, Value::from("-1.234,56"), "decimal");
    assert_eq!(canonical, Value::from("-1234.56"));
    assert_eq!(round_trip(&mut types, canonical.clone(), "decimal"), canonical);
    assert_eq!(
        round_trip(&mut types, Value::from("1000,5"), "decimal"),
        Value::from("1000.5")
    );
}

#[test]
fn json_documents_survive_a_round_trip() {
    let mut types = datatype();
    let document = Value::Json(json!({"tags": ["a", "b"], "count": 2, "nested": {"ok": true}}));
    assert_eq!(round_trip(&mut types, document.clone(), "json"), document);
    assert_eq!(round_trip(&mut types, document.clone(), "jsonb"), document);
}

#[test]
fn decimal_literals_are_normalized() {
    let mut types = datatype();
    let quote = |types: &mut Datatype<AnsiBackend>, text: &str| {
        types
            .quote_literal(&Value::from(text), Some("decimal"))
            .unwrap()
    };
    assert_eq!(quote(&mut types, "1.234,56"), "1234.56");
    assert_eq!(quote(&mut types, "1,234.56"), "1234.56");
    assert_eq!(quote(&mut types, "1000,5"), "1000.5");
    assert_eq!(quote(&mut types, "1,000,50"), "1000.50");
    assert_eq!(quote(&mut types, "$ 12.00"), "12.00");
}

#[test]
fn float_literals_use_two_digit_exponents() {
    let mut types = datatype();
    assert_eq!(
        types.quote_literal(&Value::from("1.5e-7"), Some("float")).unwrap(),
        "1.5E-07"
    );
    assert_eq!(
        types.quote_literal(&Value::from("3,25E+120"), Some("float")).unwrap(),
        "3.25E+120"
    );
}

#[test]
fn null_and_empty_text() {
    let mut types = datatype();
    assert_eq!(types.quote_literal(&Value::Null, Some("integer")).unwrap(), "NULL");
    assert_eq!(types.quote_literal(&Value::from(""), Some("text")).unwrap(), "''");
    assert_eq!(
        types.quote(&Value::Null, Some("text"), QuoteOptions::UNQUOTED).unwrap(),
        None
    );

    let mut types = Datatype::new(
        AnsiBackend::new("main").with_options(Options::new().empty_to_null(true)),
    );
    assert_eq!(types.quote_literal(&Value::from(""), Some("text")).unwrap(), "NULL");
    assert_eq!(
        types.quote(&Value::from(""), Some("text"), QuoteOptions::UNQUOTED).unwrap(),
        None
    );
}

#[test]
fn untyped_values_are_inferred() {
    let mut types = datatype();
    assert_eq!(types.quote_literal(&Value::Int(3), None).unwrap(), "3");
    assert_eq!(types.quote_literal(&Value::Bool(true), None).unwrap(), "1");
    assert_eq!(
        types.quote_literal(&Value::from("2024-01-31"), None).unwrap(),
        "'2024-01-31'"
    );
    assert_eq!(types.quote_literal(&Value::from("plain"), None).unwrap(), "'plain'");
}

#[test]
fn temporal_now_keywords_become_functions() {
    let mut types = datatype();
    assert_eq!(
        types.quote_literal(&Value::from("CURRENT_DATE"), Some("date")).unwrap(),
        "CURRENT_DATE"
    );
    assert_eq!(
        types.quote_literal(&Value::from("CURRENT_TIME"), Some("timestamp")).unwrap(),
        "'CURRENT_TIME'"
    );
}

#[test]
fn pattern_quoting_escapes_wildcards() {
    let mut types = datatype();
    assert_eq!(
        types
            .quote(&Value::from("50%_off"), Some("text"), QuoteOptions::PATTERN)
            .unwrap()
            .unwrap(),
        "'50\\%\\_off' ESCAPE '\\'"
    );
    assert_eq!(
        types
            .match_pattern(&["it's ", "%", " 100%"], Some("NOT LIKE"), Some("title"))
            .unwrap(),
        "title NOT LIKE 'it''s % 100\\%' ESCAPE '\\'"
    );
    assert_eq!(types.pattern_escape_string(), " ESCAPE '\\'");
}

#[test]
fn implode_builds_in_lists() {
    let types = datatype();
    let values = [Value::from("a"), Value::from("b'c"), Value::Null];
    assert_eq!(types.implode(&values, Some("text")).unwrap(), "'a', 'b''c', NULL");
    assert_eq!(
        types.implode(&[Value::Int(1), Value::Int(2)], None).unwrap(),
        "1, 2"
    );
    assert_eq!(types.implode(&[], Some("integer")).unwrap(), "NULL");
}

#[test]
fn rows_are_decoded_by_position_and_name() {
    let mut types = datatype();

    let row = Row::from_pairs([
        ("id", Value::from("12")),
        ("price", Value::from("9.90")),
        ("meta", Value::from(r#"{"a":1}"#)),
    ]);
    let decoded = types
        .decode_row(&RowTypes::positional(["integer", "", "json"]), row, true)
        .unwrap();
    assert_eq!(decoded.get_by_name("id"), Some(&Value::Int(12)));
    assert_eq!(decoded.get_by_name("price"), Some(&Value::from("9.90")));
    assert_eq!(decoded.get_by_name("meta"), Some(&Value::Json(json!({"a": 1}))));

    let row = Row::from_pairs([("flag", Value::from("0")), ("name", Value::from("x  "))]);
    let decoded = types
        .decode_row(&RowTypes::named([("name", "text"), ("flag", "boolean")]), row, true)
        .unwrap();
    assert_eq!(decoded.get(0), Some(&Value::Bool(false)));
    assert_eq!(decoded.get(1), Some(&Value::from("x")));
}

#[test]
fn result_types_are_checked() {
    let types = Datatype::new(
        AnsiBackend::new("main").with_options(Options::new().map_type("string", "text")),
    );
    types
        .check_result_types(&RowTypes::positional(["integer", "string"]))
        .unwrap();

    let err = types
        .check_result_types(&RowTypes::named([("total", "money")]))
        .unwrap_err();
    assert!(err.is_unsupported());
    assert_eq!(err.message(), "money for total is not a supported column type");
}
