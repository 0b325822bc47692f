use serde_json::{Map, Value, json};
use vssr_expr::{
    BasicExpressionParser, Context, EvalError, ExpressionParser, Methods, ParseError,
};

fn data(v: Value) -> Map<String, Value> {
    match v {
        Value::Object(map) => map,
        _ => panic!("fixture must be an object"),
    }
}

fn eval(source: &str, bindings: Value) -> Result<Value, EvalError> {
    eval_with(source, bindings, &Methods::new())
}

fn eval_with(source: &str, bindings: Value, methods: &Methods) -> Result<Value, EvalError> {
    let expr = BasicExpressionParser.parse(source).expect("parse");
    let ctx = Context::with_methods(data(bindings), methods);
    expr.evaluate(&ctx)
}

fn string_methods() -> Methods {
    Methods::new()
        .with("strtoupper", |args: &[Value]| {
            json!(args.first().and_then(Value::as_str).unwrap_or("").to_uppercase())
        })
        .with("strrev", |args: &[Value]| {
            json!(args
                .first()
                .and_then(Value::as_str)
                .unwrap_or("")
                .chars()
                .rev()
                .collect::<String>())
        })
        .with("concat", |args: &[Value]| {
            json!(args
                .iter()
                .map(vssr_expr::value::to_display_string)
                .collect::<String>())
        })
}

#[test]
fn string_literal() {
    assert_eq!(eval("'some string'", json!({})), Ok(json!("some string")));
    assert_eq!(eval(" 'some string' ", json!({})), Ok(json!("some string")));
    assert_eq!(eval(r#""double""#, json!({})), Ok(json!("double")));
}

#[test]
fn property_access() {
    let result = eval(
        "variable.property",
        json!({"variable": {"property": "some value"}}),
    );
    assert_eq!(result, Ok(json!("some value")));
}

#[test]
fn negation() {
    assert_eq!(eval("!variable", json!({"variable": false})), Ok(json!(true)));
    assert_eq!(eval("!variable", json!({"variable": true})), Ok(json!(false)));
    assert_eq!(eval("!!variable", json!({"variable": "x"})), Ok(json!(true)));
}

#[test]
fn method_calls() {
    let methods = string_methods();
    assert_eq!(
        eval_with("strtoupper(somevar)", json!({"somevar": "abc"}), &methods),
        Ok(json!("ABC"))
    );
    assert_eq!(
        eval_with("strtoupper('abc')", json!({}), &methods),
        Ok(json!("ABC"))
    );
    assert_eq!(
        eval_with(" strrev( strtoupper( somevar ) ) ", json!({"somevar": "abc"}), &methods),
        Ok(json!("CBA"))
    );
}

#[test]
fn unknown_method_fails_at_evaluation() {
    let expr = BasicExpressionParser.parse("nope(1)").expect("parses fine");
    let err = expr.evaluate(&Context::new(Map::new())).unwrap_err();
    assert_eq!(err, EvalError::UndefinedMethod { name: "nope".into() });
}

#[test]
fn object_literals() {
    assert_eq!(
        eval("{ key: testProperty }", json!({"testProperty": 1})),
        Ok(json!({"key": 1}))
    );
    assert_eq!(
        eval(
            "{ key: testObject.testDelegate.testProperty }",
            json!({"testObject": {"testDelegate": {"testProperty": 1}}})
        ),
        Ok(json!({"key": 1}))
    );
    assert_eq!(
        eval(
            "{ 'wikibase-mex-icon-expand-x-small': !showReferences.P321, \
               'wikibase-mex-icon-collapse-x-small': showReferences.P321 }",
            json!({"showReferences": {"P321": false}})
        ),
        Ok(json!({
            "wikibase-mex-icon-expand-x-small": true,
            "wikibase-mex-icon-collapse-x-small": false
        }))
    );
}

#[test]
fn computed_object_keys() {
    assert_eq!(
        eval("{ [name]: true, static: 1 }", json!({"name": "dyn"})),
        Ok(json!({"dyn": true, "static": 1}))
    );
}

#[test]
fn object_keys_keep_source_order() {
    let value = eval("{ z: 1, a: 2 }", json!({})).unwrap();
    let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys, ["z", "a"]);
}

#[test]
fn array_literals() {
    assert_eq!(eval("['a', b, 3]", json!({"b": "B"})), Ok(json!(["a", "B", 3])));
    assert_eq!(eval("[]", json!({})), Ok(json!([])));
}

#[test]
fn comparisons() {
    assert_eq!(eval("false", json!({})), Ok(json!(false)));
    assert_eq!(eval("false != true", json!({})), Ok(json!(true)));
    assert_eq!(eval("3 < 4", json!({})), Ok(json!(true)));
    assert_eq!(eval("4 <= 4", json!({})), Ok(json!(true)));
    assert_eq!(eval("-1.5 > 2", json!({})), Ok(json!(false)));
    assert_eq!(eval("'this' == 'that'", json!({})), Ok(json!(false)));
    assert_eq!(eval("'b' > 'a'", json!({})), Ok(json!(true)));
    assert_eq!(eval("x === 'y'", json!({"x": "y"})), Ok(json!(true)));
    assert_eq!(eval("'1' == 1", json!({})), Ok(json!(true)));
    assert_eq!(eval("'1' === 1", json!({})), Ok(json!(false)));
}

#[test]
fn equality_binds_looser_than_ordering() {
    assert_eq!(eval("1 < 2 === true", json!({})), Ok(json!(true)));
    assert_eq!(eval("!(1 < 2)", json!({})), Ok(json!(false)));
}

#[test]
fn comparing_collections_is_a_type_mismatch() {
    let err = eval("3 < myvar", json!({"myvar": [1, 2, 3]})).unwrap_err();
    assert_eq!(
        err,
        EvalError::TypeMismatch {
            operator: "<",
            left: "number",
            right: "array"
        }
    );
    assert!(matches!(
        eval("null == 0", json!({})),
        Err(EvalError::TypeMismatch { .. })
    ));
}

#[test]
fn identity_with_null_accepts_any_operand() {
    assert_eq!(eval("x !== null", json!({"x": []})), Ok(json!(true)));
    assert_eq!(eval("x === null", json!({"x": null})), Ok(json!(true)));
}

#[test]
fn missing_variable_is_an_error() {
    assert_eq!(
        eval("missing", json!({})),
        Err(EvalError::UndefinedVariable { path: "missing".into() })
    );
    assert_eq!(
        eval("a.b.c", json!({"a": {"b": {}}})),
        Err(EvalError::UndefinedVariable { path: "a.b.c".into() })
    );
}

#[test]
fn computed_member_access() {
    let bindings = json!({
        "list": {"data-values": "dv", "1": "one"},
        "items": ["a", "b", "c"],
        "index": {"key": "second"},
        "indexKeys": {"second": 2},
    });
    assert_eq!(eval("list['data-values']", bindings.clone()), Ok(json!("dv")));
    assert_eq!(eval("list[1]", bindings.clone()), Ok(json!("one")));
    assert_eq!(eval("items[1]", bindings.clone()), Ok(json!("b")));
    assert_eq!(eval("items['2']", bindings.clone()), Ok(json!("c")));
    assert_eq!(
        eval("items[indexKeys[index.key]]", bindings.clone()),
        Ok(json!("c"))
    );
    assert!(eval("items[3]", bindings).is_err());
}

#[test]
fn length_of_lists_and_strings() {
    let bindings = json!({"items": [1, 2, 3], "word": "héllo"});
    assert_eq!(eval("items.length", bindings.clone()), Ok(json!(3)));
    assert_eq!(eval("word.length", bindings.clone()), Ok(json!(5)));
    assert_eq!(eval("items.length > 2", bindings), Ok(json!(true)));
}

#[test]
fn filters_chain_left_to_right() {
    let methods = string_methods();
    assert_eq!(
        eval_with("name | strtoupper | strrev", json!({"name": "abc"}), &methods),
        Ok(json!("CBA"))
    );
    assert_eq!(
        eval_with("a, b | concat('!')", json!({"a": "x", "b": "y"}), &methods),
        Ok(json!("xy!"))
    );
}

#[test]
fn logical_or_is_not_a_filter() {
    let err = BasicExpressionParser.parse("a || b").unwrap_err();
    assert!(matches!(err, ParseError::Syntax { .. }));
}

#[test]
fn unknown_filter() {
    assert_eq!(
        eval("name | shout", json!({"name": "x"})),
        Err(EvalError::UndefinedFilter { name: "shout".into() })
    );
}

#[test]
fn syntax_errors_carry_source() {
    for bad in ["", "a ===", "{ key }", "'unterminated", "a..b"] {
        match BasicExpressionParser.parse(bad) {
            Err(ParseError::Syntax { source_text, .. }) => assert_eq!(source_text, bad.trim()),
            other => panic!("{bad:?} gave {other:?}"),
        }
    }
}

#[test]
fn pipeline_errors_name_the_expression() {
    for bad in ["| upper", " , | upper", "a | upper(b ===)"] {
        match BasicExpressionParser.parse(bad) {
            Err(ParseError::Syntax { source_text, .. }) => {
                assert!(!source_text.is_empty(), "{bad:?} lost its source");
                assert!(bad.contains(source_text.as_str()), "{bad:?} gave {source_text:?}");
            }
            other => panic!("{bad:?} gave {other:?}"),
        }
    }
}
