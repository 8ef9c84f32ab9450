use sprig_bson::{bson, encode, from_json, Number, ObjectMap, Tag, Value};

#[test]
fn test_bson_macro_null() {
    let value = bson!(null);
    assert_eq!(value, Value::Null);
}

#[test]
fn test_bson_macro_booleans() {
    let true_val = bson!(true);
    assert_eq!(true_val, Value::Bool(true));

    let false_val = bson!(false);
    assert_eq!(false_val, Value::Bool(false));
}

#[test]
fn test_bson_macro_numbers() {
    assert_eq!(bson!(42), Value::Number(Number::Byte(42)));
    assert_eq!(bson!(-123), Value::Number(Number::Byte(-123)));
    assert_eq!(bson!(1000), Value::Number(Number::Short(1000)));
    assert_eq!(bson!(5_000_000_000i64), Value::Number(Number::Long(5_000_000_000)));
    assert_eq!(bson!(3.5), Value::Number(Number::Double(3.5)));
    assert_eq!(bson!(0.25f32), Value::Number(Number::Float(0.25)));
}

#[test]
fn test_bson_macro_strings() {
    let string_val = bson!("hello world");
    assert_eq!(string_val, Value::String("hello world".to_string()));

    let empty_string = bson!("");
    assert_eq!(empty_string, Value::String(String::new()));
}

#[test]
fn test_bson_macro_arrays() {
    let empty_array = bson!([]);
    assert_eq!(empty_array, Value::Array(vec![]));

    let mixed_array = bson!([1, "hello", true, null]);
    assert_eq!(
        mixed_array,
        Value::Array(vec![
            Value::Number(Number::Byte(1)),
            Value::String("hello".to_string()),
            Value::Bool(true),
            Value::Null,
        ])
    );
}

#[test]
fn test_bson_macro_objects() {
    let empty_object = bson!({});
    assert_eq!(empty_object, Value::Object(ObjectMap::new()));

    let simple_object = bson!({
        "name": "Alice",
        "age": 30
    });

    match simple_object {
        Value::Object(ref obj) => {
            assert_eq!(obj.len(), 2);
            assert_eq!(obj.get("name"), Some(&Value::String("Alice".to_string())));
            assert_eq!(obj.get("age"), Some(&Value::Number(Number::Byte(30))));
        }
        _ => panic!("Expected object"),
    }
}

#[test]
fn test_bson_macro_nested() {
    let nested = bson!({
        "user": {
            "id": 123,
            "name": "Bob",
            "active": true
        },
        "tags": ["admin", "developer"],
        "count": 40000
    });

    let obj = nested.as_object().unwrap();
    assert_eq!(obj.len(), 3);

    if let Some(Value::Object(user)) = obj.get("user") {
        assert_eq!(user.get("id"), Some(&Value::Number(Number::Byte(123))));
        assert_eq!(user.get("active"), Some(&Value::Bool(true)));
    } else {
        panic!("Expected user to be an object");
    }

    if let Some(Value::Array(tags)) = obj.get("tags") {
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[1], Value::String("developer".to_string()));
    } else {
        panic!("Expected tags to be an array");
    }

    assert_eq!(obj.get("count"), Some(&Value::Number(Number::Integer(40000))));
}

#[test]
fn test_bson_macro_matches_parser() {
    let built = bson!({
        "id": 7,
        "scores": [1, 300, 70000],
        "nick": null
    });
    let parsed = from_json(r#"{"id":7,"scores":[1,300,70000],"nick":null}"#).unwrap();

    assert_eq!(encode(&built).unwrap(), parsed);
}

#[test]
fn test_value_methods() {
    let null_val = bson!(null);
    assert!(null_val.is_null());
    assert!(!null_val.is_bool());
    assert!(!null_val.is_number());
    assert!(!null_val.is_string());
    assert!(!null_val.is_array());
    assert!(!null_val.is_object());
    assert_eq!(null_val.tag(), Tag::Null);

    let bool_val = bson!(false);
    assert_eq!(bool_val.as_bool(), Some(false));
    assert_eq!(bool_val.tag(), Tag::False);

    let str_val = bson!("hello");
    assert_eq!(str_val.as_str(), Some("hello"));

    let array_val = bson!([1, 2, 3]);
    assert_eq!(array_val.as_array().unwrap().len(), 3);

    let obj_val = bson!({"key": "value"});
    assert_eq!(obj_val.as_object().unwrap().len(), 1);
    assert_eq!(obj_val.to_string(), r#"{"key":"value"}"#);
}

#[test]
fn test_bson_macro_unsupported_leaf_is_null() {
    let mut scores = std::collections::BTreeMap::new();
    scores.insert(1u8, "one");
    assert!(sprig_bson::to_value(&scores).is_err());

    assert_eq!(bson!(scores), Value::Null);
    assert_eq!(
        bson!({ "scores": scores, "ok": true }),
        bson!({ "scores": null, "ok": true })
    );
}
