/// Builds a [`Value`](crate::Value) from JSON-like syntax.
///
/// Leaves go through the serde bridge, so integers are narrowed to the
/// smallest width that holds them and float literals become DOUBLE. A leaf
/// the bridge rejects, such as a map with integer keys or a tuple variant,
/// becomes [`Value::Null`](crate::Value::Null) instead of an error. Call
/// [`to_value`](crate::to_value) directly to see the error.
///
/// ```rust
/// use sprig_bson::{bson, Number, Value};
///
/// let v = bson!({ "id": 300, "tags": ["a", null] });
/// let obj = v.as_object().unwrap();
/// assert_eq!(obj.get("id"), Some(&Value::Number(Number::Short(300))));
/// ```
#[macro_export]
macro_rules! bson {
    // Handle null
    (null) => {
        $crate::Value::Null
    };

    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::Array(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Array(vec![$($crate::bson!($elem)),*])
    };

    ({}) => {
        $crate::Value::Object($crate::ObjectMap::new())
    };

    // Later keys replace earlier ones in place
    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut object = $crate::ObjectMap::new();
        $(
            object.insert($key.to_string(), $crate::bson!($value));
        )*
        $crate::Value::Object(object)
    }};

    // Any other expression; unsupported shapes become null
    ($s:expr) => {{
        $crate::to_value(&$s).unwrap_or($crate::Value::Null)
    }};
}
