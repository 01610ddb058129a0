use crate::state::State;

/// The type of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Array,
    Bool,
    Null,
    Number,
    Object,
    String,
}

/// A value stored in a [`State`].
///
/// Numbers are always IEEE-754 doubles, whatever their JSON spelling was.
/// `Array` and `Null` are carried through parsing, merging, comparison and
/// serialization, but have no typed accessors.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum Value {
    Number(f64),
    String(String),
    Bool(bool),
    Object(State),
    Array(Vec<Value>),
    Null,
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Number(_) => ValueType::Number,
            Value::String(_) => ValueType::String,
            Value::Bool(_) => ValueType::Bool,
            Value::Object(_) => ValueType::Object,
            Value::Array(_) => ValueType::Array,
            Value::Null => ValueType::Null,
        }
    }

    pub fn as_object(&self) -> Option<&State> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n.into())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<State> for Value {
    fn from(s: State) -> Self {
        Value::Object(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => Value::Number(f),
                // Only reachable with serde_json's arbitrary_precision feature
                None => Value::String(n.to_string()),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(a) => Value::Array(a.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(o) => Value::Object(State::from(o)),
        }
    }
}

/// Largest magnitude below which every integer is exactly representable as f64.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Number(n) => number_to_json(n),
            Value::String(s) => serde_json::Value::String(s),
            Value::Array(a) => {
                serde_json::Value::Array(a.into_iter().map(serde_json::Value::from).collect())
            }
            Value::Object(o) => serde_json::Value::Object(o.into()),
        }
    }
}

/// Integral numbers are written without a fractional part, so `3` stays `3`
/// instead of turning into `3.0`. JSON has no representation for NaN or the
/// infinities; those become `null`.
fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER {
        serde_json::Value::Number((n as i64).into())
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn value_type_of_each_variant() {
        assert_eq!(Value::from(1.5).value_type(), ValueType::Number);
        assert_eq!(Value::from("x").value_type(), ValueType::String);
        assert_eq!(Value::from(false).value_type(), ValueType::Bool);
        assert_eq!(Value::from(State::new()).value_type(), ValueType::Object);
        assert_eq!(Value::from(vec![]).value_type(), ValueType::Array);
        assert_eq!(Value::Null.value_type(), ValueType::Null);
    }

    #[test]
    fn json_integers_become_doubles() {
        assert_eq!(Value::from(json!(2)), Value::Number(2.0));
        assert_eq!(Value::from(json!(-7)), Value::Number(-7.0));
        assert_eq!(Value::from(json!(0.25)), Value::Number(0.25));
    }

    #[test]
    fn integral_numbers_serialize_without_fraction() {
        assert_eq!(serde_json::Value::from(Value::Number(3.0)), json!(3));
        assert_eq!(serde_json::to_string(&Value::Number(3.0)).unwrap(), "3");
        assert_eq!(serde_json::to_string(&Value::Number(0.2)).unwrap(), "0.2");
    }

    #[test]
    fn non_finite_numbers_serialize_as_null() {
        assert_eq!(serde_json::Value::from(Value::Number(f64::NAN)), json!(null));
        assert_eq!(
            serde_json::Value::from(Value::Number(f64::INFINITY)),
            json!(null)
        );
    }

    #[test]
    fn arrays_and_null_pass_through() {
        let j = json!([1, "two", null, [true], {"k": "v"}]);
        let v = Value::from(j.clone());
        assert_eq!(v.value_type(), ValueType::Array);
        assert_eq!(serde_json::Value::from(v), j);
    }

    #[test]
    fn deserialize_value() {
        let v: Value = serde_json::from_str(r#"{ "a": [1, 2] }"#).unwrap();
        let o = v.as_object().unwrap();
        assert_eq!(
            o.get("a").unwrap(),
            &Value::Array(vec![Value::Number(1.0), Value::Number(2.0)])
        );
    }
}
