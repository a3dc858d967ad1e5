//! Dynamic values stored in validated maps.

use crate::validated_map::ValidatedMap;

/// Map key. Schemas and data are keyed by owned strings.
pub type Key = String;

/// Plain, unvalidated mapping. This is what [`Plain::into_plain`] hands back.
pub type Map = hashbrown::HashMap<Key, Value>;

/// A value held by a [`ValidatedMap`].
///
/// `Null` is a legitimately stored "no value"; it is never confused with an
/// access to a key outside the schema, which is reported through
/// [`Checked::InvalidKey`](crate::Checked::InvalidKey) instead.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(Map),
    Record(ValidatedMap),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&ValidatedMap> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Strip records at every depth, leaving only plain maps and lists.
    pub fn into_plain_deep(self) -> Value {
        match self {
            Value::Record(r) => Value::Map(deep_map(r.into_plain())),
            Value::Map(m) => Value::Map(deep_map(m)),
            Value::List(items) => {
                Value::List(items.into_iter().map(Value::into_plain_deep).collect())
            }
            other => other,
        }
    }
}

fn deep_map(m: Map) -> Map {
    m.into_iter().map(|(k, v)| (k, v.into_plain_deep())).collect()
}

/// Unwrap capability: a validated map yields its data, everything else
/// yields itself. Applying it twice is the same as applying it once.
///
/// This is the escape hatch before handing data to code that needs to add
/// arbitrary fields.
pub trait Plain {
    type Output;

    fn into_plain(self) -> Self::Output;
}

impl Plain for ValidatedMap {
    type Output = Map;

    fn into_plain(self) -> Map {
        self.into_data()
    }
}

impl Plain for Map {
    type Output = Map;

    #[inline]
    fn into_plain(self) -> Map {
        self
    }
}

impl Plain for Value {
    type Output = Value;

    fn into_plain(self) -> Value {
        match self {
            Value::Record(r) => Value::Map(r.into_plain()),
            other => other,
        }
    }
}

/// JSON integers that fit in `i64` become `Int`; every other number becomes
/// `Float`. The conversion is lossy for integers above `i64::MAX`, which are
/// rounded to the nearest `f64`.
impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                // Without arbitrary precision every number has an f64 view.
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(obj) => {
                Value::Map(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
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

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Value::Map(m)
    }
}

impl From<ValidatedMap> for Value {
    fn from(r: ValidatedMap) -> Self {
        Value::Record(r)
    }
}

/// Convert a JSON object into a plain [`Map`]; any other JSON value yields
/// `None`.
pub fn map_from_json(v: serde_json::Value) -> Option<Map> {
    match Value::from(v) {
        Value::Map(m) => Some(m),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_numbers_prefer_integers() {
        assert_eq!(Value::from(json!(3)), Value::Int(3));
        assert_eq!(Value::from(json!(1.5)), Value::Float(1.5));
        assert_eq!(Value::from(json!(i64::MAX)), Value::Int(i64::MAX));
    }

    /// Invariant: integers past `i64::MAX` round to the nearest float.
    #[test]
    fn large_unsigned_integers_are_lossy() {
        let big = i64::MAX as u64 + 1;
        assert_eq!(Value::from(json!(big)), Value::Float(big as f64));
        assert_eq!(Value::from(json!(u64::MAX)), Value::Float(u64::MAX as f64));
    }

    #[test]
    fn json_objects_become_plain_maps() {
        let m = map_from_json(json!({"a": {"b": [1, null]}})).unwrap();
        let inner = m["a"].as_map().unwrap();
        assert_eq!(
            inner["b"],
            Value::List(vec![Value::Int(1), Value::Null])
        );
        assert!(map_from_json(json!([1])).is_none());
    }

    #[test]
    fn into_plain_is_idempotent_on_values() {
        let r = ValidatedMap::new(map_from_json(json!({"id": 1})).unwrap());
        let once = Value::Record(r).into_plain();
        let twice = once.clone().into_plain();
        assert_eq!(once, twice);
        assert!(matches!(once, Value::Map(_)));
        assert_eq!(Value::Int(4).into_plain(), Value::Int(4));
    }

    #[test]
    fn deep_plain_strips_nested_records() {
        let child = ValidatedMap::new(map_from_json(json!({"id": "U1"})).unwrap());
        let mut parent = Map::new();
        parent.insert("user".into(), Value::Record(child.clone()));
        parent.insert("users".into(), Value::List(vec![Value::Record(child)]));
        let outer = Value::Record(ValidatedMap::new(parent)).into_plain_deep();

        let m = outer.as_map().unwrap();
        assert!(m["user"].as_map().is_some());
        assert!(m["users"].as_list().unwrap()[0].as_map().is_some());
    }

    #[test]
    fn records_serialize_as_their_data() {
        let r = ValidatedMap::new(map_from_json(json!({"id": 1, "tags": ["x"]})).unwrap());
        let out = serde_json::to_value(Value::Record(r)).unwrap();
        assert_eq!(out, json!({"id": 1, "tags": ["x"]}));
    }
}
