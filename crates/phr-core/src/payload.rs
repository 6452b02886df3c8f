//! # Payload Model
//!
//! Health records arrive as arbitrary JSON-like structures with no fixed
//! schema. They are modelled as [`PayloadValue`], a tagged union of scalars,
//! arrays and string-keyed mappings, and [`Payload`], which is the mapping
//! that sits at the top of every record.
//!
//! Mappings are stored in a `BTreeMap`, so key order is never observable
//! through this type. Integers are normalised on the way in: a value that
//! fits `i64` is always `Int`, and `Uint` is reserved for values above
//! `i64::MAX`.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

use crate::error::CanonicalizationError;

/// A single value inside a payload.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadValue {
    Null,
    Bool(bool),
    Int(i64),
    /// Only for integers above `i64::MAX`.
    Uint(u64),
    /// May hold NaN or infinities; those are rejected at canonicalization.
    Float(f64),
    String(String),
    Array(Vec<PayloadValue>),
    Object(BTreeMap<String, PayloadValue>),
}

impl PayloadValue {
    /// JSON type name, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) | Self::Uint(_) | Self::Float(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    /// Look up a key if this value is an object.
    pub fn get(&self, key: &str) -> Option<&PayloadValue> {
        match self {
            Self::Object(map) => map.get(key),
            _ => None,
        }
    }
}

impl From<bool> for PayloadValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for PayloadValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for PayloadValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u64> for PayloadValue {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(i) => Self::Int(i),
            Err(_) => Self::Uint(v),
        }
    }
}

impl From<f64> for PayloadValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for PayloadValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for PayloadValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec<PayloadValue>> for PayloadValue {
    fn from(v: Vec<PayloadValue>) -> Self {
        Self::Array(v)
    }
}

impl From<BTreeMap<String, PayloadValue>> for PayloadValue {
    fn from(v: BTreeMap<String, PayloadValue>) -> Self {
        Self::Object(v)
    }
}

impl From<serde_json::Value> for PayloadValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Self::Uint(u)
                } else {
                    // serde_json numbers are always finite.
                    Self::Float(n.as_f64().unwrap_or_default())
                }
            }
            Value::String(s) => Self::String(s),
            Value::Array(arr) => Self::Array(arr.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl Serialize for PayloadValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Uint(u) => serializer.serialize_u64(*u),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(arr) => {
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for item in arr {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(map) => {
                let mut m = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    m.serialize_entry(k, v)?;
                }
                m.end()
            }
        }
    }
}

struct PayloadValueVisitor;

impl<'de> Visitor<'de> for PayloadValueVisitor {
    type Value = PayloadValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(PayloadValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(PayloadValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
        PayloadValue::deserialize(d)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(PayloadValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(PayloadValue::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(PayloadValue::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(PayloadValue::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(PayloadValue::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(PayloadValue::String(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut out = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            out.push(item);
        }
        Ok(PayloadValue::Array(out))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut out = BTreeMap::new();
        while let Some((k, v)) = map.next_entry::<String, PayloadValue>()? {
            out.insert(k, v);
        }
        Ok(PayloadValue::Object(out))
    }
}

impl<'de> Deserialize<'de> for PayloadValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PayloadValueVisitor)
    }
}

/// A health record: the top-level key-value mapping handed to the anchoring
/// core. Owned by the caller and never mutated once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload(BTreeMap<String, PayloadValue>);

impl Payload {
    /// An empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PayloadValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Convert a parsed JSON document, which must be an object.
    pub fn from_json(value: serde_json::Value) -> Result<Self, CanonicalizationError> {
        match PayloadValue::from(value) {
            PayloadValue::Object(map) => Ok(Self(map)),
            other => Err(CanonicalizationError::NotAMapping {
                found: other.type_name(),
            }),
        }
    }

    /// Look up a top-level field.
    pub fn get(&self, key: &str) -> Option<&PayloadValue> {
        self.0.get(key)
    }

    /// Number of top-level fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over top-level fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &PayloadValue)> {
        self.0.iter()
    }

    pub(crate) fn as_map(&self) -> &BTreeMap<String, PayloadValue> {
        &self.0
    }
}

impl From<BTreeMap<String, PayloadValue>> for Payload {
    fn from(map: BTreeMap<String, PayloadValue>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<PayloadValue>> FromIterator<(K, V)> for Payload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut m = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            m.serialize_entry(k, v)?;
        }
        m.end()
    }
}

impl<'de> Deserialize<'de> for Payload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match PayloadValue::deserialize(deserializer)? {
            PayloadValue::Object(map) => Ok(Self(map)),
            other => Err(de::Error::invalid_type(
                de::Unexpected::Other(other.type_name()),
                &"a JSON object",
            )),
        }
    }
}
