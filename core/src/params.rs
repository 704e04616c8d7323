//! Request parameters and their canonical string form.
//!
//! # Design
//! `ParamValue` is a closed set of value kinds, each with one rendering rule:
//! strings pass through, numbers use their decimal form, everything else is
//! compact JSON. `Null` exists so callers can express "no value" (for
//! example from an `Option`), but it can never be rendered: the validation
//! pass in `Parameters::canonical_pairs` rejects it before any signing or
//! encoding happens.
//!
//! `Parameters` is backed by a `BTreeMap`, so iteration is always in byte
//! order of the keys. Both the signature and the form body are derived from
//! that order.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;

/// A single parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    String(String),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    /// Any other JSON-serializable value, rendered as compact JSON.
    Json(Value),
    /// An absent value. Always rejected by validation.
    Null,
}

impl ParamValue {
    /// Serialize an arbitrary value into the `Json` variant.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, ApiError> {
        serde_json::to_value(value)
            .map(ParamValue::from)
            .map_err(|e| ApiError::SerializationError(e.to_string()))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, ParamValue::Null | ParamValue::Json(Value::Null))
    }

    /// Render the value as it appears in the signature and on the wire.
    pub fn render(&self, key: &str) -> Result<String, ApiError> {
        match self {
            ParamValue::String(s) => Ok(s.clone()),
            ParamValue::Integer(n) => Ok(n.to_string()),
            ParamValue::Unsigned(n) => Ok(n.to_string()),
            ParamValue::Float(f) if !f.is_finite() => {
                Err(ApiError::invalid_parameter(key, format!("non-finite number {f}")))
            }
            ParamValue::Float(f) => Ok(f.to_string()),
            ParamValue::Null | ParamValue::Json(Value::Null) => {
                Err(ApiError::invalid_parameter(key, "value is absent"))
            }
            ParamValue::Json(Value::String(s)) => Ok(s.clone()),
            ParamValue::Json(v) => {
                serde_json::to_string(v).map_err(|e| ApiError::SerializationError(e.to_string()))
            }
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::String(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        ParamValue::String(value.clone())
    }
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for ParamValue {
            fn from(value: $t) -> Self {
                ParamValue::Integer(i64::from(value))
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for ParamValue {
            fn from(value: $t) -> Self {
                ParamValue::Unsigned(u64::from(value))
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64);
impl_from_unsigned!(u8, u16, u32, u64);

impl From<f32> for ParamValue {
    /// Goes through the shortest `f32` decimal so `0.1f32` stays `0.1`
    /// instead of picking up widening noise.
    fn from(value: f32) -> Self {
        ParamValue::Float(value.to_string().parse().unwrap_or(f64::from(value)))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Json(Value::Bool(value))
    }
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        ParamValue::Json(value)
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ParamValue::Null, Into::into)
    }
}

/// Key/value arguments of one request, kept in canonical key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters(BTreeMap<String, ParamValue>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Option<ParamValue> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in canonical (byte-sorted) key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Reject absent values. Runs before anything is rendered so no partial
    /// signature is ever computed over a placeholder.
    pub fn validate(&self) -> Result<(), ApiError> {
        match self.0.iter().find(|(_, v)| v.is_absent()) {
            Some((key, _)) => Err(ApiError::invalid_parameter(key, "value is absent")),
            None => Ok(()),
        }
    }

    /// Validated `(key, rendered value)` pairs in canonical order.
    pub fn canonical_pairs(&self) -> Result<Vec<(&str, String)>, ApiError> {
        self.validate()?;
        self.iter()
            .map(|(key, value)| value.render(key).map(|rendered| (key, rendered)))
            .collect()
    }

    /// `application/x-www-form-urlencoded` serialization of every pair.
    pub fn to_form_body(&self) -> Result<String, ApiError> {
        let pairs = self.canonical_pairs()?;
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &pairs {
            serializer.append_pair(key, value);
        }
        Ok(serializer.finish())
    }
}

impl<K, V> FromIterator<(K, V)> for Parameters
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
