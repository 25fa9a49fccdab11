//! The polymorphic materialization target: a dynamic tree mirroring the
//! source document's shape, used when a caller's storage site declares no
//! static type (`get_interface`, a field typed `any`).

use indexmap::IndexMap;

use jsonspan::{
    extract_value, key_to_string, resolve_with_config, to_bool, to_f64, to_i64, to_string, Config,
    Kind, Span,
};

use crate::error::Result;

/// A fully-owned dynamic JSON value. `Object` preserves source key order.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
}

impl Value {
    /// Recursively materialize `span` into a [`Value`] tree.
    pub(crate) fn from_span(buffer: &[u8], span: &Span) -> Result<Self> {
        Ok(match span.kind {
            Kind::Null => Value::Null,
            Kind::Bool => Value::Bool(to_bool(buffer, span, false)?),
            Kind::Int => Value::Int(to_i64(buffer, span, false)?),
            Kind::Float => Value::Float(to_f64(buffer, span, false)?),
            Kind::String => Value::String(to_string(buffer, span, false)?.into_owned()),
            Kind::Array => {
                let mut items = Vec::new();
                jsonspan::for_each_element(buffer, span, |element, _consumed| {
                    items.push(Value::from_span(buffer, &element)?);
                    Ok(true)
                })?;
                Value::Array(items)
            }
            Kind::Object => {
                let mut map = IndexMap::new();
                jsonspan::for_each_member(buffer, span, |member, _consumed| {
                    let key = key_to_string(buffer, &member.key)?.into_owned();
                    let value = Value::from_span(buffer, &member.value)?;
                    map.insert(key, value);
                    Ok(true)
                })?;
                Value::Object(map)
            }
            Kind::Invalid => unreachable!("extract_value never returns an Invalid-kind span"),
        })
    }

    /// Parse the whole of `buffer` into a [`Value`] tree.
    pub fn parse(buffer: &[u8]) -> Result<Self> {
        let (span, _) = extract_value(buffer, 0)?;
        Value::from_span(buffer, &span)
    }

    /// Resolve `path` against the whole of `buffer` and materialize the
    /// result polymorphically — the `extract_interface` combinator named
    /// in §6.
    ///
    /// # Errors
    ///
    /// Any error the key-path resolver or a nested `from_span` call
    /// produces.
    pub fn extract_interface(buffer: &[u8], path: &str, config: &Config) -> Result<Self> {
        let (root, _) = extract_value(buffer, 0)?;
        let span = resolve_with_config(buffer, &root, path, config)?;
        Value::from_span(buffer, &span)
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_interface_resolves_a_path_then_materializes_polymorphically() {
        let doc = br#"{"a": [1, "two", null]}"#;
        let value = Value::extract_interface(doc, "a.1", &Config::default()).unwrap();
        assert_eq!(value, Value::String("two".to_string()));
    }

    #[test]
    fn parses_nested_document_preserving_key_order() {
        let doc = br#"{"z": 1, "a": [true, null, "x"]}"#;
        let value = Value::parse(doc).unwrap();
        let obj = value.as_object().unwrap();
        let keys: Vec<_> = obj.keys().collect();
        assert_eq!(keys, vec!["z", "a"]);
        let arr = obj.get("a").unwrap().as_array().unwrap();
        assert_eq!(arr[0], Value::Bool(true));
        assert_eq!(arr[1], Value::Null);
        assert_eq!(arr[2], Value::String("x".to_string()));
    }
}
