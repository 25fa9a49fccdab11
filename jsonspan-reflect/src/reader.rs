//! The tree-backed reader: a node that pre-indexes its own immediate
//! children so repeated lookups against the same container are O(1) after
//! the first index build, with typed accessors layered over the coercion
//! layer.
//!
//! Nested containers are indexed lazily: `get_collection` builds a fresh
//! `Reader` for the child span on demand rather than eagerly walking the
//! whole document up front, keeping with the engine's "don't materialize
//! untouched subtrees" design.

use indexmap::IndexMap;

use jsonspan::{
    extract_value, for_each_element, for_each_member, key_to_string, resolve, to_bool, to_f64,
    to_i64, to_string, Kind, Span,
};

use crate::error::{Error, Result};
use crate::value::Value;

/// A single indexed level of a JSON document: the node's own span, kind,
/// source-ordered key list, and an index from key (or decimal-string
/// array position) to child span.
pub struct Reader<'b> {
    buffer: &'b [u8],
    span: Span,
    ordered_keys: Vec<String>,
    children: IndexMap<String, Span>,
}

impl<'b> Reader<'b> {
    /// Index the whole of `buffer` as the reader's root.
    ///
    /// # Errors
    ///
    /// Any error [`jsonspan::extract_value`] or its member/element walk can
    /// produce.
    pub fn new(buffer: &'b [u8]) -> Result<Self> {
        let (span, _) = extract_value(buffer, 0)?;
        Self::from_span(buffer, span)
    }

    fn from_span(buffer: &'b [u8], span: Span) -> Result<Self> {
        let mut ordered_keys = Vec::new();
        let mut children = IndexMap::new();

        match span.kind {
            Kind::Object => {
                for_each_member(buffer, &span, |member, _consumed| {
                    let key = key_to_string(buffer, &member.key)?.into_owned();
                    ordered_keys.push(key.clone());
                    children.insert(key, member.value);
                    Ok(true)
                })?;
            }
            Kind::Array => {
                let mut i = 0usize;
                for_each_element(buffer, &span, |element, _consumed| {
                    let key = i.to_string();
                    ordered_keys.push(key.clone());
                    children.insert(key, element);
                    i += 1;
                    Ok(true)
                })?;
            }
            _ => {
                ordered_keys.push("0".to_string());
                children.insert("0".to_string(), span);
            }
        }

        Ok(Reader {
            buffer,
            span,
            ordered_keys,
            children,
        })
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.span.kind
    }

    /// Source-order keys (or decimal-string indices, for an array root).
    #[must_use]
    pub fn ordered_keys(&self) -> &[String] {
        &self.ordered_keys
    }

    /// Resolve `path` against this node. The first component is served from
    /// the prebuilt index; any remainder is handed to the core resolver.
    ///
    /// # Errors
    ///
    /// `Error::Core` wrapping `KeyMissing`/`NoSuchIndex`/`RequiresContainer`
    /// if the path does not resolve.
    pub fn get(&self, path: &str) -> Result<Span> {
        if path.is_empty() {
            return Ok(self.span);
        }
        let (head, rest) = split_first_component(path);
        if let Some(&head_span) = self.children.get(&head) {
            return if rest.is_empty() {
                Ok(head_span)
            } else {
                Ok(resolve(self.buffer, &head_span, &rest)?)
            };
        }
        // Not in the prebuilt index: fall through to the core resolver so
        // the error (KeyMissing vs NoSuchIndex vs RequiresContainer) is
        // produced the same way a direct `jsonspan::resolve` call would.
        Ok(resolve(self.buffer, &self.span, path)?)
    }

    /// Build a child `Reader` over the container found at `path`.
    ///
    /// # Errors
    ///
    /// Propagates [`Reader::get`]'s errors, plus `Error::RequiresContainer`
    /// if the resolved span is not an object or array.
    pub fn get_collection(&self, path: &str) -> Result<Reader<'b>> {
        let span = self.get(path)?;
        if !span.kind.is_container() {
            return Err(Error::RequiresContainer { found: span.kind });
        }
        Reader::from_span(self.buffer, span)
    }

    pub fn get_string(&self, path: &str) -> Result<String> {
        Ok(to_string(self.buffer, &self.get(path)?, false)?.into_owned())
    }

    pub fn get_int(&self, path: &str) -> Result<i64> {
        Ok(to_i64(self.buffer, &self.get(path)?, false)?)
    }

    pub fn get_float(&self, path: &str) -> Result<f64> {
        Ok(to_f64(self.buffer, &self.get(path)?, false)?)
    }

    pub fn get_bool(&self, path: &str) -> Result<bool> {
        Ok(to_bool(self.buffer, &self.get(path)?, false)?)
    }

    pub fn get_byte_slice(&self, path: &str) -> Result<Vec<u8>> {
        let span = self.get(path)?;
        Ok(span.inner_bytes(self.buffer).to_vec())
    }

    pub fn get_byte_slices(&self, path: &str) -> Result<Vec<Vec<u8>>> {
        let span = self.get(path)?;
        let mut out = Vec::new();
        for_each_element(self.buffer, &span, |element, _consumed| {
            out.push(element.inner_bytes(self.buffer).to_vec());
            Ok(true)
        })?;
        Ok(out)
    }

    pub fn get_interface(&self, path: &str) -> Result<Value> {
        let span = self.get(path)?;
        Value::from_span(self.buffer, &span)
    }

    pub fn get_interface_slice(&self, path: &str) -> Result<Vec<Value>> {
        let span = self.get(path)?;
        let mut out = Vec::new();
        for_each_element(self.buffer, &span, |element, _consumed| {
            out.push(Value::from_span(self.buffer, &element)?);
            Ok(true)
        })?;
        Ok(out)
    }

    pub fn get_map_string_interface(&self, path: &str) -> Result<IndexMap<String, Value>> {
        let span = self.get(path)?;
        let mut out = IndexMap::new();
        for_each_member(self.buffer, &span, |member, _consumed| {
            let key = key_to_string(self.buffer, &member.key)?.into_owned();
            out.insert(key, Value::from_span(self.buffer, &member.value)?);
            Ok(true)
        })?;
        Ok(out)
    }

    pub fn to_string_value(&self) -> Result<String> {
        self.get_string("")
    }

    pub fn to_int(&self) -> Result<i64> {
        self.get_int("")
    }

    pub fn to_float(&self) -> Result<f64> {
        self.get_float("")
    }

    pub fn to_bool(&self) -> Result<bool> {
        self.get_bool("")
    }

    pub fn to_interface(&self) -> Result<Value> {
        self.get_interface("")
    }
}

/// Split `path` into its first unescaped-dot component and the remainder
/// (remainder excludes the separating dot).
fn split_first_component(path: &str) -> (String, String) {
    let mut head = String::new();
    let mut chars = path.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if c == '\\' && chars.peek().map(|&(_, c)| c) == Some('.') {
            head.push('.');
            chars.next();
        } else if c == '.' {
            let rest_start = idx + c.len_utf8();
            return (head, path[rest_start..].to_string());
        } else {
            head.push(c);
        }
    }
    (head, String::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexes_top_level_object() {
        let doc = br#"{"a": 1, "b": "two"}"#;
        let reader = Reader::new(doc).unwrap();
        assert_eq!(reader.ordered_keys(), &["a".to_string(), "b".to_string()]);
        assert_eq!(reader.get_int("a").unwrap(), 1);
        assert_eq!(reader.get_string("b").unwrap(), "two");
    }

    #[test]
    fn nested_access_via_get_collection() {
        let doc = br#"{"outer": {"inner": [10, 20]}}"#;
        let reader = Reader::new(doc).unwrap();
        let outer = reader.get_collection("outer").unwrap();
        let inner = outer.get_collection("inner").unwrap();
        assert_eq!(inner.get_int("1").unwrap(), 20);
    }

    #[test]
    fn multi_component_path_delegates_past_first_index() {
        let doc = br#"{"a": {"b": {"c": 7}}}"#;
        let reader = Reader::new(doc).unwrap();
        assert_eq!(reader.get_int("a.b.c").unwrap(), 7);
    }

    #[test]
    fn missing_key_is_an_error() {
        let doc = br#"{"a": 1}"#;
        let reader = Reader::new(doc).unwrap();
        assert!(reader.get("missing").is_err());
    }

    #[test]
    fn scalar_root_has_single_zero_key() {
        let reader = Reader::new(b"42").unwrap();
        assert_eq!(reader.ordered_keys(), &["0".to_string()]);
        assert_eq!(reader.to_int().unwrap(), 42);
    }
}
