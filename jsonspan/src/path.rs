//! Key-path resolution: walk a dotted path of object keys and array
//! indices against a root span, short-circuiting left to right.

use alloc::string::String;
use alloc::vec::Vec;

use crate::coerce::{self, CoercedStr};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::extract::{for_each_element, for_each_member};
use crate::lex::is_json_whitespace;
use crate::span::{Kind, Span};

/// Split a dotted path into its components, resolving the `\.` escape to a
/// literal dot within a component. An unescaped `.` separates components;
/// any other backslash sequence is passed through unchanged.
///
/// # Errors
///
/// `Error::PathTooDeep` if the path has more components than
/// `config.max_path_components`.
fn split_components(path: &str, config: &Config) -> Result<Vec<String>> {
    let mut components = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' {
            if chars.peek() == Some(&'.') {
                current.push('.');
                chars.next();
            } else {
                current.push('\\');
            }
        } else if c == '.' {
            components.push(core::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    components.push(current);

    if components.len() > config.max_path_components {
        return Err(Error::PathTooDeep {
            max: config.max_path_components,
        });
    }
    Ok(components)
}

/// Resolve `path` against `root` using [`Config::default`].
///
/// # Errors
///
/// See [`resolve_with_config`].
pub fn resolve(buffer: &[u8], root: &Span, path: &str) -> Result<Span> {
    resolve_with_config(buffer, root, path, &Config::default())
}

/// Resolve a dotted key path against `root`, descending into objects by key
/// and arrays by decimal index, left to right.
///
/// # Errors
///
/// `Error::PathTooDeep` if the path has too many components.
/// `Error::RequiresContainer` if a non-final component lands on a scalar.
/// `Error::KeyMissing` if an object lookup fails.
/// `Error::NoSuchIndex` if an array index is out of range or not numeric.
pub fn resolve_with_config(buffer: &[u8], root: &Span, path: &str, config: &Config) -> Result<Span> {
    let components = split_components(path, config)?;
    let mut current = *root;

    for component in &components {
        current = descend(buffer, &current, component)?;
    }
    Ok(current)
}

/// `true` if `path` resolves against `root` without error.
#[must_use]
pub fn key_exists(buffer: &[u8], root: &Span, path: &str) -> bool {
    key_exists_with_config(buffer, root, path, &Config::default())
}

/// `true` if `path` resolves against `root` without error, under `config`.
#[must_use]
pub fn key_exists_with_config(buffer: &[u8], root: &Span, path: &str, config: &Config) -> bool {
    resolve_with_config(buffer, root, path, config).is_ok()
}

/// Resolve `path` against `root` and coerce the result to a string, in one
/// call — the `extract_string` combinator named in §6.
///
/// # Errors
///
/// See [`resolve_with_config`] and [`coerce::to_string`].
pub fn extract_string<'b>(buffer: &'b [u8], root: &Span, path: &str, config: &Config) -> Result<CoercedStr<'b>> {
    let span = resolve_with_config(buffer, root, path, config)?;
    coerce::to_string(buffer, &span, config.strict)
}

/// `resolve_with_config` + [`coerce::to_i64`].
///
/// # Errors
///
/// See [`extract_string`].
pub fn extract_int(buffer: &[u8], root: &Span, path: &str, config: &Config) -> Result<i64> {
    let span = resolve_with_config(buffer, root, path, config)?;
    coerce::to_i64(buffer, &span, config.strict)
}

/// `resolve_with_config` + [`coerce::to_f64`].
///
/// # Errors
///
/// See [`extract_string`].
pub fn extract_float(buffer: &[u8], root: &Span, path: &str, config: &Config) -> Result<f64> {
    let span = resolve_with_config(buffer, root, path, config)?;
    coerce::to_f64(buffer, &span, config.strict)
}

/// `resolve_with_config` + [`coerce::to_bool`].
///
/// # Errors
///
/// See [`extract_string`].
pub fn extract_bool(buffer: &[u8], root: &Span, path: &str, config: &Config) -> Result<bool> {
    let span = resolve_with_config(buffer, root, path, config)?;
    coerce::to_bool(buffer, &span, config.strict)
}

fn descend(buffer: &[u8], current: &Span, component: &str) -> Result<Span> {
    match current.kind {
        Kind::Object => descend_object(buffer, current, component),
        Kind::Array => descend_array(buffer, current, component),
        _ => Err(Error::RequiresContainer {
            index: current.start,
            found: current.kind,
        }),
    }
}

fn descend_object(buffer: &[u8], object: &Span, key: &str) -> Result<Span> {
    let mut found: Option<Span> = None;
    for_each_member(buffer, object, |member, _consumed| {
        if bytes_match_trimmed(member.key.bytes(buffer), key.as_bytes()) {
            found = Some(member.value);
            return Ok(false);
        }
        Ok(true)
    })?;
    found.ok_or_else(|| Error::key_missing(buffer, object.start))
}

fn descend_array(buffer: &[u8], array: &Span, component: &str) -> Result<Span> {
    let index: usize = component
        .parse()
        .map_err(|_| Error::no_such_index(buffer, array.start))?;

    let mut found: Option<Span> = None;
    let mut i = 0usize;
    for_each_element(buffer, array, |value, _consumed| {
        if i == index {
            found = Some(value);
            return Ok(false);
        }
        i += 1;
        Ok(true)
    })?;
    found.ok_or_else(|| Error::no_such_index(buffer, array.start))
}

fn bytes_match_trimmed(a: &[u8], b: &[u8]) -> bool {
    trim_ws(a) == trim_ws(b)
}

fn trim_ws(bytes: &[u8]) -> &[u8] {
    let mut start = 0;
    let mut end = bytes.len();
    while start < end && is_json_whitespace(bytes[start]) {
        start += 1;
    }
    while end > start && is_json_whitespace(bytes[end - 1]) {
        end -= 1;
    }
    &bytes[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_value;

    #[test]
    fn descends_object_then_array() {
        let doc = br#"{"a": {"b": [10, 20, 30]}}"#;
        let (root, _) = extract_value(doc, 0).unwrap();
        let span = resolve(doc, &root, "a.b.1").unwrap();
        assert_eq!(span.bytes(doc), b"20");
    }

    #[test]
    fn escaped_dot_is_literal_key_component() {
        let doc = br#"{"a.b": 5}"#;
        let (root, _) = extract_value(doc, 0).unwrap();
        let span = resolve(doc, &root, r"a\.b").unwrap();
        assert_eq!(span.bytes(doc), b"5");
    }

    #[test]
    fn missing_key_errors() {
        let doc = br#"{"a": 1}"#;
        let (root, _) = extract_value(doc, 0).unwrap();
        assert!(resolve(doc, &root, "missing").is_err());
        assert!(!key_exists(doc, &root, "missing"));
    }

    #[test]
    fn scalar_with_remaining_path_requires_container() {
        let doc = br#"{"a": 1}"#;
        let (root, _) = extract_value(doc, 0).unwrap();
        assert!(resolve(doc, &root, "a.b").is_err());
    }

    #[test]
    fn array_index_out_of_range_is_no_such_index() {
        let doc = b"[1,2,3]";
        let (root, _) = extract_value(doc, 0).unwrap();
        assert!(resolve(doc, &root, "5").is_err());
    }

    #[test]
    fn extract_combinators_resolve_and_coerce_in_one_call() {
        let doc = br#"{"a": {"count": "19", "active": true}}"#;
        let (root, _) = extract_value(doc, 0).unwrap();
        let config = Config::default();
        assert_eq!(extract_int(doc, &root, "a.count", &config).unwrap(), 19);
        assert_eq!(extract_string(doc, &root, "a.count", &config).unwrap(), "19");
        assert!(extract_bool(doc, &root, "a.active", &config).unwrap());
    }

    #[test]
    fn too_many_components_is_path_too_deep() {
        let doc = b"{}";
        let (root, _) = extract_value(doc, 0).unwrap();
        let config = Config {
            max_path_components: 2,
            ..Config::default()
        };
        let err = resolve_with_config(doc, &root, "a.b.c", &config).unwrap_err();
        assert!(matches!(err, Error::PathTooDeep { max: 2 }));
    }
}
