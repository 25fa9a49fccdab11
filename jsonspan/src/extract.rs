//! The span extractor: given a buffer and offset, bound the next value, the
//! next object member, and the terminator that follows — without
//! materializing anything the caller didn't ask for.

use crate::error::{Error, Result};
use crate::lex::{matches_ci, scan_number, skip_ws};
use crate::span::{Kind, Member, Span};

/// State for the bracket-matching container scan. Only in `Outside` do
/// `{`/`[`/`}`/`]` bytes adjust the depth counter; a backslash in
/// `InString` unconditionally escapes the next byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Outside,
    InString,
    InStringEscape,
}

/// Extract the next JSON value starting at `start`, skipping leading
/// whitespace. Returns the value's span and the exclusive end offset (the
/// two agree for everything but whitespace-prefixed tokens, where `start`
/// moves forward and `end` is `span.end`).
///
/// # Errors
///
/// `Error::MalformedJson` if no recognizable token begins at `start`, a
/// container's brackets never balance, or a string is never terminated.
pub fn extract_value(buffer: &[u8], start: usize) -> Result<(Span, usize)> {
    let i = skip_ws(buffer, start);
    let Some(&b) = buffer.get(i) else {
        return Err(Error::malformed(buffer, start));
    };

    match b {
        b'{' | b'[' => {
            let (end, kind) = scan_container(buffer, i)?;
            Ok((Span::new(i, end, kind), end))
        }
        b'"' => {
            let end = scan_string(buffer, i)?;
            Ok((Span::new(i, end, Kind::String), end))
        }
        b'-' | b'0'..=b'9' => {
            let (end, kind) = scan_number(buffer, i);
            if kind == Kind::Invalid {
                return Err(Error::malformed(buffer, i));
            }
            Ok((Span::new(i, end, kind), end))
        }
        b't' | b'T' if matches_ci(buffer, i, b"true") => {
            Ok((Span::new(i, i + 4, Kind::Bool), i + 4))
        }
        b'f' | b'F' if matches_ci(buffer, i, b"false") => {
            Ok((Span::new(i, i + 5, Kind::Bool), i + 5))
        }
        b'n' | b'N' if matches_ci(buffer, i, b"null") => {
            Ok((Span::new(i, i + 4, Kind::Null), i + 4))
        }
        _ => Err(Error::malformed(buffer, i)),
    }
}

/// Scan a quoted string starting exactly at the opening quote. Returns the
/// exclusive end offset (just past the closing quote). Escape sequences are
/// not resolved; a backslash only protects the next byte from being
/// mistaken for the closing quote.
fn scan_string(buffer: &[u8], start: usize) -> Result<usize> {
    let len = buffer.len();
    let mut i = start + 1;
    loop {
        match buffer.get(i) {
            None => return Err(Error::malformed(buffer, start)),
            Some(b'\\') => {
                if i + 1 >= len {
                    return Err(Error::malformed(buffer, start));
                }
                i += 2;
            }
            Some(b'"') => return Ok(i + 1),
            Some(_) => i += 1,
        }
    }
}

/// Bracket-match a container (`{...}` or `[...]`) starting exactly at the
/// opening bracket, entering a string-scanning sub-state so that bracket
/// bytes embedded in strings don't perturb the depth counter.
fn scan_container(buffer: &[u8], start: usize) -> Result<(usize, Kind)> {
    let kind = if buffer[start] == b'{' {
        Kind::Object
    } else {
        Kind::Array
    };
    let mut depth: i64 = 1;
    let mut state = ScanState::Outside;
    let mut i = start + 1;
    let len = buffer.len();

    while i < len {
        let b = buffer[i];
        match state {
            ScanState::Outside => match b {
                b'"' => state = ScanState::InString,
                b'{' | b'[' => depth += 1,
                b'}' | b']' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok((i + 1, kind));
                    }
                }
                _ => {}
            },
            ScanState::InString => match b {
                b'\\' => state = ScanState::InStringEscape,
                b'"' => state = ScanState::Outside,
                _ => {}
            },
            ScanState::InStringEscape => state = ScanState::InString,
        }
        i += 1;
    }

    Err(Error::malformed(buffer, start))
}

/// Extract the next object member starting at `start`: a quoted key, a `:`
/// separator (permissive surrounding whitespace), and a value.
///
/// Returns `(value_span, key_span, value_kind, consumed_end)`. `key_span`
/// points at the *unquoted interior* of the key.
///
/// # Errors
///
/// `Error::MalformedJson` if `start` is not positioned at a quoted key, or
/// the `:` separator is missing.
pub fn extract_object_member(buffer: &[u8], start: usize) -> Result<(Span, Span, Kind, usize)> {
    let i = skip_ws(buffer, start);
    if buffer.get(i) != Some(&b'"') {
        return Err(Error::malformed(buffer, i));
    }
    let key_end = scan_string(buffer, i)?;
    let key_span = Span::new(i + 1, key_end - 1, Kind::String);

    let j = skip_ws(buffer, key_end);
    if buffer.get(j) != Some(&b':') {
        return Err(Error::malformed(buffer, j));
    }

    let (value_span, consumed) = extract_value(buffer, j + 1)?;
    Ok((value_span, key_span, value_span.kind, consumed))
}

/// Find the terminator following a container member: skip whitespace, then
/// require `,`, `]`, or `}`. Returns the position just past the terminator;
/// `buffer[result - 1]` reveals which terminator byte was found.
///
/// # Errors
///
/// `Error::MalformedJson` if the next non-whitespace byte is not a
/// terminator.
pub fn find_terminator(buffer: &[u8], pos: usize) -> Result<usize> {
    let i = skip_ws(buffer, pos);
    match buffer.get(i) {
        Some(b',' | b']' | b'}') => Ok(i + 1),
        _ => Err(Error::malformed(buffer, i)),
    }
}

/// Walk a container span once to count its members. Returns `-1` for
/// `Null`, `0` for an empty container, and `1` for a scalar not inside a
/// container — the pre-sizing hint the materializer uses for contiguous
/// sequence allocation.
///
/// # Errors
///
/// `Error::MalformedJson` if the container is not well-formed.
pub fn count_members(buffer: &[u8], span: &Span) -> Result<i64> {
    match span.kind {
        Kind::Null => Ok(-1),
        Kind::Object => count_container_members(buffer, span, true),
        Kind::Array => count_container_members(buffer, span, false),
        _ => Ok(1),
    }
}

fn count_container_members(buffer: &[u8], span: &Span, is_object: bool) -> Result<i64> {
    let close = if is_object { b'}' } else { b']' };
    let mut pos = span.start + 1;

    let first = skip_ws(buffer, pos);
    if buffer.get(first) == Some(&close) {
        return Ok(0);
    }

    let mut count: i64 = 0;
    loop {
        let consumed = if is_object {
            extract_object_member(buffer, pos)?.3
        } else {
            extract_value(buffer, pos)?.1
        };
        count += 1;

        let next = find_terminator(buffer, consumed)?;
        if buffer[next - 1] == close {
            return Ok(count);
        }
        pos = next;
    }
}

/// Iterate the members of an object span, calling `f` with each
/// `(Member, consumed_end)` until the object closes, or `f` returns
/// `Ok(false)`. Used by the key-path resolver and by `jsonspan-reflect`'s
/// materializer; stops and propagates on the first error.
pub fn for_each_member(
    buffer: &[u8],
    span: &Span,
    mut f: impl FnMut(Member, usize) -> Result<bool>,
) -> Result<()> {
    debug_assert_eq!(span.kind, Kind::Object);
    let mut pos = span.start + 1;
    let first = skip_ws(buffer, pos);
    if buffer.get(first) == Some(&b'}') {
        return Ok(());
    }
    loop {
        let (value, key, _kind, consumed) = extract_object_member(buffer, pos)?;
        let keep_going = f(Member { key, value }, consumed)?;
        let next = find_terminator(buffer, consumed)?;
        let closed = buffer[next - 1] == b'}';
        if !keep_going || closed {
            return Ok(());
        }
        pos = next;
    }
}

/// Iterate the elements of an array span, calling `f` with each
/// `(Span, consumed_end)` until the array closes, or `f` returns
/// `Ok(false)`.
pub fn for_each_element(
    buffer: &[u8],
    span: &Span,
    mut f: impl FnMut(Span, usize) -> Result<bool>,
) -> Result<()> {
    debug_assert_eq!(span.kind, Kind::Array);
    let mut pos = span.start + 1;
    let first = skip_ws(buffer, pos);
    if buffer.get(first) == Some(&b']') {
        return Ok(());
    }
    loop {
        let (value, consumed) = extract_value(buffer, pos)?;
        let keep_going = f(value, consumed)?;
        let next = find_terminator(buffer, consumed)?;
        let closed = buffer[next - 1] == b']';
        if !keep_going || closed {
            return Ok(());
        }
        pos = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_scalar() {
        let (span, consumed) = extract_value(b"  42, ", 0).unwrap();
        assert_eq!(span.kind, Kind::Int);
        assert_eq!(&b"  42, "[span.start..span.end], b"42");
        assert_eq!(consumed, 4);
    }

    #[test]
    fn extracts_nested_container_with_string_brackets() {
        let doc = br#"{"a": "[{}]", "b": 2}"#;
        let (span, _) = extract_value(doc, 0).unwrap();
        assert_eq!(span.kind, Kind::Object);
        assert_eq!(span.start, 0);
        assert_eq!(span.end, doc.len());
    }

    #[test]
    fn missing_terminator_is_malformed() {
        let doc = br#"{"a": 1"#;
        assert!(extract_value(doc, 0).is_err());
    }

    #[test]
    fn empty_containers_count_zero() {
        let (span, _) = extract_value(b"{}", 0).unwrap();
        assert_eq!(count_members(b"{}", &span).unwrap(), 0);
        let (span, _) = extract_value(b"[]", 0).unwrap();
        assert_eq!(count_members(b"[]", &span).unwrap(), 0);
    }

    #[test]
    fn trailing_comma_is_malformed() {
        let doc = br#"[1, 2, ]"#;
        let (span, _) = extract_value(doc, 0).unwrap();
        assert!(count_members(doc, &span).is_err());
    }

    #[test]
    fn object_member_key_is_unquoted() {
        let (value, key, kind, _) = extract_object_member(br#""a": 1"#, 0).unwrap();
        assert_eq!(kind, Kind::Int);
        assert_eq!(key.bytes(br#""a": 1"#), b"a");
        assert_eq!(value.bytes(br#""a": 1"#), b"1");
    }
}
