//! The coercion layer: converting a recognized [`Span`] into the Rust value
//! a caller actually wants, permissively by default and strictly on
//! request.
//!
//! Conversions never touch the source buffer; owned results (an unescaped
//! string, a parsed number) are only allocated when the source bytes can't
//! be borrowed as-is.

use alloc::borrow::Cow;
use alloc::string::String;

use crate::error::{Error, Result};
use crate::lex::find_number;
use crate::span::{Kind, Span};

/// A coerced string: borrowed straight from the buffer when the source has
/// no escape sequences, owned when unescaping was necessary.
pub type CoercedStr<'b> = Cow<'b, str>;

/// Coerce `span` to a string per §4.3: strings borrow their interior
/// unless escaped, numbers and bools render their source text, and `null`
/// coerces to an empty string in permissive mode only.
///
/// # Errors
///
/// `Error::StrictStandards` if `strict` is `true` and `span.kind` is not
/// `String`. `Error::MalformedJson` if a string contains an invalid escape
/// or unterminated surrogate pair.
pub fn to_string<'b>(buffer: &'b [u8], span: &Span, strict: bool) -> Result<CoercedStr<'b>> {
    match span.kind {
        Kind::String => unescape(buffer, span),
        Kind::Int | Kind::Float | Kind::Bool if !strict => {
            let bytes = span.bytes(buffer);
            core::str::from_utf8(bytes)
                .map(Cow::Borrowed)
                .map_err(|_| Error::malformed(buffer, span.start))
        }
        Kind::Null if !strict => Ok(Cow::Borrowed("")),
        _ => Err(Error::StrictStandards {
            from: span.kind,
            to: "string",
            index: span.start,
        }),
    }
}

/// Resolve escape sequences in an object member's key span.
///
/// [`crate::extract::extract_object_member`] hands back a key span that
/// already points at the unquoted interior (so `Span::bytes` on it reads
/// the raw key text), unlike every other `String` span, whose range still
/// includes the surrounding quotes. Calling [`to_string`] on a key would
/// make [`Span::inner_bytes`] strip a second pair of bytes that isn't
/// there; use this instead.
///
/// # Errors
///
/// `Error::MalformedJson` for the same reasons as [`to_string`].
pub fn key_to_string<'b>(buffer: &'b [u8], key: &Span) -> Result<CoercedStr<'b>> {
    unescape_bytes(buffer, key, key.bytes(buffer))
}

/// Coerce `span` to an `i64` per §4.3: integers parse directly, floats
/// truncate toward zero in permissive mode, booleans become `0`/`1`, and
/// numeric strings are recursively unquoted and parsed.
///
/// # Errors
///
/// `Error::StrictStandards` if `strict` forbids the source kind.
/// `Error::MalformedJson` if the bytes don't parse as the claimed kind.
pub fn to_i64(buffer: &[u8], span: &Span, strict: bool) -> Result<i64> {
    match span.kind {
        Kind::Int => parse_int(buffer, span.start, span.end),
        Kind::Float if !strict => Ok(parse_float(buffer, span.start, span.end)? as i64),
        Kind::Bool if !strict => Ok(i64::from(parse_bool(buffer, span)?)),
        Kind::String if !strict => {
            let (inner_start, consumed, kind) = find_number(buffer, span.start);
            if kind == Kind::Invalid || consumed != span.end {
                return Err(Error::malformed(buffer, span.start));
            }
            match kind {
                Kind::Int => parse_int(buffer, inner_start, inner_consumed_end(buffer, span)),
                Kind::Float => {
                    Ok(parse_float(buffer, inner_start, inner_consumed_end(buffer, span))? as i64)
                }
                _ => Err(Error::malformed(buffer, span.start)),
            }
        }
        _ => Err(Error::StrictStandards {
            from: span.kind,
            to: "i64",
            index: span.start,
        }),
    }
}

/// Coerce `span` to an `f64` per §4.3, mirroring [`to_i64`]'s source-kind
/// acceptance but never truncating.
///
/// # Errors
///
/// Same conditions as [`to_i64`].
pub fn to_f64(buffer: &[u8], span: &Span, strict: bool) -> Result<f64> {
    match span.kind {
        Kind::Int | Kind::Float => parse_float(buffer, span.start, span.end),
        Kind::Bool if !strict => Ok(f64::from(parse_bool(buffer, span)?)),
        Kind::String if !strict => {
            let (inner_start, consumed, kind) = find_number(buffer, span.start);
            if kind == Kind::Invalid || consumed != span.end {
                return Err(Error::malformed(buffer, span.start));
            }
            parse_float(buffer, inner_start, inner_consumed_end(buffer, span))
        }
        _ => Err(Error::StrictStandards {
            from: span.kind,
            to: "f64",
            index: span.start,
        }),
    }
}

/// Coerce `span` to a `bool` per §4.3: `true`/`false` directly, numbers are
/// nonzero-is-true in permissive mode, and the strings `"true"`/`"false"`
/// (case-insensitive) are accepted in permissive mode.
///
/// # Errors
///
/// Same conditions as [`to_i64`].
pub fn to_bool(buffer: &[u8], span: &Span, strict: bool) -> Result<bool> {
    match span.kind {
        Kind::Bool => parse_bool(buffer, span),
        Kind::Int if !strict => Ok(parse_int(buffer, span.start, span.end)? != 0),
        Kind::Float if !strict => Ok(parse_float(buffer, span.start, span.end)? != 0.0),
        Kind::String if !strict => {
            let inner = span.inner_bytes(buffer);
            if inner.eq_ignore_ascii_case(b"true") {
                Ok(true)
            } else if inner.eq_ignore_ascii_case(b"false") {
                Ok(false)
            } else {
                Err(Error::malformed(buffer, span.start))
            }
        }
        _ => Err(Error::StrictStandards {
            from: span.kind,
            to: "bool",
            index: span.start,
        }),
    }
}

/// `true` if `span` is `Kind::Null`, or (permissively) an empty string.
#[must_use]
pub fn is_null(buffer: &[u8], span: &Span, strict: bool) -> bool {
    span.kind == Kind::Null || (!strict && span.kind == Kind::String && span.inner_bytes(buffer).is_empty())
}

fn parse_bool(buffer: &[u8], span: &Span) -> Result<bool> {
    let bytes = span.bytes(buffer);
    if bytes.eq_ignore_ascii_case(b"true") {
        Ok(true)
    } else if bytes.eq_ignore_ascii_case(b"false") {
        Ok(false)
    } else {
        Err(Error::malformed(buffer, span.start))
    }
}

fn parse_int(buffer: &[u8], start: usize, end: usize) -> Result<i64> {
    let text = core::str::from_utf8(&buffer[start..end]).map_err(|_| Error::malformed(buffer, start))?;
    text.parse::<i64>().map_err(|_| Error::malformed(buffer, start))
}

fn parse_float(buffer: &[u8], start: usize, end: usize) -> Result<f64> {
    let text = core::str::from_utf8(&buffer[start..end]).map_err(|_| Error::malformed(buffer, start))?;
    text.parse::<f64>().map_err(|_| Error::malformed(buffer, start))
}

/// A numeric string's consumed range may include a surrounding quote the
/// caller's span does not; this recovers the digit-only end for parsing.
fn inner_consumed_end(buffer: &[u8], span: &Span) -> usize {
    let inner = span.inner_bytes(buffer);
    span.start + 1 + inner.len()
}

/// Resolve the escape sequences in a quoted string span. Borrows the
/// interior bytes directly when there is no backslash to resolve;
/// otherwise builds an owned, unescaped `String`.
///
/// # Errors
///
/// `Error::MalformedJson` for an unrecognized escape, a truncated `\uXXXX`
/// sequence, a lone low surrogate, or a high surrogate not immediately
/// followed by a low surrogate.
fn unescape<'b>(buffer: &'b [u8], span: &Span) -> Result<CoercedStr<'b>> {
    debug_assert_eq!(span.kind, Kind::String);
    unescape_bytes(buffer, span, span.inner_bytes(buffer))
}

/// Resolve escape sequences in `inner`, already stripped of any surrounding
/// quotes. Shared by [`unescape`] (a normal `String` span) and
/// [`key_to_string`] (an object member's key span, whose bytes are unquoted
/// already — see [`crate::span::Member`]).
fn unescape_bytes<'b>(buffer: &'b [u8], span: &Span, inner: &'b [u8]) -> Result<CoercedStr<'b>> {
    if !inner.contains(&b'\\') {
        return core::str::from_utf8(inner)
            .map(Cow::Borrowed)
            .map_err(|_| Error::malformed(buffer, span.start));
    }

    let mut out = String::with_capacity(inner.len());
    let mut i = 0;
    while i < inner.len() {
        if inner[i] != b'\\' {
            let start = i;
            while i < inner.len() && inner[i] != b'\\' {
                i += 1;
            }
            let chunk = core::str::from_utf8(&inner[start..i])
                .map_err(|_| Error::malformed(buffer, span.start))?;
            out.push_str(chunk);
            continue;
        }

        let esc = *inner
            .get(i + 1)
            .ok_or_else(|| Error::malformed(buffer, span.start))?;
        match esc {
            b'"' => out.push('"'),
            b'\\' => out.push('\\'),
            b'/' => out.push('/'),
            b'b' => out.push('\u{8}'),
            b'f' => out.push('\u{c}'),
            b'n' => out.push('\n'),
            b'r' => out.push('\r'),
            b't' => out.push('\t'),
            b'u' => {
                let high = read_hex4(buffer, span, inner, i + 2)?;
                i += 6;
                if (0xD800..=0xDBFF).contains(&high) {
                    if inner.get(i) != Some(&b'\\') || inner.get(i + 1) != Some(&b'u') {
                        return Err(Error::malformed(buffer, span.start));
                    }
                    let low = read_hex4(buffer, span, inner, i + 2)?;
                    if !(0xDC00..=0xDFFF).contains(&low) {
                        return Err(Error::malformed(buffer, span.start));
                    }
                    i += 6;
                    let codepoint = ((high - 0xD800) * 0x400) + (low - 0xDC00) + 0x1_0000;
                    let ch = char::from_u32(codepoint)
                        .ok_or_else(|| Error::malformed(buffer, span.start))?;
                    out.push(ch);
                } else if (0xDC00..=0xDFFF).contains(&high) {
                    return Err(Error::malformed(buffer, span.start));
                } else {
                    let ch = char::from_u32(high).ok_or_else(|| Error::malformed(buffer, span.start))?;
                    out.push(ch);
                }
                continue;
            }
            _ => return Err(Error::malformed(buffer, span.start)),
        }
        i += 2;
    }

    Ok(Cow::Owned(out))
}

/// Read a `\uXXXX` escape's four hex digits starting at `inner[at]`.
fn read_hex4(buffer: &[u8], span: &Span, inner: &[u8], at: usize) -> Result<u32> {
    let digits = inner
        .get(at..at + 4)
        .ok_or_else(|| Error::malformed(buffer, span.start))?;
    let text = core::str::from_utf8(digits).map_err(|_| Error::malformed(buffer, span.start))?;
    u32::from_str_radix(text, 16).map_err(|_| Error::malformed(buffer, span.start))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_value;

    #[test]
    fn borrows_plain_string() {
        let doc = br#""hello""#;
        let (span, _) = extract_value(doc, 0).unwrap();
        let s = to_string(doc, &span, false).unwrap();
        assert!(matches!(s, Cow::Borrowed(_)));
        assert_eq!(s, "hello");
    }

    #[test]
    fn unescapes_basic_sequences() {
        let doc = br#""a\n\tb\"c""#;
        let (span, _) = extract_value(doc, 0).unwrap();
        let s = to_string(doc, &span, false).unwrap();
        assert_eq!(s, "a\n\tb\"c");
    }

    #[test]
    fn combines_surrogate_pair() {
        let doc = br#""😀""#;
        let (span, _) = extract_value(doc, 0).unwrap();
        let s = to_string(doc, &span, false).unwrap();
        assert_eq!(s, "\u{1F600}");
    }

    #[test]
    fn lone_low_surrogate_is_malformed() {
        let doc = br#""\udc00""#;
        let (span, _) = extract_value(doc, 0).unwrap();
        assert!(to_string(doc, &span, false).is_err());
    }

    #[test]
    fn strict_mode_rejects_number_to_string() {
        let doc = b"42";
        let (span, _) = extract_value(doc, 0).unwrap();
        assert!(to_string(doc, &span, true).is_err());
        assert_eq!(to_string(doc, &span, false).unwrap(), "42");
    }

    #[test]
    fn permissive_numeric_string_to_int() {
        let doc = br#""42""#;
        let (span, _) = extract_value(doc, 0).unwrap();
        assert_eq!(to_i64(doc, &span, false).unwrap(), 42);
    }

    #[test]
    fn float_truncates_to_int_permissively() {
        let doc = b"3.9";
        let (span, _) = extract_value(doc, 0).unwrap();
        assert_eq!(to_i64(doc, &span, false).unwrap(), 3);
        assert!(to_i64(doc, &span, true).is_err());
    }

    #[test]
    fn bool_from_nonzero_number() {
        let doc = b"0";
        let (span, _) = extract_value(doc, 0).unwrap();
        assert!(!to_bool(doc, &span, false).unwrap());
        let doc = b"7";
        let (span, _) = extract_value(doc, 0).unwrap();
        assert!(to_bool(doc, &span, false).unwrap());
    }

    #[test]
    fn key_to_string_does_not_double_strip_an_already_unquoted_key() {
        let doc = br#"{"name": 1}"#;
        let (_, key, _, _) = crate::extract::extract_object_member(doc, 1).unwrap();
        assert_eq!(key_to_string(doc, &key).unwrap(), "name");
    }

    #[test]
    fn key_to_string_resolves_escapes_in_an_unquoted_key() {
        let doc = br#"{"a\tb": 1}"#;
        let (_, key, _, _) = crate::extract::extract_object_member(doc, 1).unwrap();
        assert_eq!(key_to_string(doc, &key).unwrap(), "a\tb");
    }

    #[test]
    fn null_is_empty_string_permissively() {
        let doc = b"null";
        let (span, _) = extract_value(doc, 0).unwrap();
        assert!(is_null(doc, &span, false));
        assert_eq!(to_string(doc, &span, false).unwrap(), "");
        assert!(to_string(doc, &span, true).is_err());
    }
}
