//! Lexical recognizers: pure, allocation-free predicates and locators over a byte span.
//!
//! Nothing in this module reads past the bytes it needs, and nothing
//! allocates. `classify` is the entry point every other component calls
//! before deciding how to dispatch.

use crate::span::Kind;

/// `true` for the whitespace bytes this engine accepts before a token:
/// space, tab, newline, carriage return, and form feed (RFC 8259 allows the
/// first four; form feed is this engine's one intentional relaxation on the
/// leading-whitespace set).
#[must_use]
pub fn is_json_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0c)
}

/// Returns the index of the first non-whitespace byte at or after `start`,
/// or `buffer.len()` if the buffer is exhausted.
#[must_use]
pub fn skip_ws(buffer: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < buffer.len() && is_json_whitespace(buffer[i]) {
        i += 1;
    }
    i
}

/// Classify the JSON value starting at `offset`, after skipping leading
/// whitespace. Returns `Kind::Invalid` if `offset` is at or past the end of
/// the buffer, or the first non-whitespace byte does not begin a
/// recognizable token.
#[must_use]
pub fn classify(buffer: &[u8], offset: usize) -> Kind {
    let i = skip_ws(buffer, offset);
    let Some(&b) = buffer.get(i) else {
        return Kind::Invalid;
    };
    match b {
        b'{' => Kind::Object,
        b'[' => Kind::Array,
        b'"' => Kind::String,
        b'-' | b'0'..=b'9' => scan_number(buffer, i).1,
        b't' | b'T' => {
            if matches_ci(buffer, i, b"true") {
                Kind::Bool
            } else {
                Kind::Invalid
            }
        }
        b'f' | b'F' => {
            if matches_ci(buffer, i, b"false") {
                Kind::Bool
            } else {
                Kind::Invalid
            }
        }
        b'n' | b'N' => {
            if matches_ci(buffer, i, b"null") {
                Kind::Null
            } else {
                Kind::Invalid
            }
        }
        _ => Kind::Invalid,
    }
}

/// Case-insensitive match of `literal` at `buffer[start..]`.
#[must_use]
pub fn matches_ci(buffer: &[u8], start: usize, literal: &[u8]) -> bool {
    if start + literal.len() > buffer.len() {
        return false;
    }
    buffer[start..start + literal.len()]
        .iter()
        .zip(literal)
        .all(|(&b, &l)| b.to_ascii_lowercase() == l.to_ascii_lowercase())
}

#[must_use]
pub fn is_literal_true(buffer: &[u8], start: usize) -> bool {
    matches_ci(buffer, start, b"true")
}

#[must_use]
pub fn is_literal_false(buffer: &[u8], start: usize) -> bool {
    matches_ci(buffer, start, b"false")
}

#[must_use]
pub fn is_literal_null(buffer: &[u8], start: usize) -> bool {
    matches_ci(buffer, start, b"null")
}

/// Bytes that may legally follow a number token: the stopping set from
/// §4.1 plus end-of-buffer.
fn is_number_stop(b: u8) -> bool {
    matches!(b, b'"' | b',' | b']' | b'}') || is_json_whitespace(b)
}

/// Scan a number token starting exactly at `start` (no leading whitespace,
/// no opening quote). Returns the exclusive end offset and `Int`/`Float`, or
/// `Invalid` with `start` as the end if no valid number begins there.
///
/// Grammar: `-?` then either the single digit `0`, or a leading `1-9`
/// followed by any digits, an optional `.` followed by at least one digit,
/// and an optional `[eE][+-]?` followed by at least one digit. A leading `0`
/// immediately followed by another digit is invalid, as is a second `.`, a
/// second exponent marker, or any trailing byte outside the stopping set.
#[must_use]
pub fn scan_number(buffer: &[u8], start: usize) -> (usize, Kind) {
    let len = buffer.len();
    let mut i = start;

    if i < len && buffer[i] == b'-' {
        i += 1;
    }
    if i >= len || !buffer[i].is_ascii_digit() {
        return (start, Kind::Invalid);
    }

    if buffer[i] == b'0' {
        i += 1;
        if i < len && buffer[i].is_ascii_digit() {
            // leading zero followed by another digit: "00" is invalid
            return (start, Kind::Invalid);
        }
    } else {
        while i < len && buffer[i].is_ascii_digit() {
            i += 1;
        }
    }

    let mut kind = Kind::Int;

    if i < len && buffer[i] == b'.' {
        i += 1;
        if i >= len || !buffer[i].is_ascii_digit() {
            // "0." with no digit after the decimal point is invalid
            return (start, Kind::Invalid);
        }
        while i < len && buffer[i].is_ascii_digit() {
            i += 1;
        }
        kind = Kind::Float;
        if i < len && buffer[i] == b'.' {
            // a second decimal point invalidates the token
            return (start, Kind::Invalid);
        }
    }

    if i < len && (buffer[i] == b'e' || buffer[i] == b'E') {
        i += 1;
        if i < len && (buffer[i] == b'+' || buffer[i] == b'-') {
            i += 1;
        }
        if i >= len || !buffer[i].is_ascii_digit() {
            return (start, Kind::Invalid);
        }
        while i < len && buffer[i].is_ascii_digit() {
            i += 1;
        }
        kind = Kind::Float;
        if i < len && (buffer[i] == b'e' || buffer[i] == b'E') {
            // a second exponent marker invalidates the token
            return (start, Kind::Invalid);
        }
    }

    if i < len && !is_number_stop(buffer[i]) {
        // trailing garbage immediately after an otherwise well-formed number
        return (start, Kind::Invalid);
    }

    (i, kind)
}

/// Locate a number token that may be wrapped in whitespace and/or a
/// surrounding quote (the quoted form arises when the coercion layer
/// recurses into a numeric-looking string, per §4.3's "unquote then
/// recurse"). Returns `(inner_start, consumed_end, kind)`: `inner_start` is
/// where the digits begin, `consumed_end` is just past the closing quote if
/// one was opened.
#[must_use]
pub fn find_number(buffer: &[u8], start: usize) -> (usize, usize, Kind) {
    let mut i = skip_ws(buffer, start);
    let quoted = buffer.get(i) == Some(&b'"');
    if quoted {
        i += 1;
    }
    let inner_start = i;
    let (end, kind) = scan_number(buffer, i);
    if kind == Kind::Invalid {
        return (inner_start, start, Kind::Invalid);
    }
    if quoted {
        if buffer.get(end) == Some(&b'"') {
            return (inner_start, end + 1, kind);
        }
        return (inner_start, start, Kind::Invalid);
    }
    (inner_start, end, kind)
}

/// Return `span` with leading and trailing whitespace bytes removed.
#[must_use]
pub fn trim(buffer: &[u8], mut start: usize, mut end: usize) -> (usize, usize) {
    while start < end && is_json_whitespace(buffer[start]) {
        start += 1;
    }
    while end > start && is_json_whitespace(buffer[end - 1]) {
        end -= 1;
    }
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_basic_tokens() {
        assert_eq!(classify(b"{\"a\":1}", 0), Kind::Object);
        assert_eq!(classify(b"[1,2]", 0), Kind::Array);
        assert_eq!(classify(b"\"hi\"", 0), Kind::String);
        assert_eq!(classify(b"true", 0), Kind::Bool);
        assert_eq!(classify(b"TRUE", 0), Kind::Bool);
        assert_eq!(classify(b"NuLl", 0), Kind::Null);
        assert_eq!(classify(b"False", 0), Kind::Bool);
        assert_eq!(classify(b"0", 0), Kind::Int);
        assert_eq!(classify(b"-3.5e10", 0), Kind::Float);
        assert_eq!(classify(b"", 0), Kind::Invalid);
        assert_eq!(classify(b"  \t\n", 0), Kind::Invalid);
    }

    #[test]
    fn leading_zero_rules() {
        assert_eq!(scan_number(b"0", 0).1, Kind::Int);
        assert_eq!(scan_number(b"00", 0).1, Kind::Invalid);
        assert_eq!(scan_number(b"0.5", 0).1, Kind::Float);
        assert_eq!(scan_number(b"0.", 0).1, Kind::Invalid);
        assert_eq!(scan_number(b"1.2.3", 0).1, Kind::Invalid);
        assert_eq!(scan_number(b"1e2e3", 0).1, Kind::Invalid);
    }

    #[test]
    fn form_feed_is_whitespace() {
        assert!(is_json_whitespace(0x0c));
        assert_eq!(skip_ws(b"\x0c1", 0), 1);
    }
}
