//! The value kinds, byte spans, and object members the rest of the crate is built on.

/// The JSON type classification of a [`Span`].
///
/// `Int` and `Float` are distinguished by the presence of a decimal point or
/// exponent marker in the source text, not by the parsed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    String,
    Int,
    Float,
    Bool,
    Null,
    Array,
    Object,
    /// Not a recognizable JSON token at this position.
    Invalid,
}

impl Kind {
    /// `true` for `Array` and `Object`.
    #[must_use]
    pub fn is_container(self) -> bool {
        matches!(self, Kind::Array | Kind::Object)
    }

    /// `true` for `Int` and `Float`.
    #[must_use]
    pub fn is_number(self) -> bool {
        matches!(self, Kind::Int | Kind::Float)
    }
}

impl core::fmt::Display for Kind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Kind::String => "string",
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::Bool => "bool",
            Kind::Null => "null",
            Kind::Array => "array",
            Kind::Object => "object",
            Kind::Invalid => "invalid",
        };
        f.write_str(name)
    }
}

/// A half-open byte range `[start, end)` into a caller-owned buffer, tagged with its [`Kind`].
///
/// For `String` the range includes the surrounding quotes. For `Array`/`Object`
/// the range includes the outer brackets. For literals and numbers the range
/// covers exactly the token. A `Span` never owns bytes; it is only meaningful
/// relative to the buffer it was produced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub kind: Kind,
}

impl Span {
    #[must_use]
    pub fn new(start: usize, end: usize, kind: Kind) -> Self {
        debug_assert!(start <= end, "span start must not exceed end");
        Span { start, end, kind }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Borrow the raw bytes this span covers in `buffer`.
    ///
    /// # Panics
    ///
    /// Panics if the span does not fit within `buffer` — callers that cannot
    /// guarantee the span originated from `buffer` should check bounds first.
    #[must_use]
    pub fn bytes<'b>(&self, buffer: &'b [u8]) -> &'b [u8] {
        &buffer[self.start..self.end]
    }

    /// For `String` spans, the interior bytes with the surrounding quotes
    /// stripped. For any other kind this is identical to [`Span::bytes`].
    #[must_use]
    pub fn inner_bytes<'b>(&self, buffer: &'b [u8]) -> &'b [u8] {
        if self.kind == Kind::String && self.len() >= 2 {
            &buffer[self.start + 1..self.end - 1]
        } else {
            self.bytes(buffer)
        }
    }
}

/// An object member: a key span (pointing at the *unquoted interior* of the
/// key, never the surrounding quotes) paired with the member's value span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Member {
    pub key: Span,
    pub value: Span,
}
