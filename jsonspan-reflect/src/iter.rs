//! A forward iterator over an array or object's top-level elements, with a
//! memoized positions table so that `index(n)` and repeated `reset`/`next`
//! passes over already-visited elements are O(1) rather than re-scanning
//! from the start.

use jsonspan::{extract_object_member, extract_value, find_terminator, skip_ws, Kind, Span};

use crate::error::{Error, Result};

/// Iterates the members of an array or object span, yielding each
/// element's value span (keys, for an object, are discarded — use
/// [`crate::reader::Reader`] when keys matter).
pub struct Iter<'b> {
    buffer: &'b [u8],
    is_object: bool,
    memo: Vec<Span>,
    memo_complete: bool,
    scan_cursor: usize,
    current: usize,
}

impl<'b> Iter<'b> {
    /// Construct an iterator over the whole of `buffer`, which must parse
    /// to an array or object at the top level.
    ///
    /// # Errors
    ///
    /// `Error::UnsupportedContainer` if the top-level value is a scalar.
    /// Propagates any `jsonspan` extraction error otherwise.
    pub fn new(buffer: &'b [u8]) -> Result<Self> {
        let (span, _) = extract_value(buffer, 0)?;
        Self::over(buffer, &span)
    }

    /// Construct an iterator over a previously extracted container span.
    ///
    /// # Errors
    ///
    /// `Error::UnsupportedContainer` if `span` is not `Array`/`Object`.
    pub fn over(buffer: &'b [u8], span: &Span) -> Result<Self> {
        let is_object = match span.kind {
            Kind::Object => true,
            Kind::Array => false,
            _ => {
                return Err(Error::UnsupportedContainer {
                    shape: "iterator requires an array or object",
                })
            }
        };
        Ok(Iter {
            buffer,
            is_object,
            memo: Vec::new(),
            memo_complete: false,
            scan_cursor: span.start + 1,
            current: 0,
        })
    }

    fn close_byte(&self) -> u8 {
        if self.is_object {
            b'}'
        } else {
            b']'
        }
    }

    fn scan_one(&mut self) -> Result<()> {
        let close = self.close_byte();
        let i = skip_ws(self.buffer, self.scan_cursor);
        if self.buffer.get(i) == Some(&close) {
            self.memo_complete = true;
            return Ok(());
        }

        let consumed = if self.is_object {
            let (value, _key, _kind, consumed) = extract_object_member(self.buffer, self.scan_cursor)?;
            self.memo.push(value);
            consumed
        } else {
            let (value, consumed) = extract_value(self.buffer, self.scan_cursor)?;
            self.memo.push(value);
            consumed
        };

        let next_pos = find_terminator(self.buffer, consumed)?;
        if self.buffer[next_pos - 1] == close {
            self.memo_complete = true;
        }
        self.scan_cursor = next_pos;
        Ok(())
    }

    fn ensure_index(&mut self, n: usize) -> Result<()> {
        while self.memo.len() <= n && !self.memo_complete {
            self.scan_one()?;
        }
        Ok(())
    }

    /// Advance and return the next element, or `Error::EndOfInput` once
    /// exhausted.
    ///
    /// # Errors
    ///
    /// `Error::EndOfInput` when no element remains. Propagates malformed
    /// container errors otherwise.
    pub fn next(&mut self) -> Result<Span> {
        self.ensure_index(self.current)?;
        let value = self.memo.get(self.current).copied().ok_or(Error::EndOfInput)?;
        self.current += 1;
        Ok(value)
    }

    /// Random-access the `n`th element (zero-based), scanning forward only
    /// as far as needed and memoizing the result for later revisits.
    ///
    /// # Errors
    ///
    /// `Error::EndOfInput` if the container has fewer than `n + 1`
    /// elements.
    pub fn index(&mut self, n: usize) -> Result<Span> {
        self.ensure_index(n)?;
        self.memo.get(n).copied().ok_or(Error::EndOfInput)
    }

    /// Scan to the end of the container and return its final element.
    ///
    /// # Errors
    ///
    /// `Error::EndOfInput` if the container is empty.
    pub fn last(&mut self) -> Result<Span> {
        while !self.memo_complete {
            self.scan_one()?;
        }
        self.memo.last().copied().ok_or(Error::EndOfInput)
    }

    /// Rewind `next()` to the first element without discarding the memo
    /// built so far.
    pub fn reset(&mut self) {
        self.current = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iterates_array_elements_in_order() {
        let doc = b"[1, 2, 3]";
        let mut it = Iter::new(doc).unwrap();
        assert_eq!(it.next().unwrap().bytes(doc), b"1");
        assert_eq!(it.next().unwrap().bytes(doc), b"2");
        assert_eq!(it.next().unwrap().bytes(doc), b"3");
        assert!(matches!(it.next(), Err(Error::EndOfInput)));
    }

    #[test]
    fn index_is_memoized_and_random_access() {
        let doc = b"[10, 20, 30, 40]";
        let mut it = Iter::new(doc).unwrap();
        assert_eq!(it.index(2).unwrap().bytes(doc), b"30");
        assert_eq!(it.index(0).unwrap().bytes(doc), b"10");
        assert_eq!(it.index(3).unwrap().bytes(doc), b"40");
        assert!(it.index(4).is_err());
    }

    #[test]
    fn reset_replays_from_the_beginning() {
        let doc = b"[1, 2]";
        let mut it = Iter::new(doc).unwrap();
        it.next().unwrap();
        it.next().unwrap();
        it.reset();
        assert_eq!(it.next().unwrap().bytes(doc), b"1");
    }

    #[test]
    fn last_on_empty_array_is_end_of_input() {
        let mut it = Iter::new(b"[]").unwrap();
        assert!(matches!(it.last(), Err(Error::EndOfInput)));
    }

    #[test]
    fn object_iteration_yields_values_only() {
        let doc = br#"{"a": 1, "b": 2}"#;
        let mut it = Iter::new(doc).unwrap();
        assert_eq!(it.next().unwrap().bytes(doc), b"1");
        assert_eq!(it.next().unwrap().bytes(doc), b"2");
    }

    #[test]
    fn scalar_top_level_is_unsupported() {
        assert!(matches!(
            Iter::new(b"42"),
            Err(Error::UnsupportedContainer { .. })
        ));
    }
}
