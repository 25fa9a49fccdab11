//! Error types for the scanning, extraction and coercion layers.
//!
//! Every variant carries the byte index at which the problem was observed
//! plus a bounded preview of the offending bytes, per the "short
//! machine-readable kind and a human string... a bounded (≤50 bytes) slice"
//! contract. `KeyMissing` and `NoSuchIndex` are non-fatal at the lookup
//! level: callers that want to probe without erroring use `key_exists`.

use crate::span::Kind;

/// Convenient alias for results produced by this crate.
pub type Result<T> = core::result::Result<T, Error>;

const PREVIEW_CAP: usize = 50;

/// A bounded, allocation-free preview of buffer bytes for error messages.
#[derive(Debug, Clone, Copy)]
pub struct Preview {
    bytes: [u8; PREVIEW_CAP],
    len: u8,
}

impl Preview {
    #[must_use]
    pub fn capture(buffer: &[u8], start: usize) -> Self {
        let start = start.min(buffer.len());
        let end = (start + PREVIEW_CAP).min(buffer.len());
        let slice = &buffer[start..end];
        let mut bytes = [0u8; PREVIEW_CAP];
        bytes[..slice.len()].copy_from_slice(slice);
        Preview {
            bytes,
            #[allow(clippy::cast_possible_truncation)]
            len: slice.len() as u8,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }
}

impl core::fmt::Display for Preview {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for &b in self.as_bytes() {
            if b == b' ' || b.is_ascii_graphic() {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

/// Errors raised by the recognizer, extractor, coercion, and key-path layers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `classify` yielded `Invalid`, a container's brackets didn't balance,
    /// or a required terminator was missing.
    #[error("malformed JSON at byte {index}: \"{preview}\"")]
    MalformedJson { index: usize, preview: Preview },

    /// A key-path component did not match any object key or array index.
    #[error("key missing at byte {index}: \"{preview}\"")]
    KeyMissing { index: usize, preview: Preview },

    /// An array index component was out of range or not a valid non-negative
    /// decimal integer against an array.
    #[error("no such index at byte {index}: \"{preview}\"")]
    NoSuchIndex { index: usize, preview: Preview },

    /// A key-path component was resolved against a non-container value.
    #[error("path requires a container at byte {index}, found {found}")]
    RequiresContainer { index: usize, found: Kind },

    /// Strict mode rejected a kind conversion that permissive mode would
    /// have coerced.
    #[error("strict mode: cannot convert {from} to {to} at byte {index}")]
    StrictStandards {
        from: Kind,
        to: &'static str,
        index: usize,
    },

    /// A dotted key path exceeded the configured maximum component count.
    #[error("key path exceeds the maximum of {max} components")]
    PathTooDeep { max: usize },
}

impl Error {
    #[must_use]
    pub(crate) fn malformed(buffer: &[u8], index: usize) -> Self {
        Error::MalformedJson {
            index,
            preview: Preview::capture(buffer, index),
        }
    }

    #[must_use]
    pub(crate) fn key_missing(buffer: &[u8], index: usize) -> Self {
        Error::KeyMissing {
            index,
            preview: Preview::capture(buffer, index),
        }
    }

    #[must_use]
    pub(crate) fn no_such_index(buffer: &[u8], index: usize) -> Self {
        Error::NoSuchIndex {
            index,
            preview: Preview::capture(buffer, index),
        }
    }
}
