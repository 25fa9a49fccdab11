//! Errors surfaced by the reader, iterator, and materializer, layered over
//! [`jsonspan::Error`].

use jsonspan::Kind;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised above the core scanning/coercion layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Any error from the core scanning, extraction, coercion, or key-path layer.
    #[error(transparent)]
    Core(#[from] jsonspan::Error),

    /// An iterator's `next` was called after it was exhausted.
    #[error("end of input")]
    EndOfInput,

    /// A record field marked `required` had no matching JSON member.
    #[error("required field {field:?} is missing")]
    RequiredKeyMissing { field: &'static str },

    /// A record field marked `nonempty` matched its kind's zero value.
    #[error("field {field:?} must not be empty")]
    NonEmptyZeroValue { field: &'static str },

    /// Materialization targeted a storage shape this engine doesn't support
    /// (channels, functions, and similar are not JSON-representable).
    #[error("unsupported storage shape: {shape}")]
    UnsupportedContainer { shape: &'static str },

    /// A user-supplied pre/post hook returned an error or panicked.
    #[error("hook failed: {0}")]
    PostHookError(String),

    /// A key path resolved to a kind the caller's storage cannot accept,
    /// even under permissive coercion (e.g. an `Object` into a byte slot).
    #[error("cannot store {found} value at this site")]
    RequiresContainer { found: Kind },

    /// Materialization recursed past `Config::max_recursion_depth`. Guards
    /// against a pathologically deep document driving unbounded stack
    /// growth.
    #[error("materialization exceeded the maximum recursion depth of {max}")]
    RecursionTooDeep { max: usize },
}

impl Error {
    /// Wrap a caught panic payload from a hook invocation.
    #[must_use]
    pub fn from_panic_payload(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "hook panicked with a non-string payload".to_string()
        };
        Error::PostHookError(message)
    }
}
