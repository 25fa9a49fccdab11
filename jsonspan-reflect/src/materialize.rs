//! The reflective materializer: binds located spans into caller-supplied
//! storage of arbitrary shape, driving the core scanner/coercion layer
//! recursively.

use std::cell::Cell;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};

use indexmap::IndexMap;

use jsonspan::{
    extract_value, for_each_element, for_each_member, key_to_string, to_string, Config, Kind, Span,
};

use crate::descriptor::{reach_embedded_mut, Descriptor, Record, RecordObject};
use crate::error::{Error, Result};
use crate::value::Value;

/// Implemented for every type that can sit at a materialization storage
/// site: primitives, `Option`, `Vec`, `IndexMap<String, _>`, [`Value`],
/// and (via the blanket impl below) any [`Record`].
///
/// `materialize` is the shape-dispatch step (§4.5 step 5, plus the
/// byte-wide short-circuit of step 4 for `Vec<u8>`). The Null short-circuit
/// (step 2) is each impl's own responsibility so that `Record` can still
/// run its required/non-empty checks against an untouched default value,
/// which a single generic short-circuit could not do.
pub trait Materialize: Sized + Default {
    /// # Errors
    ///
    /// A coercion, extraction, or record-constraint failure.
    fn materialize(buffer: &[u8], span: &Span, config: &Config) -> Result<Self>;

    /// `true` if `self` equals this type's JSON "zero" value, for the
    /// non-empty field check.
    fn is_zero(&self) -> bool {
        false
    }

    /// A user pre-hook: if `Some`, its result overrides default handling
    /// entirely (including the Null short-circuit).
    fn unmarshal_hook(_buffer: &[u8], _span: &Span, _config: &Config) -> Option<Result<Self>> {
        None
    }

    /// A user post-hook, run after normal (or hook-driven) unmarshal
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Any validation failure the hook chooses to report.
    fn post_hook(self) -> Result<Self> {
        Ok(self)
    }
}

thread_local! {
    static RECURSION_DEPTH: Cell<usize> = Cell::new(0);
}

/// RAII depth counter: increments on entry, decrements on drop (including
/// on the error path via `?`), so a deep chain of `materialize_field`
/// calls can't outlive `Config::max_recursion_depth` without being caught.
struct DepthGuard;

impl DepthGuard {
    fn enter(max: usize) -> Result<Self> {
        let exceeded = RECURSION_DEPTH.with(|depth| {
            let next = depth.get() + 1;
            depth.set(next);
            next > max
        });
        if exceeded {
            return Err(Error::RecursionTooDeep { max });
        }
        Ok(DepthGuard)
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        RECURSION_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// The single entry point every recursive storage site should call: runs
/// the recursion-depth guard and the hook dispatch (§4.5 step 1) before
/// falling through to [`Materialize::materialize`].
///
/// # Errors
///
/// `Error::RecursionTooDeep` past `config.max_recursion_depth`. Otherwise
/// whatever the hook or the underlying `materialize` call produces.
pub fn materialize_field<T: Materialize>(buffer: &[u8], span: &Span, config: &Config) -> Result<T> {
    let _guard = DepthGuard::enter(config.max_recursion_depth)?;
    if let Some(result) = T::unmarshal_hook(buffer, span, config) {
        return result.and_then(Materialize::post_hook);
    }
    T::materialize(buffer, span, config).and_then(Materialize::post_hook)
}

impl Materialize for i64 {
    fn materialize(buffer: &[u8], span: &Span, config: &Config) -> Result<Self> {
        if span.kind == Kind::Null {
            return Ok(0);
        }
        Ok(jsonspan::to_i64(buffer, span, config.strict)?)
    }

    fn is_zero(&self) -> bool {
        *self == 0
    }
}

impl Materialize for f64 {
    fn materialize(buffer: &[u8], span: &Span, config: &Config) -> Result<Self> {
        if span.kind == Kind::Null {
            return Ok(0.0);
        }
        Ok(jsonspan::to_f64(buffer, span, config.strict)?)
    }

    fn is_zero(&self) -> bool {
        *self == 0.0
    }
}

impl Materialize for bool {
    fn materialize(buffer: &[u8], span: &Span, config: &Config) -> Result<Self> {
        if span.kind == Kind::Null {
            return Ok(false);
        }
        Ok(jsonspan::to_bool(buffer, span, config.strict)?)
    }

    fn is_zero(&self) -> bool {
        !*self
    }
}

impl Materialize for String {
    fn materialize(buffer: &[u8], span: &Span, config: &Config) -> Result<Self> {
        if span.kind == Kind::Null {
            return Ok(String::new());
        }
        Ok(to_string(buffer, span, config.strict)?.into_owned())
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

/// Byte-wide short-circuit target (§4.5 step 4): a `String` source
/// contributes its unquoted-but-unescaped inner bytes, anything else
/// contributes its whole source span verbatim.
impl Materialize for Vec<u8> {
    fn materialize(buffer: &[u8], span: &Span, _config: &Config) -> Result<Self> {
        if span.kind == Kind::Null {
            return Ok(Vec::new());
        }
        if span.kind == Kind::String {
            Ok(span.inner_bytes(buffer).to_vec())
        } else {
            Ok(span.bytes(buffer).to_vec())
        }
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl Materialize for Value {
    fn materialize(buffer: &[u8], span: &Span, _config: &Config) -> Result<Self> {
        Value::from_span(buffer, span).map_err(Into::into)
    }

    fn is_zero(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Int(n) => *n == 0,
            Value::Float(f) => *f == 0.0,
            Value::String(s) => s.is_empty(),
            Value::Array(a) => a.is_empty(),
            Value::Object(o) => o.is_empty(),
        }
    }
}

impl<T: Materialize> Materialize for Option<T> {
    fn materialize(buffer: &[u8], span: &Span, config: &Config) -> Result<Self> {
        if span.kind == Kind::Null {
            return Ok(None);
        }
        Ok(Some(materialize_field::<T>(buffer, span, config)?))
    }

    fn is_zero(&self) -> bool {
        self.is_none()
    }
}

/// Sequence storage (§4.5 "Sequence"): pre-sized with `count_members`;
/// object sources iterate values discarding keys, array sources iterate
/// values, any scalar source becomes a single-element sequence.
impl<T: Materialize> Materialize for Vec<T> {
    fn materialize(buffer: &[u8], span: &Span, config: &Config) -> Result<Self> {
        if span.kind == Kind::Null {
            return Ok(Vec::new());
        }
        match span.kind {
            Kind::Object => {
                let count = jsonspan::count_members(buffer, span)?.max(0) as usize;
                let mut out = Vec::with_capacity(count);
                for_each_member(buffer, span, |member, _consumed| {
                    out.push(materialize_field::<T>(buffer, &member.value, config)?);
                    Ok(true)
                })?;
                Ok(out)
            }
            Kind::Array => {
                let count = jsonspan::count_members(buffer, span)?.max(0) as usize;
                let mut out = Vec::with_capacity(count);
                for_each_element(buffer, span, |element, _consumed| {
                    out.push(materialize_field::<T>(buffer, &element, config)?);
                    Ok(true)
                })?;
                Ok(out)
            }
            _ => Ok(vec![materialize_field::<T>(buffer, span, config)?]),
        }
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

/// Mapping storage (§4.5 "Mapping"): object sources key by the unquoted
/// key string, array sources key by decimal-string index, scalars key
/// under `"0"`.
impl<T: Materialize> Materialize for IndexMap<String, T> {
    fn materialize(buffer: &[u8], span: &Span, config: &Config) -> Result<Self> {
        if span.kind == Kind::Null {
            return Ok(IndexMap::new());
        }
        let mut out = IndexMap::new();
        match span.kind {
            Kind::Object => {
                for_each_member(buffer, span, |member, _consumed| {
                    let key = key_to_string(buffer, &member.key)?.into_owned();
                    out.insert(key, materialize_field::<T>(buffer, &member.value, config)?);
                    Ok(true)
                })?;
            }
            Kind::Array => {
                let mut i = 0usize;
                for_each_element(buffer, span, |element, _consumed| {
                    out.insert(i.to_string(), materialize_field::<T>(buffer, &element, config)?);
                    i += 1;
                    Ok(true)
                })?;
            }
            _ => {
                out.insert("0".to_string(), materialize_field::<T>(buffer, span, config)?);
            }
        }
        Ok(out)
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

/// Record storage (§4.5 "Record"): resolve the type descriptor, scan
/// members left-to-right, recurse into each recognized field's storage
/// through its (possibly embedded) path, then enforce required/non-empty.
impl<T: Record + RecordObject + Default> Materialize for T {
    fn materialize(buffer: &[u8], span: &Span, config: &Config) -> Result<Self> {
        materialize_record::<T>(buffer, span, config)
    }
}

pub(crate) fn materialize_record<T: Record + RecordObject + Default>(
    buffer: &[u8],
    span: &Span,
    config: &Config,
) -> Result<T> {
    let mut record = T::default();
    let descriptor = T::descriptor();

    match span.kind {
        Kind::Object => {
            let mut seen: HashSet<&'static str> = HashSet::new();
            for_each_member(buffer, span, |member, _consumed| {
                let key = key_to_string(buffer, &member.key)?.into_owned();
                if let Some(field) = descriptor.by_name.get(key.as_str()) {
                    let target =
                        reach_embedded_mut(&mut record as &mut dyn RecordObject, &field.embedded_path);
                    target.set_field_span(field.storage_index, buffer, member.value, config)?;
                    seen.insert(field.json_name);
                } else {
                    tracing::debug!(key = %key, "skipping unrecognized record key");
                }
                Ok(true)
            })?;
            check_required_and_nonempty(&mut record, descriptor, &seen)?;
        }
        Kind::Null => {
            check_required_and_nonempty(&mut record, descriptor, &HashSet::new())?;
        }
        found => return Err(Error::RequiresContainer { found }),
    }

    Ok(record)
}

fn check_required_and_nonempty<T: RecordObject>(
    record: &mut T,
    descriptor: &Descriptor,
    seen: &HashSet<&'static str>,
) -> Result<()> {
    for &name in &descriptor.required {
        if !seen.contains(name) {
            tracing::warn!(field = name, "required field missing, failing materialization");
            return Err(Error::RequiredKeyMissing { field: name });
        }
    }
    for &name in &descriptor.nonempty {
        if let Some(field) = descriptor.by_name.get(name) {
            let target = reach_embedded_mut(record as &mut dyn RecordObject, &field.embedded_path);
            if target.is_field_empty(field.storage_index) {
                return Err(Error::NonEmptyZeroValue { field: name });
            }
        }
    }
    Ok(())
}

/// Unmarshal the whole of `buffer` into a fresh `T`, permissive coercion.
///
/// # Errors
///
/// Any extraction, coercion, or record-constraint error. A panic inside
/// the engine or a user hook is captured and returned as
/// [`Error::PostHookError`] rather than unwinding past this call.
#[tracing::instrument(skip(buffer), level = "debug")]
pub fn unmarshal<T: Materialize>(buffer: &[u8]) -> Result<T> {
    unmarshal_with_config(buffer, &Config::default())
}

/// `unmarshal`, but strict-mode coercion.
///
/// # Errors
///
/// See [`unmarshal`].
#[tracing::instrument(skip(buffer), level = "debug")]
pub fn unmarshal_strict<T: Materialize>(buffer: &[u8]) -> Result<T> {
    unmarshal_with_config(buffer, &Config::strict())
}

/// `unmarshal` with an explicit [`Config`].
///
/// # Errors
///
/// See [`unmarshal`].
pub fn unmarshal_with_config<T: Materialize>(buffer: &[u8], config: &Config) -> Result<T> {
    let (span, _) = extract_value(buffer, 0)?;
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| materialize_field::<T>(buffer, &span, config)));
    match outcome {
        Ok(result) => result,
        Err(payload) => {
            tracing::warn!("materialization panicked and was recovered");
            Err(Error::from_panic_payload(payload.as_ref()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json_record;

    #[derive(Debug, Default, PartialEq)]
    struct Address {
        city: String,
    }

    json_record! {
        struct Address {
            fields {
                city: String { json: "city", index: 0, required: false, nonempty: false },
            }
            embeds {}
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct Person {
        name: String,
        age: i64,
        tags: Vec<String>,
        address: Address,
    }

    json_record! {
        struct Person {
            fields {
                name: String { json: "name", index: 0, required: true, nonempty: false },
                age: i64 { json: "age", index: 1, required: false, nonempty: false },
                tags: Vec<String> { json: "tags", index: 2, required: false, nonempty: false }
            }
            embeds {
                address: Address { index: 3 }
            }
        }
    }

    #[test]
    fn unmarshals_flat_fields() {
        let doc = br#"{"name": "Ada", "age": 36, "tags": ["a", "b"]}"#;
        let person: Person = unmarshal(doc).unwrap();
        assert_eq!(person.name, "Ada");
        assert_eq!(person.age, 36);
        assert_eq!(person.tags, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn embedded_field_flattens_into_parent_namespace() {
        let doc = br#"{"name": "Ada", "city": "London"}"#;
        let person: Person = unmarshal(doc).unwrap();
        assert_eq!(person.address.city, "London");
    }

    #[test]
    fn missing_required_field_errors() {
        let doc = br#"{"age": 1}"#;
        let err = unmarshal::<Person>(doc).unwrap_err();
        assert!(matches!(err, Error::RequiredKeyMissing { field: "name" }));
    }

    #[test]
    fn null_document_runs_required_check_against_defaults() {
        let doc = b"null";
        let err = unmarshal::<Person>(doc).unwrap_err();
        assert!(matches!(err, Error::RequiredKeyMissing { field: "name" }));
    }

    #[test]
    fn empty_object_with_no_required_fields_succeeds() {
        #[derive(Debug, Default, PartialEq)]
        struct Empty {
            note: String,
        }
        json_record! {
            struct Empty {
                fields {
                    note: String { json: "note", index: 0, required: false, nonempty: false }
                }
                embeds {}
            }
        }
        let person: Empty = unmarshal(b"{}").unwrap();
        assert_eq!(person, Empty::default());
    }

    #[test]
    fn nonempty_zero_value_errors() {
        #[derive(Debug, Default)]
        struct Counted {
            count: i64,
        }
        json_record! {
            struct Counted {
                fields {
                    count: i64 { json: "count", index: 0, required: false, nonempty: true }
                }
                embeds {}
            }
        }
        let err = unmarshal::<Counted>(br#"{"count": 0}"#).unwrap_err();
        assert!(matches!(err, Error::NonEmptyZeroValue { field: "count" }));
    }

    #[test]
    fn sequence_presizes_from_object_source_discarding_keys() {
        let values: Vec<i64> = unmarshal(br#"{"a": 1, "b": 2}"#).unwrap();
        assert_eq!(values, vec![1, 2]);
    }

    #[test]
    fn map_keys_array_by_decimal_index() {
        let map: IndexMap<String, i64> = unmarshal(b"[10, 20]").unwrap();
        assert_eq!(map.get("0"), Some(&10));
        assert_eq!(map.get("1"), Some(&20));
    }
}
