//! Type descriptors: the reflection substitute for record materialization.
//!
//! Rust has no runtime reflection. The teacher workspace this crate is
//! built against never reaches for a proc-macro derive anywhere in its own
//! four crates, so the descriptor for a record type is wired up by the
//! declarative [`json_record!`] macro instead of a `syn`/`quote`-based
//! attribute, keeping code generation inside what the teacher's own idiom
//! already does (hand-written trait impls, no separate codegen crate in
//! the dependency graph). The macro emits two trait impls: [`Record`] (the
//! static field list) and [`RecordObject`] (the dyn-dispatchable field
//! setters the materializer drives recursively).
//!
//! The descriptor *cache* is the process-wide collaborator described in
//! the data model: a mutex-guarded map from [`TypeId`] to a leaked,
//! `'static` [`Descriptor`], built once per type on first use.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use jsonspan::{Config, Span};

use crate::error::Result;

/// One field's binding: its JSON name, the storage slot it occupies
/// (possibly through a chain of embedded records), and its declarative
/// constraints.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub json_name: &'static str,
    pub storage_index: usize,
    /// Indices of the anchor fields to traverse, root to leaf, before
    /// reaching `storage_index` on the innermost embedded record. Empty
    /// for a direct field.
    pub embedded_path: Vec<usize>,
    pub required: bool,
    pub nonempty: bool,
}

/// Field name, required, and non-empty ownership used for a record's tie
/// resolution and downstream constraint checks.
fn rank(field: &FieldDescriptor) -> (u8, usize, usize) {
    let is_embedded = u8::from(!field.embedded_path.is_empty());
    (is_embedded, field.embedded_path.len(), field.storage_index)
}

/// A fully resolved record descriptor: one winning [`FieldDescriptor`] per
/// JSON name (embedding ties broken per §4.5), plus the flat required and
/// non-empty name sets.
pub struct Descriptor {
    pub by_name: HashMap<&'static str, FieldDescriptor>,
    pub required: Vec<&'static str>,
    pub nonempty: Vec<&'static str>,
}

impl Descriptor {
    /// Resolve a raw, possibly name-colliding field list (direct fields
    /// plus whatever embedded records contributed) into one descriptor.
    #[must_use]
    pub fn build(raw: Vec<FieldDescriptor>) -> Self {
        let mut by_name: HashMap<&'static str, FieldDescriptor> = HashMap::new();
        for field in &raw {
            match by_name.get(field.json_name) {
                None => {
                    by_name.insert(field.json_name, field.clone());
                }
                Some(existing) if rank(field) < rank(existing) => {
                    by_name.insert(field.json_name, field.clone());
                }
                Some(_) => {}
            }
        }

        // Required/non-empty are flat sets over *all* raw entries
        // (embedded fields contribute their own names), last-wins on
        // conflicting declarations for the same name.
        let mut required_state: HashMap<&'static str, bool> = HashMap::new();
        let mut nonempty_state: HashMap<&'static str, bool> = HashMap::new();
        for field in &raw {
            required_state.insert(field.json_name, field.required);
            nonempty_state.insert(field.json_name, field.nonempty);
        }

        let required = required_state
            .into_iter()
            .filter_map(|(name, flag)| flag.then_some(name))
            .collect();
        let nonempty = nonempty_state
            .into_iter()
            .filter_map(|(name, flag)| flag.then_some(name))
            .collect();

        Descriptor {
            by_name,
            required,
            nonempty,
        }
    }
}

/// Implemented by every type the [`json_record!`] macro is invoked on.
/// `raw_fields` enumerates the type's own direct fields plus, for each
/// embedded anchor, the nested type's fields with its anchor index
/// prepended to their `embedded_path` — composing automatically to
/// arbitrary embedding depth without the materializer re-walking anything
/// at runtime.
pub trait Record: Sized + 'static {
    fn raw_fields() -> Vec<FieldDescriptor>;

    /// The process-wide cached, resolved descriptor for this type.
    fn descriptor() -> &'static Descriptor {
        descriptor_for::<Self>()
    }
}

/// Object-safe half of the generated impl: lets the materializer set a
/// field by storage index, or reach into an embedded anchor field, without
/// knowing the concrete record type at the call site.
pub trait RecordObject {
    /// # Errors
    ///
    /// Whatever [`crate::materialize::materialize_field`] returns for the
    /// field's static type.
    fn set_field_span(
        &mut self,
        storage_index: usize,
        buffer: &[u8],
        span: Span,
        config: &Config,
    ) -> Result<()>;

    /// `Some` if `storage_index` names a field whose static type is itself
    /// a `json_record!`-declared embedding anchor.
    fn nested_mut(&mut self, storage_index: usize) -> Option<&mut dyn RecordObject>;

    fn is_field_empty(&self, storage_index: usize) -> bool;
}

/// Follow an `embedded_path` one anchor hop at a time, composing through
/// however many embedding levels a field's descriptor names.
///
/// # Panics
///
/// If a path index does not name an embedding anchor on the record it is
/// applied to — a descriptor/struct mismatch, which only arises from a
/// hand-written `Record`/`RecordObject` impl pair that disagrees with
/// itself.
pub(crate) fn reach_embedded_mut<'r>(
    root: &'r mut dyn RecordObject,
    path: &[usize],
) -> &'r mut dyn RecordObject {
    let mut current = root;
    for &index in path {
        current = current
            .nested_mut(index)
            .expect("embedded_path index must address a nested record field");
    }
    current
}

static DESCRIPTOR_CACHE: OnceLock<Mutex<HashMap<TypeId, &'static Descriptor>>> = OnceLock::new();

/// Fetch (building and caching on first use) the resolved descriptor for
/// `T`. Mirrors the data model's single process-wide, mutex-guarded
/// descriptor cache.
pub fn descriptor_for<T: Record>() -> &'static Descriptor {
    let cache = DESCRIPTOR_CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    let type_id = TypeId::of::<T>();

    {
        let guard = cache.lock().expect("descriptor cache mutex poisoned");
        if let Some(&descriptor) = guard.get(&type_id) {
            return descriptor;
        }
    }

    let built: &'static Descriptor = Box::leak(Box::new(Descriptor::build(T::raw_fields())));
    let mut guard = cache.lock().expect("descriptor cache mutex poisoned");
    *guard.entry(type_id).or_insert(built)
}

/// Wire a plain struct up to [`Record`] and [`RecordObject`] without a
/// proc-macro derive.
///
/// ```ignore
/// #[derive(Default)]
/// struct Address {
///     city: String,
/// }
/// json_record! {
///     struct Address {
///         fields {
///             city: String { json: "city", index: 0, required: false, nonempty: false },
///         }
///         embeds {}
///     }
/// }
///
/// #[derive(Default)]
/// struct Person {
///     name: String,
///     address: Address,
/// }
/// json_record! {
///     struct Person {
///         fields {
///             name: String { json: "name", index: 0, required: true, nonempty: false },
///         }
///         embeds {
///             address: Address { index: 1 },
///         }
///     }
/// }
/// ```
///
/// A field omitted from both blocks is invisible to the core, matching
/// the `-` tag annotation's effect.
#[macro_export]
macro_rules! json_record {
    (
        struct $name:ident {
            fields {
                $(
                    $field:ident : $ty:ty {
                        json: $jname:literal,
                        index: $idx:expr,
                        required: $required:literal,
                        nonempty: $nonempty:literal
                    }
                ),* $(,)?
            }
            embeds {
                $(
                    $efield:ident : $ety:ty { index: $eidx:expr }
                ),* $(,)?
            }
        }
    ) => {
        impl $crate::descriptor::Record for $name {
            fn raw_fields() -> ::std::vec::Vec<$crate::descriptor::FieldDescriptor> {
                let mut fields = ::std::vec::Vec::new();
                $(
                    fields.push($crate::descriptor::FieldDescriptor {
                        json_name: $jname,
                        storage_index: $idx,
                        embedded_path: ::std::vec::Vec::new(),
                        required: $required,
                        nonempty: $nonempty,
                    });
                )*
                $(
                    for nested in <$ety as $crate::descriptor::Record>::raw_fields() {
                        let mut embedded_path = ::std::vec![$eidx];
                        embedded_path.extend(nested.embedded_path);
                        fields.push($crate::descriptor::FieldDescriptor {
                            json_name: nested.json_name,
                            storage_index: nested.storage_index,
                            embedded_path,
                            required: nested.required,
                            nonempty: nested.nonempty,
                        });
                    }
                )*
                fields
            }
        }

        impl $crate::descriptor::RecordObject for $name {
            fn set_field_span(
                &mut self,
                storage_index: usize,
                buffer: &[u8],
                span: $crate::__reexport::Span,
                config: &$crate::__reexport::Config,
            ) -> $crate::error::Result<()> {
                match storage_index {
                    $(
                        $idx => {
                            self.$field = $crate::materialize::materialize_field(buffer, &span, config)?;
                            ::std::result::Result::Ok(())
                        }
                    )*
                    $(
                        $eidx => {
                            self.$efield = $crate::materialize::materialize_field(buffer, &span, config)?;
                            ::std::result::Result::Ok(())
                        }
                    )*
                    other => ::std::unreachable!(
                        "no such storage index {} on {}",
                        other,
                        ::std::stringify!($name)
                    ),
                }
            }

            fn nested_mut(
                &mut self,
                storage_index: usize,
            ) -> ::std::option::Option<&mut dyn $crate::descriptor::RecordObject> {
                match storage_index {
                    $(
                        $eidx => ::std::option::Option::Some(
                            &mut self.$efield as &mut dyn $crate::descriptor::RecordObject
                        ),
                    )*
                    _ => ::std::option::Option::None,
                }
            }

            fn is_field_empty(&self, storage_index: usize) -> bool {
                match storage_index {
                    $(
                        $idx => $crate::materialize::Materialize::is_zero(&self.$field),
                    )*
                    $(
                        $eidx => $crate::materialize::Materialize::is_zero(&self.$efield),
                    )*
                    _ => false,
                }
            }
        }
    };
}
