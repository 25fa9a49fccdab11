#![doc = include_str!("../README.md")]

pub mod descriptor;
pub mod error;
pub mod iter;
pub mod materialize;
pub mod reader;
pub mod value;

pub use descriptor::{descriptor_for, Descriptor, FieldDescriptor, Record, RecordObject};
pub use error::{Error, Result};
pub use iter::Iter;
pub use materialize::{materialize_field, unmarshal, unmarshal_strict, unmarshal_with_config, Materialize};
pub use reader::Reader;
pub use value::Value;

/// Re-exported so [`json_record!`]'s generated code can name `jsonspan`
/// types without assuming the invoking crate depends on `jsonspan`
/// directly under that name.
#[doc(hidden)]
pub use jsonspan as __reexport;
