#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

extern crate alloc;

pub mod coerce;
pub mod config;
pub mod error;
pub mod extract;
pub mod lex;
pub mod path;
pub mod span;

pub use coerce::{key_to_string, to_bool, to_f64, to_i64, to_string, CoercedStr};
pub use config::Config;
pub use error::{Error, Preview, Result};
pub use extract::{
    count_members, extract_object_member, extract_value, find_terminator, for_each_element,
    for_each_member,
};
pub use lex::{classify, skip_ws};
pub use path::{
    extract_bool, extract_float, extract_int, extract_string, key_exists, key_exists_with_config,
    resolve, resolve_with_config,
};
pub use span::{Kind, Member, Span};
