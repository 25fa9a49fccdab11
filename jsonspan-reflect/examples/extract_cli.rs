//! Manual smoke-testing tool: read a JSON document and a dotted path from
//! stdin, print what `extract`/`key_exists`/`unmarshal` see. Not part of
//! the public API.
//!
//! Usage: `echo '{"a": [1, 2]}' | cargo run --example extract_cli -- a.1`

use std::env;
use std::io::{self, Read};

use jsonspan::Config;
use jsonspan_reflect::Value;

fn main() {
    let path = env::args().nth(1).unwrap_or_default();

    let mut buffer = Vec::new();
    io::stdin()
        .read_to_end(&mut buffer)
        .expect("failed to read stdin");

    let config = Config::default();

    match Value::extract_interface(&buffer, &path, &config) {
        Ok(value) => println!("{value:?}"),
        Err(err) => eprintln!("extract failed: {err}"),
    }

    let exists = jsonspan::extract_value(&buffer, 0)
        .map(|(root, _)| jsonspan::key_exists(&buffer, &root, &path))
        .unwrap_or(false);
    println!("key_exists({path:?}) = {exists}");
}
