#![allow(dead_code)]

use envbind::Bind;

#[derive(Bind)]
pub struct Config {
    #[bind(default = "FOO")]
    foo: Option<String>,
}

fn main() {}
