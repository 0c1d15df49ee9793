#![allow(dead_code)]

use envbind::Bind;

#[derive(Bind, Default)]
#[bind(default)]
pub struct Config {
    #[bind(default = "8080")]
    port: u16,
}

fn main() {}
