#![allow(dead_code)]

use envbind::Bind;

#[derive(Bind)]
pub struct Config {
    #[bind(skip, include)]
    cache: String,
}

fn main() {}
