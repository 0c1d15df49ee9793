#![allow(dead_code)]

use envbind::Bind;

#[derive(Bind)]
pub struct Config {
    #[bind(skip, required)]
    cache: String,
}

fn main() {}
