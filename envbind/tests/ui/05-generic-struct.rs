#![allow(dead_code)]

use envbind::Bind;

#[derive(Bind)]
pub struct Config<T> {
    value: T,
}

fn main() {}
