#![allow(dead_code)]

use layerconf_derive::Config;

#[derive(Config)]
struct Settings {
    #[config("port,short=")]
    port: u16,
}

fn main() {}
