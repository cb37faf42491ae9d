#![allow(dead_code)]

use layerconf_derive::Config;

#[derive(Config)]
struct Settings {
    #[config("port")]
    #[config("listen-port")]
    port: u16,
}

fn main() {}
