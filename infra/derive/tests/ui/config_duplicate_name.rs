#![allow(dead_code)]

use layerconf_derive::Config;

#[derive(Config)]
struct Settings {
    #[config("port")]
    port: u16,
    #[config("listen,short=port")]
    listen: u16,
}

fn main() {}
