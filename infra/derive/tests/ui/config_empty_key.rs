#![allow(dead_code)]

use layerconf_derive::Config;

#[derive(Config)]
struct Settings {
    #[config(",required")]
    port: u16,
}

fn main() {}
