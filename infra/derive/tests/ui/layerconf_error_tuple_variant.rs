use layerconf_derive::layerconf_error;

#[layerconf_error]
pub enum DemoError {
    Io(std::io::Error),
}

fn main() {}
