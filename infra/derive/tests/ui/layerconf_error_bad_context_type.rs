use layerconf_derive::layerconf_error;

#[layerconf_error]
pub enum DemoError {
    #[error("I/O error: {source}")]
    Io { source: std::io::Error, context: Option<String> },
}

fn main() {}
