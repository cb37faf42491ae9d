use layerconf_derive::layerconf_error;

#[layerconf_error]
pub enum DemoError {
    #[error("I/O error: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },
}

fn main() {}
