use layerconf_derive::layerconf_error;
use std::borrow::Cow;

#[layerconf_error]
pub enum DemoError {
    #[error("I/O error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn main() {
    let io: Result<(), std::io::Error> = Err(std::io::Error::other("disk"));
    let err = io.context("reading tags").unwrap_err();
    assert_eq!(err.to_string(), "I/O error (reading tags): disk");

    let err: DemoError = "boom".into();
    assert_eq!(err.to_string(), "Internal error: boom");
}
