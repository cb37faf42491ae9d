use layerconf::backends::MapBackend;
use layerconf::{Config, Configurable, Context, TypeKind, load};
use std::time::Duration;

#[derive(Debug, Default, Config)]
struct Everything {
    #[config("name,required")]
    name: String,
    #[config("verbose, short=v")]
    verbose: bool,
    #[config("tiny")]
    tiny: i8,
    #[config("size")]
    size: usize,
    #[config("ratio,description=Share of traffic to sample")]
    ratio: f64,
    #[config("grace")]
    grace: Duration,
    #[config("limit")]
    limit: Option<u16>,
    #[config("-")]
    skipped: String,
    untagged: u64,
}

#[derive(Config)]
struct Generic<T: Default> {
    #[config("label")]
    label: String,
    extra: T,
}

fn main() {
    assert_eq!(Everything::FIELDS.len(), 7);
    assert_eq!(Everything::FIELDS[2].kind, TypeKind::Int { bits: 8 });
    assert_eq!(Everything::FIELDS[6].kind, TypeKind::Uint { bits: 16 });

    let backend = MapBackend::new().with("name", "svc").with("limit", "5").with("grace", "1.5s");
    let mut everything = Everything::default();
    load(&Context::background(), &mut everything, &[&backend]).unwrap();
    assert_eq!(everything.limit, Some(5));
    assert_eq!(everything.grace, Duration::from_millis(1500));
    assert!(everything.skipped.is_empty());
    assert_eq!(everything.untagged, 0);

    let mut generic = Generic::<u8> { label: String::new(), extra: 3 };
    load(&Context::background(), &mut generic, &[&MapBackend::new().with("label", "x")]).unwrap();
    assert_eq!(generic.label, "x");
    assert_eq!(generic.extra, 3);
}
