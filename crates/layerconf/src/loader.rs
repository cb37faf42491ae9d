use crate::backend::Backend;
use crate::coerce::coerce;
use crate::context::Context;
use crate::error::LoadError;
use crate::field::{self, Configurable, FieldDescriptor};
use std::borrow::Cow;
use std::fmt;
use tracing::{debug, trace};

/// Populates the tagged fields of `target` from `backends`.
///
/// Fields are resolved in declaration order. For each one, backends are asked in the given order
/// and the first value found is coerced and written; later backends are not consulted. A field no
/// backend knows keeps its current value, which is how defaults are expressed, unless it is
/// `required`.
///
/// The pass stops at the first error. Fields written before the failure keep their new values;
/// fields after it are not touched.
///
/// # Errors
/// * [`LoadError::MalformedTag`] before any backend is queried.
/// * [`LoadError::MissingRequiredField`] when no backend has a required key.
/// * [`LoadError::TypeConversion`] when a found value does not parse.
/// * [`LoadError::BackendLookup`] when a backend fails for another reason than a missing key.
/// * [`LoadError::Canceled`] when `ctx` is cancelled or past its deadline.
/// * Whatever a backend's [`Backend::prepare`] returns, e.g. [`LoadError::FlagParse`].
pub fn load<T>(ctx: &Context, target: &mut T, backends: &[&dyn Backend]) -> Result<(), LoadError>
where
    T: Configurable + ?Sized,
{
    ctx.check()?;
    let fields = field::extract::<T>()?;

    for backend in backends {
        backend.prepare(&fields)?;
    }

    let mut resolved = 0usize;
    for field in &fields {
        ctx.check()?;

        match lookup(ctx, field, backends)? {
            Some((position, raw)) => {
                assign(target, field, &raw)?;
                resolved += 1;
                trace!(key = field.key, backend = backends[position].name(), "field resolved");
            },
            None if field.required => {
                return Err(LoadError::MissingRequiredField { key: field.key, context: None });
            },
            None => trace!(key = field.key, "no value found, keeping current"),
        }
    }

    debug!(fields = fields.len(), resolved, backends = backends.len(), "configuration loaded");
    Ok(())
}

/// Returns the position of the first backend holding `field` and the raw value it returned.
fn lookup(
    ctx: &Context,
    field: &FieldDescriptor,
    backends: &[&dyn Backend],
) -> Result<Option<(usize, Vec<u8>)>, LoadError> {
    for (position, backend) in backends.iter().enumerate() {
        if field.backend.is_some_and(|only| only != backend.name()) {
            continue;
        }
        ctx.check()?;

        match backend.get(ctx, field.key) {
            Ok(raw) => return Ok(Some((position, raw))),
            Err(err) if err.is_not_found() => {},
            Err(source) => {
                return Err(LoadError::BackendLookup {
                    backend: backend.name().to_owned(),
                    key: field.key,
                    source,
                    context: None,
                });
            },
        }
    }

    Ok(None)
}

fn assign<T>(target: &mut T, field: &FieldDescriptor, raw: &[u8]) -> Result<(), LoadError>
where
    T: Configurable + ?Sized,
{
    let conversion_error = |reason: Cow<'static, str>| LoadError::TypeConversion {
        key: field.key,
        raw: String::from_utf8_lossy(raw).into_owned(),
        kind: field.kind,
        reason,
        context: Some(format!("field `{}`", field.name).into()),
    };

    let value = coerce(raw, field.kind).map_err(|err| conversion_error(err.reason))?;
    target
        .assign(field.index, value)
        .map_err(|_| conversion_error(Cow::Borrowed("value does not fit the field type")))
}

/// An owned, ordered set of backends that can populate any number of records.
///
/// # Example
///
/// ```rust
/// use layerconf::backends::MapBackend;
/// use layerconf::{Config, Context, Loader};
///
/// #[derive(Debug, Default, Config)]
/// struct Settings {
///     #[config("host,required")]
///     host: String,
///     #[config("port")]
///     port: u16,
/// }
///
/// let loader = Loader::new()
///     .with_backend(MapBackend::new().with("host", "db.internal"))
///     .with_backend(MapBackend::named("defaults").with("host", "localhost").with("port", "5432"));
///
/// let mut settings = Settings::default();
/// loader.load(&Context::background(), &mut settings)?;
///
/// assert_eq!(settings.host, "db.internal");
/// assert_eq!(settings.port, 5432);
/// # Ok::<(), layerconf::LoadError>(())
/// ```
#[derive(Default)]
pub struct Loader {
    backends: Vec<Box<dyn Backend>>,
}

impl Loader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a backend with lower priority than every backend added before it.
    #[must_use = "The loader must be kept to resolve configuration"]
    pub fn with_backend(mut self, backend: impl Backend + 'static) -> Self {
        self.backends.push(Box::new(backend));
        self
    }

    /// Names of the backends in priority order.
    pub fn backend_names(&self) -> impl Iterator<Item = &str> {
        self.backends.iter().map(|backend| backend.name())
    }

    /// Runs [`load`] with this loader's backends.
    ///
    /// # Errors
    /// See [`load`].
    pub fn load<T>(&self, ctx: &Context, target: &mut T) -> Result<(), LoadError>
    where
        T: Configurable + ?Sized,
    {
        let backends: Vec<&dyn Backend> = self.backends.iter().map(|backend| &**backend).collect();
        load(ctx, target, &backends)
    }
}

impl FromIterator<Box<dyn Backend>> for Loader {
    fn from_iter<I: IntoIterator<Item = Box<dyn Backend>>>(iter: I) -> Self {
        Self { backends: iter.into_iter().collect() }
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader").field("backends", &self.backend_names().collect::<Vec<_>>()).finish()
    }
}
