//! # Field descriptors
//!
//! A record advertises its resolvable fields through [`Configurable::FIELDS`], a static table
//! usually generated by `#[derive(Config)]`. [`extract`] turns that table into
//! [`FieldDescriptor`]s by parsing each field's tag:
//!
//! ```text
//! <key>[,short=<alias>][,required][,backend=<name>][,description=<text>]
//! ```
//!
//! The key comes first and must not be empty. A tag of `-` excludes the field.

use crate::error::LoadError;
use crate::value::Value;
use fxhash::FxHashMap;
use std::fmt;

/// Coercion target of a field. Numeric kinds carry the bit width of the Rust type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    String,
    Bool,
    Int { bits: u32 },
    Uint { bits: u32 },
    Float { bits: u32 },
    Duration,
}

impl TypeKind {
    /// Short human-readable name, also used as the flag value placeholder.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Int { bits: 8 } => "int8",
            Self::Int { bits: 16 } => "int16",
            Self::Int { bits: 32 } => "int32",
            Self::Int { .. } => "int64",
            Self::Uint { bits: 8 } => "uint8",
            Self::Uint { bits: 16 } => "uint16",
            Self::Uint { bits: 32 } => "uint32",
            Self::Uint { .. } => "uint64",
            Self::Float { bits: 32 } => "float32",
            Self::Float { .. } => "float64",
            Self::Duration => "duration",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One entry of a record's static field table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Rust field name, used in diagnostics.
    pub name: &'static str,
    /// Raw tag string.
    pub tag: &'static str,
    pub kind: TypeKind,
}

/// A record whose fields can be populated by the resolver.
///
/// Implemented by `#[derive(Config)]`. Hand-written implementations must keep `assign` indices
/// aligned with [`Configurable::FIELDS`].
pub trait Configurable {
    const FIELDS: &'static [FieldSpec];

    /// Writes `value` into the field at `index` of [`Configurable::FIELDS`].
    ///
    /// # Errors
    /// Hands the value back when it does not fit the field's type or the index is unknown.
    fn assign(&mut self, index: usize, value: Value) -> Result<(), Value>;
}

/// Parsed metadata for one resolvable field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Position in [`Configurable::FIELDS`].
    pub index: usize,
    pub name: &'static str,
    pub key: &'static str,
    pub short: Option<&'static str>,
    pub required: bool,
    /// Restricts the lookup to the backend with this name.
    pub backend: Option<&'static str>,
    pub description: Option<&'static str>,
    pub kind: TypeKind,
}

impl FieldDescriptor {
    /// Parses the tag of `spec`. Returns `Ok(None)` for fields tagged `-`.
    ///
    /// # Errors
    /// Returns [`LoadError::MalformedTag`] for an empty key, an unknown or repeated option,
    /// or an option missing its value.
    pub fn parse(index: usize, spec: &FieldSpec) -> Result<Option<Self>, LoadError> {
        let tag = spec.tag.trim();
        if tag == "-" {
            return Ok(None);
        }

        let malformed = |message: String| LoadError::MalformedTag {
            field: spec.name,
            message: message.into(),
            context: Some(format!("tag {:?}", spec.tag).into()),
        };

        let mut parts = tag.split(',').map(str::trim);
        let key = parts.next().unwrap_or_default();
        if key.is_empty() {
            return Err(malformed("the key must not be empty".to_owned()));
        }

        let mut descriptor = Self {
            index,
            name: spec.name,
            key,
            short: None,
            required: false,
            backend: None,
            description: None,
            kind: spec.kind,
        };

        for part in parts {
            let (option, value) = part.split_once('=').map_or((part, None), |(o, v)| (o, Some(v)));
            let slot = match (option, value) {
                ("required", None) => {
                    if descriptor.required {
                        return Err(malformed("`required` is repeated".to_owned()));
                    }
                    descriptor.required = true;
                    continue;
                },
                ("short", Some(alias)) if !alias.is_empty() => (&mut descriptor.short, alias),
                ("backend", Some(name)) if !name.is_empty() => (&mut descriptor.backend, name),
                ("description", Some(text)) => (&mut descriptor.description, text),
                ("short" | "backend", _) => {
                    return Err(malformed(format!("`{option}` requires a non-empty value")));
                },
                _ => return Err(malformed(format!("unknown option `{part}`"))),
            };

            let (target, value) = slot;
            if target.replace(value).is_some() {
                return Err(malformed(format!("`{option}` is repeated")));
            }
        }

        Ok(Some(descriptor))
    }

    /// The primary key followed by the alias, if any.
    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.key).chain(self.short)
    }
}

/// Builds the descriptors of `T` in declaration order.
///
/// # Errors
/// Returns [`LoadError::MalformedTag`] if a tag cannot be parsed, or if a key or alias is used
/// by more than one field.
pub fn extract<T: Configurable + ?Sized>() -> Result<Vec<FieldDescriptor>, LoadError> {
    let mut descriptors = Vec::with_capacity(T::FIELDS.len());
    let mut owners: FxHashMap<&'static str, &'static str> = FxHashMap::default();

    for (index, spec) in T::FIELDS.iter().enumerate() {
        let Some(descriptor) = FieldDescriptor::parse(index, spec)? else {
            continue;
        };

        for name in descriptor.names() {
            if let Some(owner) = owners.insert(name, spec.name) {
                return Err(LoadError::MalformedTag {
                    field: spec.name,
                    message: format!("`{name}` is already used by field `{owner}`").into(),
                    context: None,
                });
            }
        }
        descriptors.push(descriptor);
    }

    Ok(descriptors)
}
