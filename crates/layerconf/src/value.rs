use crate::field::TypeKind;
use std::time::Duration;

/// A coerced configuration value, ready to be written into a field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float32(f32),
    Float64(f64),
    Duration(Duration),
}

/// Rust types that can back a configuration field.
///
/// `KIND` selects the coercion rule; `from_value` narrows the coerced value into `Self`.
pub trait ConfigField: Sized {
    const KIND: TypeKind;

    /// # Errors
    /// Returns the value unchanged when it does not fit `Self`.
    fn from_value(value: Value) -> Result<Self, Value>;
}

impl ConfigField for String {
    const KIND: TypeKind = TypeKind::String;

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(other),
        }
    }
}

impl ConfigField for bool {
    const KIND: TypeKind = TypeKind::Bool;

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(other),
        }
    }
}

impl ConfigField for Duration {
    const KIND: TypeKind = TypeKind::Duration;

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Duration(d) => Ok(d),
            other => Err(other),
        }
    }
}

impl ConfigField for f32 {
    const KIND: TypeKind = TypeKind::Float { bits: 32 };

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Float32(f) => Ok(f),
            other => Err(other),
        }
    }
}

impl ConfigField for f64 {
    const KIND: TypeKind = TypeKind::Float { bits: 64 };

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Float64(f) => Ok(f),
            Value::Float32(f) => Ok(Self::from(f)),
            other => Err(other),
        }
    }
}

macro_rules! integer_fields {
    ($variant:ident => $kind:ident: $($ty:ty),+) => {$(
        impl ConfigField for $ty {
            const KIND: TypeKind = TypeKind::$kind { bits: <$ty>::BITS };

            fn from_value(value: Value) -> Result<Self, Value> {
                match value {
                    Value::$variant(n) => Self::try_from(n).map_err(|_| Value::$variant(n)),
                    other => Err(other),
                }
            }
        }
    )+};
}

integer_fields!(Int => Int: i8, i16, i32, i64, isize);
integer_fields!(Uint => Uint: u8, u16, u32, u64, usize);

/// Optional fields keep `None` when no backend supplies a value.
impl<T: ConfigField> ConfigField for Option<T> {
    const KIND: TypeKind = T::KIND;

    fn from_value(value: Value) -> Result<Self, Value> {
        T::from_value(value).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_report_their_width() {
        assert_eq!(<i8 as ConfigField>::KIND, TypeKind::Int { bits: 8 });
        assert_eq!(<u32 as ConfigField>::KIND, TypeKind::Uint { bits: 32 });
        assert_eq!(<Option<u16> as ConfigField>::KIND, TypeKind::Uint { bits: 16 });
    }

    #[test]
    fn narrowing_out_of_range_hands_the_value_back() {
        assert_eq!(i8::from_value(Value::Int(300)), Err(Value::Int(300)));
        assert_eq!(u16::from_value(Value::Uint(65_535)), Ok(65_535));
    }

    #[test]
    fn mismatched_variant_is_rejected() {
        assert_eq!(bool::from_value(Value::String("true".to_owned())), Err(Value::String("true".to_owned())));
        assert_eq!(Option::<bool>::from_value(Value::Bool(true)), Ok(Some(true)));
    }
}
